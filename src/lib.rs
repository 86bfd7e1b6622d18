//! Orbit discovery library crate
//!
//! Re-exports core modules for integration tests and external use.

pub mod api;
pub mod config;
pub mod database;
pub mod discovery;
pub mod error;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use database::Database;
pub use discovery::{DiscoveryEngine, SuggestedProfile};
pub use error::{Error, Result};
pub use store::{DiscoveryStore, MemoryStore, PostgresStore};
