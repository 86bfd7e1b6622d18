//! Discovery Module
//!
//! People-discovery and ranking for Orbit users.
//!
//! ## Architecture
//!
//! 1. **Exclusion** - per-request set of users who must never be suggested
//!    (the viewer, their follows, blocks in either direction, mutes)
//! 2. **Signal stages** - candidate generators run in priority order:
//!    mutual connections, shared-hashtag interest, trending growth, and a
//!    recently-active fallback
//! 3. **Engine** - orchestrates the stages with early termination, shuffles
//!    and truncates the accumulator, and hydrates the final candidates into
//!    profile payloads
//!
//! ## Failure policy
//!
//! Discovery is a non-critical personalization feature: every stage is
//! failure-isolated. A store error or timeout in one stage is logged and
//! collapsed to an empty contribution; the worst case for a caller is an
//! empty suggestion list, never an error.

pub mod active;
pub mod candidate;
pub mod engine;
pub mod exclusion;
pub mod interest;
pub mod mutual;
pub mod profile;
pub mod trending;

// Re-export the types that are actually used externally
pub use candidate::{CandidateScore, Signal};
pub use engine::DiscoveryEngine;
pub use exclusion::ExclusionSet;
pub use profile::SuggestedProfile;
