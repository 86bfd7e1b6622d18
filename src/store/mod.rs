//! Storage abstraction for the discovery engine
//!
//! The discovery pipeline reads a handful of relations (follows, blocks,
//! mutes, posts, hashtags, users, stories) but never writes. Everything it
//! needs is expressed as the domain-shaped reads on [`DiscoveryStore`], so
//! the core stays independent of the backing store.
//!
//! Two implementations ship with the crate:
//! - [`PostgresStore`] - the production backend (sqlx)
//! - [`MemoryStore`] - an in-memory double for tests and local development

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A user row as the discovery payload needs it
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

/// One (author, hashtag) co-occurrence read by the interest stage
#[derive(Debug, Clone)]
pub struct HashtagUse {
    pub author: Uuid,
    pub hashtag: String,
}

/// Follow-edge growth for one user inside the trending window
#[derive(Debug, Clone)]
pub struct FollowGrowth {
    pub user_id: Uuid,
    pub recent_follows: i64,
}

/// Read interface the discovery pipeline runs against.
///
/// All methods are plain reads; implementations must not mutate state.
/// Errors are propagated here and swallowed at the stage boundary by the
/// orchestrator.
#[async_trait::async_trait]
pub trait DiscoveryStore: Send + Sync {
    /// Users the given user follows
    async fn following_of(&self, user: Uuid) -> Result<Vec<Uuid>>;

    /// Users that block the given user or are blocked by them.
    /// Blocking is directed; both directions are included here.
    async fn blocked_either_way(&self, user: Uuid) -> Result<Vec<Uuid>>;

    /// Users the given user has muted
    async fn muted_by(&self, user: Uuid) -> Result<Vec<Uuid>>;

    /// Users followed by any of `sources`, excluding `exclude`, up to `limit`.
    /// Order is implementation-defined but must be stable for equal inputs.
    async fn second_degree_follows(
        &self,
        sources: &[Uuid],
        exclude: &[Uuid],
        limit: i64,
    ) -> Result<Vec<Uuid>>;

    /// Distinct hashtag names on the user's `post_limit` most recent posts
    /// (ordered by last modification, newest first)
    async fn recent_hashtags_of(&self, user: Uuid, post_limit: i64) -> Result<Vec<String>>;

    /// Distinct (author, hashtag) pairs for posts tagged with any of `names`,
    /// excluding authors in `exclude`
    async fn authors_using_hashtags(
        &self,
        names: &[String],
        exclude: &[Uuid],
    ) -> Result<Vec<HashtagUse>>;

    /// Per-followee count of follow edges created at or after `since`
    async fn recent_follow_counts(&self, since: DateTime<Utc>) -> Result<Vec<FollowGrowth>>;

    /// Authoritative total follower count (not windowed)
    async fn follower_count(&self, user: Uuid) -> Result<i64>;

    /// Total following count, used for profile hydration
    async fn following_count(&self, user: Uuid) -> Result<i64>;

    /// Authors of the most recent posts modified at or after `since`,
    /// newest first, scanning at most `limit` posts. May contain duplicates.
    async fn recent_post_authors(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<Uuid>>;

    /// Profile row for a user, if it exists
    async fn profile(&self, user: Uuid) -> Result<Option<ProfileRow>>;

    /// Whether `follower` follows `followee`
    async fn is_following(&self, follower: Uuid, followee: Uuid) -> Result<bool>;

    /// Whether `muter` has muted `muted`
    async fn is_muted(&self, muter: Uuid, muted: Uuid) -> Result<bool>;

    /// Whether the user has a story that has not expired
    async fn has_active_story(&self, user: Uuid) -> Result<bool>;

    /// Usernames of users the viewer follows who also follow `candidate`,
    /// up to `limit`
    async fn common_followers(
        &self,
        viewer: Uuid,
        candidate: Uuid,
        limit: i64,
    ) -> Result<Vec<String>>;
}
