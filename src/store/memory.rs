//! In-memory discovery store
//!
//! A vector-backed [`DiscoveryStore`] used by the test suite and for local
//! development without a database. It mirrors the Postgres backend's
//! ordering semantics, counts calls per method, and can be told to fail
//! individual methods to exercise the pipeline's degrade paths.
//!
//! This is a test double, not a persistence layer; the production path is
//! [`super::PostgresStore`].

use super::{DiscoveryStore, FollowGrowth, HashtagUse, ProfileRow};
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct FollowEdge {
    follower: Uuid,
    following: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Post {
    id: Uuid,
    author: Uuid,
    last_modified: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    users: Vec<ProfileRow>,
    follows: Vec<FollowEdge>,
    blocks: Vec<(Uuid, Uuid)>,
    mutes: Vec<(Uuid, Uuid)>,
    posts: Vec<Post>,
    post_tags: Vec<(Uuid, String)>,
    stories: Vec<(Uuid, DateTime<Utc>)>,
}

/// In-memory store with call counting and fault injection
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: Mutex<HashSet<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Fixture builders
    // ------------------------------------------------------------------

    /// Add a user and return its id
    pub fn add_user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().users.push(ProfileRow {
            id,
            username: username.to_string(),
            display_name: Some(username.to_string()),
            avatar: None,
            bio: None,
        });
        id
    }

    /// Record a follow edge created now
    pub fn follow(&self, follower: Uuid, following: Uuid) {
        self.follow_at(follower, following, Utc::now());
    }

    /// Record a follow edge with an explicit creation time
    pub fn follow_at(&self, follower: Uuid, following: Uuid, created_at: DateTime<Utc>) {
        self.state.lock().unwrap().follows.push(FollowEdge {
            follower,
            following,
            created_at,
        });
    }

    pub fn block(&self, blocker: Uuid, blocked: Uuid) {
        self.state.lock().unwrap().blocks.push((blocker, blocked));
    }

    pub fn mute(&self, muter: Uuid, muted: Uuid) {
        self.state.lock().unwrap().mutes.push((muter, muted));
    }

    /// Add a post with the given hashtags, returning the post id
    pub fn add_post(&self, author: Uuid, last_modified: DateTime<Utc>, tags: &[&str]) -> Uuid {
        let id = Uuid::new_v4();
        let mut state = self.state.lock().unwrap();
        state.posts.push(Post {
            id,
            author,
            last_modified,
        });
        for tag in tags {
            state.post_tags.push((id, tag.to_string()));
        }
        id
    }

    /// Give the user a story expiring 24h from now
    pub fn add_story(&self, user: Uuid) {
        self.state
            .lock()
            .unwrap()
            .stories
            .push((user, Utc::now() + Duration::hours(24)));
    }

    // ------------------------------------------------------------------
    // Instrumentation
    // ------------------------------------------------------------------

    /// Make the named trait method fail on every call
    pub fn fail_method(&self, method: &'static str) {
        self.failing.lock().unwrap().insert(method);
    }

    /// Number of times the named trait method has been called
    pub fn call_count(&self, method: &'static str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    fn record(&self, method: &'static str) -> Result<()> {
        *self.calls.lock().unwrap().entry(method).or_insert(0) += 1;
        if self.failing.lock().unwrap().contains(method) {
            return Err(Error::database(format!("injected failure in {}", method)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DiscoveryStore for MemoryStore {
    async fn following_of(&self, user: Uuid) -> Result<Vec<Uuid>> {
        self.record("following_of")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .follows
            .iter()
            .filter(|e| e.follower == user)
            .map(|e| e.following)
            .collect())
    }

    async fn blocked_either_way(&self, user: Uuid) -> Result<Vec<Uuid>> {
        self.record("blocked_either_way")?;
        let state = self.state.lock().unwrap();
        let mut out = Vec::new();
        for (blocker, blocked) in &state.blocks {
            if *blocker == user {
                out.push(*blocked);
            } else if *blocked == user {
                out.push(*blocker);
            }
        }
        Ok(out)
    }

    async fn muted_by(&self, user: Uuid) -> Result<Vec<Uuid>> {
        self.record("muted_by")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .mutes
            .iter()
            .filter(|(muter, _)| *muter == user)
            .map(|(_, muted)| *muted)
            .collect())
    }

    async fn second_degree_follows(
        &self,
        sources: &[Uuid],
        exclude: &[Uuid],
        limit: i64,
    ) -> Result<Vec<Uuid>> {
        self.record("second_degree_follows")?;
        let state = self.state.lock().unwrap();
        let sources: HashSet<Uuid> = sources.iter().copied().collect();
        let excluded: HashSet<Uuid> = exclude.iter().copied().collect();

        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for edge in &state.follows {
            if sources.contains(&edge.follower) && !excluded.contains(&edge.following) {
                *counts.entry(edge.following).or_insert(0) += 1;
            }
        }

        // Shared-follower count desc, then id, like the Postgres backend
        let mut ranked: Vec<(Uuid, i64)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(ranked
            .into_iter()
            .take(limit as usize)
            .map(|(id, _)| id)
            .collect())
    }

    async fn recent_hashtags_of(&self, user: Uuid, post_limit: i64) -> Result<Vec<String>> {
        self.record("recent_hashtags_of")?;
        let state = self.state.lock().unwrap();

        let mut posts: Vec<&Post> = state.posts.iter().filter(|p| p.author == user).collect();
        posts.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        let recent: HashSet<Uuid> = posts
            .into_iter()
            .take(post_limit as usize)
            .map(|p| p.id)
            .collect();

        let names: BTreeSet<String> = state
            .post_tags
            .iter()
            .filter(|(post_id, _)| recent.contains(post_id))
            .map(|(_, name)| name.clone())
            .collect();
        Ok(names.into_iter().collect())
    }

    async fn authors_using_hashtags(
        &self,
        names: &[String],
        exclude: &[Uuid],
    ) -> Result<Vec<HashtagUse>> {
        self.record("authors_using_hashtags")?;
        let state = self.state.lock().unwrap();
        let wanted: HashSet<&String> = names.iter().collect();
        let excluded: HashSet<Uuid> = exclude.iter().copied().collect();
        let authors: HashMap<Uuid, Uuid> =
            state.posts.iter().map(|p| (p.id, p.author)).collect();

        let mut pairs: BTreeSet<(Uuid, String)> = BTreeSet::new();
        for (post_id, name) in &state.post_tags {
            if !wanted.contains(name) {
                continue;
            }
            if let Some(author) = authors.get(post_id) {
                if !excluded.contains(author) {
                    pairs.insert((*author, name.clone()));
                }
            }
        }

        Ok(pairs
            .into_iter()
            .map(|(author, hashtag)| HashtagUse { author, hashtag })
            .collect())
    }

    async fn recent_follow_counts(&self, since: DateTime<Utc>) -> Result<Vec<FollowGrowth>> {
        self.record("recent_follow_counts")?;
        let state = self.state.lock().unwrap();

        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for edge in &state.follows {
            if edge.created_at >= since {
                *counts.entry(edge.following).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(Uuid, i64)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(ranked
            .into_iter()
            .map(|(user_id, recent_follows)| FollowGrowth {
                user_id,
                recent_follows,
            })
            .collect())
    }

    async fn follower_count(&self, user: Uuid) -> Result<i64> {
        self.record("follower_count")?;
        let state = self.state.lock().unwrap();
        Ok(state.follows.iter().filter(|e| e.following == user).count() as i64)
    }

    async fn following_count(&self, user: Uuid) -> Result<i64> {
        self.record("following_count")?;
        let state = self.state.lock().unwrap();
        Ok(state.follows.iter().filter(|e| e.follower == user).count() as i64)
    }

    async fn recent_post_authors(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<Uuid>> {
        self.record("recent_post_authors")?;
        let state = self.state.lock().unwrap();

        let mut posts: Vec<&Post> = state
            .posts
            .iter()
            .filter(|p| p.last_modified >= since)
            .collect();
        posts.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(posts
            .into_iter()
            .take(limit as usize)
            .map(|p| p.author)
            .collect())
    }

    async fn profile(&self, user: Uuid) -> Result<Option<ProfileRow>> {
        self.record("profile")?;
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.id == user).cloned())
    }

    async fn is_following(&self, follower: Uuid, followee: Uuid) -> Result<bool> {
        self.record("is_following")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .follows
            .iter()
            .any(|e| e.follower == follower && e.following == followee))
    }

    async fn is_muted(&self, muter: Uuid, muted: Uuid) -> Result<bool> {
        self.record("is_muted")?;
        let state = self.state.lock().unwrap();
        Ok(state.mutes.iter().any(|m| *m == (muter, muted)))
    }

    async fn has_active_story(&self, user: Uuid) -> Result<bool> {
        self.record("has_active_story")?;
        let now = Utc::now();
        let state = self.state.lock().unwrap();
        Ok(state
            .stories
            .iter()
            .any(|(u, expires_at)| *u == user && *expires_at > now))
    }

    async fn common_followers(
        &self,
        viewer: Uuid,
        candidate: Uuid,
        limit: i64,
    ) -> Result<Vec<String>> {
        self.record("common_followers")?;
        let state = self.state.lock().unwrap();

        let viewer_follows: Vec<Uuid> = state
            .follows
            .iter()
            .filter(|e| e.follower == viewer)
            .map(|e| e.following)
            .collect();

        let mut names: Vec<String> = viewer_follows
            .into_iter()
            .filter(|mid| {
                state
                    .follows
                    .iter()
                    .any(|e| e.follower == *mid && e.following == candidate)
            })
            .filter_map(|mid| {
                state
                    .users
                    .iter()
                    .find(|u| u.id == mid)
                    .map(|u| u.username.clone())
            })
            .collect();
        names.sort();
        names.truncate(limit as usize);
        Ok(names)
    }
}
