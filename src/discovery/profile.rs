//! Profile hydration
//!
//! Turns the final candidate ids into the payload the HTTP layer serves:
//! profile fields plus follow counts, relationship flags, story presence,
//! and (when available) the usernames of the viewer's follows who also
//! follow the candidate.

use crate::config::DiscoveryConfig;
use crate::error::Result;
use crate::store::DiscoveryStore;
use serde::Serialize;
use uuid::Uuid;

/// Hydrated suggestion payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedProfile {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub followers: i64,
    pub following: i64,
    pub is_following: bool,
    pub is_muted: bool,
    pub has_story: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followed_by: Option<Vec<String>>,
}

/// Hydrate one candidate. Returns `None` when the user row no longer
/// exists (the candidate is silently dropped).
pub async fn hydrate(
    store: &dyn DiscoveryStore,
    config: &DiscoveryConfig,
    viewer: Uuid,
    user: Uuid,
) -> Result<Option<SuggestedProfile>> {
    let row = match store.profile(user).await? {
        Some(row) => row,
        None => return Ok(None),
    };

    let followers = store.follower_count(user).await?;
    let following = store.following_count(user).await?;
    let is_following = store.is_following(viewer, user).await?;
    let is_muted = store.is_muted(viewer, user).await?;
    let has_story = store.has_active_story(user).await?;

    let followed_by = store
        .common_followers(viewer, user, config.followed_by_limit as i64)
        .await?;
    let followed_by = if followed_by.is_empty() {
        None
    } else {
        Some(followed_by)
    };

    Ok(Some(SuggestedProfile {
        id: row.id,
        username: row.username,
        display_name: row.display_name,
        avatar: row.avatar,
        bio: row.bio,
        followers,
        following,
        is_following,
        is_muted,
        has_story,
        followed_by,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_hydrates_counts_and_flags() {
        let store = MemoryStore::new();
        let viewer = store.add_user("viewer");
        let mutual = store.add_user("mutual");
        let candidate = store.add_user("candidate");

        store.follow(viewer, mutual);
        store.follow(mutual, candidate);
        store.follow(candidate, mutual);
        store.add_story(candidate);

        let config = DiscoveryConfig::default();
        let profile = hydrate(&store, &config, viewer, candidate)
            .await
            .unwrap()
            .expect("candidate exists");

        assert_eq!(profile.username, "candidate");
        assert_eq!(profile.followers, 1);
        assert_eq!(profile.following, 1);
        assert!(!profile.is_following);
        assert!(!profile.is_muted);
        assert!(profile.has_story);
        assert_eq!(profile.followed_by, Some(vec!["mutual".to_string()]));
    }

    #[tokio::test]
    async fn test_missing_user_row_is_none() {
        let store = MemoryStore::new();
        let viewer = store.add_user("viewer");
        let ghost = Uuid::new_v4();

        let config = DiscoveryConfig::default();
        let profile = hydrate(&store, &config, viewer, ghost).await.unwrap();
        assert!(profile.is_none());
    }

    #[tokio::test]
    async fn test_followed_by_omitted_when_empty() {
        let store = MemoryStore::new();
        let viewer = store.add_user("viewer");
        let candidate = store.add_user("candidate");

        let config = DiscoveryConfig::default();
        let profile = hydrate(&store, &config, viewer, candidate)
            .await
            .unwrap()
            .unwrap();
        assert!(profile.followed_by.is_none());
        assert!(!profile.has_story);
    }
}
