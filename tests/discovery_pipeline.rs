//! End-to-end tests for the discovery pipeline over the in-memory store.
//!
//! These cover the pipeline-level guarantees: exclusion, caps, stage
//! ordering with early termination, failure isolation, and shuffle
//! determinism under a fixed seed.

use chrono::Utc;
use orbit::config::DiscoveryConfig;
use orbit::discovery::DiscoveryEngine;
use orbit::store::MemoryStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use uuid::Uuid;

fn engine_with(store: &Arc<MemoryStore>, config: DiscoveryConfig) -> DiscoveryEngine {
    DiscoveryEngine::new(store.clone(), config)
}

fn engine(store: &Arc<MemoryStore>) -> DiscoveryEngine {
    engine_with(store, DiscoveryConfig::default())
}

async fn suggestion_ids(engine: &DiscoveryEngine, viewer: Uuid, seed: u64) -> Vec<Uuid> {
    let mut rng = StdRng::seed_from_u64(seed);
    engine
        .user_suggestions_with_rng(viewer, &mut rng)
        .await
        .into_iter()
        .map(|p| p.id)
        .collect()
}

#[tokio::test]
async fn viewer_is_never_suggested_to_themselves() {
    let store = Arc::new(MemoryStore::new());
    let viewer = store.add_user("viewer");
    let friend = store.add_user("friend");
    let candidate = store.add_user("candidate");

    store.follow(viewer, friend);
    store.follow(friend, candidate);
    // A cycle back to the viewer must not surface them
    store.follow(friend, viewer);
    store.add_post(viewer, Utc::now(), &["rust"]);

    let ids = suggestion_ids(&engine(&store), viewer, 1).await;
    assert!(!ids.contains(&viewer));
    assert!(ids.contains(&candidate));
}

#[tokio::test]
async fn followed_blocked_and_muted_users_are_excluded() {
    let store = Arc::new(MemoryStore::new());
    let viewer = store.add_user("viewer");
    let followed = store.add_user("followed");
    let blocked = store.add_user("blocked");
    let blocker = store.add_user("blocker");
    let muted = store.add_user("muted");
    let friend = store.add_user("friend");

    store.follow(viewer, followed);
    store.follow(viewer, friend);
    store.block(viewer, blocked);
    store.block(blocker, viewer);
    store.mute(viewer, muted);

    // Make every excluded user a strong candidate in several stages
    for bad in [followed, blocked, blocker, muted] {
        store.follow(friend, bad);
        store.add_post(bad, Utc::now(), &["rust"]);
        let fan = store.add_user(&format!("fan-of-{}", bad));
        store.follow(fan, bad);
    }
    store.add_post(viewer, Utc::now(), &["rust"]);

    let ids = suggestion_ids(&engine(&store), viewer, 2).await;
    for bad in [viewer, followed, blocked, blocker, muted] {
        assert!(!ids.contains(&bad), "{} should have been excluded", bad);
    }
}

#[tokio::test]
async fn suggestions_are_capped_at_the_target() {
    let store = Arc::new(MemoryStore::new());
    let viewer = store.add_user("viewer");
    let friend = store.add_user("friend");
    store.follow(viewer, friend);

    // Oversupply every stage
    let now = Utc::now();
    store.add_post(viewer, now, &["rust", "art"]);
    for i in 0..20 {
        let u = store.add_user(&format!("user{}", i));
        store.follow(friend, u);
        store.add_post(u, now, &["rust"]);
        let fan = store.add_user(&format!("fan{}", i));
        store.follow(fan, u);
    }

    let config = DiscoveryConfig::default();
    let target = config.suggestion_target;
    let ids = suggestion_ids(&engine_with(&store, config), viewer, 3).await;
    assert_eq!(ids.len(), target);

    // No duplicates across stages
    let unique: std::collections::HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
}

#[tokio::test]
async fn later_stages_are_skipped_once_the_target_is_reached() {
    let store = Arc::new(MemoryStore::new());
    let viewer = store.add_user("viewer");
    let friend = store.add_user("friend");
    store.follow(viewer, friend);
    for i in 0..8 {
        let u = store.add_user(&format!("mutual{}", i));
        store.follow(friend, u);
    }

    // Let the mutual stage alone satisfy the target
    let config = DiscoveryConfig {
        mutual_limit: 10,
        ..DiscoveryConfig::default()
    };
    let ids = suggestion_ids(&engine_with(&store, config), viewer, 4).await;
    assert_eq!(ids.len(), 5);

    assert_eq!(store.call_count("recent_hashtags_of"), 0);
    assert_eq!(store.call_count("recent_follow_counts"), 0);
    assert_eq!(store.call_count("recent_post_authors"), 0);
}

#[tokio::test]
async fn stages_run_in_priority_order_until_the_target_is_met() {
    let store = Arc::new(MemoryStore::new());
    let viewer = store.add_user("viewer");
    let friend = store.add_user("friend");
    store.follow(viewer, friend);
    // One mutual candidate only; the pipeline must keep going
    let mutual = store.add_user("mutual");
    store.follow(friend, mutual);

    let ids = suggestion_ids(&engine(&store), viewer, 5).await;
    assert!(ids.contains(&mutual));

    assert_eq!(store.call_count("second_degree_follows"), 1);
    assert_eq!(store.call_count("recent_hashtags_of"), 1);
    assert_eq!(store.call_count("recent_follow_counts"), 1);
    assert_eq!(store.call_count("recent_post_authors"), 1);
}

#[tokio::test]
async fn empty_graph_yields_empty_suggestions() {
    let store = Arc::new(MemoryStore::new());
    let viewer = store.add_user("viewer");

    let ids = suggestion_ids(&engine(&store), viewer, 6).await;
    assert!(ids.is_empty());
}

#[tokio::test]
async fn a_failed_stage_does_not_poison_the_rest() {
    let store = Arc::new(MemoryStore::new());
    let viewer = store.add_user("viewer");
    let friend = store.add_user("friend");
    let interest_match = store.add_user("interest_match");

    store.follow(viewer, friend);
    let now = Utc::now();
    store.add_post(viewer, now, &["rust"]);
    store.add_post(interest_match, now, &["rust"]);

    store.fail_method("second_degree_follows");

    let ids = suggestion_ids(&engine(&store), viewer, 7).await;
    assert!(ids.contains(&interest_match));
}

#[tokio::test]
async fn total_backend_failure_yields_empty_suggestions() {
    let store = Arc::new(MemoryStore::new());
    let viewer = store.add_user("viewer");
    let friend = store.add_user("friend");
    store.follow(viewer, friend);
    store.add_post(viewer, Utc::now(), &["rust"]);

    for method in [
        "following_of",
        "blocked_either_way",
        "muted_by",
        "second_degree_follows",
        "recent_hashtags_of",
        "recent_follow_counts",
        "recent_post_authors",
    ] {
        store.fail_method(method);
    }

    let ids = suggestion_ids(&engine(&store), viewer, 8).await;
    assert!(ids.is_empty());
}

#[tokio::test]
async fn same_seed_produces_the_same_ordering() {
    let store = Arc::new(MemoryStore::new());
    let viewer = store.add_user("viewer");
    let friend = store.add_user("friend");
    store.follow(viewer, friend);
    for i in 0..10 {
        let u = store.add_user(&format!("mutual{}", i));
        store.follow(friend, u);
    }

    let config = DiscoveryConfig {
        mutual_limit: 10,
        ..DiscoveryConfig::default()
    };
    let engine = engine_with(&store, config);

    let first = suggestion_ids(&engine, viewer, 42).await;
    let second = suggestion_ids(&engine, viewer, 42).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn hydration_failures_drop_the_candidate() {
    let store = Arc::new(MemoryStore::new());
    let viewer = store.add_user("viewer");
    let friend = store.add_user("friend");
    let candidate = store.add_user("candidate");
    store.follow(viewer, friend);
    store.follow(friend, candidate);

    store.fail_method("profile");

    let ids = suggestion_ids(&engine(&store), viewer, 9).await;
    assert!(ids.is_empty());
}

#[tokio::test]
async fn popular_profiles_are_capped_and_exclude_the_viewer_graph() {
    let store = Arc::new(MemoryStore::new());
    let viewer = store.add_user("viewer");
    let followed = store.add_user("followed");
    store.follow(viewer, followed);

    let now = Utc::now();
    // followed gains followers too, but must stay out of the results
    for i in 0..3 {
        let fan = store.add_user(&format!("ff{}", i));
        store.follow_at(fan, followed, now);
    }
    let mut trending = Vec::new();
    for i in 0..8 {
        let u = store.add_user(&format!("trending{}", i));
        for j in 0..(i + 2) {
            let fan = store.add_user(&format!("fan{}-{}", i, j));
            store.follow_at(fan, u, now);
        }
        trending.push(u);
    }

    let engine = engine(&store);
    let mut rng = StdRng::seed_from_u64(10);
    let items = engine.popular_profiles_with_rng(viewer, &mut rng).await;

    assert_eq!(items.len(), 4);
    let ids: Vec<Uuid> = items.iter().map(|p| p.id).collect();
    assert!(!ids.contains(&viewer));
    assert!(!ids.contains(&followed));
    assert!(ids.iter().all(|id| trending.contains(id)));
}

#[tokio::test]
async fn hydrated_payload_reports_mutual_follower_usernames() {
    let store = Arc::new(MemoryStore::new());
    let viewer = store.add_user("viewer");
    let alice = store.add_user("alice");
    let bob = store.add_user("bob");
    let candidate = store.add_user("candidate");

    store.follow(viewer, alice);
    store.follow(viewer, bob);
    store.follow(alice, candidate);
    store.follow(bob, candidate);

    let engine = engine(&store);
    let mut rng = StdRng::seed_from_u64(11);
    let items = engine.user_suggestions_with_rng(viewer, &mut rng).await;

    let suggested = items
        .iter()
        .find(|p| p.id == candidate)
        .expect("candidate should be suggested");
    assert_eq!(suggested.followers, 2);
    assert!(!suggested.is_following);
    let followed_by = suggested.followed_by.as_ref().expect("mutuals present");
    assert_eq!(followed_by, &vec!["alice".to_string(), "bob".to_string()]);
}
