//! Exclusion set construction
//!
//! Every discovery request starts by computing the set of users who must
//! never appear in its results: the viewer themself, everyone they already
//! follow, anyone blocked in either direction, and anyone they mute. The
//! orchestrator then grows the same set with each stage's output so later
//! stages cannot re-select earlier candidates.
//!
//! Building the set never fails. A store error during construction is
//! logged and the read's contribution skipped; the set always contains at
//! least the viewer.

use crate::store::DiscoveryStore;
use std::collections::HashSet;
use tracing::warn;
use uuid::Uuid;

/// Set of user ids excluded from discovery results for one request.
///
/// Scoped to a single discovery call; never cached across requests.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    members: HashSet<Uuid>,
}

impl ExclusionSet {
    /// Create a set containing only the viewer
    pub fn new(viewer: Uuid) -> Self {
        let mut members = HashSet::new();
        members.insert(viewer);
        Self { members }
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.members.contains(&id)
    }

    /// Insert an id, returning true if it was not already present
    pub fn insert(&mut self, id: Uuid) -> bool {
        self.members.insert(id)
    }

    pub fn extend_from(&mut self, ids: &[Uuid]) {
        self.members.extend(ids.iter().copied());
    }

    /// Members as a vector, for set-membership predicates in store queries
    pub fn to_vec(&self) -> Vec<Uuid> {
        self.members.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Build the exclusion set for a viewer: self + follows + blocks (either
/// direction) + mutes.
pub async fn build_exclusions(store: &dyn DiscoveryStore, viewer: Uuid) -> ExclusionSet {
    let mut set = ExclusionSet::new(viewer);

    match store.following_of(viewer).await {
        Ok(ids) => set.extend_from(&ids),
        Err(e) => warn!(stage = "exclusions", error = %e, "follow read failed, continuing with partial set"),
    }

    match store.blocked_either_way(viewer).await {
        Ok(ids) => set.extend_from(&ids),
        Err(e) => warn!(stage = "exclusions", error = %e, "block read failed, continuing with partial set"),
    }

    match store.muted_by(viewer).await {
        Ok(ids) => set.extend_from(&ids),
        Err(e) => warn!(stage = "exclusions", error = %e, "mute read failed, continuing with partial set"),
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_always_contains_viewer() {
        let store = MemoryStore::new();
        let viewer = store.add_user("viewer");

        let set = build_exclusions(&store, viewer).await;
        assert!(set.contains(viewer));
        assert_eq!(set.len(), 1);
    }

    #[tokio::test]
    async fn test_includes_follows_blocks_and_mutes() {
        let store = MemoryStore::new();
        let viewer = store.add_user("viewer");
        let followed = store.add_user("followed");
        let blocker = store.add_user("blocker");
        let blocked = store.add_user("blocked");
        let muted = store.add_user("muted");
        let stranger = store.add_user("stranger");

        store.follow(viewer, followed);
        store.block(blocker, viewer);
        store.block(viewer, blocked);
        store.mute(viewer, muted);

        let set = build_exclusions(&store, viewer).await;
        assert!(set.contains(viewer));
        assert!(set.contains(followed));
        assert!(set.contains(blocker));
        assert!(set.contains(blocked));
        assert!(set.contains(muted));
        assert!(!set.contains(stranger));
    }

    #[tokio::test]
    async fn test_degrades_to_viewer_on_store_failure() {
        let store = MemoryStore::new();
        let viewer = store.add_user("viewer");
        let followed = store.add_user("followed");
        store.follow(viewer, followed);

        store.fail_method("following_of");
        store.fail_method("blocked_either_way");
        store.fail_method("muted_by");

        let set = build_exclusions(&store, viewer).await;
        assert!(set.contains(viewer));
        assert_eq!(set.len(), 1);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_other_reads() {
        let store = MemoryStore::new();
        let viewer = store.add_user("viewer");
        let muted = store.add_user("muted");
        store.mute(viewer, muted);

        store.fail_method("following_of");

        let set = build_exclusions(&store, viewer).await;
        assert!(set.contains(viewer));
        assert!(set.contains(muted));
    }
}
