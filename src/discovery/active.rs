//! Active-user fallback stage
//!
//! Last resort when the stronger signals cannot fill the target: sample
//! authors who posted (or edited a post) recently. Authors are
//! deduplicated, excluded, uniformly shuffled with Fisher-Yates, and
//! capped at two.

use crate::config::DiscoveryConfig;
use crate::discovery::candidate::{CandidateScore, Signal};
use crate::discovery::exclusion::ExclusionSet;
use crate::error::Result;
use crate::store::DiscoveryStore;
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use uuid::Uuid;

pub const STAGE: &str = "active";

/// Sample up to `active_limit` recently-active users not in `exclusions`.
pub async fn sample(
    store: &dyn DiscoveryStore,
    config: &DiscoveryConfig,
    exclusions: &ExclusionSet,
    rng: &mut StdRng,
) -> Result<Vec<CandidateScore>> {
    let window = Duration::from_std(config.active_window)
        .unwrap_or_else(|_| Duration::days(3));
    let since = Utc::now() - window;

    let authors = store
        .recent_post_authors(since, config.active_scan_limit)
        .await?;

    let mut seen = HashSet::new();
    let mut pool: Vec<Uuid> = authors
        .into_iter()
        .filter(|id| !exclusions.contains(*id) && seen.insert(*id))
        .collect();

    pool.shuffle(rng);
    Ok(pool
        .into_iter()
        .take(config.active_limit)
        .map(|id| CandidateScore::unscored(id, Signal::Active))
        .collect())
}
