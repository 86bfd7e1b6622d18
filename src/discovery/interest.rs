//! Interest stage
//!
//! Suggests users whose recent posts share hashtags with the viewer's
//! recent posts. A candidate's score is the number of distinct hashtags
//! they have in common with the viewer (co-occurrence count, not post
//! volume). Ties keep first-seen order, so results are deterministic for
//! a fixed store state.

use crate::config::DiscoveryConfig;
use crate::discovery::candidate::{CandidateScore, Signal};
use crate::discovery::exclusion::ExclusionSet;
use crate::error::Result;
use crate::store::DiscoveryStore;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

pub const STAGE: &str = "interest";

/// Find up to `interest_limit` users who recently used the viewer's
/// hashtags, scored by shared-hashtag count.
pub async fn find(
    store: &dyn DiscoveryStore,
    config: &DiscoveryConfig,
    viewer: Uuid,
    exclusions: &ExclusionSet,
) -> Result<Vec<CandidateScore>> {
    let hashtags = store
        .recent_hashtags_of(viewer, config.interest_post_window)
        .await?;
    if hashtags.is_empty() {
        return Ok(Vec::new());
    }

    let uses = store
        .authors_using_hashtags(&hashtags, &exclusions.to_vec())
        .await?;

    // Count distinct shared hashtags per author, preserving first-seen order
    let mut order: Vec<Uuid> = Vec::new();
    let mut shared: HashMap<Uuid, HashSet<String>> = HashMap::new();
    for usage in uses {
        if exclusions.contains(usage.author) {
            continue;
        }
        shared
            .entry(usage.author)
            .or_insert_with(|| {
                order.push(usage.author);
                HashSet::new()
            })
            .insert(usage.hashtag);
    }

    let mut scored: Vec<CandidateScore> = order
        .into_iter()
        .map(|author| {
            let count = shared.get(&author).map(|s| s.len()).unwrap_or(0);
            CandidateScore::new(author, Signal::Interest, count as f64)
        })
        .collect();

    // Stable sort keeps first-seen order for equal scores
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(config.interest_limit);

    Ok(scored)
}
