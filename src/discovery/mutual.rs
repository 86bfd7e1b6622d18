//! Mutual-connection stage
//!
//! Suggests users followed by people the viewer follows. This is the
//! strongest signal and always runs first.
//!
//! Ordering: we take the store's first N, and both backends rank
//! second-degree candidates by shared-follower count (then id) so the
//! cut is deterministic.

use crate::config::DiscoveryConfig;
use crate::discovery::candidate::{CandidateScore, Signal};
use crate::discovery::exclusion::ExclusionSet;
use crate::error::Result;
use crate::store::DiscoveryStore;
use uuid::Uuid;

pub const STAGE: &str = "mutual";

/// Find up to `mutual_limit` users followed by the viewer's follows,
/// excluding anyone in `exclusions`.
pub async fn find(
    store: &dyn DiscoveryStore,
    config: &DiscoveryConfig,
    viewer: Uuid,
    exclusions: &ExclusionSet,
) -> Result<Vec<CandidateScore>> {
    let following = store.following_of(viewer).await?;
    if following.is_empty() {
        return Ok(Vec::new());
    }

    let candidates = store
        .second_degree_follows(&following, &exclusions.to_vec(), config.mutual_limit as i64)
        .await?;

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(config.mutual_limit);
    for id in candidates {
        if exclusions.contains(id) || !seen.insert(id) {
            continue;
        }
        out.push(CandidateScore::unscored(id, Signal::Mutual));
        if out.len() == config.mutual_limit {
            break;
        }
    }

    Ok(out)
}
