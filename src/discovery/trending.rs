//! Trending stage
//!
//! Scores users by follower momentum: total follower count anchors
//! absolute popularity, and log-scaled recent growth rewards momentum
//! without letting short viral spikes fully dominate established
//! accounts. Used both as a suggestion fallback and for the standalone
//! popular-profiles feature.

use crate::config::DiscoveryConfig;
use crate::discovery::candidate::{CandidateScore, Signal};
use crate::discovery::exclusion::ExclusionSet;
use crate::error::Result;
use crate::store::DiscoveryStore;
use chrono::{Duration, Utc};

pub const STAGE: &str = "trending";

/// Trending score for one user.
///
/// `total_followers * ln(recent_growth + 1)`. The `+ 1` keeps the log
/// defined when a user gained no followers in the window.
pub fn trending_score(total_followers: i64, recent_growth: i64) -> f64 {
    total_followers as f64 * ((recent_growth as f64) + 1.0).ln()
}

/// Find up to `limit` trending users not in `exclusions`, scored over the
/// configured growth window. Returns nothing when no follow edges exist
/// in the window.
pub async fn find(
    store: &dyn DiscoveryStore,
    config: &DiscoveryConfig,
    exclusions: &ExclusionSet,
    limit: usize,
) -> Result<Vec<CandidateScore>> {
    let window = Duration::from_std(config.trending_window)
        .unwrap_or_else(|_| Duration::days(7));
    let since = Utc::now() - window;

    let growth = store.recent_follow_counts(since).await?;
    if growth.is_empty() {
        return Ok(Vec::new());
    }

    let mut scored: Vec<CandidateScore> = Vec::with_capacity(growth.len());
    for entry in growth {
        if exclusions.contains(entry.user_id) {
            continue;
        }
        let total = store.follower_count(entry.user_id).await?;
        scored.push(CandidateScore::new(
            entry.user_id,
            Signal::Trending,
            trending_score(total, entry.recent_follows),
        ));
    }

    // Stable sort keeps store order for equal scores
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(limit);

    Ok(scored)
}
