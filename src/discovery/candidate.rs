//! Candidate records produced by the signal stages
//!
//! These are transient: they live for one discovery request and are never
//! persisted.

use serde::Serialize;
use uuid::Uuid;

/// Which stage produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Mutual,
    Interest,
    Trending,
    Active,
}

impl Signal {
    /// Stage identifier used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Mutual => "mutual",
            Signal::Interest => "interest",
            Signal::Trending => "trending",
            Signal::Active => "active",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored discovery candidate.
///
/// `score` is only meaningful within a signal: interest counts shared
/// hashtags, trending carries the growth-weighted score, and the mutual
/// and active stages assign no score (0.0).
#[derive(Debug, Clone, Serialize)]
pub struct CandidateScore {
    pub user_id: Uuid,
    pub signal: Signal,
    pub score: f64,
}

impl CandidateScore {
    pub fn new(user_id: Uuid, signal: Signal, score: f64) -> Self {
        Self {
            user_id,
            signal,
            score,
        }
    }

    /// Candidate from a stage that defines no score
    pub fn unscored(user_id: Uuid, signal: Signal) -> Self {
        Self::new(user_id, signal, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_stage_names() {
        assert_eq!(Signal::Mutual.as_str(), "mutual");
        assert_eq!(Signal::Interest.as_str(), "interest");
        assert_eq!(Signal::Trending.as_str(), "trending");
        assert_eq!(Signal::Active.as_str(), "active");
    }
}
