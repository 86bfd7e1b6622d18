//! Discovery Engine
//!
//! Orchestrates the signal stages into ranked suggestion lists. Stages run
//! sequentially in priority order with early termination once the target
//! count is reached; each stage's output is folded into the working
//! exclusion set so later stages cannot re-select the same users.
//!
//! Every stage call is failure-isolated: a store error or a timeout is
//! logged with its stage identifier and contributes nothing. The engine
//! never returns an error to its callers; total upstream failure yields an
//! empty list.

use crate::config::DiscoveryConfig;
use crate::discovery::candidate::CandidateScore;
use crate::discovery::exclusion::{build_exclusions, ExclusionSet};
use crate::discovery::profile::{self, SuggestedProfile};
use crate::discovery::{active, interest, mutual, trending};
use crate::error::Result;
use crate::store::DiscoveryStore;
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Main discovery engine
#[derive(Clone)]
pub struct DiscoveryEngine {
    store: Arc<dyn DiscoveryStore>,
    config: DiscoveryConfig,
}

impl DiscoveryEngine {
    pub fn new(store: Arc<dyn DiscoveryStore>, config: DiscoveryConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Up to `suggestion_target` suggested users for the viewer.
    ///
    /// Result order carries no ranking meaning: the accumulator is
    /// uniformly shuffled before truncation.
    pub async fn user_suggestions(&self, viewer: Uuid) -> Vec<SuggestedProfile> {
        let mut rng = StdRng::from_entropy();
        self.user_suggestions_with_rng(viewer, &mut rng).await
    }

    /// Deterministic variant used by tests: same pipeline, caller-supplied
    /// randomness.
    pub async fn user_suggestions_with_rng(
        &self,
        viewer: Uuid,
        rng: &mut StdRng,
    ) -> Vec<SuggestedProfile> {
        let store = self.store.as_ref();
        let target = self.config.suggestion_target;

        let mut exclusions = build_exclusions(store, viewer).await;
        let mut accum: Vec<CandidateScore> = Vec::with_capacity(target);

        let found = self
            .run_stage(
                mutual::STAGE,
                mutual::find(store, &self.config, viewer, &exclusions),
            )
            .await;
        absorb(&mut accum, &mut exclusions, found);

        if accum.len() < target {
            let found = self
                .run_stage(
                    interest::STAGE,
                    interest::find(store, &self.config, viewer, &exclusions),
                )
                .await;
            absorb(&mut accum, &mut exclusions, found);
        }

        if accum.len() < target {
            let found = self
                .run_stage(
                    trending::STAGE,
                    trending::find(
                        store,
                        &self.config,
                        &exclusions,
                        self.config.trending_fetch_limit,
                    ),
                )
                .await;
            absorb(&mut accum, &mut exclusions, found);
        }

        if accum.len() < target {
            let found = self
                .run_stage(
                    active::STAGE,
                    active::sample(store, &self.config, &exclusions, rng),
                )
                .await;
            absorb(&mut accum, &mut exclusions, found);
        }

        accum.shuffle(rng);
        accum.truncate(target);

        self.hydrate_all(viewer, &accum).await
    }

    /// Up to `popular_target` trending profiles for the viewer's popular
    /// page. Trending is the only signal here; the viewer's exclusion set
    /// still applies.
    pub async fn popular_profiles(&self, viewer: Uuid) -> Vec<SuggestedProfile> {
        let mut rng = StdRng::from_entropy();
        self.popular_profiles_with_rng(viewer, &mut rng).await
    }

    /// Deterministic variant used by tests.
    pub async fn popular_profiles_with_rng(
        &self,
        viewer: Uuid,
        rng: &mut StdRng,
    ) -> Vec<SuggestedProfile> {
        let store = self.store.as_ref();
        let target = self.config.popular_target;

        let mut exclusions = build_exclusions(store, viewer).await;
        let mut accum: Vec<CandidateScore> = Vec::with_capacity(target);

        let found = self
            .run_stage(
                trending::STAGE,
                trending::find(store, &self.config, &exclusions, target),
            )
            .await;
        absorb(&mut accum, &mut exclusions, found);

        accum.shuffle(rng);
        accum.truncate(target);

        self.hydrate_all(viewer, &accum).await
    }

    /// Run one stage under the configured timeout, collapsing any failure
    /// to an empty contribution.
    async fn run_stage<F>(&self, stage: &'static str, fut: F) -> Vec<CandidateScore>
    where
        F: Future<Output = Result<Vec<CandidateScore>>>,
    {
        match tokio::time::timeout(self.config.stage_timeout, fut).await {
            Ok(Ok(found)) => {
                debug!(stage, count = found.len(), "discovery stage completed");
                found
            }
            Ok(Err(e)) => {
                warn!(stage, error = %e, "discovery stage failed, contributing nothing");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    stage,
                    timeout_ms = self.config.stage_timeout.as_millis() as u64,
                    "discovery stage timed out, contributing nothing"
                );
                Vec::new()
            }
        }
    }

    /// Hydrate the final candidates concurrently (fan-out bounded by the
    /// accumulator size). A candidate whose hydration fails is dropped.
    async fn hydrate_all(
        &self,
        viewer: Uuid,
        candidates: &[CandidateScore],
    ) -> Vec<SuggestedProfile> {
        let store = self.store.as_ref();
        let results = join_all(
            candidates
                .iter()
                .map(|c| profile::hydrate(store, &self.config, viewer, c.user_id)),
        )
        .await;

        let mut out = Vec::with_capacity(candidates.len());
        for (candidate, result) in candidates.iter().zip(results) {
            match result {
                Ok(Some(p)) => out.push(p),
                Ok(None) => {
                    debug!(user_id = %candidate.user_id, "candidate has no profile row, dropping")
                }
                Err(e) => {
                    warn!(
                        stage = "hydrate",
                        user_id = %candidate.user_id,
                        error = %e,
                        "hydration failed, dropping candidate"
                    )
                }
            }
        }
        out
    }
}

/// Fold a stage's output into the accumulator, extending the working
/// exclusion set so later stages cannot re-select the same users.
fn absorb(
    accum: &mut Vec<CandidateScore>,
    exclusions: &mut ExclusionSet,
    found: Vec<CandidateScore>,
) {
    for candidate in found {
        if exclusions.insert(candidate.user_id) {
            accum.push(candidate);
        }
    }
}
