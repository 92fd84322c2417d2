//! Score-based proxy selection strategy

use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use tracing::debug;

use super::{ProxySelector, SelectionStrategy};
use crate::error::Result;
use crate::proxy::health::HealthTracker;

/// Concurrent counter reads while scoring a snapshot
const SCORE_CONCURRENCY: usize = 16;

/// Selects the identity with the highest `success / (success + failure + 0.1)`.
///
/// Ties go to the identity seen first in the snapshot.
pub struct SmartSelector {
    health: Arc<HealthTracker>,
}

impl SmartSelector {
    pub fn new(health: Arc<HealthTracker>) -> Self {
        Self { health }
    }
}

#[async_trait]
impl ProxySelector for SmartSelector {
    async fn select(&self, snapshot: &[String]) -> Result<Option<String>> {
        let health = self.health.clone();

        // `buffered` keeps snapshot order, which the tie-break relies on
        let scores: Vec<f64> = futures::stream::iter(snapshot.to_vec())
            .map(move |identity| {
                let health = health.clone();
                async move { health.score(&identity).await }
            })
            .buffered(SCORE_CONCURRENCY)
            .try_collect()
            .await?;

        let mut best: Option<(usize, f64)> = None;
        for (idx, score) in scores.into_iter().enumerate() {
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((idx, score)),
            }
        }

        Ok(best.map(|(idx, score)| {
            debug!(identity = %snapshot[idx], score, "Smart selection");
            snapshot[idx].clone()
        }))
    }

    fn strategy(&self) -> SelectionStrategy {
        SelectionStrategy::Smart
    }
}
