//! Success/failure tracking for catalog proxies
//!
//! Counters are incremented with the store's single-key atomic increment.
//! The eviction check that follows a failure increment is a separate step, so
//! concurrent failure reports may both evict the same identity; the second
//! removal is a no-op.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::catalog::ProxyCatalog;
use crate::error::{PoolError, Result};
use crate::models::ProxyStats;
use crate::store::{entry_key, ProxyStore};

const SUCCESS_FIELD: &str = "success";
const FAILURE_FIELD: &str = "failure";

/// Result of recording one failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Counter incremented, proxy stays in the catalog
    Recorded { failures: u64 },
    /// Counter reached the threshold and the proxy was removed
    Evicted { failures: u64 },
    /// No counter entry exists, usually because a concurrent report already
    /// evicted the identity
    Untracked,
}

impl FailureOutcome {
    pub fn evicted(&self) -> bool {
        matches!(self, FailureOutcome::Evicted { .. })
    }

    /// Failure count after the increment, if the identity was tracked
    pub fn failures(&self) -> Option<u64> {
        match self {
            FailureOutcome::Recorded { failures } | FailureOutcome::Evicted { failures } => {
                Some(*failures)
            }
            FailureOutcome::Untracked => None,
        }
    }
}

/// Records request outcomes and applies the failure-threshold eviction rule
pub struct HealthTracker {
    store: Arc<dyn ProxyStore>,
    catalog: ProxyCatalog,
    failure_threshold: u64,
}

impl HealthTracker {
    pub fn new(store: Arc<dyn ProxyStore>, catalog: ProxyCatalog, failure_threshold: u64) -> Self {
        Self {
            store,
            catalog,
            failure_threshold,
        }
    }

    pub fn failure_threshold(&self) -> u64 {
        self.failure_threshold
    }

    /// Increment the success counter, returning the new value.
    ///
    /// Fails with `UnknownProxy` when the identity has no counter entry.
    pub async fn record_success(&self, identity: &str) -> Result<u64> {
        match self
            .store
            .incr_field(&entry_key(identity), SUCCESS_FIELD, 1)
            .await?
        {
            Some(successes) => Ok(successes.max(0) as u64),
            None => Err(PoolError::UnknownProxy {
                identity: identity.to_string(),
            }),
        }
    }

    /// Increment the failure counter and evict the proxy once it reaches the threshold
    #[instrument(skip(self))]
    pub async fn record_failure(&self, identity: &str) -> Result<FailureOutcome> {
        let Some(failures) = self
            .store
            .incr_field(&entry_key(identity), FAILURE_FIELD, 1)
            .await?
        else {
            if self.catalog.drop_orphan(identity).await? {
                warn!(identity = %identity, "Unlisted proxy with no counter entry");
            } else {
                warn!(identity = %identity, "Failure reported for untracked proxy");
            }
            return Ok(FailureOutcome::Untracked);
        };

        let failures = failures.max(0) as u64;
        if failures < self.failure_threshold {
            return Ok(FailureOutcome::Recorded { failures });
        }

        self.catalog.remove(identity).await?;
        info!(identity = %identity, failures, "Evicted proxy after repeated failures");

        Ok(FailureOutcome::Evicted { failures })
    }

    /// Raw counters; missing fields read as 0
    pub async fn stats(&self, identity: &str) -> Result<ProxyStats> {
        let key = entry_key(identity);
        let fields = self.store.get_fields(&key).await?;

        Ok(ProxyStats {
            success: parse_counter(&key, &fields, SUCCESS_FIELD)?,
            failure: parse_counter(&key, &fields, FAILURE_FIELD)?,
        })
    }

    /// `success / (success + failure + 0.1)`
    pub async fn score(&self, identity: &str) -> Result<f64> {
        Ok(self.stats(identity).await?.score())
    }

    /// Whether the failure count has reached the threshold
    pub async fn is_bad(&self, identity: &str) -> Result<bool> {
        Ok(self.stats(identity).await?.is_bad(self.failure_threshold))
    }
}

fn parse_counter(key: &str, fields: &HashMap<String, String>, field: &str) -> Result<u64> {
    match fields.get(field) {
        None => Ok(0),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| PoolError::InvalidCounter {
                key: key.to_string(),
                field: field.to_string(),
                value: raw.clone(),
            }),
    }
}
