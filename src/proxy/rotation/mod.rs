//! Proxy selection strategies
//!
//! Each strategy picks one identity from a catalog snapshot taken by the
//! caller. The snapshot may be stale by the time the identity is used.

mod random;
mod sequential;
mod smart;

pub use random::RandomSelector;
pub use sequential::SequentialSelector;
pub use smart::SmartSelector;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::health::HealthTracker;
use crate::error::Result;

/// Strategy types for proxy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStrategy {
    Random,
    #[default]
    Smart,
    Sequential,
}

impl SelectionStrategy {
    /// Parse a strategy name. Unrecognized names select `Smart`.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "random" => Self::Random,
            "sequential" | "round_robin" | "roundrobin" | "round-robin" => Self::Sequential,
            _ => Self::Smart,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Smart => "smart",
            Self::Sequential => "sequential",
        }
    }
}

impl std::fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for proxy selection strategies
#[async_trait]
pub trait ProxySelector: Send + Sync {
    /// Pick one identity from the snapshot, `None` when it is empty
    async fn select(&self, snapshot: &[String]) -> Result<Option<String>>;

    /// Get the strategy implemented by this selector
    fn strategy(&self) -> SelectionStrategy;
}

/// Holds one selector per strategy and dispatches between them.
///
/// The only state is the sequential cursor, local to this engine.
pub struct SelectionEngine {
    random: RandomSelector,
    smart: SmartSelector,
    sequential: SequentialSelector,
}

impl SelectionEngine {
    pub fn new(health: Arc<HealthTracker>) -> Self {
        Self {
            random: RandomSelector::new(),
            smart: SmartSelector::new(health),
            sequential: SequentialSelector::new(),
        }
    }

    fn selector(&self, strategy: SelectionStrategy) -> &dyn ProxySelector {
        match strategy {
            SelectionStrategy::Random => &self.random,
            SelectionStrategy::Smart => &self.smart,
            SelectionStrategy::Sequential => &self.sequential,
        }
    }

    /// Select with the given strategy
    pub async fn select(
        &self,
        strategy: SelectionStrategy,
        snapshot: &[String],
    ) -> Result<Option<String>> {
        self.selector(strategy).select(snapshot).await
    }

    /// Current sequential cursor
    pub fn cursor(&self) -> usize {
        self.sequential.cursor()
    }
}
