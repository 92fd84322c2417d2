//! Random proxy selection strategy

use async_trait::async_trait;
use rand::seq::SliceRandom;

use super::{ProxySelector, SelectionStrategy};
use crate::error::Result;

/// Selects a uniformly random identity from the snapshot
#[derive(Debug, Default)]
pub struct RandomSelector;

impl RandomSelector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProxySelector for RandomSelector {
    async fn select(&self, snapshot: &[String]) -> Result<Option<String>> {
        let mut rng = rand::thread_rng();
        Ok(snapshot.choose(&mut rng).cloned())
    }

    fn strategy(&self) -> SelectionStrategy {
        SelectionStrategy::Random
    }
}
