//! Sequential (round-robin) proxy selection strategy

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{ProxySelector, SelectionStrategy};
use crate::error::Result;

/// Selects identities in snapshot order, one step per call.
///
/// The cursor is taken modulo the size of the snapshot it is applied to, so
/// growing or shrinking the catalog between calls reindexes the rotation. It
/// lives in process memory only and restarts at 0.
#[derive(Debug, Default)]
pub struct SequentialSelector {
    cursor: AtomicUsize,
}

impl SequentialSelector {
    pub fn new() -> Self {
        Self {
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ProxySelector for SequentialSelector {
    async fn select(&self, snapshot: &[String]) -> Result<Option<String>> {
        let len = snapshot.len();
        if len == 0 {
            return Ok(None);
        }

        // Read and advance in one atomic step; returns the previous cursor
        let previous = self
            .cursor
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| {
                Some((c % len + 1) % len)
            })
            .unwrap_or_else(|c| c);

        Ok(snapshot.get(previous % len).cloned())
    }

    fn strategy(&self) -> SelectionStrategy {
        SelectionStrategy::Sequential
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_sequential_empty_leaves_cursor() {
        let selector = SequentialSelector::new();
        selector.select(&snapshot(&["a", "b", "c"])).await.unwrap();
        assert_eq!(selector.cursor(), 1);

        assert_eq!(selector.select(&[]).await.unwrap(), None);
        assert_eq!(selector.cursor(), 1);
    }

    #[tokio::test]
    async fn test_sequential_cycle() {
        let selector = SequentialSelector::new();
        let proxies = snapshot(&["a", "b", "c"]);

        let mut picked = Vec::new();
        for _ in 0..6 {
            picked.push(selector.select(&proxies).await.unwrap().unwrap());
        }

        assert_eq!(picked, vec!["a", "b", "c", "a", "b", "c"]);
        assert_eq!(selector.cursor(), 0);
    }

    #[tokio::test]
    async fn test_sequential_reindexes_on_shrink() {
        let selector = SequentialSelector::new();
        let large = snapshot(&["a", "b", "c", "d"]);

        selector.select(&large).await.unwrap();
        selector.select(&large).await.unwrap();
        selector.select(&large).await.unwrap();
        assert_eq!(selector.cursor(), 3);

        // cursor 3 over a snapshot of 2 lands on index 1
        let small = snapshot(&["a", "b"]);
        assert_eq!(selector.select(&small).await.unwrap().as_deref(), Some("b"));
        assert_eq!(selector.cursor(), 0);
        assert_eq!(selector.select(&small).await.unwrap().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_sequential_concurrent_callers_split_the_cycle() {
        let selector = std::sync::Arc::new(SequentialSelector::new());
        let proxies = std::sync::Arc::new(snapshot(&["a", "b", "c", "d"]));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let selector = selector.clone();
                let proxies = proxies.clone();
                tokio::spawn(async move { selector.select(&proxies).await.unwrap().unwrap() })
            })
            .collect();

        let mut picked = Vec::new();
        for handle in handles {
            picked.push(handle.await.unwrap());
        }
        picked.sort();

        assert_eq!(picked, vec!["a", "b", "c", "d"]);
    }
}
