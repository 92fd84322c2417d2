//! Pool replenishment service
//!
//! Periodically provisions a new batch when the pool has emptied, for example
//! after every proxy was evicted by failure reports.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, instrument};

use crate::proxy::ProxyManager;

/// Pool replenishment service
pub struct PoolReplenishService {
    manager: Arc<ProxyManager>,
    check_interval: Duration,
}

impl PoolReplenishService {
    pub fn new(manager: Arc<ProxyManager>, check_interval: Duration) -> Self {
        Self {
            manager,
            check_interval,
        }
    }

    /// Run until the shutdown channel fires
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Starting pool replenish service (interval: {}s)",
            self.check_interval.as_secs()
        );

        let mut ticker = interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // Skip immediate tick

        loop {
            tokio::select! {
                _ = ticker.tick() => self.replenish().await,
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Pool replenish service shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One replenish pass; errors are logged and retried on the next tick
    pub async fn replenish(&self) {
        match self.manager.initialize().await {
            Ok(0) => {}
            Ok(loaded) => info!(loaded, "Replenished empty proxy pool"),
            Err(e) => error!("Pool replenish failed: {}", e),
        }
    }
}

/// Handle for stopping the replenish service
pub struct PoolReplenishHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl PoolReplenishHandle {
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { shutdown_tx: tx }, rx)
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Default for PoolReplenishHandle {
    fn default() -> Self {
        Self::new().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::proxy::manager::tests::{provisioned, FakeProvider};
    use crate::store::MemoryStore;

    fn manager(provider: Arc<FakeProvider>) -> Arc<ProxyManager> {
        Arc::new(
            ProxyManager::new(Arc::new(MemoryStore::new()), provider, PoolConfig::default())
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_replenish_refills_only_empty_pool() {
        let provider = Arc::new(FakeProvider::new(vec![provisioned("10.0.0.1", true)]));
        let manager = manager(provider.clone());
        let service = PoolReplenishService::new(manager.clone(), Duration::from_secs(60));

        service.replenish().await;
        assert_eq!(manager.catalog().size().await.unwrap(), 1);

        service.replenish().await;
        assert_eq!(provider.calls(), 1);

        for _ in 0..3 {
            manager
                .report_failure("user:pass@10.0.0.1:8080")
                .await
                .unwrap();
        }
        assert_eq!(manager.catalog().size().await.unwrap(), 0);

        service.replenish().await;
        assert_eq!(manager.catalog().size().await.unwrap(), 1);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_replenish_swallows_provider_errors() {
        let provider = Arc::new(FakeProvider::failing());
        let service = PoolReplenishService::new(manager(provider.clone()), Duration::from_secs(60));

        service.replenish().await;
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let provider = Arc::new(FakeProvider::new(vec![provisioned("10.0.0.1", true)]));
        let manager = manager(provider);
        let service = PoolReplenishService::new(manager.clone(), Duration::from_millis(10));
        let (handle, rx) = PoolReplenishHandle::new();

        let task = tokio::spawn(async move { service.run(rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("service did not stop")
            .unwrap();
        assert_eq!(manager.catalog().size().await.unwrap(), 1);
    }
}
