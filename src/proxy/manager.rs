//! Pool manager: provisioning, selection and outcome reporting over one store

use std::sync::Arc;

use futures::{StreamExt, TryStreamExt};
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use super::catalog::ProxyCatalog;
use super::format::format_proxy;
use super::health::{FailureOutcome, HealthTracker};
use super::rotation::{SelectionEngine, SelectionStrategy};
use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::models::{PoolStats, ProxyEndpoints};
use crate::provider::ProxyProvider;
use crate::store::ProxyStore;

/// Concurrent counter reads while building a stats report
const STATS_CONCURRENCY: usize = 16;

/// Composes the catalog, health tracker and selection engine.
///
/// Holds no lock across store or provider calls. Concurrent `initialize` or
/// `refresh` calls may both fetch; the idempotent insert absorbs duplicates.
pub struct ProxyManager {
    config: PoolConfig,
    catalog: ProxyCatalog,
    health: Arc<HealthTracker>,
    engine: SelectionEngine,
    provider: Arc<dyn ProxyProvider>,
    strategy: RwLock<SelectionStrategy>,
}

impl ProxyManager {
    pub fn new(
        store: Arc<dyn ProxyStore>,
        provider: Arc<dyn ProxyProvider>,
        config: PoolConfig,
    ) -> Result<Self> {
        config.validate()?;

        let catalog = ProxyCatalog::new(store.clone());
        let health = Arc::new(HealthTracker::new(
            store,
            catalog.clone(),
            config.failure_threshold,
        ));
        let engine = SelectionEngine::new(health.clone());

        Ok(Self {
            strategy: RwLock::new(config.strategy),
            config,
            catalog,
            health,
            engine,
            provider,
        })
    }

    /// Build a manager after checking the store is reachable
    pub async fn connect(
        store: Arc<dyn ProxyStore>,
        provider: Arc<dyn ProxyProvider>,
        config: PoolConfig,
    ) -> Result<Self> {
        store
            .ping()
            .await
            .map_err(|e| PoolError::StoreUnavailable(e.to_string()))?;

        let manager = Self::new(store, provider, config)?;
        let size = manager.catalog.size().await?;
        if size == 0 {
            info!("Proxy pool is empty; call initialize to provision proxies");
        } else {
            info!(proxies = size, "Connected to existing proxy pool");
        }

        Ok(manager)
    }

    pub fn catalog(&self) -> &ProxyCatalog {
        &self.catalog
    }

    pub fn health(&self) -> &HealthTracker {
        &self.health
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn strategy(&self) -> SelectionStrategy {
        *self.strategy.read()
    }

    /// Switch the strategy used by subsequent selections
    pub fn set_strategy(&self, strategy: SelectionStrategy) {
        let previous = std::mem::replace(&mut *self.strategy.write(), strategy);
        if previous != strategy {
            info!(from = %previous, to = %strategy, "Selection strategy changed");
        }
    }

    /// Provision proxies when the catalog is empty; returns how many were inserted
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<usize> {
        if self.catalog.size().await? > 0 {
            debug!("Proxy pool already populated, skipping provisioning");
            return Ok(0);
        }
        self.load_proxies().await
    }

    /// Drop every proxy and counter, then provision a fresh set.
    ///
    /// Selections between the clear and the reload see an empty pool.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<usize> {
        self.catalog.clear().await?;
        info!("Cleared proxy pool");
        self.load_proxies().await
    }

    async fn load_proxies(&self) -> Result<usize> {
        let fetched = tokio::time::timeout(self.config.provisioning_timeout, self.provider.fetch())
            .await
            .map_err(|_| {
                PoolError::ProvisioningFailure(format!(
                    "{} provider timed out after {}s",
                    self.provider.name(),
                    self.config.provisioning_timeout.as_secs()
                ))
            })??;

        let offered = fetched.len();
        let mut inserted = 0usize;
        for proxy in fetched
            .into_iter()
            .filter(|p| p.valid)
            .take(self.config.pool_size)
        {
            if self.catalog.add(&proxy.identity()).await? {
                inserted += 1;
            }
        }

        info!(
            provider = self.provider.name(),
            offered,
            inserted,
            "Loaded proxies into pool"
        );
        Ok(inserted)
    }

    /// Register one identity by hand; `false` when it is already present
    pub async fn add_proxy(&self, identity: &str) -> Result<bool> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(PoolError::InvalidProxyFormat(
                "proxy identity is empty".to_string(),
            ));
        }
        self.catalog.add(identity).await
    }

    /// Select one proxy with the current strategy; `None` when the pool is empty
    pub async fn get_proxy(&self) -> Result<Option<ProxyEndpoints>> {
        let strategy = self.strategy();
        let snapshot = self.catalog.list_all().await?;

        match self.engine.select(strategy, &snapshot).await? {
            Some(identity) => {
                debug!(identity = %identity, strategy = %strategy, "Selected proxy");
                format_proxy(&identity).map(Some)
            }
            None => {
                debug!(strategy = %strategy, "No proxies available");
                Ok(None)
            }
        }
    }

    pub async fn report_success(&self, identity: &str) -> Result<u64> {
        self.health.record_success(identity).await
    }

    /// Record a failure; reaching the threshold evicts the proxy
    pub async fn report_failure(&self, identity: &str) -> Result<FailureOutcome> {
        let outcome = self.health.record_failure(identity).await?;
        if outcome.evicted() {
            let remaining = self.catalog.size().await?;
            if remaining == 0 {
                warn!("Proxy pool exhausted by evictions");
            }
        }
        Ok(outcome)
    }

    /// Aggregate report over the current catalog
    pub async fn stats(&self) -> Result<PoolStats> {
        let snapshot = self.catalog.list_all().await?;
        let health = self.health.clone();

        let entries: Vec<_> = futures::stream::iter(snapshot)
            .map(move |identity| {
                let health = health.clone();
                async move {
                    let stats = health.stats(&identity).await?;
                    Ok::<_, PoolError>((identity, stats))
                }
            })
            .buffered(STATS_CONCURRENCY)
            .try_collect()
            .await?;

        Ok(PoolStats::collect(
            entries,
            self.config.failure_threshold,
            self.strategy().as_str(),
        ))
    }
}
