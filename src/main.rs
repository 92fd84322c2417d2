//! Proxy pool server - Entry Point
//!
//! Connects the backing store, starts the admin API and the replenish service,
//! and shuts everything down on Ctrl+C or SIGTERM.

use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use proxypool::api::ApiServer;
use proxypool::config::{Config, LogConfig};
use proxypool::error::Result;
use proxypool::provider::WebshareProvider;
use proxypool::proxy::ProxyManager;
use proxypool::services::{PoolReplenishHandle, PoolReplenishService};
use proxypool::store;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log);

    info!("Starting proxy pool server");

    let store = match store::connect(&config.store).await {
        Ok(store) => store,
        Err(e) => {
            error!("Cannot reach proxy store: {}", e);
            return Err(e);
        }
    };
    info!(backend = ?config.store.backend, "Connected to proxy store");

    let provider = Arc::new(WebshareProvider::new(
        &config.provider,
        config.pool.provisioning_timeout,
    )?);
    if config.provider.api_key.is_none() {
        warn!("PROVIDER_API_KEY is not set; provisioning will fail until it is configured");
    }

    let manager = Arc::new(ProxyManager::connect(store, provider, config.pool.clone()).await?);
    info!("Using selection strategy: {}", manager.strategy());

    if let Err(e) = manager.initialize().await {
        warn!("Initial provisioning failed: {}", e);
    }

    let (shutdown_tx, _) = watch::channel(false);

    // Replenish service
    let (replenish_handle, replenish_shutdown) = PoolReplenishHandle::new();
    let replenish_task = config.pool.replenish_interval.map(|interval| {
        let service = PoolReplenishService::new(manager.clone(), interval);
        tokio::spawn(async move {
            service.run(replenish_shutdown).await;
        })
    });

    // API server
    let api_server = ApiServer::new(config.api.clone(), manager.clone());
    let api_shutdown = shutdown_tx.subscribe();
    let api_task = tokio::spawn(async move {
        if let Err(e) = api_server.run(api_shutdown).await {
            error!("API server error: {}", e);
        }
    });

    info!("API server started on {}", config.api_addr());

    shutdown_signal().await;
    info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    replenish_handle.shutdown();

    let _ = api_task.await;
    if let Some(task) = replenish_task {
        let _ = task.await;
    }

    info!("Proxy pool server stopped");
    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("proxypool={},tower_http=info", log.level).into());

    let json = log.format.eq_ignore_ascii_case("json");
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
