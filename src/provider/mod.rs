//! Proxy provisioning
//!
//! A provider is asked for a batch of candidate proxies whenever the pool is
//! initialized or refreshed.

mod webshare;

pub use webshare::WebshareProvider;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ProvisionedProxy;

/// Source of fresh proxies for the pool
#[async_trait]
pub trait ProxyProvider: Send + Sync {
    /// Fetch every candidate proxy, valid or not
    async fn fetch(&self) -> Result<Vec<ProvisionedProxy>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
