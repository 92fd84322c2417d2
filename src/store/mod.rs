//! Backing store adapters
//!
//! The pool keeps its membership list and per-proxy counters in a shared
//! key-value store. Only single-key operations are atomic; multi-step
//! sequences built on top of them are not.

mod memory;
mod migrations;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::Result;

/// List holding every catalog identity in insertion order
pub const PROXY_LIST_KEY: &str = "proxy_list";

/// Prefix of the per-identity counter entry keys
pub const ENTRY_KEY_PREFIX: &str = "proxy:";

/// Counter entry key for an identity
pub fn entry_key(identity: &str) -> String {
    format!("{}{}", ENTRY_KEY_PREFIX, identity)
}

/// Key-value store contract consumed by the pool
#[async_trait]
pub trait ProxyStore: Send + Sync {
    /// Connectivity check
    async fn ping(&self) -> Result<()>;

    /// Whether a hash key exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Create a hash with the given fields unless the key already exists.
    ///
    /// Returns `false` and writes nothing when the key is present.
    async fn create_fields(&self, key: &str, fields: &[(&str, &str)]) -> Result<bool>;

    /// Atomically add `delta` to an integer field.
    ///
    /// Returns `None` without creating anything when the key does not exist.
    /// A missing field on an existing key starts from 0.
    async fn incr_field(&self, key: &str, field: &str, delta: i64) -> Result<Option<i64>>;

    /// All fields of a hash; empty when the key does not exist
    async fn get_fields(&self, key: &str) -> Result<HashMap<String, String>>;

    /// Delete a hash key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Append a value to the end of a list
    async fn list_append(&self, list_key: &str, value: &str) -> Result<()>;

    /// Remove every occurrence of a value from a list
    async fn list_remove(&self, list_key: &str, value: &str) -> Result<u64>;

    /// Full list contents in order
    async fn list_range(&self, list_key: &str) -> Result<Vec<String>>;

    /// List length
    async fn list_len(&self, list_key: &str) -> Result<u64>;

    /// Delete a list and every hash whose key starts with `key_prefix`,
    /// as one step from the point of view of readers.
    async fn purge(&self, list_key: &str, key_prefix: &str) -> Result<()>;
}

/// Open the configured store backend
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn ProxyStore>> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Postgres => {
            let store = PgStore::connect(config).await?;
            store.run_migrations().await?;
            Ok(Arc::new(store))
        }
    }
}
