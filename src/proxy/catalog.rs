//! Proxy catalog: the ordered membership list plus one counter entry per identity

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::store::{entry_key, ProxyStore, ENTRY_KEY_PREFIX, PROXY_LIST_KEY};

/// Counter fields created for every new entry
const INITIAL_COUNTERS: &[(&str, &str)] = &[("success", "0"), ("failure", "0")];

/// Typed view over the membership list and counter entries.
///
/// An identity is listed if and only if its counter entry exists; `add` and
/// `remove` touch both.
#[derive(Clone)]
pub struct ProxyCatalog {
    store: Arc<dyn ProxyStore>,
}

impl ProxyCatalog {
    pub fn new(store: Arc<dyn ProxyStore>) -> Self {
        Self { store }
    }

    /// Snapshot of every identity in catalog order
    pub async fn list_all(&self) -> Result<Vec<String>> {
        self.store.list_range(PROXY_LIST_KEY).await
    }

    /// Insert an identity with zeroed counters.
    ///
    /// Returns `false` without touching anything when it is already present.
    pub async fn add(&self, identity: &str) -> Result<bool> {
        let created = self
            .store
            .create_fields(&entry_key(identity), INITIAL_COUNTERS)
            .await?;

        if !created {
            return Ok(false);
        }

        self.store.list_append(PROXY_LIST_KEY, identity).await?;

        // A clear or eviction between the two writes leaves a bare listing
        if !self.contains(identity).await? {
            self.store.list_remove(PROXY_LIST_KEY, identity).await?;
            debug!(identity = %identity, "Proxy removed while being added");
            return Ok(false);
        }

        debug!(identity = %identity, "Added proxy to catalog");
        Ok(true)
    }

    /// Drop an identity and its counters; absent identities are a no-op.
    pub async fn remove(&self, identity: &str) -> Result<bool> {
        let deleted = self.store.delete(&entry_key(identity)).await?;
        let unlisted = self.store.list_remove(PROXY_LIST_KEY, identity).await?;
        Ok(deleted || unlisted > 0)
    }

    /// Unlist an identity that has no counter entry.
    ///
    /// Returns whether a listing was dropped; a tracked identity is left alone.
    pub async fn drop_orphan(&self, identity: &str) -> Result<bool> {
        if self.contains(identity).await? {
            return Ok(false);
        }
        Ok(self.store.list_remove(PROXY_LIST_KEY, identity).await? > 0)
    }

    /// Whether an identity has a counter entry
    pub async fn contains(&self, identity: &str) -> Result<bool> {
        self.store.exists(&entry_key(identity)).await
    }

    /// Number of listed identities
    pub async fn size(&self) -> Result<usize> {
        Ok(self.store.list_len(PROXY_LIST_KEY).await? as usize)
    }

    /// Remove every identity and counter entry in one store step
    pub async fn clear(&self) -> Result<()> {
        self.store.purge(PROXY_LIST_KEY, ENTRY_KEY_PREFIX).await
    }
}
