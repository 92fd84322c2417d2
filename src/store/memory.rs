//! In-process store backend

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::ProxyStore;
use crate::error::{PoolError, Result};

#[derive(Debug, Default)]
struct MemoryState {
    hashes: HashMap<String, HashMap<String, String>>,
    lists: HashMap<String, Vec<String>>,
}

/// Store backed by process memory
///
/// Every operation runs under a single lock acquisition, so each one is
/// atomic on its own, `purge` included.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProxyStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.state.read().hashes.contains_key(key))
    }

    async fn create_fields(&self, key: &str, fields: &[(&str, &str)]) -> Result<bool> {
        let mut state = self.state.write();
        if state.hashes.contains_key(key) {
            return Ok(false);
        }

        let hash = fields
            .iter()
            .map(|(field, value)| (field.to_string(), value.to_string()))
            .collect();
        state.hashes.insert(key.to_string(), hash);
        Ok(true)
    }

    async fn incr_field(&self, key: &str, field: &str, delta: i64) -> Result<Option<i64>> {
        let mut state = self.state.write();
        let Some(hash) = state.hashes.get_mut(key) else {
            return Ok(None);
        };

        let current = match hash.get(field) {
            Some(raw) => raw.parse::<i64>().map_err(|_| PoolError::InvalidCounter {
                key: key.to_string(),
                field: field.to_string(),
                value: raw.clone(),
            })?,
            None => 0,
        };

        let updated = current + delta;
        hash.insert(field.to_string(), updated.to_string());
        Ok(Some(updated))
    }

    async fn get_fields(&self, key: &str) -> Result<HashMap<String, String>> {
        Ok(self
            .state
            .read()
            .hashes
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.state.write().hashes.remove(key).is_some())
    }

    async fn list_append(&self, list_key: &str, value: &str) -> Result<()> {
        self.state
            .write()
            .lists
            .entry(list_key.to_string())
            .or_default()
            .push(value.to_string());
        Ok(())
    }

    async fn list_remove(&self, list_key: &str, value: &str) -> Result<u64> {
        let mut state = self.state.write();
        let Some(list) = state.lists.get_mut(list_key) else {
            return Ok(0);
        };

        let before = list.len();
        list.retain(|v| v != value);
        Ok((before - list.len()) as u64)
    }

    async fn list_range(&self, list_key: &str) -> Result<Vec<String>> {
        Ok(self
            .state
            .read()
            .lists
            .get(list_key)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_len(&self, list_key: &str) -> Result<u64> {
        Ok(self
            .state
            .read()
            .lists
            .get(list_key)
            .map(|l| l.len() as u64)
            .unwrap_or(0))
    }

    async fn purge(&self, list_key: &str, key_prefix: &str) -> Result<()> {
        let mut state = self.state.write();
        state.lists.remove(list_key);
        state.hashes.retain(|key, _| !key.starts_with(key_prefix));
        Ok(())
    }
}
