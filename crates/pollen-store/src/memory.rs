//! In-process backend.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::KeyValue;
use crate::error::Result;

/// Key/value backend held in process memory.
///
/// Mirrors the behavior of the Redis backend closely enough for tests and
/// for running the service without a Redis server. Nothing survives a
/// restart.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: RwLock<HashMap<String, String>>,
    sets: RwLock<HashMap<String, HashSet<String>>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of plain values stored (sets excluded).
    #[cfg(test)]
    pub(crate) async fn value_count(&self) -> usize {
        self.values.read().await.len()
    }
}

#[async_trait]
impl KeyValue for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        let values = self.values.read().await;
        Ok(keys.iter().map(|k| values.get(k).cloned()).collect())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn add_member(&self, set: &str, member: &str) -> Result<()> {
        self.sets
            .write()
            .await
            .entry(set.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn members(&self, set: &str) -> Result<Vec<String>> {
        Ok(self
            .sets
            .read()
            .await
            .get(set)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn member_count(&self, set: &str) -> Result<usize> {
        Ok(self.sets.read().await.get(set).map_or(0, HashSet::len))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
