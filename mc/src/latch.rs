//! Per-target completion latches
//!
//! Downstream workflows seed one counter per target cluster and count it down as each
//! document backfill finishes. This module computes the initial counts and provides the
//! store interface plus an in-memory store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::model::ParameterizedConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LatchError {
    #[error("No latch for target '{0}'")]
    UnknownTarget(String),

    #[error("Latch for target '{0}' is already drained")]
    Drained(String),
}

/// Number of document backfills per target cluster
///
/// Every target named by a binding gets an entry, zero when it has no backfill work.
pub fn target_latches(configs: &[ParameterizedConfig]) -> BTreeMap<String, u64> {
    let mut latches = BTreeMap::new();
    for config in configs {
        let backfills = config
            .snapshot_extract_and_load_configs
            .iter()
            .flatten()
            .flat_map(|entry| &entry.migrations)
            .filter(|migration| migration.document_backfill_config.is_some())
            .count() as u64;
        *latches.entry(config.target_config.name.clone()).or_insert(0) += backfills;
    }
    debug!(?latches, "target_latches: computed");
    latches
}

/// Coordination store holding the latches
#[async_trait]
pub trait LatchStore: Send + Sync {
    /// Replace all latches
    async fn seed(&self, latches: BTreeMap<String, u64>);

    /// Count a target down by one and return the remaining count
    async fn decrement(&self, target: &str) -> Result<u64, LatchError>;

    async fn value(&self, target: &str) -> Option<u64>;
}

/// In-process latch store
#[derive(Debug, Default)]
pub struct MemoryLatchStore {
    latches: Mutex<BTreeMap<String, u64>>,
}

impl MemoryLatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current counts
    pub async fn snapshot(&self) -> BTreeMap<String, u64> {
        self.latches.lock().await.clone()
    }
}

#[async_trait]
impl LatchStore for MemoryLatchStore {
    async fn seed(&self, latches: BTreeMap<String, u64>) {
        debug!(targets = latches.len(), "MemoryLatchStore::seed: called");
        *self.latches.lock().await = latches;
    }

    async fn decrement(&self, target: &str) -> Result<u64, LatchError> {
        let mut latches = self.latches.lock().await;
        let count = latches
            .get_mut(target)
            .ok_or_else(|| LatchError::UnknownTarget(target.to_string()))?;
        if *count == 0 {
            return Err(LatchError::Drained(target.to_string()));
        }
        *count -= 1;
        debug!(%target, remaining = *count, "MemoryLatchStore::decrement: done");
        Ok(*count)
    }

    async fn value(&self, target: &str) -> Option<u64> {
        self.latches.lock().await.get(target).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_counts_down() {
        let store = MemoryLatchStore::new();
        store
            .seed(BTreeMap::from([("t1".to_string(), 2), ("t2".to_string(), 0)]))
            .await;

        assert_eq!(store.decrement("t1").await, Ok(1));
        assert_eq!(store.decrement("t1").await, Ok(0));
        assert_eq!(store.decrement("t1").await, Err(LatchError::Drained("t1".to_string())));
        assert_eq!(store.decrement("t2").await, Err(LatchError::Drained("t2".to_string())));
        assert_eq!(
            store.decrement("t9").await,
            Err(LatchError::UnknownTarget("t9".to_string()))
        );
        assert_eq!(store.value("t1").await, Some(0));
        assert_eq!(store.value("t9").await, None);
    }

    #[tokio::test]
    async fn test_seed_replaces_previous_latches() {
        let store = MemoryLatchStore::new();
        store.seed(BTreeMap::from([("old".to_string(), 3)])).await;
        store.seed(BTreeMap::from([("new".to_string(), 1)])).await;
        assert_eq!(store.snapshot().await, BTreeMap::from([("new".to_string(), 1)]));
    }

    #[test]
    fn test_no_bindings_no_latches() {
        assert!(target_latches(&[]).is_empty());
    }
}
