//! In-memory [`SnapshotStore`] implementation for tests and embedding.
//!
//! Uses a `BTreeMap` keyed by date behind `std::sync::RwLock`. Nothing
//! survives the process.

use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::snapshot::Snapshot;

use super::SnapshotStore;

/// In-memory snapshot history.
pub struct InMemoryStore {
    snapshots: RwLock<BTreeMap<NaiveDate, Snapshot>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> anyhow::Error {
    anyhow!("in-memory snapshot store lock poisoned")
}

#[async_trait]
impl SnapshotStore for InMemoryStore {
    async fn dates(&self) -> Result<Vec<NaiveDate>> {
        let snapshots = self.snapshots.read().map_err(|_| poisoned())?;
        Ok(snapshots.keys().copied().collect())
    }

    async fn get(&self, date: NaiveDate) -> Result<Option<Snapshot>> {
        let snapshots = self.snapshots.read().map_err(|_| poisoned())?;
        Ok(snapshots.get(&date).cloned())
    }

    async fn upsert(&self, snapshot: &Snapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().map_err(|_| poisoned())?;
        snapshots.insert(snapshot.date(), snapshot.clone());
        Ok(())
    }

    async fn remove(&self, date: NaiveDate) -> Result<()> {
        let mut snapshots = self.snapshots.write().map_err(|_| poisoned())?;
        snapshots.remove(&date);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut snapshots = self.snapshots.write().map_err(|_| poisoned())?;
        snapshots.clear();
        Ok(())
    }
}
