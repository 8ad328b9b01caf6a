//! Storage abstraction for snapshot history.
//!
//! The [`SnapshotStore`] trait defines the primitive operations a history
//! backend must provide (SQLite, in-memory, anything else). The retention
//! policy and "most recent eligible snapshot" lookup are built on top of
//! these primitives in [`history`], so every backend gets identical
//! semantics.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod history;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::snapshot::Snapshot;

/// Lightweight per-snapshot metadata for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub date: NaiveDate,
    pub captured_at_ms: i64,
    pub variant_count: usize,
    pub brands: Vec<String>,
    pub fingerprint: String,
}

impl SnapshotSummary {
    pub fn of(snapshot: &Snapshot) -> Self {
        SnapshotSummary {
            date: snapshot.date(),
            captured_at_ms: snapshot.captured_at().timestamp_millis(),
            variant_count: snapshot.variant_count(),
            brands: snapshot.brands().map(str::to_string).collect(),
            fingerprint: snapshot.fingerprint(),
        }
    }
}

/// Abstract history backend, keyed by snapshot date.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`dates`](SnapshotStore::dates) | All stored dates, ascending |
/// | [`get`](SnapshotStore::get) | Load one snapshot by date |
/// | [`upsert`](SnapshotStore::upsert) | Insert or replace the snapshot for its date |
/// | [`remove`](SnapshotStore::remove) | Delete one date |
/// | [`clear`](SnapshotStore::clear) | Delete everything |
/// | [`summaries`](SnapshotStore::summaries) | Metadata for listings |
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// All stored snapshot dates in ascending order.
    async fn dates(&self) -> Result<Vec<NaiveDate>>;

    /// Retrieve the snapshot stored for `date`.
    async fn get(&self, date: NaiveDate) -> Result<Option<Snapshot>>;

    /// Store `snapshot`, replacing any snapshot with the same date.
    async fn upsert(&self, snapshot: &Snapshot) -> Result<()>;

    /// Delete the snapshot for `date`. Missing dates are not an error.
    async fn remove(&self, date: NaiveDate) -> Result<()>;

    /// Delete all history.
    async fn clear(&self) -> Result<()>;

    /// Metadata for every stored snapshot, ascending by date.
    ///
    /// The default loads each snapshot; backends with cheaper access
    /// should override it.
    async fn summaries(&self) -> Result<Vec<SnapshotSummary>> {
        let mut out = Vec::new();
        for date in self.dates().await? {
            if let Some(snapshot) = self.get(date).await? {
                out.push(SnapshotSummary::of(&snapshot));
            }
        }
        Ok(out)
    }
}
