//! Tracker session: the explicit home of "previous" and "current".
//!
//! A [`TrackerSession`] owns a [`SnapshotStore`] handle, the retention cap,
//! and the two snapshot slots a comparison needs. Callers drive it step by
//! step (capture, resolve previous, save, compare, render), awaiting each
//! step before the next; nothing is shared process-wide.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

use crate::export::{export_rows, ExportOptions, ExportRow};
use crate::reconcile::{compare, Comparison};
use crate::report::{render_comparison, ReportOptions};
use crate::snapshot::{Products, Snapshot, SnapshotError};
use crate::store::history::{self, DEFAULT_RETENTION};
use crate::store::SnapshotStore;

/// Where the session's previous snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviousSource {
    /// Loaded from local history.
    History,
    /// Adopted from a portable snapshot document; never written to history.
    Imported,
}

/// Result of persisting the current snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved {
        date: NaiveDate,
        evicted: Vec<NaiveDate>,
    },
    /// The store rejected the write. The in-session snapshot is unaffected.
    Failed { reason: String },
    /// There is no current snapshot to save.
    NothingToSave,
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }
}

pub struct TrackerSession<S> {
    store: S,
    retention: usize,
    previous: Option<(Snapshot, PreviousSource)>,
    current: Option<Snapshot>,
}

impl<S: SnapshotStore> TrackerSession<S> {
    pub fn new(store: S) -> Self {
        Self::with_retention(store, DEFAULT_RETENTION)
    }

    pub fn with_retention(store: S, retention: usize) -> Self {
        TrackerSession {
            store,
            retention,
            previous: None,
            current: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&Snapshot> {
        self.previous.as_ref().map(|(s, _)| s)
    }

    pub fn previous_source(&self) -> Option<PreviousSource> {
        self.previous.as_ref().map(|(_, src)| *src)
    }

    /// Build and hold the current snapshot from loaded products.
    pub fn capture_current(&mut self, products: Products, now: DateTime<Utc>) -> &Snapshot {
        self.current.insert(Snapshot::capture(products, now))
    }

    /// Hold an already built snapshot as current.
    pub fn set_current(&mut self, snapshot: Snapshot) {
        self.current = Some(snapshot);
    }

    /// Make sure a previous snapshot is in place for a comparison on
    /// `today`.
    ///
    /// An imported snapshot always wins. Otherwise the most recent history
    /// entry dated differently from `today` is loaded.
    pub async fn resolve_previous(&mut self, today: NaiveDate) -> Result<Option<&Snapshot>> {
        if self.previous_source() != Some(PreviousSource::Imported) {
            self.previous = history::load_most_recent(&self.store, Some(today))
                .await?
                .map(|s| (s, PreviousSource::History));
        }
        Ok(self.previous())
    }

    /// Like [`resolve_previous`](Self::resolve_previous), but only history
    /// entries dated strictly before `date` qualify. Used when comparing a
    /// stored snapshot that may not be the latest.
    pub async fn resolve_previous_before(&mut self, date: NaiveDate) -> Result<Option<&Snapshot>> {
        if self.previous_source() != Some(PreviousSource::Imported) {
            self.previous = history::load_latest_before(&self.store, date)
                .await?
                .map(|s| (s, PreviousSource::History));
        }
        Ok(self.previous())
    }

    /// Adopt a portable snapshot document as the previous snapshot.
    ///
    /// History is not touched. On a validation error the session is left
    /// exactly as it was.
    pub fn import_external(&mut self, document: &str) -> Result<&Snapshot, SnapshotError> {
        let snapshot = Snapshot::from_json(document)?;
        tracing::info!(
            date = %snapshot.date(),
            variants = snapshot.variant_count(),
            "imported previous snapshot"
        );
        let (snapshot, _) = self.previous.insert((snapshot, PreviousSource::Imported));
        Ok(&*snapshot)
    }

    /// Serialize the current snapshot as a portable document.
    pub fn export_current(&self) -> Result<Option<String>> {
        match &self.current {
            Some(s) => Ok(Some(s.to_json_pretty()?)),
            None => Ok(None),
        }
    }

    /// Persist the current snapshot and apply retention.
    ///
    /// Storage errors are reported, not propagated.
    pub async fn save_current(&self) -> SaveOutcome {
        let current = match &self.current {
            Some(s) => s,
            None => return SaveOutcome::NothingToSave,
        };

        match history::save(&self.store, current, self.retention).await {
            Ok(evicted) => SaveOutcome::Saved {
                date: current.date(),
                evicted,
            },
            Err(e) => {
                tracing::warn!(date = %current.date(), error = %e, "failed to save snapshot");
                SaveOutcome::Failed {
                    reason: format!("{:#}", e),
                }
            }
        }
    }

    pub fn compare(&self) -> Comparison {
        compare(self.previous(), self.current())
    }

    pub fn render_report(&self, opts: &ReportOptions) -> String {
        render_comparison(&self.compare(), opts)
    }

    /// Merged export rows for the current snapshot, or `None` without one.
    pub fn export_rows(&self, opts: &ExportOptions) -> Option<Vec<ExportRow>> {
        let current = self.current.as_ref()?;
        let comparison = self.compare();
        Some(export_rows(current, comparison.reconciliation(), opts))
    }

    /// Drop the previous snapshot (imported or loaded).
    pub fn forget_previous(&mut self) {
        self.previous = None;
    }

    /// Wipe all stored history. Irreversible.
    ///
    /// A previous snapshot loaded from history is dropped too; an imported
    /// one stays.
    pub async fn clear_all(&mut self) -> Result<()> {
        self.store.clear().await?;
        if self.previous_source() == Some(PreviousSource::History) {
            self.previous = None;
        }
        tracing::info!("cleared snapshot history");
        Ok(())
    }
}
