//! Retention and lookup policy over any [`SnapshotStore`].
//!
//! History holds at most `retention` snapshots, one per date. Saving
//! upserts by date and then evicts the oldest dates until the cap holds.
//! Evicted snapshots are gone for good.

use anyhow::{bail, Result};
use chrono::NaiveDate;

use crate::snapshot::Snapshot;

use super::SnapshotStore;

/// Default number of dated snapshots kept.
pub const DEFAULT_RETENTION: usize = 7;

/// The most recently dated snapshot whose date is not `excluding`.
///
/// Passing today's date keeps a same-day re-run from comparing the day
/// against itself.
pub async fn load_most_recent<S>(store: &S, excluding: Option<NaiveDate>) -> Result<Option<Snapshot>>
where
    S: SnapshotStore + ?Sized,
{
    let dates = store.dates().await?;
    let candidate = dates.into_iter().rev().find(|d| Some(*d) != excluding);
    match candidate {
        Some(date) => store.get(date).await,
        None => Ok(None),
    }
}

/// The most recent snapshot dated strictly before `date`.
pub async fn load_latest_before<S>(store: &S, date: NaiveDate) -> Result<Option<Snapshot>>
where
    S: SnapshotStore + ?Sized,
{
    let dates = store.dates().await?;
    match dates.into_iter().rev().find(|d| *d < date) {
        Some(found) => store.get(found).await,
        None => Ok(None),
    }
}

/// Upsert `snapshot`, then evict the oldest dates beyond `retention`.
///
/// Returns the evicted dates, oldest first. A snapshot that would be the
/// first one evicted (a backfill older than every retained date, with
/// history already full) is rejected and history is left untouched.
pub async fn save<S>(store: &S, snapshot: &Snapshot, retention: usize) -> Result<Vec<NaiveDate>>
where
    S: SnapshotStore + ?Sized,
{
    if retention == 0 {
        bail!("history retention must be at least 1");
    }

    let date = snapshot.date();
    let existing = store.dates().await?;
    if !existing.contains(&date) {
        let newer = existing.iter().filter(|d| **d > date).count();
        if newer >= retention {
            bail!(
                "snapshot {} is older than all {} retained snapshots and would be evicted immediately",
                date,
                retention
            );
        }
    }

    store.upsert(snapshot).await?;

    let dates = store.dates().await?;
    let excess = dates.len().saturating_sub(retention);
    let evicted: Vec<NaiveDate> = dates.into_iter().take(excess).collect();
    for date in &evicted {
        store.remove(*date).await?;
        tracing::info!(date = %date, "evicted snapshot beyond retention");
    }

    Ok(evicted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Products;
    use crate::store::memory::InMemoryStore;
    use chrono::{TimeZone, Utc};

    fn snap(day: u32) -> Snapshot {
        Snapshot::capture(
            Products::new(),
            Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap(),
        )
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[tokio::test]
    async fn test_eighth_save_evicts_oldest() {
        let store = InMemoryStore::new();
        for day in 1..=7 {
            let evicted = save(&store, &snap(day), DEFAULT_RETENTION).await.unwrap();
            assert!(evicted.is_empty());
        }
        let evicted = save(&store, &snap(8), DEFAULT_RETENTION).await.unwrap();
        assert_eq!(evicted, vec![date(1)]);

        let dates = store.dates().await.unwrap();
        assert_eq!(dates, (2..=8).map(date).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_eviction_is_by_date_not_insertion_order() {
        let store = InMemoryStore::new();
        for day in [10, 12, 11] {
            save(&store, &snap(day), 2).await.unwrap();
        }
        assert_eq!(store.dates().await.unwrap(), vec![date(11), date(12)]);
    }

    #[tokio::test]
    async fn test_same_date_overwrites() {
        let store = InMemoryStore::new();
        save(&store, &snap(5), 3).await.unwrap();
        save(&store, &snap(5), 3).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_load_most_recent_skips_excluded_day() {
        let store = InMemoryStore::new();
        assert!(load_most_recent(&store, None).await.unwrap().is_none());

        save(&store, &snap(13), 7).await.unwrap();
        save(&store, &snap(14), 7).await.unwrap();

        let latest = load_most_recent(&store, None).await.unwrap().unwrap();
        assert_eq!(latest.date(), date(14));

        let prior = load_most_recent(&store, Some(date(14))).await.unwrap().unwrap();
        assert_eq!(prior.date(), date(13));

        store.remove(date(13)).await.unwrap();
        assert!(load_most_recent(&store, Some(date(14))).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_latest_before_ignores_later_days() {
        let store = InMemoryStore::new();
        for day in [10, 12, 14] {
            save(&store, &snap(day), 7).await.unwrap();
        }
        let found = load_latest_before(&store, date(13)).await.unwrap().unwrap();
        assert_eq!(found.date(), date(12));
        assert!(load_latest_before(&store, date(10)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_backfill_older_than_window_is_rejected() {
        let store = InMemoryStore::new();
        for day in 10..=12 {
            save(&store, &snap(day), 3).await.unwrap();
        }

        let err = save(&store, &snap(5), 3).await.unwrap_err();
        assert!(err.to_string().contains("2026-03-05"));
        assert_eq!(store.dates().await.unwrap(), vec![date(10), date(11), date(12)]);

        // Inside the window it still lands and pushes out the oldest.
        let evicted = save(&store, &snap(11), 3).await.unwrap();
        assert!(evicted.is_empty());
        store.remove(date(10)).await.unwrap();
        let evicted = save(&store, &snap(9), 3).await.unwrap();
        assert!(evicted.is_empty());
        assert_eq!(store.dates().await.unwrap(), vec![date(9), date(11), date(12)]);
    }

    #[tokio::test]
    async fn test_zero_retention_rejected() {
        let store = InMemoryStore::new();
        assert!(save(&store, &snap(1), 0).await.is_err());
        assert!(store.is_empty());
    }
}
