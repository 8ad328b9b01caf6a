//! `invd history` and `invd clear`: inspect and wipe stored snapshots.

use anyhow::{bail, Result};
use chrono::DateTime;

use inventory_delta_core::store::SnapshotSummary;
use inventory_delta_core::{SnapshotStore, TrackerSession};

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteStore;

const FINGERPRINT_WIDTH: usize = 12;

fn format_ms(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// Render summaries as a fixed-width table.
pub fn format_history(summaries: &[SnapshotSummary], retention: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<12} {:>9}  {:<14} {:<22} BRANDS\n",
        "DATE", "VARIANTS", "FINGERPRINT", "CAPTURED"
    ));
    for s in summaries {
        let fingerprint: String = s.fingerprint.chars().take(FINGERPRINT_WIDTH).collect();
        out.push_str(&format!(
            "{:<12} {:>9}  {:<14} {:<22} {}\n",
            s.date.to_string(),
            s.variant_count,
            fingerprint,
            format_ms(s.captured_at_ms),
            s.brands.join(", ")
        ));
    }
    out.push_str(&format!(
        "\n{} of {} snapshots retained\n",
        summaries.len(),
        retention
    ));
    out
}

pub async fn run_history(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::ensure_schema(&pool).await?;
    let store = SqliteStore::new(pool);

    let summaries = store.summaries().await?;
    if summaries.is_empty() {
        println!("No snapshots stored yet.");
        return Ok(());
    }

    print!("{}", format_history(&summaries, config.history.retention));
    Ok(())
}

pub async fn run_clear(config: &Config, yes: bool) -> Result<()> {
    if !yes {
        bail!("Refusing to delete snapshot history without --yes");
    }

    let pool = db::connect(config).await?;
    migrate::ensure_schema(&pool).await?;
    let mut session = TrackerSession::with_retention(SqliteStore::new(pool), config.history.retention);

    let count = session.store().dates().await?.len();
    session.clear_all().await?;
    println!("Cleared {} snapshots.", count);
    Ok(())
}
