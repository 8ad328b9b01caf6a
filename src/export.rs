//! Writers for the export CSV and portable snapshot documents.
//!
//! The export CSV uses the fixed 20-column schema with every field quoted.
//! The header is always written, so a run with no rows still produces a
//! valid file.

use anyhow::{bail, Context, Result};
use std::path::Path;

use inventory_delta_core::export::{ExportRow, EXPORT_HEADERS};
use inventory_delta_core::SnapshotStore;
use inventory_delta_core::store::history;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::report_cmd::parse_date_arg;
use crate::sqlite_store::SqliteStore;

/// Render rows as CSV bytes.
pub fn export_csv_bytes(rows: &[ExportRow]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(EXPORT_HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush export CSV: {}", e.error()))
}

pub async fn write_export_csv(path: &Path, rows: &[ExportRow]) -> Result<()> {
    let bytes = export_csv_bytes(rows)?;
    write_bytes(path, &bytes).await
}

pub async fn write_text(path: &Path, text: &str) -> Result<()> {
    write_bytes(path, text.as_bytes()).await
}

async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Write a stored snapshot as a portable document.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_snapshot_export(
    config: &Config,
    date: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let date = date.map(parse_date_arg).transpose()?;

    let pool = db::connect(config).await?;
    migrate::ensure_schema(&pool).await?;
    let store = SqliteStore::new(pool);

    let snapshot = match date {
        Some(d) => store.get(d).await?,
        None => history::load_most_recent(&store, None).await?,
    };
    let snapshot = match (snapshot, date) {
        (Some(s), _) => s,
        (None, Some(d)) => bail!("No snapshot stored for {}", d),
        (None, None) => bail!("No snapshots stored yet. Run `invd ingest` first."),
    };

    let document = snapshot.to_json_pretty()?;
    match output {
        Some(path) => {
            write_text(path, &document).await?;
            eprintln!(
                "Exported snapshot {} ({} variants) to {}",
                snapshot.date(),
                snapshot.variant_count(),
                path.display()
            );
        }
        None => println!("{}", document),
    }

    Ok(())
}
