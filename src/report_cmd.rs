//! `invd report`: compare stored snapshots without ingesting.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;

use inventory_delta_core::report::render_comparison;
use inventory_delta_core::snapshot::DATE_FORMAT;
use inventory_delta_core::store::history;
use inventory_delta_core::{Comparison, SnapshotStore, TrackerSession};

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteStore;

/// JSON form of a comparison: the reconciliation with `"status": "ready"`,
/// or the unavailable reason.
pub fn comparison_json(comparison: &Comparison) -> serde_json::Value {
    match comparison {
        Comparison::Ready(r) => {
            let mut value = serde_json::to_value(r).unwrap_or(serde_json::Value::Null);
            if let serde_json::Value::Object(map) = &mut value {
                map.insert("status".to_string(), "ready".into());
            }
            value
        }
        Comparison::Unavailable(reason) => serde_json::json!({
            "status": "unavailable",
            "reason": reason,
            "message": reason.to_string(),
        }),
    }
}

pub fn parse_date_arg(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .with_context(|| format!("Invalid date '{}': expected YYYY-MM-DD", raw))
}

pub async fn run_report(
    config: &Config,
    date: Option<&str>,
    previous: Option<&Path>,
    json: bool,
) -> Result<()> {
    let date = date.map(parse_date_arg).transpose()?;

    let pool = db::connect(config).await?;
    migrate::ensure_schema(&pool).await?;
    let store = SqliteStore::new(pool);

    let current = match date {
        Some(d) => {
            let found = store.get(d).await?;
            if found.is_none() {
                tracing::warn!(date = %d, "no snapshot stored for date");
            }
            found
        }
        None => history::load_most_recent(&store, None).await?,
    };

    let mut session = TrackerSession::with_retention(store, config.history.retention);

    if let Some(path) = previous {
        let document = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
        session
            .import_external(&document)
            .with_context(|| format!("Invalid snapshot file: {}", path.display()))?;
    }

    if let Some(current) = current {
        let day = current.date();
        session.set_current(current);
        session.resolve_previous_before(day).await?;
    }

    let comparison = session.compare();
    if json {
        println!("{}", serde_json::to_string_pretty(&comparison_json(&comparison))?);
    } else {
        print!("{}", render_comparison(&comparison, &config.report.options()));
    }

    Ok(())
}
