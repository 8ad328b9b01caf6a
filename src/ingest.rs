//! Ingestion pipeline: brand CSVs → current snapshot → history + report.
//!
//! # Pipeline
//!
//! ```text
//! brand files ──▶ csv_source ──▶ normalize_rows ──▶ Products
//!                                                      │
//!                            TrackerSession ◀──────────┘
//!                   capture current · import/resolve previous
//!                   save (unless dry run) · compare · render
//!                                   │
//!               stdout report / JSON · export CSV · portable snapshot
//! ```
//!
//! Brands come from `[brands.<name>] path` entries plus any `--file
//! brand=path` arguments. Several files for one brand are concatenated
//! and normalized as a single load pass, so a later duplicate row wins.
//! A failed history save is reported but does not fail the run.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;

use inventory_delta_core::normalize::{normalize_rows, BrandLoad};
use inventory_delta_core::session::PreviousSource;
use inventory_delta_core::snapshot::Products;
use inventory_delta_core::{SaveOutcome, TrackerSession};

use crate::config::Config;
use crate::csv_source;
use crate::db;
use crate::export;
use crate::migrate;
use crate::report_cmd;
use crate::sqlite_store::SqliteStore;

/// Arguments for one ingest run.
#[derive(Debug, Default, Clone)]
pub struct IngestArgs {
    /// Extra `(brand, path)` sources on top of the configured ones.
    pub files: Vec<(String, PathBuf)>,
    /// Restrict the run to these brands. Empty means all.
    pub only: Vec<String>,
    /// Portable snapshot to compare against instead of history.
    pub previous: Option<PathBuf>,
    pub export: Option<PathBuf>,
    pub snapshot_out: Option<PathBuf>,
    pub dry_run: bool,
    pub json: bool,
    /// Capture date override. Snapshots are dated by the UTC day of the run.
    pub as_of: Option<NaiveDate>,
}

/// Collect brand → files from config and CLI, honoring `--only`.
pub fn resolve_sources(
    config: &Config,
    files: &[(String, PathBuf)],
    only: &[String],
) -> Result<BTreeMap<String, Vec<PathBuf>>> {
    let mut sources: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    for (brand, cfg) in &config.brands {
        if let Some(path) = &cfg.path {
            sources.entry(brand.clone()).or_default().push(path.clone());
        }
    }
    add_files(&mut sources, files)?;

    if !only.is_empty() {
        for name in only {
            if !sources.contains_key(name) {
                bail!(
                    "Unknown brand: '{}'. Configure [brands.{}] or pass --file {}=path.",
                    name,
                    name,
                    name
                );
            }
        }
        sources.retain(|brand, _| only.contains(brand));
    }

    if sources.is_empty() {
        bail!("No brand files to ingest. Configure [brands.<name>] path or pass --file brand=path.");
    }

    Ok(sources)
}

/// Add `(brand, path)` pairs from the command line to `sources`.
pub fn add_files(
    sources: &mut BTreeMap<String, Vec<PathBuf>>,
    files: &[(String, PathBuf)],
) -> Result<()> {
    for (brand, path) in files {
        let brand = brand.trim();
        if brand.is_empty() {
            bail!("--file needs a brand name: use --file brand=path");
        }
        if brand.contains(inventory_delta_core::models::KEY_DELIMITER) {
            bail!("brand name '{}' must not contain '|'", brand);
        }
        sources
            .entry(brand.to_string())
            .or_default()
            .push(path.clone());
    }
    Ok(())
}

/// Read and normalize every brand.
pub async fn load_brands(sources: &BTreeMap<String, Vec<PathBuf>>) -> Result<Vec<BrandLoad>> {
    let mut loads = Vec::with_capacity(sources.len());
    for (brand, paths) in sources {
        let mut rows = Vec::new();
        for path in paths {
            rows.extend(csv_source::read_rows(path).await?);
        }
        let load = normalize_rows(brand, rows);
        tracing::info!(
            brand = %brand,
            variants = load.variants.len(),
            skipped = load.skipped,
            duplicates = load.duplicates,
            "loaded brand"
        );
        loads.push(load);
    }
    Ok(loads)
}

fn capture_time(as_of: Option<NaiveDate>) -> DateTime<Utc> {
    let now = Utc::now();
    match as_of {
        Some(date) => date.and_time(now.time()).and_utc(),
        None => now,
    }
}

pub async fn run_ingest(config: &Config, args: &IngestArgs) -> Result<()> {
    let sources = resolve_sources(config, &args.files, &args.only)?;
    let loads = load_brands(&sources).await?;

    let mut products = Products::new();
    for load in &loads {
        products.insert(load.brand.clone(), load.variants.clone());
    }

    let pool = db::connect(config).await?;
    migrate::ensure_schema(&pool).await?;
    let mut session =
        TrackerSession::with_retention(SqliteStore::new(pool), config.history.retention);

    let captured_at = capture_time(args.as_of);
    let today = session.capture_current(products, captured_at).date();

    if let Some(path) = &args.previous {
        let document = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
        session
            .import_external(&document)
            .with_context(|| format!("Invalid snapshot file: {}", path.display()))?;
    }
    session.resolve_previous(today).await?;

    let outcome = if args.dry_run {
        None
    } else {
        Some(session.save_current().await)
    };

    let comparison = session.compare();

    if let Some(path) = &args.export {
        let rows = session
            .export_rows(&config.export.options())
            .unwrap_or_default();
        export::write_export_csv(path, &rows).await?;
        tracing::info!(path = %path.display(), rows = rows.len(), "wrote export csv");
    }

    if let Some(path) = &args.snapshot_out {
        if let Some(document) = session.export_current()? {
            export::write_text(path, &document).await?;
            tracing::info!(path = %path.display(), "wrote portable snapshot");
        }
    }

    let variant_total: usize = loads.iter().map(|l| l.variants.len()).sum();

    if args.json {
        let brands: Vec<serde_json::Value> = loads
            .iter()
            .map(|l| {
                serde_json::json!({
                    "brand": l.brand,
                    "variants": l.variants.len(),
                    "skipped": l.skipped,
                    "duplicates": l.duplicates,
                })
            })
            .collect();
        let save = match &outcome {
            None => serde_json::json!({ "status": "dry_run" }),
            Some(SaveOutcome::Saved { date, evicted }) => serde_json::json!({
                "status": "saved",
                "date": date,
                "evicted": evicted,
            }),
            Some(SaveOutcome::Failed { reason }) => {
                serde_json::json!({ "status": "failed", "reason": reason })
            }
            Some(SaveOutcome::NothingToSave) => serde_json::json!({ "status": "nothing_to_save" }),
        };
        let result = serde_json::json!({
            "date": today,
            "variants": variant_total,
            "brands": brands,
            "previous": session.previous().map(|p| p.date()),
            "previous_source": session.previous_source().map(source_label),
            "save": save,
            "comparison": report_cmd::comparison_json(&comparison),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("ingest {}", today);
    for load in &loads {
        println!(
            "  {}: {} variants ({} skipped, {} duplicates)",
            config.brand_label(&load.brand),
            load.variants.len(),
            load.skipped,
            load.duplicates
        );
    }
    println!("  variants: {}", variant_total);
    match session.previous() {
        Some(prev) => println!(
            "  previous: {} ({})",
            prev.date(),
            session.previous_source().map(source_label).unwrap_or("-")
        ),
        None => println!("  previous: none"),
    }
    match &outcome {
        None => println!("  saved: no (dry run)"),
        Some(SaveOutcome::Saved { date, evicted }) => {
            println!("  saved: {}", date);
            for d in evicted {
                println!("  evicted: {}", d);
            }
        }
        Some(SaveOutcome::Failed { reason }) => println!("  saved: FAILED ({})", reason),
        Some(SaveOutcome::NothingToSave) => println!("  saved: nothing to save"),
    }
    if let Some(path) = &args.export {
        println!("  export: {}", path.display());
    }
    if let Some(path) = &args.snapshot_out {
        println!("  snapshot: {}", path.display());
    }
    println!();
    print!("{}", session.render_report(&config.report.options()));

    Ok(())
}

fn source_label(source: PreviousSource) -> &'static str {
    match source {
        PreviousSource::History => "history",
        PreviousSource::Imported => "imported",
    }
}
