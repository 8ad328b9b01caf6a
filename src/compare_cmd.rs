//! `invd compare`: reconcile two sets of brand CSVs directly.
//!
//! Both sides are loaded the same way `ingest` loads today's files, and the
//! result is the same report. History is never read or written, so a user
//! holding yesterday's export can diff it against today's without a
//! database.
//!
//! Each side is dated by the first `YYYY-MM-DD` in its file names (in
//! brand order). When no file name carries a date, the newest modification
//! day (UTC) of that side's files is used.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use inventory_delta_core::export::export_rows;
use inventory_delta_core::normalize::BrandLoad;
use inventory_delta_core::reconcile::compare;
use inventory_delta_core::report::render_comparison;
use inventory_delta_core::snapshot::{Products, Snapshot, DATE_FORMAT};

use crate::config::Config;
use crate::export;
use crate::ingest::{add_files, load_brands};
use crate::report_cmd;

/// Arguments for one compare run.
#[derive(Debug, Default, Clone)]
pub struct CompareArgs {
    pub previous_files: Vec<(String, PathBuf)>,
    pub files: Vec<(String, PathBuf)>,
    pub export: Option<PathBuf>,
    pub json: bool,
}

/// One loaded side of a comparison.
pub struct Side {
    pub snapshot: Snapshot,
    pub loads: Vec<BrandLoad>,
}

/// The first `YYYY-MM-DD` date embedded in the file name of `path`.
pub fn date_in_file_name(path: &Path) -> Option<NaiveDate> {
    let name = path.file_name()?.to_str()?;
    let bytes = name.as_bytes();
    bytes.windows(10).enumerate().find_map(|(i, w)| {
        let shaped = w.iter().enumerate().all(|(j, b)| match j {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
        if !shaped {
            return None;
        }
        NaiveDate::parse_from_str(&name[i..i + 10], DATE_FORMAT).ok()
    })
}

async fn side_date(sources: &BTreeMap<String, Vec<PathBuf>>) -> Result<NaiveDate> {
    let paths: Vec<&PathBuf> = sources.values().flatten().collect();

    if let Some(date) = paths.iter().find_map(|p| date_in_file_name(p)) {
        return Ok(date);
    }

    let mut newest: Option<DateTime<Utc>> = None;
    for path in paths {
        let modified = tokio::fs::metadata(path)
            .await
            .and_then(|m| m.modified())
            .with_context(|| format!("Failed to read modification time: {}", path.display()))?;
        let modified = DateTime::<Utc>::from(modified);
        newest = Some(newest.map_or(modified, |n| n.max(modified)));
    }
    Ok(newest.unwrap_or_else(Utc::now).date_naive())
}

/// Load one side's brand files into a dated snapshot.
pub async fn load_side(files: &[(String, PathBuf)], flag: &str) -> Result<Side> {
    let mut sources = BTreeMap::new();
    add_files(&mut sources, files)?;
    if sources.is_empty() {
        anyhow::bail!("No files given for {}. Use {} brand=path.", flag, flag);
    }

    let date = side_date(&sources).await?;
    let loads = load_brands(&sources).await?;

    let mut products = Products::new();
    for load in &loads {
        products.insert(load.brand.clone(), load.variants.clone());
    }
    let captured_at = date.and_time(NaiveTime::MIN).and_utc();

    Ok(Side {
        snapshot: Snapshot::from_parts(date, captured_at, products),
        loads,
    })
}

fn side_json(side: &Side) -> serde_json::Value {
    serde_json::json!({
        "date": side.snapshot.date(),
        "variants": side.snapshot.variant_count(),
        "brands": side.loads.iter().map(|l| serde_json::json!({
            "brand": l.brand,
            "variants": l.variants.len(),
            "skipped": l.skipped,
            "duplicates": l.duplicates,
        })).collect::<Vec<_>>(),
    })
}

pub async fn run_compare(config: &Config, args: &CompareArgs) -> Result<()> {
    let previous = load_side(&args.previous_files, "--previous-file").await?;
    let current = load_side(&args.files, "--file").await?;

    let comparison = compare(Some(&previous.snapshot), Some(&current.snapshot));

    if let Some(path) = &args.export {
        let rows = export_rows(
            &current.snapshot,
            comparison.reconciliation(),
            &config.export.options(),
        );
        export::write_export_csv(path, &rows).await?;
        tracing::info!(path = %path.display(), rows = rows.len(), "wrote export csv");
    }

    if args.json {
        let result = serde_json::json!({
            "previous": side_json(&previous),
            "current": side_json(&current),
            "comparison": report_cmd::comparison_json(&comparison),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("compare");
    for (label, side) in [("previous", &previous), ("current", &current)] {
        println!(
            "  {}: {} ({} variants)",
            label,
            side.snapshot.date(),
            side.snapshot.variant_count()
        );
        for load in &side.loads {
            if load.skipped > 0 || load.duplicates > 0 {
                println!(
                    "    {}: {} skipped, {} duplicates",
                    config.brand_label(&load.brand),
                    load.skipped,
                    load.duplicates
                );
            }
        }
    }
    if let Some(path) = &args.export {
        println!("  export: {}", path.display());
    }
    println!();
    print!("{}", render_comparison(&comparison, &config.report.options()));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "Handle,Title,Option1 Value,SKU,On hand (new)\n";

    fn write(dir: &TempDir, name: &str, rows: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, format!("{HEADER}{rows}")).unwrap();
        path
    }

    #[test]
    fn test_date_in_file_name() {
        let d = |s: &str| date_in_file_name(Path::new(s));
        assert_eq!(
            d("/exports/saucony-2026-03-14.csv"),
            NaiveDate::from_ymd_opt(2026, 3, 14)
        );
        assert_eq!(
            d("inventory_export_2026-03-13_final.csv"),
            NaiveDate::from_ymd_opt(2026, 3, 13)
        );
        assert_eq!(d("x12026-03-14.csv"), NaiveDate::from_ymd_opt(2026, 3, 14));
        assert_eq!(d("saucony.csv"), None);
        assert_eq!(d("2026-13-40.csv"), None);
        assert_eq!(d("2026-3-14.csv"), None);
        // Only the file name counts, not the directories above it.
        assert_eq!(d("/2026-03-14/saucony.csv"), None);
    }

    #[tokio::test]
    async fn test_two_csv_sides_reconcile() {
        let dir = TempDir::new().unwrap();
        let old = write(
            &dir,
            "saucony-2026-03-13.csv",
            "shoe1,Shoe 1,9,S1-9,5\nshoe1,Shoe 1,10,S1-10,2\n",
        );
        let new = write(
            &dir,
            "saucony-2026-03-14.csv",
            "shoe1,Shoe 1,9,S1-9,3\nshoe1,Shoe 1,10,S1-10,2\nshoe2,Shoe 2,10,S2-10,4\n",
        );

        let previous = load_side(&[("saucony".into(), old)], "--previous-file")
            .await
            .unwrap();
        let current = load_side(&[("saucony".into(), new)], "--file").await.unwrap();
        assert_eq!(previous.snapshot.date(), NaiveDate::from_ymd_opt(2026, 3, 13).unwrap());
        assert_eq!(current.snapshot.date(), NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());

        let comparison = compare(Some(&previous.snapshot), Some(&current.snapshot));
        let r = comparison.reconciliation().unwrap();
        assert!(r.discontinued.is_empty());
        assert_eq!(r.new_products.len(), 1);
        assert_eq!(r.new_products[0].handle, "shoe2");
        assert_eq!(r.quantity_changes.len(), 1);
        assert_eq!(r.quantity_changes[0].change, -2);
    }

    #[tokio::test]
    async fn test_undated_side_uses_modification_day() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "saucony.csv", "shoe1,Shoe 1,9,S1-9,5\n");
        let modified = fs::metadata(&path).unwrap().modified().unwrap();

        let side = load_side(&[("saucony".into(), path)], "--file").await.unwrap();
        assert_eq!(
            side.snapshot.date(),
            DateTime::<Utc>::from(modified).date_naive()
        );
    }

    #[tokio::test]
    async fn test_empty_side_is_an_error() {
        let err = load_side(&[], "--previous-file").await.err().unwrap();
        assert!(err.to_string().contains("--previous-file"));
    }
}
