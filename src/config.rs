//! Configuration parsing and validation.
//!
//! `invd` reads a single TOML file (default `./config/invd.toml`). Only
//! `[db]` is required; every other section falls back to the defaults
//! below. Brand file paths are resolved relative to the config file's
//! directory so a config can travel with its exports.
//!
//! ```toml
//! [db]
//! path = "./data/invd.sqlite"
//!
//! [history]
//! retention = 7
//!
//! [report]
//! group_by_colorway = true
//! max_quantity_changes = 30
//!
//! [export]
//! location = ""
//!
//! [brands.saucony]
//! path = "./exports/saucony.csv"
//! display_name = "Saucony"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use inventory_delta_core::export::ExportOptions;
use inventory_delta_core::report::ReportOptions;
use inventory_delta_core::store::history::DEFAULT_RETENTION;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub brands: BTreeMap<String, BrandConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "default_retention")]
    pub retention: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
        }
    }
}

fn default_retention() -> usize {
    DEFAULT_RETENTION
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_group_by_colorway")]
    pub group_by_colorway: bool,
    #[serde(default = "default_max_quantity_changes")]
    pub max_quantity_changes: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            group_by_colorway: default_group_by_colorway(),
            max_quantity_changes: default_max_quantity_changes(),
        }
    }
}

fn default_group_by_colorway() -> bool {
    true
}
fn default_max_quantity_changes() -> usize {
    30
}

impl ReportConfig {
    pub fn options(&self) -> ReportOptions {
        ReportOptions {
            group_by_colorway: self.group_by_colorway,
            max_quantity_changes: self.max_quantity_changes,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ExportConfig {
    /// Value written to the `Location` column of every export row.
    #[serde(default)]
    pub location: String,
}

impl ExportConfig {
    pub fn options(&self) -> ExportOptions {
        ExportOptions {
            location: self.location.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BrandConfig {
    /// CSV export for this brand. Optional: brands can also be supplied
    /// per run with `--file brand=path`.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Config {
    /// Human label for `brand`, falling back to the config key.
    pub fn brand_label<'a>(&'a self, brand: &'a str) -> &'a str {
        self.brands
            .get(brand)
            .and_then(|b| b.display_name.as_deref())
            .unwrap_or(brand)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.history.retention < 1 {
        anyhow::bail!("history.retention must be >= 1");
    }

    if config.report.max_quantity_changes < 1 {
        anyhow::bail!("report.max_quantity_changes must be >= 1");
    }

    for name in config.brands.keys() {
        if name.trim().is_empty() {
            anyhow::bail!("brand names must not be empty");
        }
        if name.contains(inventory_delta_core::models::KEY_DELIMITER) {
            anyhow::bail!(
                "brand name '{}' must not contain '{}'",
                name,
                inventory_delta_core::models::KEY_DELIMITER
            );
        }
    }

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for brand in config.brands.values_mut() {
        if let Some(p) = brand.path.as_mut() {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
    }

    Ok(config)
}
