//! Inventory export rows.
//!
//! Materializes the merged export: every current variant at its live
//! quantity, followed by every discontinued variant at quantity 0 so that
//! importing the file retires them instead of leaving stale stock behind.
//! The column layout is the fixed 20-field inventory schema.

use serde::Serialize;

use crate::models::Variant;
use crate::reconcile::Reconciliation;
use crate::snapshot::Snapshot;

/// Export column headers, in file order.
pub const EXPORT_HEADERS: [&str; 20] = [
    "Handle",
    "Title",
    "Option1 Name",
    "Option1 Value",
    "Option2 Name",
    "Option2 Value",
    "Option3 Name",
    "Option3 Value",
    "SKU",
    "Barcode",
    "HS Code",
    "COO",
    "Location",
    "Bin name",
    "Incoming (not editable)",
    "Unavailable (not editable)",
    "Committed (not editable)",
    "Available (not editable)",
    "On hand (current)",
    "On hand (new)",
];

/// Literal written to `Option1 Name`.
pub const OPTION1_NAME: &str = "Size";

/// Export settings.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Value for the `Location` column. Empty when unset.
    pub location: String,
}

/// One export row. Field order matches [`EXPORT_HEADERS`]; columns with no
/// source value are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Handle")]
    pub handle: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Option1 Name")]
    pub option1_name: String,
    #[serde(rename = "Option1 Value")]
    pub option1_value: String,
    #[serde(rename = "Option2 Name")]
    pub option2_name: String,
    #[serde(rename = "Option2 Value")]
    pub option2_value: String,
    #[serde(rename = "Option3 Name")]
    pub option3_name: String,
    #[serde(rename = "Option3 Value")]
    pub option3_value: String,
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Barcode")]
    pub barcode: String,
    #[serde(rename = "HS Code")]
    pub hs_code: String,
    #[serde(rename = "COO")]
    pub coo: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Bin name")]
    pub bin_name: String,
    #[serde(rename = "Incoming (not editable)")]
    pub incoming: String,
    #[serde(rename = "Unavailable (not editable)")]
    pub unavailable: String,
    #[serde(rename = "Committed (not editable)")]
    pub committed: String,
    #[serde(rename = "Available (not editable)")]
    pub available: String,
    #[serde(rename = "On hand (current)")]
    pub on_hand_current: String,
    #[serde(rename = "On hand (new)")]
    pub on_hand_new: u32,
}

impl ExportRow {
    fn from_variant(v: &Variant, quantity: u32, opts: &ExportOptions) -> Self {
        ExportRow {
            handle: v.handle.clone(),
            title: v.title.clone(),
            option1_name: OPTION1_NAME.to_string(),
            option1_value: v.size.clone(),
            option2_name: String::new(),
            option2_value: String::new(),
            option3_name: String::new(),
            option3_value: String::new(),
            sku: v.sku.clone(),
            barcode: v.barcode.clone().unwrap_or_default(),
            hs_code: String::new(),
            coo: String::new(),
            location: opts.location.clone(),
            bin_name: String::new(),
            incoming: String::new(),
            unavailable: String::new(),
            committed: String::new(),
            available: String::new(),
            on_hand_current: String::new(),
            on_hand_new: quantity,
        }
    }
}

/// Build the merged export for `current`.
///
/// With no reconciliation (first run, nothing to compare against) only the
/// current rows are emitted. Row count is always
/// `current.variant_count() + discontinued.len()`.
pub fn export_rows(
    current: &Snapshot,
    reconciliation: Option<&Reconciliation>,
    opts: &ExportOptions,
) -> Vec<ExportRow> {
    let discontinued = reconciliation.map(|r| r.discontinued.as_slice()).unwrap_or(&[]);
    let mut rows = Vec::with_capacity(current.variant_count() + discontinued.len());

    rows.extend(
        current
            .variants()
            .map(|v| ExportRow::from_variant(v, v.quantity, opts)),
    );
    rows.extend(
        discontinued
            .iter()
            .map(|d| ExportRow::from_variant(&d.variant, 0, opts)),
    );

    rows
}
