//! Canonical inventory data model.
//!
//! A [`Variant`] is one sellable size of one product handle for one brand.
//! Every vendor export, after conversion to the canonical row shape, is
//! reduced to a list of variants; all matching across snapshots goes through
//! the [`VariantKey`] derived from `(brand, handle, size)`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Column holding the product handle in the canonical row shape.
pub const COL_HANDLE: &str = "Handle";
/// Column holding the product title.
pub const COL_TITLE: &str = "Title";
/// Column holding the size (first option value).
pub const COL_SIZE: &str = "Option1 Value";
/// Column holding the SKU.
pub const COL_SKU: &str = "SKU";
/// Column holding the barcode.
pub const COL_BARCODE: &str = "Barcode";
/// Column holding the on-hand quantity.
pub const COL_QUANTITY: &str = "On hand (new)";

/// Separator used when rendering a [`VariantKey`]. Never expected inside
/// brand names, handles or sizes.
pub const KEY_DELIMITER: char = '|';

/// A normalized inventory variant.
///
/// SKU and barcode are carried for reporting and export only; they do not
/// participate in identity (a brand may reissue a SKU for the same
/// handle/size).
///
/// In the portable snapshot document variants are filed under their brand
/// and carry no `brand` field; [`Snapshot`](crate::Snapshot) re-attaches it
/// on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(default)]
    pub brand: String,
    pub handle: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sku: String,
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default)]
    pub quantity: u32,
}

impl Variant {
    /// Build a variant from a loosely typed row (`column name -> value`).
    ///
    /// Returns `None` when the row lacks a handle, a SKU, or a size. Blank
    /// and malformed trailing rows are normal in spreadsheet exports, so
    /// this is not an error.
    pub fn from_source_row(brand: &str, row: &HashMap<String, String>) -> Option<Variant> {
        let field = |name: &str| row.get(name).map(|v| v.trim()).unwrap_or("");

        let handle = field(COL_HANDLE);
        let sku = field(COL_SKU);
        let size = field(COL_SIZE);
        if handle.is_empty() || sku.is_empty() || size.is_empty() {
            return None;
        }

        let barcode = field(COL_BARCODE);

        Some(Variant {
            brand: brand.to_string(),
            handle: handle.to_string(),
            title: field(COL_TITLE).to_string(),
            sku: sku.to_string(),
            size: size.to_string(),
            barcode: if barcode.is_empty() {
                None
            } else {
                Some(barcode.to_string())
            },
            quantity: parse_quantity(row.get(COL_QUANTITY).map(String::as_str)),
        })
    }

    /// Identity key used for all cross-snapshot matching.
    pub fn key(&self) -> VariantKey {
        VariantKey::new(&self.brand, &self.handle, &self.size)
    }
}

/// Identity of a variant across snapshots: `brand|handle|size`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey(String);

impl VariantKey {
    pub fn new(brand: &str, handle: &str, size: &str) -> Self {
        let mut key = String::with_capacity(brand.len() + handle.len() + size.len() + 2);
        key.push_str(brand);
        key.push(KEY_DELIMITER);
        key.push_str(handle);
        key.push(KEY_DELIMITER);
        key.push_str(size);
        VariantKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse an on-hand quantity cell.
///
/// Takes the leading integer of the trimmed cell (`"12 pcs"` → 12,
/// `"3.7"` → 3). Missing, empty or non-numeric cells yield 0, as do
/// negative counts. One bad cell never fails a load.
pub fn parse_quantity(raw: Option<&str>) -> u32 {
    let s = match raw {
        Some(s) => s.trim(),
        None => return 0,
    };

    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 || negative {
        return 0;
    }

    digits[..end].parse::<u64>().map(|n| n.min(u32::MAX as u64) as u32).unwrap_or(u32::MAX)
}
