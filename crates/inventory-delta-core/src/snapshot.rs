//! Dated, immutable inventory snapshots and their portable JSON form.
//!
//! A [`Snapshot`] captures every variant of every brand at one instant. Its
//! calendar `date` is derived exactly once, from the UTC day of the capture
//! instant, and is the key under which the snapshot lives in history.
//!
//! The portable document (used for cross-machine transfer and as the
//! logical shape of a history entry) is:
//!
//! ```json
//! {
//!   "date": "2026-03-14",
//!   "timestamp": 1773446400000,
//!   "products": { "saucony": [ { "handle": "...", "title": "...", "sku": "...",
//!                                "size": "9", "barcode": "...", "quantity": 3 } ] }
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::Variant;

/// Date format used for snapshot dates and history keys.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation failure for an imported snapshot document.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("snapshot is missing a date")]
    MissingDate,
    #[error("snapshot date '{0}' is not a YYYY-MM-DD date")]
    InvalidDate(String),
    #[error("snapshot is missing its products mapping")]
    MissingProducts,
}

/// Brand name → ordered variants.
pub type Products = BTreeMap<String, Vec<Variant>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    date: NaiveDate,
    captured_at: DateTime<Utc>,
    products: Products,
}

#[derive(Serialize)]
struct SnapshotDocument<'a> {
    date: String,
    timestamp: i64,
    products: BTreeMap<&'a str, Vec<PortableVariant<'a>>>,
}

/// A variant as written in the portable document (brand is the map key).
#[derive(Serialize)]
struct PortableVariant<'a> {
    handle: &'a str,
    title: &'a str,
    sku: &'a str,
    size: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    barcode: Option<&'a str>,
    quantity: u32,
}

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    products: Option<Products>,
}

impl Snapshot {
    /// Capture a new snapshot at `captured_at`. The date is the UTC day of
    /// that instant.
    pub fn capture(products: Products, captured_at: DateTime<Utc>) -> Self {
        Self::from_parts(captured_at.date_naive(), captured_at, products)
    }

    /// Rebuild a snapshot from stored parts. Each variant's brand is set to
    /// the brand it is filed under.
    pub fn from_parts(date: NaiveDate, captured_at: DateTime<Utc>, mut products: Products) -> Self {
        for (brand, variants) in products.iter_mut() {
            for v in variants.iter_mut() {
                if v.brand != *brand {
                    v.brand = brand.clone();
                }
            }
        }
        Snapshot {
            date,
            captured_at,
            products,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The date as `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn products(&self) -> &Products {
        &self.products
    }

    pub fn brands(&self) -> impl Iterator<Item = &str> {
        self.products.keys().map(String::as_str)
    }

    /// All variants, brands in name order, rows in load order.
    pub fn variants(&self) -> impl Iterator<Item = &Variant> {
        self.products.values().flatten()
    }

    pub fn variant_count(&self) -> usize {
        self.products.values().map(Vec::len).sum()
    }

    /// SHA-256 over the products content. Two snapshots with the same
    /// fingerprint hold identical variants regardless of capture time.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (brand, variants) in &self.products {
            hasher.update(brand.as_bytes());
            hasher.update([0u8]);
            for v in variants {
                for part in [&v.handle, &v.title, &v.sku, &v.size] {
                    hasher.update(part.as_bytes());
                    hasher.update([0u8]);
                }
                hasher.update(v.barcode.as_deref().unwrap_or("").as_bytes());
                hasher.update([0u8]);
                hasher.update(v.quantity.to_le_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }

    /// Serialize to the portable document.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.document())
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.document())
    }

    /// Parse and validate a portable document.
    ///
    /// `date` and `products` are required. A missing `timestamp` defaults
    /// to midnight UTC of the date.
    pub fn from_json(input: &str) -> Result<Self, SnapshotError> {
        let raw: RawSnapshot = serde_json::from_str(input)?;

        let date_str = raw.date.filter(|d| !d.trim().is_empty()).ok_or(SnapshotError::MissingDate)?;
        let date = NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT)
            .map_err(|_| SnapshotError::InvalidDate(date_str.clone()))?;
        let products = raw.products.ok_or(SnapshotError::MissingProducts)?;

        let captured_at = raw
            .timestamp
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN).and_utc());

        Ok(Self::from_parts(date, captured_at, products))
    }

    fn document(&self) -> SnapshotDocument<'_> {
        SnapshotDocument {
            date: self.date_string(),
            timestamp: self.captured_at.timestamp_millis(),
            products: self
                .products
                .iter()
                .map(|(brand, variants)| {
                    let rows = variants
                        .iter()
                        .map(|v| PortableVariant {
                            handle: &v.handle,
                            title: &v.title,
                            sku: &v.sku,
                            size: &v.size,
                            barcode: v.barcode.as_deref(),
                            quantity: v.quantity,
                        })
                        .collect();
                    (brand.as_str(), rows)
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn variant(brand: &str, handle: &str, size: &str, qty: u32) -> Variant {
        Variant {
            brand: brand.into(),
            handle: handle.into(),
            title: format!("{handle} title"),
            sku: format!("{handle}-{size}"),
            size: size.into(),
            barcode: None,
            quantity: qty,
        }
    }

    #[test]
    fn test_date_derived_from_capture_instant() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 23, 59, 0).unwrap();
        let snap = Snapshot::capture(Products::new(), at);
        assert_eq!(snap.date_string(), "2026-03-14");
        assert_eq!(snap.captured_at(), at);
    }

    #[test]
    fn test_portable_document_shape() {
        let mut products = Products::new();
        products.insert("brandA".into(), vec![variant("brandA", "shoe1", "9", 5)]);
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
        let snap = Snapshot::capture(products, at);

        let value: serde_json::Value = serde_json::from_str(&snap.to_json().unwrap()).unwrap();
        assert_eq!(value["date"], "2026-03-14");
        assert_eq!(value["timestamp"], at.timestamp_millis());
        let row = &value["products"]["brandA"][0];
        assert_eq!(row["handle"], "shoe1");
        assert_eq!(row["quantity"], 5);
        assert!(row.get("brand").is_none());
    }

    #[test]
    fn test_import_reattaches_brand() {
        let json = r#"{"date":"2026-03-13","timestamp":1773360000000,
            "products":{"hoka":[{"handle":"clifton-9","title":"Clifton 9","sku":"C9-10","size":"10","quantity":2}]}}"#;
        let snap = Snapshot::from_json(json).unwrap();
        assert_eq!(snap.date_string(), "2026-03-13");
        let v = snap.variants().next().unwrap();
        assert_eq!(v.brand, "hoka");
        assert_eq!(v.key().as_str(), "hoka|clifton-9|10");
    }

    #[test]
    fn test_import_validation_errors() {
        assert!(matches!(
            Snapshot::from_json(r#"{"products":{}}"#),
            Err(SnapshotError::MissingDate)
        ));
        assert!(matches!(
            Snapshot::from_json(r#"{"date":"2026-03-13"}"#),
            Err(SnapshotError::MissingProducts)
        ));
        assert!(matches!(
            Snapshot::from_json(r#"{"date":"yesterday","products":{}}"#),
            Err(SnapshotError::InvalidDate(_))
        ));
        assert!(matches!(
            Snapshot::from_json("not json"),
            Err(SnapshotError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_timestamp_defaults_to_midnight() {
        let snap = Snapshot::from_json(r#"{"date":"2026-03-13","products":{}}"#).unwrap();
        assert_eq!(
            snap.captured_at(),
            Utc.with_ymd_and_hms(2026, 3, 13, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_fingerprint_ignores_capture_time() {
        let mut products = Products::new();
        products.insert("brandA".into(), vec![variant("brandA", "shoe1", "9", 5)]);
        let a = Snapshot::capture(products.clone(), Utc.with_ymd_and_hms(2026, 3, 14, 8, 0, 0).unwrap());
        let b = Snapshot::capture(products.clone(), Utc.with_ymd_and_hms(2026, 3, 15, 8, 0, 0).unwrap());
        assert_eq!(a.fingerprint(), b.fingerprint());

        products.get_mut("brandA").unwrap()[0].quantity = 6;
        let c = Snapshot::capture(products, Utc.with_ymd_and_hms(2026, 3, 14, 8, 0, 0).unwrap());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
