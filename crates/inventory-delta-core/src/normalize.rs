//! Row normalization for one brand's load pass.
//!
//! Turns the parsed rows of a canonical-shape export into an ordered,
//! key-unique list of [`Variant`]s. Rows that fail the source row contract
//! are dropped and counted; duplicate identity keys resolve
//! last-write-wins while keeping the position of the first occurrence.

use std::collections::HashMap;

use crate::models::{Variant, VariantKey};

/// Outcome of normalizing one brand's rows.
#[derive(Debug, Clone, Default)]
pub struct BrandLoad {
    pub brand: String,
    pub variants: Vec<Variant>,
    /// Rows that produced a variant (including ones later overwritten).
    pub accepted: usize,
    /// Rows dropped for missing handle, SKU, or size.
    pub skipped: usize,
    /// Accepted rows whose key was already seen in this pass.
    pub duplicates: usize,
}

/// Normalize `rows` for `brand`.
pub fn normalize_rows<I>(brand: &str, rows: I) -> BrandLoad
where
    I: IntoIterator<Item = HashMap<String, String>>,
{
    let mut load = BrandLoad {
        brand: brand.to_string(),
        ..BrandLoad::default()
    };
    let mut index: HashMap<VariantKey, usize> = HashMap::new();

    for (line, row) in rows.into_iter().enumerate() {
        let variant = match Variant::from_source_row(brand, &row) {
            Some(v) => v,
            None => {
                tracing::debug!(brand, row = line + 1, "skipping row without handle/SKU/size");
                load.skipped += 1;
                continue;
            }
        };
        load.accepted += 1;

        match index.get(&variant.key()) {
            Some(&pos) => {
                load.duplicates += 1;
                load.variants[pos] = variant;
            }
            None => {
                index.insert(variant.key(), load.variants.len());
                load.variants.push(variant);
            }
        }
    }

    load
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(handle: &str, sku: &str, size: &str, qty: &str) -> HashMap<String, String> {
        let mut r = HashMap::new();
        r.insert("Handle".to_string(), handle.to_string());
        r.insert("SKU".to_string(), sku.to_string());
        r.insert("Option1 Value".to_string(), size.to_string());
        r.insert("On hand (new)".to_string(), qty.to_string());
        r
    }

    #[test]
    fn test_last_write_wins_keeps_first_position() {
        let rows = vec![
            row("shoe1", "S1", "9", "5"),
            row("shoe2", "S2", "10", "1"),
            row("shoe1", "S1-R", "9", "8"),
        ];
        let load = normalize_rows("brandA", rows);
        assert_eq!(load.variants.len(), 2);
        assert_eq!(load.accepted, 3);
        assert_eq!(load.duplicates, 1);
        assert_eq!(load.variants[0].handle, "shoe1");
        assert_eq!(load.variants[0].quantity, 8);
        assert_eq!(load.variants[0].sku, "S1-R");
        assert_eq!(load.variants[1].handle, "shoe2");
    }

    #[test]
    fn test_blank_rows_are_counted_not_fatal() {
        let rows = vec![row("shoe1", "S1", "9", "5"), row("", "", "", ""), row("x", "", "9", "1")];
        let load = normalize_rows("brandA", rows);
        assert_eq!(load.variants.len(), 1);
        assert_eq!(load.skipped, 2);
    }

    #[test]
    fn test_same_handle_different_sizes_are_distinct() {
        let rows = vec![row("shoe1", "S1", "9", "1"), row("shoe1", "S1", "9.5", "1")];
        let load = normalize_rows("brandA", rows);
        assert_eq!(load.variants.len(), 2);
        assert_eq!(load.duplicates, 0);
    }
}
