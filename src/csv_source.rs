//! Reading brand CSV exports into header-keyed rows.
//!
//! Files are read with `tokio::fs` and parsed with the `csv` crate into
//! one `HashMap<column, value>` per record, which is what
//! [`normalize_rows`](inventory_delta_core::normalize::normalize_rows)
//! consumes. Parsing is lenient: ragged records are accepted, missing
//! cells read as absent, invalid UTF-8 is replaced, and a leading byte
//! order mark is dropped. Whether a row is usable is decided later by the
//! row model, not here.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub type SourceRow = HashMap<String, String>;

/// Read and parse one CSV export.
pub async fn read_rows(path: &Path) -> Result<Vec<SourceRow>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;

    let rows = parse_rows(&bytes)
        .with_context(|| format!("Failed to parse CSV file: {}", path.display()))?;

    tracing::debug!(path = %path.display(), rows = rows.len(), "read csv source");
    Ok(rows)
}

/// Parse CSV bytes with a header line into rows keyed by header name.
pub fn parse_rows(data: &[u8]) -> Result<Vec<SourceRow>> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        let row: SourceRow = headers
            .iter()
            .zip(record.iter())
            .filter(|(h, _)| !h.is_empty())
            .map(|(h, v)| (h.clone(), String::from_utf8_lossy(v).into_owned()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_keyed_by_header() {
        let data = b"Handle,Title,Option1 Value,SKU,On hand (new)\nride-17,Ride 17,9,S-9,5\n";
        let rows = parse_rows(data).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Handle"], "ride-17");
        assert_eq!(rows[0]["Option1 Value"], "9");
        assert_eq!(rows[0]["On hand (new)"], "5");
    }

    #[test]
    fn test_quoted_fields_with_commas() {
        let data = b"Handle,Title\nride,\"Ride 17, Men's\"\n";
        let rows = parse_rows(data).unwrap();
        assert_eq!(rows[0]["Title"], "Ride 17, Men's");
    }

    #[test]
    fn test_short_record_leaves_columns_absent() {
        let data = b"Handle,Title,SKU\nride\n";
        let rows = parse_rows(data).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Handle").map(String::as_str), Some("ride"));
        assert!(rows[0].get("SKU").is_none());
    }

    #[test]
    fn test_bom_and_padded_headers() {
        let data = b"\xEF\xBB\xBF Handle ,SKU\nride,S-9\n";
        let rows = parse_rows(data).unwrap();
        assert_eq!(rows[0]["Handle"], "ride");
    }

    #[test]
    fn test_header_only_file() {
        let rows = parse_rows(b"Handle,SKU\n").unwrap();
        assert!(rows.is_empty());
        assert!(parse_rows(b"").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let err = read_rows(Path::new("/nonexistent/brand.csv"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read CSV file"));
    }
}
