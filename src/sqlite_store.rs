//! SQLite-backed [`SnapshotStore`] implementation.
//!
//! A snapshot is one row in `snapshots`, one row per brand in
//! `snapshot_brands` (so brands that loaded nothing survive), and one row
//! per variant in `snapshot_variants`. `position` keeps each brand's load
//! order so a snapshot read back compares, renders and fingerprints exactly
//! as it was captured.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;

use inventory_delta_core::snapshot::{Products, Snapshot, DATE_FORMAT};
use inventory_delta_core::store::{SnapshotStore, SnapshotSummary};
use inventory_delta_core::Variant;

/// SQLite implementation of the [`SnapshotStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .with_context(|| format!("Corrupt snapshot date in database: '{}'", raw))
}

fn parse_captured_at(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| anyhow!("Corrupt snapshot timestamp in database: {}", ms))
}

#[async_trait]
impl SnapshotStore for SqliteStore {
    async fn dates(&self) -> Result<Vec<NaiveDate>> {
        let rows: Vec<String> = sqlx::query_scalar("SELECT date FROM snapshots ORDER BY date")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(|d| parse_date(d)).collect()
    }

    async fn get(&self, date: NaiveDate) -> Result<Option<Snapshot>> {
        let key = date_key(date);

        let header = sqlx::query("SELECT captured_at FROM snapshots WHERE date = ?")
            .bind(&key)
            .fetch_optional(&self.pool)
            .await?;

        let captured_at = match header {
            Some(row) => parse_captured_at(row.get("captured_at"))?,
            None => return Ok(None),
        };

        let mut products = Products::new();

        let brands: Vec<String> =
            sqlx::query_scalar("SELECT brand FROM snapshot_brands WHERE date = ? ORDER BY brand")
                .bind(&key)
                .fetch_all(&self.pool)
                .await?;
        for brand in brands {
            products.entry(brand).or_default();
        }

        let rows = sqlx::query(
            r#"
            SELECT brand, handle, title, size, sku, barcode, quantity
            FROM snapshot_variants
            WHERE date = ?
            ORDER BY brand, position
            "#,
        )
        .bind(&key)
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            let brand: String = row.get("brand");
            let quantity: i64 = row.get("quantity");
            let variant = Variant {
                brand: brand.clone(),
                handle: row.get("handle"),
                title: row.get("title"),
                sku: row.get("sku"),
                size: row.get("size"),
                barcode: row.get("barcode"),
                quantity: u32::try_from(quantity).unwrap_or(0),
            };
            products.entry(brand).or_default().push(variant);
        }

        Ok(Some(Snapshot::from_parts(date, captured_at, products)))
    }

    async fn upsert(&self, snapshot: &Snapshot) -> Result<()> {
        let key = date_key(snapshot.date());
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM snapshot_variants WHERE date = ?")
            .bind(&key)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM snapshot_brands WHERE date = ?")
            .bind(&key)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO snapshots (date, captured_at, variant_count, content_hash)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(date) DO UPDATE SET
                captured_at = excluded.captured_at,
                variant_count = excluded.variant_count,
                content_hash = excluded.content_hash
            "#,
        )
        .bind(&key)
        .bind(snapshot.captured_at().timestamp_millis())
        .bind(snapshot.variant_count() as i64)
        .bind(snapshot.fingerprint())
        .execute(&mut *tx)
        .await?;

        for (brand, variants) in snapshot.products() {
            sqlx::query("INSERT INTO snapshot_brands (date, brand) VALUES (?, ?)")
                .bind(&key)
                .bind(brand)
                .execute(&mut *tx)
                .await?;

            for (position, v) in variants.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO snapshot_variants
                        (date, brand, position, handle, title, size, sku, barcode, quantity)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&key)
                .bind(brand)
                .bind(position as i64)
                .bind(&v.handle)
                .bind(&v.title)
                .bind(&v.size)
                .bind(&v.sku)
                .bind(&v.barcode)
                .bind(v.quantity as i64)
                .execute(&mut *tx)
                .await
                .with_context(|| {
                    format!("Failed to store variant {} for {}", v.key(), key)
                })?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn remove(&self, date: NaiveDate) -> Result<()> {
        let key = date_key(date);
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM snapshot_variants WHERE date = ?")
            .bind(&key)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM snapshot_brands WHERE date = ?")
            .bind(&key)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM snapshots WHERE date = ?")
            .bind(&key)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM snapshot_variants")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM snapshot_brands")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM snapshots").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Reads the header and brand tables only; variants are never
    /// materialized.
    async fn summaries(&self) -> Result<Vec<SnapshotSummary>> {
        let rows = sqlx::query(
            "SELECT date, captured_at, variant_count, content_hash FROM snapshots ORDER BY date",
        )
        .fetch_all(&self.pool)
        .await?;

        let brand_rows = sqlx::query("SELECT date, brand FROM snapshot_brands ORDER BY date, brand")
            .fetch_all(&self.pool)
            .await?;
        let mut brands_by_date: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in brand_rows {
            brands_by_date
                .entry(row.get("date"))
                .or_default()
                .push(row.get("brand"));
        }

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let date: String = row.get("date");
            let variant_count: i64 = row.get("variant_count");
            let brands = brands_by_date.remove(&date).unwrap_or_default();

            out.push(SnapshotSummary {
                date: parse_date(&date)?,
                captured_at_ms: row.get("captured_at"),
                variant_count: usize::try_from(variant_count).unwrap_or(0),
                brands,
                fingerprint: row.get("content_hash"),
            });
        }
        Ok(out)
    }
}
