//! Schema creation for the snapshot history database.
//!
//! Every statement is `IF NOT EXISTS`, so `invd init` can be re-run safely
//! and every command that opens the store calls [`ensure_schema`] first.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    ensure_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    // One row per dated snapshot
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS snapshots (
            date TEXT PRIMARY KEY,
            captured_at INTEGER NOT NULL,
            variant_count INTEGER NOT NULL,
            content_hash TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Variants, in load order per brand
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS snapshot_variants (
            date TEXT NOT NULL,
            brand TEXT NOT NULL,
            position INTEGER NOT NULL,
            handle TEXT NOT NULL,
            title TEXT NOT NULL,
            size TEXT NOT NULL,
            sku TEXT NOT NULL,
            barcode TEXT,
            quantity INTEGER NOT NULL,
            PRIMARY KEY (date, brand, handle, size),
            FOREIGN KEY (date) REFERENCES snapshots(date) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Brands per snapshot, including brands that loaded no variants
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS snapshot_brands (
            date TEXT NOT NULL,
            brand TEXT NOT NULL,
            PRIMARY KEY (date, brand),
            FOREIGN KEY (date) REFERENCES snapshots(date) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_snapshot_variants_order ON snapshot_variants(date, brand, position)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
