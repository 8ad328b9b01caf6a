//! # Inventory Delta
//!
//! Daily inventory snapshots and reconciliation reports for brands that
//! publish their stock as CSV exports.
//!
//! Each run loads every brand's export, captures a dated snapshot, keeps a
//! short rolling history in SQLite, and reports what changed since the
//! previous snapshot: discontinued variants, new variants, and quantity
//! movements. The merged export CSV carries discontinued variants at zero
//! on hand so the downstream inventory system can retire them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Brand CSVs  │──▶│  normalize   │──▶│   Snapshot   │
//! │ csv_source  │   │  (core)      │   │   (core)     │
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!                                             │
//!                       ┌─────────────────────┤
//!                       ▼                     ▼
//!                ┌─────────────┐      ┌──────────────┐
//!                │ reconcile + │      │ SqliteStore  │
//!                │ report      │      │ (history)    │
//!                └─────────────┘      └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! invd init                                  # create database
//! invd ingest --file saucony=./saucony.csv   # capture today and compare
//! invd history                               # list stored snapshots
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite-backed snapshot history |
//! | [`csv_source`] | Brand CSV reading |
//! | [`ingest`] | Load, capture, save, compare |
//! | [`report_cmd`] | Compare stored snapshots |
//! | [`compare_cmd`] | Compare two sets of brand CSVs directly |
//! | [`history`] | List and clear stored snapshots |
//! | [`export`] | Export CSV and portable snapshot writers |
//! | [`sources`] | Configured brand listing |
//!
//! The reconciliation engine, report formatter and row model live in the
//! `inventory-delta-core` crate.

pub mod compare_cmd;
pub mod config;
pub mod csv_source;
pub mod db;
pub mod export;
pub mod history;
pub mod ingest;
pub mod migrate;
pub mod report_cmd;
pub mod sources;
pub mod sqlite_store;
