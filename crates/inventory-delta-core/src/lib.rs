//! # Inventory Delta Core
//!
//! Shared, I/O-free logic for inventory-delta: the canonical variant model,
//! dated snapshots, the snapshot store abstraction, the reconciliation
//! engine, and report/export formatting.
//!
//! This crate contains no tokio, sqlx, or filesystem dependencies. Storage
//! backends live behind the [`store::SnapshotStore`] trait.

pub mod export;
pub mod models;
pub mod normalize;
pub mod reconcile;
pub mod report;
pub mod session;
pub mod snapshot;
pub mod store;

pub use models::{Variant, VariantKey};
pub use reconcile::{reconcile, Comparison, Reconciliation};
pub use session::{SaveOutcome, TrackerSession};
pub use snapshot::{Snapshot, SnapshotError};
pub use store::SnapshotStore;
