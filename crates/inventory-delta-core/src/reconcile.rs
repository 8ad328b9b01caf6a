//! Snapshot reconciliation.
//!
//! Compares a previous and a current [`Snapshot`] by [`VariantKey`] and
//! produces three disjoint sets:
//!
//! | Bucket | Rule |
//! |--------|------|
//! | discontinued | key in previous, absent from current |
//! | new | key in current, absent from previous |
//! | quantity change | key in both, quantities differ |
//!
//! The engine is pure and deterministic. Result lists keep flattening order
//! (brands by name, rows in load order): previous order for discontinued,
//! current order for the other two. Presentation ordering is the report's
//! job.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Variant, VariantKey};
use crate::snapshot::Snapshot;

/// A variant present in the previous snapshot but missing today.
#[derive(Debug, Clone, Serialize)]
pub struct DiscontinuedVariant {
    #[serde(flatten)]
    pub variant: Variant,
    pub previous_quantity: u32,
}

/// A variant present on both sides whose quantity moved.
#[derive(Debug, Clone, Serialize)]
pub struct QuantityChange {
    #[serde(flatten)]
    pub variant: Variant,
    pub previous_quantity: u32,
    /// `quantity - previous_quantity`.
    pub change: i64,
}

/// Aggregate counts for one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconStats {
    pub total_previous: usize,
    pub total_current: usize,
    pub discontinued: usize,
    pub discontinued_colorways: usize,
    pub new: usize,
    pub new_colorways: usize,
    pub changed: usize,
    /// `total_current - total_previous`.
    pub net_change: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub previous_date: NaiveDate,
    pub current_date: NaiveDate,
    pub discontinued: Vec<DiscontinuedVariant>,
    pub new_products: Vec<Variant>,
    pub quantity_changes: Vec<QuantityChange>,
    pub stats: ReconStats,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.discontinued.is_empty() && self.new_products.is_empty() && self.quantity_changes.is_empty()
    }
}

/// Why no comparison could be made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unavailable {
    NoSnapshots,
    NoPrevious,
    NoCurrent,
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSnapshots => write!(
                f,
                "No inventory loaded yet. Load today's files to start tracking changes."
            ),
            Self::NoPrevious => write!(
                f,
                "No previous snapshot to compare against. Today's snapshot becomes the baseline for the next run."
            ),
            Self::NoCurrent => write!(
                f,
                "No current inventory loaded. Load today's files to compare against the previous snapshot."
            ),
        }
    }
}

/// Result of asking for a comparison: either a reconciliation or a
/// first-class "not possible" answer.
#[derive(Debug, Clone)]
pub enum Comparison {
    Ready(Reconciliation),
    Unavailable(Unavailable),
}

impl Comparison {
    pub fn reconciliation(&self) -> Option<&Reconciliation> {
        match self {
            Comparison::Ready(r) => Some(r),
            Comparison::Unavailable(_) => None,
        }
    }
}

/// Compare two optional snapshots. A missing side is never treated as an
/// empty snapshot.
pub fn compare(previous: Option<&Snapshot>, current: Option<&Snapshot>) -> Comparison {
    match (previous, current) {
        (Some(prev), Some(cur)) => Comparison::Ready(reconcile(prev, cur)),
        (None, None) => Comparison::Unavailable(Unavailable::NoSnapshots),
        (None, Some(_)) => Comparison::Unavailable(Unavailable::NoPrevious),
        (Some(_), None) => Comparison::Unavailable(Unavailable::NoCurrent),
    }
}

/// Key-indexed view of a snapshot: keys in first-seen order, values
/// last-write-wins.
struct KeyIndex<'a> {
    order: Vec<VariantKey>,
    by_key: HashMap<VariantKey, &'a Variant>,
}

impl<'a> KeyIndex<'a> {
    fn build(snapshot: &'a Snapshot) -> Self {
        let mut order = Vec::with_capacity(snapshot.variant_count());
        let mut by_key = HashMap::with_capacity(snapshot.variant_count());
        for v in snapshot.variants() {
            let key = v.key();
            if by_key.insert(key.clone(), v).is_none() {
                order.push(key);
            }
        }
        KeyIndex { order, by_key }
    }

    fn iter(&self) -> impl Iterator<Item = (&VariantKey, &'a Variant)> + '_ {
        self.order.iter().map(move |k| (k, self.by_key[k]))
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Diff `previous` against `current`.
pub fn reconcile(previous: &Snapshot, current: &Snapshot) -> Reconciliation {
    let prev = KeyIndex::build(previous);
    let cur = KeyIndex::build(current);

    let discontinued: Vec<DiscontinuedVariant> = prev
        .iter()
        .filter(|(key, _)| !cur.by_key.contains_key(*key))
        .map(|(_, v)| DiscontinuedVariant {
            variant: v.clone(),
            previous_quantity: v.quantity,
        })
        .collect();

    let mut new_products = Vec::new();
    let mut quantity_changes = Vec::new();
    for (key, v) in cur.iter() {
        match prev.by_key.get(key) {
            None => new_products.push(v.clone()),
            Some(old) if old.quantity != v.quantity => quantity_changes.push(QuantityChange {
                variant: v.clone(),
                previous_quantity: old.quantity,
                change: v.quantity as i64 - old.quantity as i64,
            }),
            Some(_) => {}
        }
    }

    let stats = ReconStats {
        total_previous: prev.len(),
        total_current: cur.len(),
        discontinued: discontinued.len(),
        discontinued_colorways: count_colorways(discontinued.iter().map(|d| &d.variant)),
        new: new_products.len(),
        new_colorways: count_colorways(new_products.iter()),
        changed: quantity_changes.len(),
        net_change: cur.len() as i64 - prev.len() as i64,
    };

    tracing::debug!(
        previous = %previous.date(),
        current = %current.date(),
        discontinued = stats.discontinued,
        new = stats.new,
        changed = stats.changed,
        "reconciled snapshots"
    );

    Reconciliation {
        previous_date: previous.date(),
        current_date: current.date(),
        discontinued,
        new_products,
        quantity_changes,
        stats,
    }
}

fn count_colorways<'a>(variants: impl Iterator<Item = &'a Variant>) -> usize {
    variants
        .map(|v| (v.brand.as_str(), v.handle.as_str()))
        .collect::<HashSet<_>>()
        .len()
}

/// Anything that wraps a [`Variant`] and can be grouped by colorway.
pub trait AsVariant {
    fn as_variant(&self) -> &Variant;
}

impl AsVariant for Variant {
    fn as_variant(&self) -> &Variant {
        self
    }
}

impl AsVariant for DiscontinuedVariant {
    fn as_variant(&self) -> &Variant {
        &self.variant
    }
}

impl AsVariant for QuantityChange {
    fn as_variant(&self) -> &Variant {
        &self.variant
    }
}

/// Variants sharing one brand + handle.
#[derive(Debug, Clone)]
pub struct ColorwayGroup<'a, T> {
    pub brand: &'a str,
    pub handle: &'a str,
    /// Title of the first variant seen for this handle.
    pub title: &'a str,
    pub variants: Vec<&'a T>,
}

/// Group items by colorway, groups in first-seen order.
pub fn group_by_colorway<T: AsVariant>(items: &[T]) -> Vec<ColorwayGroup<'_, T>> {
    let mut groups: Vec<ColorwayGroup<'_, T>> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();

    for item in items {
        let v = item.as_variant();
        let slot = (v.brand.as_str(), v.handle.as_str());
        match index.get(&slot) {
            Some(&i) => groups[i].variants.push(item),
            None => {
                index.insert(slot, groups.len());
                groups.push(ColorwayGroup {
                    brand: &v.brand,
                    handle: &v.handle,
                    title: &v.title,
                    variants: vec![item],
                });
            }
        }
    }

    groups
}
