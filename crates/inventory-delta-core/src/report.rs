//! Plain-text comparison report.
//!
//! Section order is fixed: header with dates, summary counts, discontinued,
//! new products, quantity changes. Empty sections are left out. Output is
//! deterministic for a given [`Reconciliation`] and [`ReportOptions`].

use std::cmp::Ordering;
use std::fmt::Write;

use crate::models::Variant;
use crate::reconcile::{group_by_colorway, AsVariant, ColorwayGroup, Comparison, Reconciliation};

const RULE_WIDTH: usize = 70;

/// Rendering knobs.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Group discontinued and new variants by colorway (brand + handle).
    pub group_by_colorway: bool,
    /// Maximum number of quantity-change lines before truncating.
    pub max_quantity_changes: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            group_by_colorway: true,
            max_quantity_changes: 30,
        }
    }
}

/// Render a comparison, including the "not available" case.
pub fn render_comparison(comparison: &Comparison, opts: &ReportOptions) -> String {
    match comparison {
        Comparison::Ready(r) => render_report(r, opts),
        Comparison::Unavailable(reason) => format!("{}\n", reason),
    }
}

/// Render a reconciliation as a text report.
pub fn render_report(r: &Reconciliation, opts: &ReportOptions) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let stats = &r.stats;
    let mut out = String::new();

    let _ = writeln!(out, "INVENTORY COMPARISON REPORT");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out);

    let _ = writeln!(out, "COMPARING:");
    let _ = writeln!(
        out,
        "  Previous ({}): {} variants",
        r.previous_date, stats.total_previous
    );
    let _ = writeln!(
        out,
        "  Current ({}): {} variants",
        r.current_date, stats.total_current
    );
    let _ = writeln!(out, "  Net Change: {}", signed(stats.net_change));
    let _ = writeln!(out);

    let _ = writeln!(out, "SUMMARY:");
    let _ = writeln!(
        out,
        "  Discontinued: {} variants ({} colorways)",
        stats.discontinued, stats.discontinued_colorways
    );
    let _ = writeln!(
        out,
        "  New Products: {} variants ({} colorways)",
        stats.new, stats.new_colorways
    );
    let _ = writeln!(out, "  Quantity Changes: {} variants", stats.changed);
    let _ = writeln!(out);

    if !r.discontinued.is_empty() {
        let heading = if opts.group_by_colorway {
            format!(
                "DISCONTINUED PRODUCTS ({} colorways, {} total variants)",
                stats.discontinued_colorways, stats.discontinued
            )
        } else {
            format!("DISCONTINUED PRODUCTS ({} variants)", stats.discontinued)
        };
        write_heading(&mut out, &rule, &heading);
        write_variant_section(&mut out, &r.discontinued, opts.group_by_colorway);
    }

    if !r.new_products.is_empty() {
        let heading = if opts.group_by_colorway {
            format!(
                "NEW COLORWAYS ({} colorways, {} total variants)",
                stats.new_colorways, stats.new
            )
        } else {
            format!("NEW PRODUCTS ({} variants)", stats.new)
        };
        write_heading(&mut out, &rule, &heading);
        write_variant_section(&mut out, &r.new_products, opts.group_by_colorway);
    }

    if !r.quantity_changes.is_empty() {
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "QUANTITY CHANGES ({} variants)", stats.changed);
        let _ = writeln!(out, "{}", rule);
        for c in r.quantity_changes.iter().take(opts.max_quantity_changes) {
            let direction = if c.change > 0 { "increased" } else { "decreased" };
            let _ = writeln!(
                out,
                "  {} - Size {}: {} -> {} ({} by {})",
                display_title(&c.variant),
                c.variant.size,
                c.previous_quantity,
                c.variant.quantity,
                direction,
                c.change.unsigned_abs()
            );
        }
        if r.quantity_changes.len() > opts.max_quantity_changes {
            let _ = writeln!(
                out,
                "  ... and {} more",
                r.quantity_changes.len() - opts.max_quantity_changes
            );
        }
    }

    out
}

fn write_heading(out: &mut String, rule: &str, heading: &str) {
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{}", heading);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out);
}

fn write_variant_section<T: AsVariant>(out: &mut String, items: &[T], grouped: bool) {
    if grouped {
        let mut groups = group_by_colorway(items);
        sort_groups(&mut groups);
        for group in &groups {
            let title = if group.title.is_empty() {
                group.handle
            } else {
                group.title
            };
            let sizes: Vec<String> = group
                .variants
                .iter()
                .map(|item| {
                    let v = item.as_variant();
                    format!("{} ({})", v.size, v.quantity)
                })
                .collect();
            let _ = writeln!(out, "{}", title);
            let _ = writeln!(out, "  Sizes: {}", sizes.join(", "));
            let _ = writeln!(out, "  Total variants: {}", group.variants.len());
            let _ = writeln!(out);
        }
    } else {
        let mut sorted: Vec<&T> = items.iter().collect();
        sorted.sort_by(|a, b| {
            let (a, b) = (a.as_variant(), b.as_variant());
            compare_titles(display_title(a), display_title(b))
                .then_with(|| a.brand.cmp(&b.brand))
                .then_with(|| a.handle.cmp(&b.handle))
                .then_with(|| compare_sizes(&a.size, &b.size))
        });
        for item in sorted {
            let v = item.as_variant();
            let _ = writeln!(out, "  {} - Size {} ({})", display_title(v), v.size, v.quantity);
        }
        let _ = writeln!(out);
    }
}

/// Groups by title (case-insensitive), then brand and handle; variants in
/// each group by size.
fn sort_groups<T: AsVariant>(groups: &mut [ColorwayGroup<'_, T>]) {
    for group in groups.iter_mut() {
        group
            .variants
            .sort_by(|a, b| compare_sizes(&a.as_variant().size, &b.as_variant().size));
    }
    groups.sort_by(|a, b| {
        let ta = if a.title.is_empty() { a.handle } else { a.title };
        let tb = if b.title.is_empty() { b.handle } else { b.title };
        compare_titles(ta, tb)
            .then_with(|| a.brand.cmp(b.brand))
            .then_with(|| a.handle.cmp(b.handle))
    });
}

fn display_title(v: &Variant) -> &str {
    if v.title.is_empty() {
        &v.handle
    } else {
        &v.title
    }
}

fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Numeric sizes ascending by value, then non-numeric sizes as strings.
///
/// A size counts as numeric when it starts with a number, so width
/// suffixes sort with their base size (`9W` < `9.5W` < `10W`). Equal
/// values fall back to the full string.
pub fn compare_sizes(a: &str, b: &str) -> Ordering {
    match (leading_number(a), leading_number(b)) {
        (Some(x), Some(y)) => x
            .partial_cmp(&y)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// The leading decimal number of a trimmed size (`"9.5W"` → 9.5).
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    s[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

fn signed(n: i64) -> String {
    if n > 0 {
        format!("+{}", n)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{compare, reconcile};
    use crate::snapshot::{Products, Snapshot};
    use chrono::{TimeZone, Utc};

    fn v(handle: &str, title: &str, size: &str, qty: u32) -> Variant {
        Variant {
            brand: "brandA".into(),
            handle: handle.into(),
            title: title.into(),
            sku: format!("{handle}-{size}"),
            size: size.into(),
            barcode: None,
            quantity: qty,
        }
    }

    fn snap(day: u32, variants: Vec<Variant>) -> Snapshot {
        let mut products = Products::new();
        products.insert("brandA".into(), variants);
        Snapshot::capture(products, Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap())
    }

    #[test]
    fn test_header_and_summary() {
        let prev = snap(13, vec![v("shoe1", "Shoe One", "9", 5)]);
        let cur = snap(14, vec![v("shoe1", "Shoe One", "9", 3), v("shoe2", "Shoe Two", "10", 1)]);
        let text = render_report(&reconcile(&prev, &cur), &ReportOptions::default());

        assert!(text.starts_with("INVENTORY COMPARISON REPORT\n"));
        assert!(text.contains("  Previous (2026-03-13): 1 variants\n"));
        assert!(text.contains("  Current (2026-03-14): 2 variants\n"));
        assert!(text.contains("  Net Change: +1\n"));
        assert!(text.contains("  New Products: 1 variants (1 colorways)\n"));
        assert!(text.contains("  Shoe One - Size 9: 5 -> 3 (decreased by 2)\n"));
        assert!(!text.contains("DISCONTINUED PRODUCTS"));
    }

    #[test]
    fn test_section_order_and_grouping() {
        let prev = snap(
            13,
            vec![
                v("zeta", "Zeta Trainer", "10", 1),
                v("zeta", "Zeta Trainer", "9.5", 2),
                v("alpha", "alpha racer", "8", 3),
                v("keep", "Keep", "9", 1),
            ],
        );
        let cur = snap(
            14,
            vec![v("keep", "Keep", "9", 4), v("new1", "New One", "11", 2), v("new1", "New One", "7", 1)],
        );
        let text = render_report(&reconcile(&prev, &cur), &ReportOptions::default());

        let disc = text.find("DISCONTINUED PRODUCTS (2 colorways, 3 total variants)").unwrap();
        let new = text.find("NEW COLORWAYS (1 colorways, 2 total variants)").unwrap();
        let changes = text.find("QUANTITY CHANGES (1 variants)").unwrap();
        assert!(disc < new && new < changes);

        // Title order is case-insensitive: "alpha racer" before "Zeta Trainer".
        let alpha = text.find("alpha racer\n").unwrap();
        let zeta = text.find("Zeta Trainer\n").unwrap();
        assert!(alpha < zeta);
        assert!(text.contains("  Sizes: 9.5 (2), 10 (1)\n"));
        assert!(text.contains("  Sizes: 7 (1), 11 (2)\n"));
        assert!(text.contains("  Total variants: 2\n"));
    }

    #[test]
    fn test_ungrouped_lists_variants() {
        let prev = snap(13, vec![]);
        let cur = snap(14, vec![v("b", "Bravo", "10", 1), v("b", "Bravo", "9", 2), v("a", "Alpha", "8", 0)]);
        let opts = ReportOptions {
            group_by_colorway: false,
            ..ReportOptions::default()
        };
        let text = render_report(&reconcile(&prev, &cur), &opts);
        assert!(text.contains("NEW PRODUCTS (3 variants)"));
        let a = text.find("  Alpha - Size 8 (0)").unwrap();
        let b9 = text.find("  Bravo - Size 9 (2)").unwrap();
        let b10 = text.find("  Bravo - Size 10 (1)").unwrap();
        assert!(a < b9 && b9 < b10);
    }

    #[test]
    fn test_quantity_changes_truncated() {
        let prev = snap(13, (0..35).map(|i| v("shoe", "Shoe", &i.to_string(), 1)).collect());
        let cur = snap(14, (0..35).map(|i| v("shoe", "Shoe", &i.to_string(), 2)).collect());
        let text = render_report(&reconcile(&prev, &cur), &ReportOptions::default());

        assert_eq!(text.matches("(increased by 1)").count(), 30);
        assert!(text.contains("  ... and 5 more\n"));
        // Insertion order, not size order: size 29 is the last line shown.
        assert!(text.contains("  Shoe - Size 29: 1 -> 2"));
        assert!(!text.contains("  Shoe - Size 30: 1 -> 2"));
    }

    #[test]
    fn test_unavailable_renders_reason() {
        let cur = snap(14, vec![v("shoe1", "Shoe One", "9", 3)]);
        let text = render_comparison(&compare(None, Some(&cur)), &ReportOptions::default());
        assert!(text.starts_with("No previous snapshot"));
    }

    #[test]
    fn test_compare_sizes() {
        assert_eq!(compare_sizes("9.5", "10"), Ordering::Less);
        assert_eq!(compare_sizes("10", "9"), Ordering::Greater);
        assert_eq!(compare_sizes("10", "XL"), Ordering::Less);
        assert_eq!(compare_sizes("M", "L"), Ordering::Greater);
    }

    #[test]
    fn test_width_suffixed_sizes_sort_by_leading_number() {
        let mut sizes = vec!["10W", "9W", "XL", "9.5W", "8", "9"];
        sizes.sort_by(|a, b| compare_sizes(a, b));
        assert_eq!(sizes, vec!["8", "9", "9W", "9.5W", "10W", "XL"]);
        assert_eq!(compare_sizes(".5", "1"), Ordering::Less);
        assert_eq!(compare_sizes("W9", "9"), Ordering::Greater);
    }

    #[test]
    fn test_deterministic() {
        let prev = snap(13, vec![v("a", "A", "9", 1), v("b", "B", "9", 1)]);
        let cur = snap(14, vec![v("c", "C", "9", 1)]);
        let r = reconcile(&prev, &cur);
        let opts = ReportOptions::default();
        assert_eq!(render_report(&r, &opts), render_report(&r, &opts));
    }
}
