//! Share of a group's `L4` vs `P4` sales change attributable to each entity.
//!
//! Fractions are signed and unbounded: an entity growing inside a shrinking
//! group gets a negative share, and offsetting movements push shares past 1.

use crate::analytics::fact_table::FactRow;
use crate::analytics::periods::{Comparison, Horizon};
use crate::analytics::primitives::safe_divide;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Contribution {
    pub to_owner_change: f64,
    pub to_category_change: f64,
}

fn group_totals<'a, F>(rows: &'a [FactRow], changes: &[f64], group: F) -> HashMap<&'a str, f64>
where
    F: Fn(&'a FactRow) -> &'a str,
{
    let mut totals = HashMap::new();
    for (row, change) in rows.iter().zip(changes) {
        *totals.entry(group(row)).or_insert(0.0) += change;
    }
    totals
}

/// Computes owner- and category-level contributions for every row.
///
/// Returned in row order.
pub fn compute_contributions(rows: &[FactRow]) -> Vec<Contribution> {
    let changes: Vec<f64> = rows
        .iter()
        .map(|row| row.sales_abs_change(Horizon::FourWeeks, Comparison::Prior))
        .collect();
    let owner_totals = group_totals(rows, &changes, |row| row.key.brand_owner.as_str());
    let category_totals = group_totals(rows, &changes, |row| row.key.category.as_str());

    rows.iter()
        .zip(&changes)
        .map(|(row, change)| {
            let owner_total = owner_totals
                .get(row.key.brand_owner.as_str())
                .copied()
                .unwrap_or(0.0);
            let category_total = category_totals
                .get(row.key.category.as_str())
                .copied()
                .unwrap_or(0.0);
            Contribution {
                to_owner_change: safe_divide(*change, owner_total),
                to_category_change: safe_divide(*change, category_total),
            }
        })
        .collect()
}

/// Requires deltas to have been applied.
pub fn apply_contributions(rows: &mut [FactRow]) {
    let contributions = compute_contributions(rows);
    for (row, contribution) in rows.iter_mut().zip(contributions) {
        row.derived.contribution = contribution;
    }
}
