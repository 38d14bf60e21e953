//! Wide fact table: one row per entity, one value per (metric, period).
//!
//! Aggregates are addressed internally by the structured [`FactKey`]. The
//! flattened `{Metric}_{Period}` names only exist at the serialization
//! boundary ([`FactRow::to_columns`]).

use crate::analytics::aggregator::{aggregate_periods, PeriodAggregate};
use crate::analytics::contribution::{apply_contributions, Contribution};
use crate::analytics::decomposition::{apply_decomposition, PriceVolumeDecomposition};
use crate::analytics::deltas::{apply_deltas, CausalFactor, PeriodChange};
use crate::analytics::periods::{Comparison, Horizon, Period, PeriodWindows};
use crate::entity_key::EntityKey;
use crate::sales_record::{Metric, SalesRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

const PERIOD_COUNT: usize = Period::ALL.len();
const CELL_COUNT: usize = Metric::ALL.len() * PERIOD_COUNT;

/// Structured column identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactKey {
    pub metric: Metric,
    pub period: Period,
}

impl FactKey {
    pub fn new(metric: Metric, period: Period) -> Self {
        FactKey { metric, period }
    }

    /// Every (metric, period) pair, in column order.
    pub fn all() -> impl Iterator<Item = FactKey> {
        Metric::ALL.into_iter().flat_map(|metric| {
            Period::ALL
                .into_iter()
                .map(move |period| FactKey::new(metric, period))
        })
    }

    fn index(&self) -> usize {
        self.metric.index() * PERIOD_COUNT + self.period.index()
    }

    /// Serialized name: the metric label with whitespace runs replaced by
    /// `_`, then `_` and the period name (`Retail_Sales_L4`).
    pub fn column_name(&self) -> String {
        format!("{}_{}", underscored(self.metric.label()), self.period)
    }
}

fn underscored(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Values computed from the aggregates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedMetrics {
    pub changes: BTreeMap<(Horizon, Comparison), PeriodChange>,
    pub decomposition: BTreeMap<Horizon, PriceVolumeDecomposition>,
    pub p4_vs_pp4_sales_abs_chg: f64,
    pub contribution: Contribution,
}

/// One entity's aggregates and derived metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct FactRow {
    pub key: EntityKey,
    values: Vec<f64>,
    pub(crate) derived: DerivedMetrics,
}

impl FactRow {
    /// Row with every (metric, period) cell set to zero.
    pub fn zeroed(key: EntityKey) -> Self {
        FactRow {
            key,
            values: vec![0.0; CELL_COUNT],
            derived: DerivedMetrics::default(),
        }
    }

    pub fn value(&self, metric: Metric, period: Period) -> f64 {
        self.values[FactKey::new(metric, period).index()]
    }

    pub(crate) fn set_value(&mut self, metric: Metric, period: Period, value: f64) {
        self.values[FactKey::new(metric, period).index()] = value;
    }

    pub fn derived(&self) -> &DerivedMetrics {
        &self.derived
    }

    /// `L{n}` vs baseline change; an absent pair reads as all zeros.
    pub fn change(&self, horizon: Horizon, comparison: Comparison) -> PeriodChange {
        self.derived
            .changes
            .get(&(horizon, comparison))
            .cloned()
            .unwrap_or_default()
    }

    pub fn sales_abs_change(&self, horizon: Horizon, comparison: Comparison) -> f64 {
        self.derived
            .changes
            .get(&(horizon, comparison))
            .map(|change| change.sales.abs_change)
            .unwrap_or(0.0)
    }

    pub fn decomposition(&self, horizon: Horizon) -> PriceVolumeDecomposition {
        self.derived
            .decomposition
            .get(&horizon)
            .copied()
            .unwrap_or_default()
    }

    pub fn contribution(&self) -> Contribution {
        self.derived.contribution
    }

    /// Flattens the row into `name -> value` columns.
    pub fn to_columns(&self) -> BTreeMap<String, f64> {
        let mut columns: BTreeMap<String, f64> = FactKey::all()
            .map(|key| (key.column_name(), self.values[key.index()]))
            .collect();

        for ((horizon, comparison), change) in &self.derived.changes {
            let pair = format!(
                "{}_vs_{}",
                Period::latest(*horizon),
                Period::baseline(*horizon, *comparison)
            );
            columns.insert(format!("{pair}_Sales_AbsChg"), change.sales.abs_change);
            columns.insert(format!("{pair}_Sales_PctChg"), change.sales.pct_change);
            columns.insert(format!("{pair}_Units_AbsChg"), change.units.abs_change);
            columns.insert(format!("{pair}_Units_PctChg"), change.units.pct_change);
            for factor in CausalFactor::ALL {
                columns.insert(
                    format!("{}_{pair}_PctChg", underscored(factor.metric().label())),
                    change.causal_pct_change(factor),
                );
            }
        }

        for (horizon, decomposition) in &self.derived.decomposition {
            let latest = Period::latest(*horizon);
            columns.insert(format!("{latest}_PriceEffect"), decomposition.price_effect);
            columns.insert(format!("{latest}_VolumeEffect"), decomposition.volume_effect);
            columns.insert(
                format!("{latest}_PriceEffect_PctOfChg"),
                decomposition.price_effect_share,
            );
            columns.insert(
                format!("{latest}_VolumeEffect_PctOfChg"),
                decomposition.volume_effect_share,
            );
            columns.insert(format!("{latest}_PriceVolume_CrossTerm"), decomposition.cross_term);
            columns.insert(format!("{latest}_PriceVolume_Residual"), decomposition.residual);
        }

        columns.insert(
            "P4_vs_PP4_Sales_AbsChg".to_string(),
            self.derived.p4_vs_pp4_sales_abs_chg,
        );
        columns.insert(
            "ContributionToOwnerChange".to_string(),
            self.derived.contribution.to_owner_change,
        );
        columns.insert(
            "ContributionToCategoryChange".to_string(),
            self.derived.contribution.to_category_change,
        );
        columns
    }
}

/// Serialized form of a fact row for external consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatFactRow {
    #[serde(rename = "Brand Owner")]
    pub brand_owner: String,
    #[serde(rename = "Brand")]
    pub brand: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Supercategory")]
    pub supercategory: String,
    #[serde(flatten)]
    pub columns: BTreeMap<String, f64>,
}

impl From<&FactRow> for FlatFactRow {
    fn from(row: &FactRow) -> Self {
        FlatFactRow {
            brand_owner: row.key.brand_owner.clone(),
            brand: row.key.brand.clone(),
            category: row.key.category.clone(),
            supercategory: row.key.supercategory.clone(),
            columns: row.to_columns(),
        }
    }
}

/// Pivots long-format aggregates into one zero-filled row per entity,
/// ordered by entity key.
pub fn reshape(aggregates: &[PeriodAggregate]) -> Vec<FactRow> {
    let mut rows: BTreeMap<&EntityKey, FactRow> = BTreeMap::new();
    for aggregate in aggregates {
        let row = rows
            .entry(&aggregate.key)
            .or_insert_with(|| FactRow::zeroed(aggregate.key.clone()));
        for metric in Metric::ALL {
            row.set_value(metric, aggregate.period, aggregate.value(metric));
        }
    }
    rows.into_values().collect()
}

/// The finished, immutable fact table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactTable {
    windows: Option<PeriodWindows>,
    rows: Vec<FactRow>,
}

impl FactTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Runs the full pipeline over the complete record set.
    pub fn build(records: &[SalesRecord]) -> Self {
        let Some(windows) = PeriodWindows::from_latest(records.iter().map(|r| r.week_ending))
        else {
            info!("no sales records; fact table is empty");
            return Self::empty();
        };

        let aggregates = aggregate_periods(records, &windows);
        let mut rows = reshape(&aggregates);
        apply_deltas(&mut rows);
        apply_decomposition(&mut rows);
        apply_contributions(&mut rows);

        info!(
            as_of = %windows.as_of(),
            records = records.len(),
            aggregates = aggregates.len(),
            entities = rows.len(),
            "built fact table"
        );

        FactTable {
            windows: Some(windows),
            rows,
        }
    }

    pub fn as_of(&self) -> Option<NaiveDate> {
        self.windows.as_ref().map(PeriodWindows::as_of)
    }

    pub fn windows(&self) -> Option<&PeriodWindows> {
        self.windows.as_ref()
    }

    pub fn rows(&self) -> &[FactRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &EntityKey) -> Option<&FactRow> {
        self.rows
            .binary_search_by(|row| row.key.cmp(key))
            .ok()
            .map(|index| &self.rows[index])
    }

    /// First row (in key order) for a (brand, category) pair.
    pub fn find_brand(&self, brand: &str, category: &str) -> Option<&FactRow> {
        self.rows
            .iter()
            .find(|row| row.key.matches_brand(brand, category))
    }

    pub fn to_flat_rows(&self) -> Vec<FlatFactRow> {
        self.rows.iter().map(FlatFactRow::from).collect()
    }
}
