//! Per-window aggregation of raw records, grouped by entity.
//!
//! Output is long-format: one [`PeriodAggregate`] per (entity, period) that
//! had at least one record in the window. Entities with no records in a
//! window simply produce no row.

use crate::analytics::periods::{Period, PeriodWindows};
use crate::analytics::primitives::FiniteAccumulator;
use crate::entity_key::EntityKey;
use crate::sales_record::{Aggregation, DateRange, Metric, SalesRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, trace};

const METRIC_COUNT: usize = Metric::ALL.len();

/// Aggregated metrics for one entity within one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodAggregate {
    pub key: EntityKey,
    pub period: Period,
    values: [f64; METRIC_COUNT],
}

impl PeriodAggregate {
    pub fn value(&self, metric: Metric) -> f64 {
        self.values[metric.index()]
    }
}

#[derive(Debug, Default)]
struct MetricAccumulator {
    metrics: [FiniteAccumulator; METRIC_COUNT],
}

impl MetricAccumulator {
    fn push(&mut self, record: &SalesRecord) {
        for metric in Metric::ALL {
            self.metrics[metric.index()].push(record.metric(metric));
        }
    }

    fn finish(&self) -> [f64; METRIC_COUNT] {
        let mut values = [0.0; METRIC_COUNT];
        for metric in Metric::ALL {
            let acc = &self.metrics[metric.index()];
            values[metric.index()] = match metric.aggregation() {
                Aggregation::Sum => acc.sum(),
                Aggregation::Mean => acc.mean().unwrap_or(0.0),
            };
        }
        values
    }
}

/// Aggregates the records falling inside `range` (inclusive), grouped by
/// entity, ordered by entity key.
pub fn aggregate_window(
    records: &[SalesRecord],
    period: Period,
    range: &DateRange,
) -> Vec<PeriodAggregate> {
    let mut groups: BTreeMap<&EntityKey, MetricAccumulator> = BTreeMap::new();
    for record in records.iter().filter(|r| range.contains(r.week_ending)) {
        groups.entry(&record.key).or_default().push(record);
    }

    debug!(period = %period, entities = groups.len(), "aggregated window");

    groups
        .into_iter()
        .map(|(key, acc)| {
            trace!(period = %period, entity = %key, "aggregate row");
            PeriodAggregate {
                key: key.clone(),
                period,
                values: acc.finish(),
            }
        })
        .collect()
}

/// Aggregates every resolved window. Rows are ordered by period (column
/// order) and then by entity key.
pub fn aggregate_periods(records: &[SalesRecord], windows: &PeriodWindows) -> Vec<PeriodAggregate> {
    Period::ALL
        .iter()
        .filter_map(|period| windows.get(*period).map(|range| (*period, *range)))
        .flat_map(|(period, range)| aggregate_window(records, period, &range))
        .collect()
}
