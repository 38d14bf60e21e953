//! Period-over-period changes between a latest window and its baselines.

use crate::analytics::fact_table::FactRow;
use crate::analytics::periods::{Comparison, Horizon, Period};
use crate::analytics::primitives::pct_change;
use crate::sales_record::Metric;
use serde::{Serialize, Serializer};
use std::fmt;

/// Metrics whose movement is used to explain a sales change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CausalFactor {
    TotalTraffic,
    PaidAdSpend,
    BuyBoxRate,
}

impl CausalFactor {
    pub const ALL: [CausalFactor; 3] = [
        CausalFactor::TotalTraffic,
        CausalFactor::PaidAdSpend,
        CausalFactor::BuyBoxRate,
    ];

    pub fn metric(&self) -> Metric {
        match self {
            CausalFactor::TotalTraffic => Metric::TotalTraffic,
            CausalFactor::PaidAdSpend => Metric::PaidAdSpend,
            CausalFactor::BuyBoxRate => Metric::BuyBoxRate,
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for CausalFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.metric().label())
    }
}

impl Serialize for CausalFactor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Absolute and guarded relative change of one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Delta {
    pub abs_change: f64,
    pub pct_change: f64,
}

impl Delta {
    pub fn between(current: f64, baseline: f64) -> Self {
        Delta {
            abs_change: current - baseline,
            pct_change: pct_change(current, baseline),
        }
    }
}

/// Everything derived from one `L{n}` vs `t{n}` comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodChange {
    pub sales: Delta,
    pub units: Delta,
    causal_pct: [f64; CausalFactor::ALL.len()],
}

impl PeriodChange {
    /// Percent change of a causal metric over the same pair of windows.
    pub fn causal_pct_change(&self, factor: CausalFactor) -> f64 {
        self.causal_pct[factor.index()]
    }
}

/// Computes the `L{n}` vs `t{n}` change for one fact row.
pub fn compute_change(row: &FactRow, horizon: Horizon, comparison: Comparison) -> PeriodChange {
    let latest = Period::latest(horizon);
    let baseline = Period::baseline(horizon, comparison);
    let delta = |metric: Metric| Delta::between(row.value(metric, latest), row.value(metric, baseline));

    let mut causal_pct = [0.0; CausalFactor::ALL.len()];
    for factor in CausalFactor::ALL {
        causal_pct[factor.index()] = delta(factor.metric()).pct_change;
    }

    PeriodChange {
        sales: delta(Metric::RetailSales),
        units: delta(Metric::UnitsSold),
        causal_pct,
    }
}

/// Trend-of-trend signal: `P4` sales minus `PP4` sales.
pub fn prior_trend_sales_change(row: &FactRow) -> f64 {
    row.value(Metric::RetailSales, Period::P4) - row.value(Metric::RetailSales, Period::PP4)
}

/// Fills every horizon/comparison change and the trend-of-trend signal.
pub fn apply_deltas(rows: &mut [FactRow]) {
    for row in rows.iter_mut() {
        for horizon in Horizon::ALL {
            for comparison in Comparison::ALL {
                let change = compute_change(row, horizon, comparison);
                row.derived.changes.insert((horizon, comparison), change);
            }
        }
        row.derived.p4_vs_pp4_sales_abs_chg = prior_trend_sales_change(row);
    }
}
