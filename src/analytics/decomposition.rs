//! First-order price/volume attribution of a sales change.
//!
//! `price = (P_L - P_P) * U_L`, `volume = (U_L - U_P) * P_P`.
//!
//! Weighting the price effect by latest units folds the interaction term
//! `(P_L - P_P) * (U_L - U_P)` into it; that term is reported separately as
//! `cross_term`, so `price + volume` exceeds the base-weighted first-order
//! sum by exactly `cross_term`. Whatever the two effects do not explain
//! (sales that are not mean price times units, e.g. mix across weeks) is
//! left in `residual` and never redistributed.

use crate::analytics::fact_table::FactRow;
use crate::analytics::periods::{Comparison, Horizon, Period};
use crate::analytics::primitives::safe_divide;
use crate::sales_record::Metric;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PriceVolumeDecomposition {
    /// `L{n}` vs `P{n}` sales change.
    pub total_change: f64,
    pub price_effect: f64,
    pub volume_effect: f64,
    pub price_effect_share: f64,
    pub volume_effect_share: f64,
    /// `(P_L - P_P) * (U_L - U_P)`, contained in `price_effect`.
    pub cross_term: f64,
    /// `total_change - price_effect - volume_effect`.
    pub residual: f64,
}

impl PriceVolumeDecomposition {
    pub fn from_components(
        total_change: f64,
        price_latest: f64,
        price_prior: f64,
        units_latest: f64,
        units_prior: f64,
    ) -> Self {
        let price_effect = (price_latest - price_prior) * units_latest;
        let volume_effect = (units_latest - units_prior) * price_prior;
        PriceVolumeDecomposition {
            total_change,
            price_effect,
            volume_effect,
            price_effect_share: safe_divide(price_effect, total_change),
            volume_effect_share: safe_divide(volume_effect, total_change),
            cross_term: (price_latest - price_prior) * (units_latest - units_prior),
            residual: total_change - price_effect - volume_effect,
        }
    }
}

/// Decomposes the `L{n}` vs `P{n}` sales change of one row.
pub fn decompose(row: &FactRow, horizon: Horizon) -> PriceVolumeDecomposition {
    let latest = Period::latest(horizon);
    let prior = Period::baseline(horizon, Comparison::Prior);
    let total_change =
        row.value(Metric::RetailSales, latest) - row.value(Metric::RetailSales, prior);

    PriceVolumeDecomposition::from_components(
        total_change,
        row.value(Metric::RetailPrice, latest),
        row.value(Metric::RetailPrice, prior),
        row.value(Metric::UnitsSold, latest),
        row.value(Metric::UnitsSold, prior),
    )
}

pub fn apply_decomposition(rows: &mut [FactRow]) {
    for row in rows.iter_mut() {
        for horizon in Horizon::DECOMPOSED {
            let decomposition = decompose(row, horizon);
            row.derived.decomposition.insert(horizon, decomposition);
        }
    }
}
