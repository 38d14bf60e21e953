//! Read-only query facade over a finished [`FactTable`].
//!
//! Output structs serialize with the field names reporting consumers rely
//! on; values are raw numbers with no presentation formatting.

use crate::analytics::deltas::CausalFactor;
use crate::analytics::fact_table::{FactRow, FactTable};
use crate::analytics::periods::{Comparison, Horizon, Period};
use crate::config::EngineConfig;
use crate::sales_record::Metric;
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::debug;

/// Maximum competitor rows in the performance summary and diagnostics.
pub const TOP_COMPETITORS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    #[serde(rename = "Supercategory")]
    pub supercategory: String,
    #[serde(rename = "L4_vs_P4_Sales_Change")]
    pub l4_vs_p4_sales_change: f64,
    #[serde(rename = "L4_vs_Y4_Sales_Change")]
    pub l4_vs_y4_sales_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusBrandSummary {
    #[serde(rename = "Brand")]
    pub brand: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "L1_vs_P1_Sales_AbsChg")]
    pub l1_vs_p1_sales_abs_chg: f64,
    #[serde(rename = "L4_vs_P4_Sales_AbsChg")]
    pub l4_vs_p4_sales_abs_chg: f64,
    #[serde(rename = "L13_vs_P13_Sales_AbsChg")]
    pub l13_vs_p13_sales_abs_chg: f64,
    #[serde(rename = "L26_vs_P26_Sales_AbsChg")]
    pub l26_vs_p26_sales_abs_chg: f64,
    #[serde(rename = "L4_vs_Y4_Sales_AbsChg")]
    pub l4_vs_y4_sales_abs_chg: f64,
    #[serde(rename = "P4_vs_PP4_Sales_AbsChg")]
    pub p4_vs_pp4_sales_abs_chg: f64,
}

impl From<&FactRow> for FocusBrandSummary {
    fn from(row: &FactRow) -> Self {
        let prior = |horizon| row.sales_abs_change(horizon, Comparison::Prior);
        FocusBrandSummary {
            brand: row.key.brand.clone(),
            category: row.key.category.clone(),
            l1_vs_p1_sales_abs_chg: prior(Horizon::OneWeek),
            l4_vs_p4_sales_abs_chg: prior(Horizon::FourWeeks),
            l13_vs_p13_sales_abs_chg: prior(Horizon::ThirteenWeeks),
            l26_vs_p26_sales_abs_chg: prior(Horizon::TwentySixWeeks),
            l4_vs_y4_sales_abs_chg: row.sales_abs_change(Horizon::FourWeeks, Comparison::YearAgo),
            p4_vs_pp4_sales_abs_chg: row.derived().p4_vs_pp4_sales_abs_chg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitorSummary {
    #[serde(rename = "Brand")]
    pub brand: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "L4_vs_P4_Sales_AbsChg")]
    pub l4_vs_p4_sales_abs_chg: f64,
    #[serde(rename = "L13_vs_P13_Sales_AbsChg")]
    pub l13_vs_p13_sales_abs_chg: f64,
    #[serde(rename = "ContributionToCategoryChange")]
    pub contribution_to_category_change: f64,
}

impl From<&FactRow> for CompetitorSummary {
    fn from(row: &FactRow) -> Self {
        CompetitorSummary {
            brand: row.key.brand.clone(),
            category: row.key.category.clone(),
            l4_vs_p4_sales_abs_chg: row.sales_abs_change(Horizon::FourWeeks, Comparison::Prior),
            l13_vs_p13_sales_abs_chg: row
                .sales_abs_change(Horizon::ThirteenWeeks, Comparison::Prior),
            contribution_to_category_change: row.contribution().to_category_change,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub focus_brand_summary: Vec<FocusBrandSummary>,
    pub competitor_summary: Vec<CompetitorSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecompositionDetail {
    #[serde(rename = "Total Change")]
    pub total_change: f64,
    #[serde(rename = "Price Effect")]
    pub price_effect: f64,
    #[serde(rename = "Volume Effect")]
    pub volume_effect: f64,
    #[serde(rename = "Price Effect % of Change")]
    pub price_effect_share: f64,
    #[serde(rename = "Volume Effect % of Change")]
    pub volume_effect_share: f64,
    #[serde(rename = "Residual")]
    pub residual: f64,
}

/// Direction of a causal metric over the prior window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Increased,
    Decreased,
}

impl Trend {
    /// Zero counts as a decrease.
    pub fn from_pct_change(pct_change: f64) -> Self {
        if pct_change > 0.0 {
            Trend::Increased
        } else {
            Trend::Decreased
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CausalFactorDetail {
    #[serde(rename = "Current Period Value")]
    pub current_value: f64,
    #[serde(rename = "% Chg vs Prev")]
    pub pct_change_vs_prior: f64,
    #[serde(rename = "% Chg vs YA")]
    pub pct_change_vs_year_ago: f64,
    #[serde(rename = "Interpretation")]
    pub interpretation: Trend,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FocusBrandDiagnostics {
    #[serde(
        rename = "PriceVolumeDecomposition",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub price_volume_decomposition: BTreeMap<Period, DecompositionDetail>,
    #[serde(rename = "CausalFactors", skip_serializing_if = "BTreeMap::is_empty")]
    pub causal_factors: BTreeMap<CausalFactor, BTreeMap<Period, CausalFactorDetail>>,
}

impl FocusBrandDiagnostics {
    pub fn is_empty(&self) -> bool {
        self.price_volume_decomposition.is_empty() && self.causal_factors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitorDetail {
    #[serde(rename = "Brand")]
    pub brand: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "L4 Sales")]
    pub l4_sales: f64,
    #[serde(rename = "L4 vs P4 Sales % Chg")]
    pub l4_vs_p4_sales_pct_chg: f64,
    #[serde(rename = "L4 vs Y4 Sales % Chg")]
    pub l4_vs_y4_sales_pct_chg: f64,
    #[serde(rename = "L4 Contribution to Category Change")]
    pub contribution_to_category_change: f64,
}

impl From<&FactRow> for CompetitorDetail {
    fn from(row: &FactRow) -> Self {
        CompetitorDetail {
            brand: row.key.brand.clone(),
            category: row.key.category.clone(),
            l4_sales: row.value(Metric::RetailSales, Period::L4),
            l4_vs_p4_sales_pct_chg: row
                .change(Horizon::FourWeeks, Comparison::Prior)
                .sales
                .pct_change,
            l4_vs_y4_sales_pct_chg: row
                .change(Horizon::FourWeeks, Comparison::YearAgo)
                .sales
                .pct_change,
            contribution_to_category_change: row.contribution().to_category_change,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BrandDiagnostics {
    pub focus_brand_diagnostics: FocusBrandDiagnostics,
    pub competitor_details: Vec<CompetitorDetail>,
}

impl BrandDiagnostics {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.focus_brand_diagnostics.is_empty() && self.competitor_details.is_empty()
    }
}

/// Borrowing view that answers the three report queries.
#[derive(Debug, Clone, Copy)]
pub struct FactQueries<'a> {
    table: &'a FactTable,
    config: &'a EngineConfig,
}

impl<'a> FactQueries<'a> {
    pub fn new(table: &'a FactTable, config: &'a EngineConfig) -> Self {
        FactQueries { table, config }
    }

    /// L4 vs P4 and L4 vs Y4 sales changes summed per supercategory,
    /// ordered by supercategory name.
    pub fn category_summary(&self) -> Vec<CategorySummary> {
        let mut totals: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
        for row in self.table.rows() {
            let entry = totals.entry(row.key.supercategory.as_str()).or_default();
            entry.0 += row.sales_abs_change(Horizon::FourWeeks, Comparison::Prior);
            entry.1 += row.sales_abs_change(Horizon::FourWeeks, Comparison::YearAgo);
        }

        totals
            .into_iter()
            .map(|(supercategory, (vs_prior, vs_year_ago))| CategorySummary {
                supercategory: supercategory.to_string(),
                l4_vs_p4_sales_change: vs_prior,
                l4_vs_y4_sales_change: vs_year_ago,
            })
            .collect()
    }

    pub fn performance_summary(&self) -> PerformanceSummary {
        let (mut focus, mut competitors): (Vec<&FactRow>, Vec<&FactRow>) = self
            .table
            .rows()
            .iter()
            .partition(|row| self.config.is_focus_owner(&row.key.brand_owner));

        sort_by_abs_desc(&mut focus, |row| {
            row.sales_abs_change(Horizon::FourWeeks, Comparison::Prior)
        });

        let threshold = self.config.competitor_contribution_threshold;
        competitors.retain(|row| row.contribution().to_category_change.abs() >= threshold);
        sort_by_abs_desc(&mut competitors, |row| {
            row.sales_abs_change(Horizon::FourWeeks, Comparison::Prior)
        });
        competitors.truncate(TOP_COMPETITORS);

        debug!(
            focus = focus.len(),
            competitors = competitors.len(),
            threshold,
            "performance summary"
        );

        PerformanceSummary {
            focus_brand_summary: focus.into_iter().map(FocusBrandSummary::from).collect(),
            competitor_summary: competitors.into_iter().map(CompetitorSummary::from).collect(),
        }
    }

    /// Decomposition and causal trends for one (brand, category) pair plus
    /// the leading non-focus competitors in that category.
    ///
    /// An unmatched pair yields [`BrandDiagnostics::empty`].
    pub fn brand_diagnostics(&self, brand: &str, category: &str) -> BrandDiagnostics {
        let Some(row) = self.table.find_brand(brand, category) else {
            debug!(brand, category, "no entity matches diagnostics request");
            return BrandDiagnostics::empty();
        };

        let mut competitors: Vec<&FactRow> = self
            .table
            .rows()
            .iter()
            .filter(|other| {
                other.key.category == category && !self.config.is_focus_owner(&other.key.brand_owner)
            })
            .collect();
        sort_by_abs_desc(&mut competitors, |other| other.contribution().to_category_change);
        competitors.truncate(TOP_COMPETITORS);

        BrandDiagnostics {
            focus_brand_diagnostics: diagnose(row),
            competitor_details: competitors.into_iter().map(CompetitorDetail::from).collect(),
        }
    }
}

fn diagnose(row: &FactRow) -> FocusBrandDiagnostics {
    let mut diagnostics = FocusBrandDiagnostics::default();

    for horizon in Horizon::DECOMPOSED {
        let latest = Period::latest(horizon);
        let decomposition = row.decomposition(horizon);
        diagnostics.price_volume_decomposition.insert(
            latest,
            DecompositionDetail {
                total_change: decomposition.total_change,
                price_effect: decomposition.price_effect,
                volume_effect: decomposition.volume_effect,
                price_effect_share: decomposition.price_effect_share,
                volume_effect_share: decomposition.volume_effect_share,
                residual: decomposition.residual,
            },
        );

        let vs_prior = row.change(horizon, Comparison::Prior);
        let vs_year_ago = row.change(horizon, Comparison::YearAgo);
        for factor in CausalFactor::ALL {
            let pct_change_vs_prior = vs_prior.causal_pct_change(factor);
            diagnostics.causal_factors.entry(factor).or_default().insert(
                latest,
                CausalFactorDetail {
                    current_value: row.value(factor.metric(), latest),
                    pct_change_vs_prior,
                    pct_change_vs_year_ago: vs_year_ago.causal_pct_change(factor),
                    interpretation: Trend::from_pct_change(pct_change_vs_prior),
                },
            );
        }
    }

    diagnostics
}

/// Stable: ties keep entity-key order.
fn sort_by_abs_desc<F>(rows: &mut [&FactRow], value: F)
where
    F: Fn(&FactRow) -> f64,
{
    rows.sort_by_key(|row| Reverse(OrderedFloat(value(row).abs())));
}
