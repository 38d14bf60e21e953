use crate::entity_key::EntityKey;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Numeric measures carried by every weekly observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    RetailSales,
    UnitsSold,
    InStockRate,
    WeeksOnHand,
    BuyBoxRate,
    TotalTraffic,
    PaidAdSpend,
    RetailPrice,
}

/// How a metric collapses across the weeks of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Mean,
}

impl Metric {
    /// Every aggregated metric, in column order.
    pub const ALL: [Metric; 8] = [
        Metric::RetailSales,
        Metric::UnitsSold,
        Metric::InStockRate,
        Metric::WeeksOnHand,
        Metric::BuyBoxRate,
        Metric::TotalTraffic,
        Metric::PaidAdSpend,
        Metric::RetailPrice,
    ];

    /// Human-readable label, matching the retailer export headers.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::RetailSales => "Retail Sales",
            Metric::UnitsSold => "Units Sold",
            Metric::InStockRate => "In-Stock Rate",
            Metric::WeeksOnHand => "Weeks On-Hand",
            Metric::BuyBoxRate => "Buy Box - Rate",
            Metric::TotalTraffic => "Total Traffic",
            Metric::PaidAdSpend => "Paid Ad Spend",
            Metric::RetailPrice => "Retail Price",
        }
    }

    /// Volumes are summed across a window, rates and prices averaged.
    pub fn aggregation(&self) -> Aggregation {
        match self {
            Metric::RetailSales
            | Metric::UnitsSold
            | Metric::TotalTraffic
            | Metric::PaidAdSpend => Aggregation::Sum,
            Metric::InStockRate
            | Metric::WeeksOnHand
            | Metric::BuyBoxRate
            | Metric::RetailPrice => Aggregation::Mean,
        }
    }

    /// Position in [`Metric::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single weekly observation for one entity at one retailer.
///
/// Metric cells that were blank at ingestion are carried as `f64::NAN`
/// and skipped during aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub retailer_id: u32,
    pub week_ending: NaiveDate,
    pub key: EntityKey,
    pub retail_sales: f64,
    pub units_sold: f64,
    pub in_stock_rate: f64,
    pub weeks_on_hand: f64,
    pub buy_box_rate: f64,
    pub total_traffic: f64,
    pub paid_ad_spend: f64,
    pub retail_price: f64,
    pub organic_traffic: f64,
}

impl SalesRecord {
    /// Creates a record with every metric set to zero.
    pub fn new(retailer_id: u32, week_ending: NaiveDate, key: EntityKey) -> Self {
        SalesRecord {
            retailer_id,
            week_ending,
            key,
            retail_sales: 0.0,
            units_sold: 0.0,
            in_stock_rate: 0.0,
            weeks_on_hand: 0.0,
            buy_box_rate: 0.0,
            total_traffic: 0.0,
            paid_ad_spend: 0.0,
            retail_price: 0.0,
            organic_traffic: 0.0,
        }
    }

    /// Builder-style setter for a single metric.
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, value);
        self
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::RetailSales => self.retail_sales,
            Metric::UnitsSold => self.units_sold,
            Metric::InStockRate => self.in_stock_rate,
            Metric::WeeksOnHand => self.weeks_on_hand,
            Metric::BuyBoxRate => self.buy_box_rate,
            Metric::TotalTraffic => self.total_traffic,
            Metric::PaidAdSpend => self.paid_ad_spend,
            Metric::RetailPrice => self.retail_price,
        }
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        let slot = match metric {
            Metric::RetailSales => &mut self.retail_sales,
            Metric::UnitsSold => &mut self.units_sold,
            Metric::InStockRate => &mut self.in_stock_rate,
            Metric::WeeksOnHand => &mut self.weeks_on_hand,
            Metric::BuyBoxRate => &mut self.buy_box_rate,
            Metric::TotalTraffic => &mut self.total_traffic,
            Metric::PaidAdSpend => &mut self.paid_ad_spend,
            Metric::RetailPrice => &mut self.retail_price,
        };
        *slot = value;
    }
}

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Start date (inclusive)
    pub start: NaiveDate,
    /// End date (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new DateRange.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// True when `date` lies within the window, bounds included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Trait for record source abstraction.
///
/// The engine never validates provenance: implementations are expected to
/// return records already narrowed to the configured retailer and
/// supercategory scope, with a parseable week-ending date and a present
/// organic-traffic value.
pub trait SalesDataSource: Send + Sync {
    /// Loads the full historical record set.
    ///
    /// # Errors
    /// Returns [`DataSourceError::NotFound`] when the backing data does not
    /// exist, or another variant when it exists but cannot be read.
    fn load_records(&self) -> Result<Vec<SalesRecord>, DataSourceError>;
}

/// Errors that can occur when loading sales records.
#[derive(Debug, Error)]
pub enum DataSourceError {
    /// Backing data does not exist
    #[error("sales data not found: {0}")]
    NotFound(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid record at line {line}: {message}")]
    InvalidRecord { line: usize, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// In-memory record source, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    records: Vec<SalesRecord>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        InMemoryDataSource { records }
    }

    pub fn add_records(&mut self, records: impl IntoIterator<Item = SalesRecord>) {
        self.records.extend(records);
    }

    /// Clears all records from the source.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl SalesDataSource for InMemoryDataSource {
    fn load_records(&self) -> Result<Vec<SalesRecord>, DataSourceError> {
        Ok(self.records.clone())
    }
}
