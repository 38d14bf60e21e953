//! CSV ingestion for the retailer weekly export.
//!
//! Expected headers (extra columns are ignored):
//!   Retailer ID, Week Ending, Brand Owner, Brand, PCB_Category,
//!   PCB_Supercategory, Retail Sales, Units Sold, In-Stock Rate,
//!   Weeks On-Hand, Buy Box - Rate, Total Traffic, Paid Ad Spend,
//!   Retail Price, Organic Traffic

use crate::config::RecordScope;
use crate::entity_key::EntityKey;
use crate::sales_record::{DataSourceError, SalesDataSource, SalesRecord};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

#[derive(Debug, Deserialize)]
struct RawSalesRow {
    #[serde(rename = "Retailer ID")]
    retailer_id: Option<u32>,
    #[serde(rename = "Week Ending")]
    week_ending: String,
    #[serde(rename = "Brand Owner")]
    brand_owner: Option<String>,
    #[serde(rename = "Brand")]
    brand: Option<String>,
    #[serde(rename = "PCB_Category")]
    category: Option<String>,
    #[serde(rename = "PCB_Supercategory")]
    supercategory: Option<String>,
    #[serde(rename = "Retail Sales")]
    retail_sales: Option<f64>,
    #[serde(rename = "Units Sold")]
    units_sold: Option<f64>,
    #[serde(rename = "In-Stock Rate")]
    in_stock_rate: Option<f64>,
    #[serde(rename = "Weeks On-Hand")]
    weeks_on_hand: Option<f64>,
    #[serde(rename = "Buy Box - Rate")]
    buy_box_rate: Option<f64>,
    #[serde(rename = "Total Traffic")]
    total_traffic: Option<f64>,
    #[serde(rename = "Paid Ad Spend")]
    paid_ad_spend: Option<f64>,
    #[serde(rename = "Retail Price")]
    retail_price: Option<f64>,
    #[serde(rename = "Organic Traffic")]
    organic_traffic: Option<f64>,
}

/// Parses a week-ending cell. Accepts ISO dates, US-style `m/d/Y`, and
/// timestamps that start with an ISO date.
pub fn parse_week_ending(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%m/%d/%Y"))
        .ok()
        .or_else(|| {
            value
                .get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

impl RawSalesRow {
    /// Retailer of a row that can be attributed to an entity; `None` when
    /// the retailer or any key cell is blank.
    fn attributable_retailer(&self) -> Option<u32> {
        let keys = [
            &self.brand_owner,
            &self.brand,
            &self.category,
            &self.supercategory,
        ];
        if keys.into_iter().any(is_blank) {
            return None;
        }
        self.retailer_id
    }

    fn into_record(self, retailer_id: u32, line: usize) -> Result<SalesRecord, DataSourceError> {
        let week_ending =
            parse_week_ending(&self.week_ending).ok_or_else(|| DataSourceError::InvalidRecord {
                line,
                message: format!("unparseable week ending {:?}", self.week_ending),
            })?;
        let key = EntityKey::new(
            self.brand_owner.unwrap_or_default(),
            self.brand.unwrap_or_default(),
            self.category.unwrap_or_default(),
            self.supercategory.unwrap_or_default(),
        )
        .map_err(|e| DataSourceError::InvalidRecord {
            line,
            message: e.to_string(),
        })?;

        let cell = |value: Option<f64>| value.unwrap_or(f64::NAN);
        Ok(SalesRecord {
            retailer_id,
            week_ending,
            key,
            retail_sales: cell(self.retail_sales),
            units_sold: cell(self.units_sold),
            in_stock_rate: cell(self.in_stock_rate),
            weeks_on_hand: cell(self.weeks_on_hand),
            buy_box_rate: cell(self.buy_box_rate),
            total_traffic: cell(self.total_traffic),
            paid_ad_spend: cell(self.paid_ad_spend),
            retail_price: cell(self.retail_price),
            organic_traffic: cell(self.organic_traffic),
        })
    }
}

/// Loads in-scope sales records from a CSV reader.
///
/// Rows without an organic-traffic value, rows with a blank retailer or
/// key cell, and rows outside `scope` are dropped before any other
/// validation. Reported line numbers are the physical line a record
/// starts on.
pub fn load_sales_records<R: Read>(
    reader: R,
    scope: &RecordScope,
) -> Result<Vec<SalesRecord>, DataSourceError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut records = Vec::new();
    let mut no_organic_traffic = 0usize;
    let mut unattributable = 0usize;
    let mut out_of_scope = 0usize;
    let mut raw = csv::StringRecord::new();
    while csv_reader.read_record(&mut raw)? {
        let line = raw.position().map_or(0, |pos| pos.line() as usize);
        let row: RawSalesRow = raw.deserialize(Some(&headers))?;

        if row.organic_traffic.is_none() {
            no_organic_traffic += 1;
            continue;
        }
        let Some(retailer_id) = row.attributable_retailer() else {
            trace!(line, "skipping row with blank retailer or key cell");
            unattributable += 1;
            continue;
        };
        let supercategory = row.supercategory.as_deref().unwrap_or_default();
        if !scope.admits(retailer_id, supercategory) {
            out_of_scope += 1;
            continue;
        }
        records.push(row.into_record(retailer_id, line)?);
    }

    if unattributable > 0 {
        warn!(unattributable, "dropped rows with a blank retailer or entity key cell");
    }
    debug!(
        kept = records.len(),
        no_organic_traffic,
        unattributable,
        out_of_scope,
        "parsed sales CSV"
    );
    Ok(records)
}

/// CSV file record source.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    path: PathBuf,
    scope: RecordScope,
}

impl CsvDataSource {
    pub fn new(path: impl AsRef<Path>, scope: RecordScope) -> Self {
        CsvDataSource {
            path: path.as_ref().to_path_buf(),
            scope,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SalesDataSource for CsvDataSource {
    fn load_records(&self) -> Result<Vec<SalesRecord>, DataSourceError> {
        let file = std::fs::File::open(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DataSourceError::NotFound(self.path.display().to_string())
            } else {
                DataSourceError::Io(e)
            }
        })?;
        let records = load_sales_records(file, &self.scope)?;
        info!(
            path = %self.path.display(),
            records = records.len(),
            "loaded sales records from CSV"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Retailer ID,Week Ending,Brand Owner,Brand,PCB_Category,PCB_Supercategory,Retail Sales,Units Sold,In-Stock Rate,Weeks On-Hand,Buy Box - Rate,Total Traffic,Paid Ad Spend,Retail Price,Organic Traffic\n";

    fn csv_with(rows: &[&str]) -> String {
        let mut data = HEADER.to_string();
        for row in rows {
            data.push_str(row);
            data.push('\n');
        }
        data
    }

    #[test]
    fn test_parse_week_ending_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(parse_week_ending("2024-06-01"), Some(expected));
        assert_eq!(parse_week_ending("6/1/2024"), Some(expected));
        assert_eq!(parse_week_ending("2024-06-01 00:00:00"), Some(expected));
        assert_eq!(parse_week_ending("June 1st"), None);
    }

    #[test]
    fn test_load_parses_all_columns() {
        let data = csv_with(&[
            "1,2024-06-01,ACME,Crunchy,Dog Food,Total Pet,1200.5,100,0.95,3.5,0.9,5000,250,12.0,4000",
        ]);
        let records = load_sales_records(data.as_bytes(), &RecordScope::default()).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.key.brand_owner, "ACME");
        assert_eq!(record.key.category, "Dog Food");
        assert_eq!(record.retail_sales, 1200.5);
        assert_eq!(record.units_sold, 100.0);
        assert_eq!(record.buy_box_rate, 0.9);
        assert_eq!(record.retail_price, 12.0);
        assert_eq!(record.organic_traffic, 4000.0);
    }

    #[test]
    fn test_load_drops_missing_organic_traffic_and_out_of_scope_rows() {
        let data = csv_with(&[
            "1,2024-06-01,ACME,Crunchy,Dog Food,Total Pet,100,10,1,1,1,1,1,10,",
            "2,2024-06-01,ACME,Crunchy,Dog Food,Total Pet,100,10,1,1,1,1,1,10,5",
            "1,2024-06-01,ACME,Crunchy,Cereal,Grocery,100,10,1,1,1,1,1,10,5",
            "1,2024-06-01,ACME,Crunchy,Dog Food,Total Pet,100,10,1,1,1,1,1,10,5",
        ]);
        let records = load_sales_records(data.as_bytes(), &RecordScope::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].retailer_id, 1);
    }

    #[test]
    fn test_blank_metric_becomes_nan() {
        let data = csv_with(&["1,2024-06-01,ACME,Crunchy,Dog Food,Total Pet,,10,1,1,1,1,1,10,5"]);
        let records = load_sales_records(data.as_bytes(), &RecordScope::default()).unwrap();
        assert!(records[0].retail_sales.is_nan());
    }

    #[test]
    fn test_invalid_date_reports_line() {
        let data = csv_with(&[
            "1,2024-06-01,ACME,Crunchy,Dog Food,Total Pet,1,1,1,1,1,1,1,1,1",
            "1,not-a-date,ACME,Crunchy,Dog Food,Total Pet,1,1,1,1,1,1,1,1,1",
        ]);
        let result = load_sales_records(data.as_bytes(), &RecordScope::default());
        assert!(matches!(
            result,
            Err(DataSourceError::InvalidRecord { line: 3, .. })
        ));
    }

    #[test]
    fn test_blank_retailer_or_key_cell_drops_row() {
        let data = csv_with(&[
            "1,2024-06-01,ACME,Crunchy,Dog Food,Total Pet,100,10,1,1,1,1,1,10,5",
            "1,2024-06-01,ACME,,Dog Food,Total Pet,100,10,1,1,1,1,1,10,5",
            ",2024-06-01,ACME,Crunchy,Dog Food,Total Pet,100,10,1,1,1,1,1,10,5",
            "1,2024-06-01,,Crunchy,Dog Food,Total Pet,100,10,1,1,1,1,1,10,5",
            "1,2024-06-01,ACME,Crunchy,  ,Total Pet,100,10,1,1,1,1,1,10,5",
            "1,2024-06-01,ACME,Crunchy,Dog Food,,100,10,1,1,1,1,1,10,5",
        ]);
        let records = load_sales_records(data.as_bytes(), &RecordScope::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key.brand, "Crunchy");
    }

    #[test]
    fn test_blank_key_rows_are_dropped_before_date_validation() {
        let data = csv_with(&[
            "1,2024-06-01,ACME,Crunchy,Dog Food,Total Pet,100,10,1,1,1,1,1,10,5",
            "1,garbage,ACME,,Dog Food,Total Pet,100,10,1,1,1,1,1,10,5",
        ]);
        let records = load_sales_records(data.as_bytes(), &RecordScope::default()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_invalid_date_line_skips_blank_lines() {
        let data = csv_with(&[
            "1,2024-06-01,ACME,Crunchy,Dog Food,Total Pet,1,1,1,1,1,1,1,1,1",
            "",
            "1,not-a-date,ACME,Crunchy,Dog Food,Total Pet,1,1,1,1,1,1,1,1,1",
        ]);
        let result = load_sales_records(data.as_bytes(), &RecordScope::default());
        assert!(matches!(
            result,
            Err(DataSourceError::InvalidRecord { line: 4, .. })
        ));
    }

    #[test]
    fn test_invalid_date_line_counts_multiline_fields() {
        let data = csv_with(&[
            "1,2024-06-01,ACME,\"Crunchy\nBites\",Dog Food,Total Pet,1,1,1,1,1,1,1,1,1",
            "1,not-a-date,ACME,Crunchy,Dog Food,Total Pet,1,1,1,1,1,1,1,1,1",
        ]);
        let result = load_sales_records(data.as_bytes(), &RecordScope::default());
        assert!(matches!(
            result,
            Err(DataSourceError::InvalidRecord { line: 4, .. })
        ));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let source = CsvDataSource::new("/nonexistent/sales.csv", RecordScope::default());
        assert!(matches!(
            source.load_records(),
            Err(DataSourceError::NotFound(_))
        ));
    }
}
