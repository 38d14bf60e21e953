use sales_analytics::csv_source::load_sales_records;
use sales_analytics::{
    CsvDataSource, EngineConfig, FactQueries, FactRepository, Horizon, Metric, Period,
    RecordScope,
};
use std::path::PathBuf;

const HEADER: &str = "Retailer ID,Week Ending,Brand Owner,Brand,PCB_Category,PCB_Supercategory,\
Retail Sales,Units Sold,In-Stock Rate,Weeks On-Hand,Buy Box - Rate,Total Traffic,Paid Ad Spend,\
Retail Price,Organic Traffic";

/// Four latest weeks and four prior weeks for two brands in one category,
/// plus rows the loader must drop: no organic traffic, out of scope, or a
/// blank retailer or key cell.
fn export() -> String {
    let mut lines = vec![HEADER.to_string()];
    let latest = ["2024-06-01", "2024-05-25", "2024-05-18", "2024-05-11"];
    let prior = ["2024-05-04", "2024-04-27", "2024-04-20", "2024-04-13"];

    for week in latest {
        lines.push(format!(
            "1,{week},POST HOLDINGS INC,Alpha,Dog Food,Total Pet,3300,300,0.95,4,0.9,1200,50,11,400"
        ));
        lines.push(format!(
            "1,{week},RIVAL CO,Beta,Dog Food,Total Pet,900,100,,3,0.8,500,,9,100"
        ));
    }
    for week in prior {
        lines.push(format!(
            "1,{week},POST HOLDINGS INC,Alpha,Dog Food,Total Pet,2500,250,0.97,5,0.85,1000,40,10,350"
        ));
        lines.push(format!(
            "1,{week},RIVAL CO,Beta,Dog Food,Total Pet,1000,100,0.9,3,0.8,600,20,10,100"
        ));
    }

    // Missing organic traffic, another retailer, another supercategory.
    lines.push("1,2024-06-01,RIVAL CO,Ghost,Dog Food,Total Pet,99999,1,,,,,,,".to_string());
    lines.push("2,2024-06-01,RIVAL CO,Beta,Dog Food,Total Pet,99999,1,,,,,,,5".to_string());
    lines.push("1,2024-06-01,RIVAL CO,Oats,Cereal,Grocery,99999,1,,,,,,,5".to_string());
    // Blank brand, blank retailer.
    lines.push("1,2024-06-01,RIVAL CO,,Dog Food,Total Pet,99999,1,,,,,,,5".to_string());
    lines.push(",2024-06-01,RIVAL CO,Beta,Dog Food,Total Pet,99999,1,,,,,,,5".to_string());
    lines.join("\n")
}

fn temp_csv(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{name}-{}.csv", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn loader_applies_scope_and_organic_traffic_filter() {
    let records = load_sales_records(export().as_bytes(), &RecordScope::default()).unwrap();
    assert_eq!(records.len(), 16);
    assert!(records.iter().all(|r| r.key.brand != "Ghost" && r.retailer_id == 1));
    // Blank cells stay NaN until aggregation skips them.
    assert!(records
        .iter()
        .any(|r| r.key.brand == "Beta" && r.metric(Metric::InStockRate).is_nan()));
}

#[test]
fn csv_file_through_repository_and_queries() {
    let path = temp_csv("sales-pipeline", &export());
    let config = EngineConfig::default();
    let repository = FactRepository::from_source(CsvDataSource::new(&path, config.scope()));

    let table = repository.build().unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(table.len(), 2);

    let alpha = table.find_brand("Alpha", "Dog Food").unwrap();
    assert_eq!(alpha.value(Metric::RetailSales, Period::L4), 13_200.0);
    assert_eq!(alpha.value(Metric::RetailSales, Period::P4), 10_000.0);
    assert_eq!(alpha.value(Metric::RetailPrice, Period::L4), 11.0);
    assert!((alpha.value(Metric::InStockRate, Period::L4) - 0.95).abs() < 1e-9);

    // Beta's in-stock cells were blank in the latest weeks.
    let beta = table.find_brand("Beta", "Dog Food").unwrap();
    assert_eq!(beta.value(Metric::InStockRate, Period::L4), 0.0);
    assert_eq!(beta.value(Metric::PaidAdSpend, Period::L4), 0.0);

    let decomposition = alpha.decomposition(Horizon::FourWeeks);
    assert_eq!(decomposition.total_change, 3200.0);
    assert_eq!(decomposition.price_effect, 1200.0);
    assert_eq!(decomposition.volume_effect, 2000.0);

    let queries = FactQueries::new(&table, &config);
    let summary = queries.performance_summary();
    assert_eq!(summary.focus_brand_summary.len(), 1);
    assert_eq!(summary.focus_brand_summary[0].l4_vs_p4_sales_abs_chg, 3200.0);
    assert_eq!(summary.competitor_summary.len(), 1);
    let beta_share = summary.competitor_summary[0].contribution_to_category_change;
    assert!((beta_share + 400.0 / 2800.0).abs() < 1e-9);
}

#[test]
fn missing_csv_file_is_no_data() {
    let path = std::env::temp_dir().join("sales-analytics-does-not-exist.csv");
    let repository =
        FactRepository::from_source(CsvDataSource::new(&path, RecordScope::default()));

    let table = repository.build().unwrap();
    assert!(table.is_empty());
    let config = EngineConfig::default();
    assert!(FactQueries::new(&table, &config).category_summary().is_empty());
}

#[test]
fn malformed_week_ending_is_reported_with_line() {
    let csv = format!(
        "{HEADER}\n1,2024-06-01,ACME,Alpha,Dog Food,Total Pet,1,1,1,1,1,1,1,1,1\n\
         1,not-a-date,ACME,Alpha,Dog Food,Total Pet,1,1,1,1,1,1,1,1,1"
    );
    let path = temp_csv("sales-malformed", &csv);
    let repository =
        FactRepository::from_source(CsvDataSource::new(&path, RecordScope::default()));

    let err = repository.build().unwrap_err();
    std::fs::remove_file(&path).unwrap();
    assert!(err.to_string().contains("line 3"), "{err}");
    assert!(!repository.is_built());
}

#[test]
fn blank_key_rows_do_not_fail_the_build() {
    let csv = format!(
        "{HEADER}\n1,2024-06-01,ACME,Alpha,Dog Food,Total Pet,100,10,1,1,1,1,1,10,5\n\
         1,2024-06-01,ACME,Alpha,,Total Pet,100,10,1,1,1,1,1,10,5\n\
         ,2024-06-01,ACME,Alpha,Dog Food,Total Pet,100,10,1,1,1,1,1,10,5\n\
         1,2024-06-01,,Gamma,Dog Food,Total Pet,100,10,1,1,1,1,1,10,5"
    );
    let path = temp_csv("sales-blank-keys", &csv);
    let repository =
        FactRepository::from_source(CsvDataSource::new(&path, RecordScope::default()));

    let table = repository.build().unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(table.len(), 1);
    let alpha = table.find_brand("Alpha", "Dog Food").unwrap();
    assert_eq!(alpha.value(Metric::RetailSales, Period::L4), 100.0);
}

#[test]
fn malformed_week_ending_line_counts_multiline_fields() {
    let csv = format!(
        "{HEADER}\n1,2024-06-01,ACME,\"Alpha\nPremium\",Dog Food,Total Pet,1,1,1,1,1,1,1,1,1\n\n\
         1,not-a-date,ACME,Alpha,Dog Food,Total Pet,1,1,1,1,1,1,1,1,1"
    );
    let path = temp_csv("sales-multiline", &csv);
    let repository =
        FactRepository::from_source(CsvDataSource::new(&path, RecordScope::default()));

    let err = repository.build().unwrap_err();
    std::fs::remove_file(&path).unwrap();
    assert!(err.to_string().contains("line 5"), "{err}");
}
