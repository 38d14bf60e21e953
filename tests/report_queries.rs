use chrono::{Duration, NaiveDate};
use sales_analytics::{
    EngineConfig, EntityKey, FactQueries, FactTable, Metric, SalesRecord,
};
use serde_json::Value;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn record(owner: &str, brand: &str, weeks_before: i64, sales: f64) -> SalesRecord {
    SalesRecord::new(
        1,
        as_of() - Duration::weeks(weeks_before),
        EntityKey::new(owner, brand, "Dog Food", "Total Pet").unwrap(),
    )
    .with(Metric::RetailSales, sales)
    .with(Metric::TotalTraffic, sales / 10.0)
}

fn table() -> FactTable {
    FactTable::build(&[
        record("POST HOLDINGS INC", "Alpha", 0, 3000.0),
        record("POST HOLDINGS INC", "Alpha", 5, 1000.0),
        record("POST HOLDINGS INC", "Alpha", 9, 4000.0),
        record("RIVAL", "Beta", 0, 800.0),
        record("RIVAL", "Beta", 5, 1000.0),
        record("RIVAL", "Beta", 52, 400.0),
    ])
}

#[test]
fn performance_summary_json_contract() {
    let table = table();
    let config = EngineConfig::default();
    let json = serde_json::to_value(FactQueries::new(&table, &config).performance_summary()).unwrap();

    let focus = &json["focus_brand_summary"][0];
    assert_eq!(focus["Brand"], "Alpha");
    assert_eq!(focus["Category"], "Dog Food");
    assert_eq!(focus["L4_vs_P4_Sales_AbsChg"], 2000.0);
    assert_eq!(focus["L1_vs_P1_Sales_AbsChg"], 3000.0);
    assert_eq!(focus["P4_vs_PP4_Sales_AbsChg"], -3000.0);
    assert_eq!(focus["L4_vs_Y4_Sales_AbsChg"], 3000.0);

    let competitor = &json["competitor_summary"][0];
    assert_eq!(competitor["Brand"], "Beta");
    assert_eq!(competitor["L4_vs_P4_Sales_AbsChg"], -200.0);
    assert_eq!(competitor["ContributionToCategoryChange"], -200.0 / 1800.0);
    assert_eq!(competitor.as_object().unwrap().len(), 5);
}

#[test]
fn category_summary_json_contract() {
    let table = table();
    let config = EngineConfig::default();
    let json = serde_json::to_value(FactQueries::new(&table, &config).category_summary()).unwrap();

    assert_eq!(
        json,
        serde_json::json!([{
            "Supercategory": "Total Pet",
            "L4_vs_P4_Sales_Change": 1800.0,
            "L4_vs_Y4_Sales_Change": 3400.0
        }])
    );
}

#[test]
fn diagnostics_json_contract() {
    let table = table();
    let config = EngineConfig::default();
    let diagnostics = FactQueries::new(&table, &config).brand_diagnostics("Alpha", "Dog Food");
    let json: Value = serde_json::to_value(&diagnostics).unwrap();

    let focus = &json["focus_brand_diagnostics"];
    for period in ["L4", "L13", "L26"] {
        assert!(focus["PriceVolumeDecomposition"][period].is_object(), "{period}");
        for factor in ["Total Traffic", "Paid Ad Spend", "Buy Box - Rate"] {
            assert!(focus["CausalFactors"][factor][period].is_object(), "{factor} {period}");
        }
    }

    let traffic = &focus["CausalFactors"]["Total Traffic"]["L4"];
    assert_eq!(traffic["Current Period Value"], 300.0);
    assert_eq!(traffic["% Chg vs Prev"], 2.0);
    assert_eq!(traffic["Interpretation"], "Increased");
    assert_eq!(focus["PriceVolumeDecomposition"]["L4"]["Residual"], 2000.0);

    let competitor = &json["competitor_details"][0];
    assert_eq!(competitor["Brand"], "Beta");
    assert_eq!(competitor["L4 Sales"], 800.0);
    assert_eq!(competitor["L4 vs Y4 Sales % Chg"], 1.0);
}

#[test]
fn flattened_fact_rows_carry_entity_and_columns() {
    let table = table();
    let rows = serde_json::to_value(table.to_flat_rows()).unwrap();
    let alpha = &rows[0];

    assert_eq!(alpha["Brand Owner"], "POST HOLDINGS INC");
    assert_eq!(alpha["Supercategory"], "Total Pet");
    assert_eq!(alpha["Retail_Sales_PP4"], 4000.0);
    assert_eq!(alpha["Total_Traffic_L4_vs_P4_PctChg"], 2.0);
    assert_eq!(alpha["L4_PriceVolume_Residual"], 2000.0);
}
