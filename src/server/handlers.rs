//! HTTP request handlers for API endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::ApiError;
use super::state::AppState;
use crate::analytics::fact_table::FlatFactRow;
use crate::queries::{BrandDiagnostics, CategorySummary, FactQueries, PerformanceSummary};

/// Health check endpoint
///
/// Also reports whether a fact table is currently cached.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let repository = state.repository.read().await;
    Json(json!({
        "status": "ok",
        "fact_table_built": repository.is_built(),
    }))
}

/// GET /category-summary
pub async fn category_summary(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategorySummary>>, ApiError> {
    let table = state.table().await?;
    Ok(Json(FactQueries::new(&table, &state.config).category_summary()))
}

/// GET /performance-summary
pub async fn performance_summary(
    State(state): State<AppState>,
) -> Result<Json<PerformanceSummary>, ApiError> {
    let table = state.table().await?;
    Ok(Json(FactQueries::new(&table, &state.config).performance_summary()))
}

/// Query parameters for the diagnostics endpoint
#[derive(Debug, Deserialize)]
pub struct DiagnosticsParams {
    pub brand: Option<String>,
    pub category: Option<String>,
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::InvalidParameter(format!("{name} is required")))
}

/// GET /diagnostics?brand=...&category=...
///
/// An unknown pair is not an error: the body is the empty diagnostics
/// structure.
pub async fn brand_diagnostics(
    State(state): State<AppState>,
    Query(params): Query<DiagnosticsParams>,
) -> Result<Json<BrandDiagnostics>, ApiError> {
    let brand = required(params.brand, "brand")?;
    let category = required(params.category, "category")?;

    let table = state.table().await?;
    let diagnostics = FactQueries::new(&table, &state.config).brand_diagnostics(&brand, &category);
    Ok(Json(diagnostics))
}

/// Response for the flattened fact table
#[derive(Debug, Serialize)]
pub struct FactsResponse {
    pub as_of: Option<NaiveDate>,
    pub rows: Vec<FlatFactRow>,
}

/// GET /facts
pub async fn list_facts(State(state): State<AppState>) -> Result<Json<FactsResponse>, ApiError> {
    let table = state.table().await?;
    Ok(Json(FactsResponse {
        as_of: table.as_of(),
        rows: table.to_flat_rows(),
    }))
}

/// Response for a cache refresh
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub as_of: Option<NaiveDate>,
    pub entities: usize,
}

/// POST /refresh - Invalidate the cached table and rebuild from the source
pub async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, ApiError> {
    let table = state.rebuild().await?;
    tracing::info!(entities = table.len(), "fact table rebuilt on request");
    Ok(Json(RefreshResponse {
        as_of: table.as_of(),
        entities: table.len(),
    }))
}
