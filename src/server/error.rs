//! Error types for the REST API server

use crate::sales_record::DataSourceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// The record source could not be read
    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::InvalidParameter(_) => (StatusCode::BAD_REQUEST, "InvalidParameter"),
            ApiError::DataSource(_) => (StatusCode::SERVICE_UNAVAILABLE, "DataSourceUnavailable"),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "error": error_type,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_is_bad_request() {
        let response = ApiError::InvalidParameter("brand is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn data_source_error_is_unavailable() {
        let err: ApiError = DataSourceError::InvalidRecord {
            line: 2,
            message: "bad date".to_string(),
        }
        .into();
        assert!(err.to_string().contains("line 2"));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
