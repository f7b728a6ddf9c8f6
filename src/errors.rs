use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error category, e.g. "Validation Error" or "External API Error"
    pub error: String,
    /// Human-readable detail: a message, or a field → message map for validation errors
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request fields rejected by the HTTP layer, keyed by field name.
    #[error("Validation failed: {0:?}")]
    Validation(BTreeMap<String, String>),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The provider could not be reached or answered with a non-success status.
    #[error("{provider} request failed: {context}")]
    UpstreamTransport {
        provider: &'static str,
        status: Option<StatusCode>,
        context: String,
    },

    /// A successful provider response did not have the expected shape.
    #[error("{payload} data format error at '{path}': {cause}")]
    DataFormat {
        payload: &'static str,
        path: String,
        cause: String,
    },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub(crate) fn data_format(
        payload: &'static str,
        path: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        AppError::DataFormat {
            payload,
            path: path.into(),
            cause: cause.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Validation(fields) => {
                tracing::error!("Validation error: {:?}", fields);
                (
                    StatusCode::BAD_REQUEST,
                    "Validation Error",
                    serde_json::json!(fields),
                )
            }
            AppError::InvalidInput(msg) => {
                tracing::error!("Invalid input: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    "Invalid Input",
                    serde_json::json!(msg),
                )
            }
            AppError::UpstreamTransport {
                status: Some(status),
                ..
            } if status.is_client_error() => {
                tracing::error!("HTTP client error: {}", self);
                let reason = status.canonical_reason().unwrap_or("Unknown");
                (
                    *status,
                    "External API Error",
                    serde_json::json!(format!("{} - {}", status.as_u16(), reason)),
                )
            }
            AppError::UpstreamTransport { .. } => {
                tracing::error!("Upstream error: {}", self);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "External API Error",
                    serde_json::json!("Could not connect to external service"),
                )
            }
            AppError::DataFormat { .. } | AppError::Unexpected(_) => {
                tracing::error!("Unexpected error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server Error",
                    serde_json::json!("An unexpected error occurred"),
                )
            }
        };

        (
            status,
            axum::Json(ErrorResponse {
                error: error.to_string(),
                details,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 10_000)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_maps_to_400_with_fields() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "latitude".to_string(),
            "Latitude must be between -90 and 90 degrees".to_string(),
        );
        let response = AppError::Validation(fields).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Validation Error");
        assert!(json["details"]["latitude"].is_string());
    }

    #[tokio::test]
    async fn test_provider_client_error_keeps_status() {
        let response = AppError::UpstreamTransport {
            provider: "OpenWeatherMap",
            status: Some(StatusCode::NOT_FOUND),
            context: "city not found".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["error"], "External API Error");
        assert_eq!(json["details"], "404 - Not Found");
    }

    #[tokio::test]
    async fn test_provider_server_error_maps_to_503() {
        let response = AppError::UpstreamTransport {
            provider: "OpenWeatherMap",
            status: Some(StatusCode::BAD_GATEWAY),
            context: "bad gateway".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_connection_failure_maps_to_503() {
        let response = AppError::UpstreamTransport {
            provider: "ipgeolocation",
            status: None,
            context: "connection refused".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let json = body_json(response).await;
        assert_eq!(json["details"], "Could not connect to external service");
    }

    #[tokio::test]
    async fn test_data_format_is_not_leaked() {
        let response =
            AppError::data_format("current weather", "/main/temp", "missing field").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Server Error");
        assert!(!json.to_string().contains("/main/temp"));
    }

    #[test]
    fn test_data_format_display_names_path() {
        let err = AppError::data_format("forecast", "/daily/2/temp/min", "expected a number");
        assert_eq!(
            err.to_string(),
            "forecast data format error at '/daily/2/temp/min': expected a number"
        );
    }
}
