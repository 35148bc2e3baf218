use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::BlockedAppsError;
use domain::services::{AggregationError, RefreshError, SnapshotError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg.clone(),
            ),
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<AggregationError> for ApiError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::InvalidRange { .. } => ApiError::Validation(err.to_string()),
            AggregationError::SourceUnavailable(_) => ApiError::ServiceUnavailable(err.to_string()),
            AggregationError::PackageResolutionFailed { .. }
            | AggregationError::NetworkQueryFailed { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Superseded { .. } => ApiError::Conflict(err.to_string()),
            RefreshError::Aggregation(inner) => inner.into(),
        }
    }
}

impl From<SnapshotError> for ApiError {
    fn from(err: SnapshotError) -> Self {
        ApiError::ServiceUnavailable(err.to_string())
    }
}

impl From<BlockedAppsError> for ApiError {
    fn from(err: BlockedAppsError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<validator::ValidationError> for ApiError {
    fn from(err: validator::ValidationError) -> Self {
        let message = err
            .message
            .map(|m| m.to_string())
            .unwrap_or_else(|| err.code.to_string());
        ApiError::Validation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::services::SourceError;

    #[test]
    fn test_api_error_not_found() {
        let response = ApiError::NotFound("no report".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_api_error_internal_hides_message() {
        let response = ApiError::Internal("secret".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_invalid_range_maps_to_bad_request() {
        let err: ApiError = AggregationError::InvalidRange {
            start: 1000,
            end: 500,
        }
        .into();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_superseded_maps_to_conflict() {
        let err: ApiError = RefreshError::Superseded { generation: 3 }.into();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_source_unavailable_maps_to_service_unavailable() {
        let err: ApiError = RefreshError::Aggregation(AggregationError::SourceUnavailable(
            SourceError::PermissionDenied,
        ))
        .into();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_validation_error_message_used() {
        let err: ApiError = shared::validation::validate_range_days(0).unwrap_err().into();
        assert_eq!(
            err.to_string(),
            "Validation error: Range must cover between 1 and 365 days"
        );
    }
}
