//! Mapping of routing failures onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pavepath_core::{CoreError, RoutingProviderError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl From<RoutingProviderError> for ApiError {
    fn from(err: RoutingProviderError) -> Self {
        ApiError::Core(err.into())
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Core(CoreError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "validation_error")
            }
            ApiError::Core(CoreError::EmptyRouteSummary) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "empty_route")
            }
            ApiError::Core(CoreError::RoutingProvider(RoutingProviderError::NotConfigured {
                ..
            })) => (StatusCode::SERVICE_UNAVAILABLE, "provider_not_configured"),
            ApiError::Core(CoreError::RoutingProvider(_)) => {
                (StatusCode::BAD_GATEWAY, "provider_error")
            }
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (
            status,
            Json(json!({
                "error": code,
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}
