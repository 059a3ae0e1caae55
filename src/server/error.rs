//! HTTP error responses.

use crate::provider::ProviderError;
use crate::session::SessionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use playground_core::GraphError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
    pub message: String,
    pub code: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFound",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::ProviderUnavailable(_) => "ProviderUnavailable",
            ApiError::InternalError(_) => "InternalError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ApiErrorResponse {
            error: self.error_type().to_string(),
            message: self.to_string(),
            code: self.code().to_string(),
        };

        if status.is_server_error() {
            tracing::error!(?body, "API error");
        } else {
            tracing::debug!(?body, "API error");
        }

        (status, Json(body)).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(_) => ApiError::NotFound(err.to_string()),
            SessionError::UnknownModel(_) => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::MissingCredential { .. } => ApiError::ProviderUnavailable(err.to_string()),
            ProviderError::UnknownModelIndex { .. } => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<GraphError> for ApiError {
    fn from(err: GraphError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}
