//! HTTP error surface.
//!
//! Lower layers return typed errors; this is where they become status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::service::ServiceError;

/// Errors a handler can answer with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("resource not found")]
    NotFound,

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("store error: {0}")]
    Store(sqlx::Error),

    /// The OS context was expected in request extensions but was absent.
    #[error("OS information not found in context")]
    ContextMissing,
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound => ApiError::NotFound,
            ServiceError::Store(e) => ApiError::Store(e),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Store(_) | ApiError::ContextMissing => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Store(ref e) => {
                // Store details stay in the log.
                tracing::error!(error = %e, "Store operation failed");
                (
                    status,
                    Json(serde_json::json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
            ApiError::ContextMissing => (status, self.to_string()).into_response(),
            _ => (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response(),
        }
    }
}
