//! API error types with HTTP response mapping.
//!
//! Every error response carries a stable `message` plus a structured
//! `details` object keyed to the offending field or request fragment.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::orders::OrderUpdateError;
use domain::ComposeError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest {
        message: String,
        details: serde_json::Value,
    },
    /// Uniqueness conflict on an update path.
    Forbidden {
        message: String,
        details: serde_json::Value,
    },
    /// Internal server error.
    Internal(String),
}

impl ApiError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::NotFound(what.into())
    }

    pub fn bad_request(message: impl Into<String>, details: serde_json::Value) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            details,
        }
    }

    /// Maps a store error on an update path: uniqueness conflicts come
    /// back as 403 instead of the 400 used on create paths.
    pub fn from_store_update(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateItem { ref fields } => ApiError::Forbidden {
                message: err.to_string(),
                details: serde_json::json!({ "fields": fields }),
            },
            other => other.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, serde_json::json!({})),
            ApiError::BadRequest { message, details } => {
                (StatusCode::BAD_REQUEST, message, details)
            }
            ApiError::Forbidden { message, details } => (StatusCode::FORBIDDEN, message, details),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    msg,
                    serde_json::json!({}),
                )
            }
        };

        let body = serde_json::json!({ "message": message, "details": details });
        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateItem { ref fields } => ApiError::BadRequest {
                message: err.to_string(),
                details: serde_json::json!({ "fields": fields }),
            },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ComposeError> for ApiError {
    fn from(err: ComposeError) -> Self {
        match err {
            ComposeError::Store(store_err) => store_err.into(),
            other => ApiError::BadRequest {
                details: other.detail(),
                message: other.to_string(),
            },
        }
    }
}

impl From<OrderUpdateError> for ApiError {
    fn from(err: OrderUpdateError) -> Self {
        match err {
            OrderUpdateError::InvalidStatus(err) => ApiError::BadRequest {
                message: "invalid order status".to_string(),
                details: serde_json::json!({
                    "status": err.token,
                    "allowed": err.allowed,
                }),
            },
            OrderUpdateError::Store(store_err) => store_err.into(),
        }
    }
}
