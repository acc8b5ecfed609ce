// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::Value;

use crate::api::{envelope, Meta};
use crate::auth::AuthError;
use crate::config;
use crate::database::DatabaseError;
use crate::services::{ErrorClass, ServiceError};

/// HTTP API error: client-safe message plus internal detail for `debug_param`
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest { message: String, detail: String },

    // 401 Unauthorized
    Unauthorized { message: String, detail: String },

    // 500 Internal Server Error
    InternalServerError { message: String, detail: String },
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest { .. } => 400,
            ApiError::Unauthorized { .. } => 401,
            ApiError::InternalServerError { .. } => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message, .. }
            | ApiError::Unauthorized { message, .. }
            | ApiError::InternalServerError { message, .. } => message,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            ApiError::BadRequest { detail, .. }
            | ApiError::Unauthorized { detail, .. }
            | ApiError::InternalServerError { detail, .. } => detail,
        }
    }

    /// Convert to the response envelope. The internal detail is only
    /// exposed when `expose_detail` is set.
    pub fn to_json(&self, expose_detail: bool) -> Value {
        let debug = if expose_detail { self.detail() } else { "" };
        let meta = Meta::new(self.status_code(), self.message(), debug);
        envelope(&meta, None, Value::Null)
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>, detail: impl ToString) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            detail: detail.to_string(),
        }
    }

    pub fn unauthorized(detail: impl ToString) -> Self {
        ApiError::Unauthorized {
            message: "unauthorized".to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn internal_server_error(message: impl Into<String>, detail: impl ToString) -> Self {
        ApiError::InternalServerError {
            message: message.into(),
            detail: detail.to_string(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        err.log();
        match err.class {
            ErrorClass::Client => ApiError::bad_request(err.message, err.detail),
            ErrorClass::Server => ApiError::internal_server_error(err.message, err.detail),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        if err.is_not_found() {
            return ApiError::bad_request("record not found", err);
        }
        // Don't expose internal SQL errors to clients
        tracing::error!("Database error: {}", err);
        ApiError::internal_server_error("database error occurred", err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        tracing::warn!("Authentication failed: {}", err);
        ApiError::unauthorized(err)
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = self.to_json(config::config().is_development());
        (status, Json(body)).into_response()
    }
}
