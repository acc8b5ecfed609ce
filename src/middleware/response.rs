use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::api::{envelope, Meta, Pagination};
use crate::error::ApiError;
use crate::services::Outcome;

/// Wrapper for API responses that adds the `{ meta, pagination?, data }` envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: StatusCode,
    pub message: String,
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            status_code: StatusCode::OK,
            message: message.into(),
            pagination: None,
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::CREATED,
            ..Self::success(data, message)
        }
    }

    pub fn with_pagination(mut self, pagination: Option<Pagination>) -> Self {
        self.pagination = pagination;
        self
    }
}

impl<T: Serialize> From<Outcome<T>> for ApiResponse<T> {
    fn from(outcome: Outcome<T>) -> Self {
        Self {
            data: outcome.data,
            status_code: StatusCode::from_u16(outcome.code).unwrap_or(StatusCode::OK),
            message: outcome.message.to_string(),
            pagination: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let data = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return ApiError::internal_server_error("failed to serialize response data", e).into_response();
            }
        };

        let meta = Meta::new(self.status_code.as_u16(), self.message, "");
        (self.status_code, Json(envelope(&meta, self.pagination.as_ref(), data))).into_response()
    }
}

// Convenience type alias
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;
