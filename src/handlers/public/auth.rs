// handlers/public/auth.rs - POST /api/v1/auth/login

use axum::{extract::State, Json};

use crate::error::ApiError;
use crate::handlers::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{LoginRequest, LoginToken};

/// Exchange email and password for a signed token.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, axum::extract::rejection::JsonRejection>,
) -> ApiResult<LoginToken> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request("failed to binds the request body", e))?;
    let outcome = state.auth.login(req).await?;
    Ok(ApiResponse::from(outcome))
}
