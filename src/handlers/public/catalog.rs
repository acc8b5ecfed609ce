// handlers/public/catalog.rs - GET /api/v1/monster-category, GET /api/v1/monster-type

use axum::extract::State;

use crate::database::models::{MonsterCategory, MonsterType};
use crate::handlers::AppState;
use crate::middleware::{ApiResponse, ApiResult};

pub async fn category_list(State(state): State<AppState>) -> ApiResult<Vec<MonsterCategory>> {
    Ok(ApiResponse::from(state.catalog.list_categories().await?))
}

pub async fn type_list(State(state): State<AppState>) -> ApiResult<Vec<MonsterType>> {
    Ok(ApiResponse::from(state.catalog.list_types().await?))
}
