// handlers/public/monster.rs - ungated monster routes
//
// GET /api/v1/monster, GET /api/v1/monster/:id, PUT /api/v1/monster/captured/:id

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::handlers::form::{monster_id, type_ids_from};
use crate::handlers::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{MonsterDetail, MonsterListItem, MonsterListQuery};

/// GET /api/v1/monster/:id
pub async fn monster_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<MonsterDetail> {
    let id = monster_id(&id)?;
    Ok(ApiResponse::from(state.reader.get_by_id(id).await?))
}

/// GET /api/v1/monster
///
/// Query: `sort_by`, `order_by`, `name`, `monster_type_id[i]`, `is_caught`,
/// and optionally `page` / `per_page`.
pub async fn monster_list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<MonsterListItem>> {
    let query = list_query(&params)?;
    let outcome = state.reader.list(query).await?;
    let page = outcome.data;
    Ok(ApiResponse::success(page.items, outcome.message).with_pagination(page.pagination))
}

fn list_query(params: &HashMap<String, String>) -> Result<MonsterListQuery, ApiError> {
    let number = |name: &str| -> Result<Option<i64>, ApiError> {
        match params.get(name).map(|s| s.trim()).filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e| ApiError::bad_request("failed to binds the request body", format!("{}: {}", name, e))),
            None => Ok(None),
        }
    };

    Ok(MonsterListQuery {
        sort_by: params.get("sort_by").cloned(),
        order_by: params.get("order_by").cloned(),
        name: params.get("name").cloned(),
        monster_type_ids: type_ids_from(params)?,
        is_caught: params.get("is_caught").cloned(),
        page: number("page")?,
        per_page: number("per_page")?,
    })
}

#[derive(Debug, Deserialize)]
pub struct CapturedRequest {
    pub is_caught: bool,
}

/// PUT /api/v1/monster/captured/:id
pub async fn monster_captured_put(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CapturedRequest>, JsonRejection>,
) -> ApiResult<()> {
    let id = monster_id(&id)?;
    let Json(req) = payload.map_err(|e| ApiError::bad_request("failed to binds the request body", e))?;
    Ok(ApiResponse::from(state.writer.update_captured(id, req.is_caught).await?))
}
