// handlers/protected/monster.rs - permission-gated monster writes
//
// POST /api/v1/monster        (write_monster)
// PUT /api/v1/monster/:id     (update_monster)
// DELETE /api/v1/monster/:id  (delete_monster)

use axum::extract::{Multipart, Path, State};

use crate::handlers::form::{monster_id, MonsterForm};
use crate::handlers::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::MonsterId;

pub async fn monster_post(State(state): State<AppState>, multipart: Multipart) -> ApiResult<MonsterId> {
    let req = MonsterForm::read(multipart).await?.into_create(&state.images)?;
    Ok(ApiResponse::from(state.writer.create(req).await?))
}

/// Only fields present in the form are considered for the update.
pub async fn monster_put(State(state): State<AppState>, Path(id): Path<String>, multipart: Multipart) -> ApiResult<()> {
    let id = monster_id(&id)?;
    let req = MonsterForm::read(multipart).await?.into_update(&state.images)?;
    Ok(ApiResponse::from(state.writer.update(id, req).await?))
}

pub async fn monster_delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let id = monster_id(&id)?;
    Ok(ApiResponse::from(state.writer.delete(id).await?))
}
