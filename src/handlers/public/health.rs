// handlers/public/health.rs - GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use crate::api::{envelope, Meta};
use crate::handlers::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = Utc::now();

    match state.health.ping().await {
        Ok(()) => {
            let meta = Meta::new(200, "ok", "");
            (StatusCode::OK, Json(envelope(&meta, None, json!({ "status": "ok", "timestamp": now, "database": "ok" }))))
        }
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            let meta = Meta::new(503, "database unavailable", "");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(envelope(&meta, None, json!({ "status": "degraded", "timestamp": now }))),
            )
        }
    }
}
