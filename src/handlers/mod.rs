// handlers/mod.rs - Two-tier handler layout
//
// Public (no token) → Protected (bearer token carrying a named permission)

pub mod form;
pub mod protected;
pub mod public;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::ImageConfig;
use crate::database::HealthProbe;
use crate::middleware::{require_permission, PermissionGate};
use crate::services::{Authenticator, CatalogReader, MonsterReader, MonsterWriter};

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn Authenticator>,
    pub catalog: Arc<dyn CatalogReader>,
    pub reader: Arc<dyn MonsterReader>,
    pub writer: Arc<dyn MonsterWriter>,
    pub health: Arc<dyn HealthProbe>,
    pub images: Arc<ImageConfig>,
    pub jwt_secret: Arc<str>,
}

pub const WRITE_MONSTER: &str = "write_monster";
pub const UPDATE_MONSTER: &str = "update_monster";
pub const DELETE_MONSTER: &str = "delete_monster";

pub fn router(state: AppState, enable_cors: bool) -> Router {
    let gate = |permission: &'static str| {
        from_fn_with_state(PermissionGate::new(state.jwt_secret.clone(), permission), require_permission)
    };

    let api = Router::new()
        .route("/auth/login", post(public::login_post))
        .route("/monster-category", get(public::category_list))
        .route("/monster-type", get(public::type_list))
        .route(
            "/monster",
            post(protected::monster_post)
                .route_layer(gate(WRITE_MONSTER))
                .get(public::monster_list),
        )
        .route(
            "/monster/:id",
            put(protected::monster_put)
                .route_layer(gate(UPDATE_MONSTER))
                .merge(delete(protected::monster_delete).route_layer(gate(DELETE_MONSTER)))
                .get(public::monster_get),
        )
        .route("/monster/captured/:id", put(public::monster_captured_put))
        .nest_service("/monster/images", ServeDir::new(&state.images.dir))
        // Multipart bodies must fit an image at the size limit plus form fields.
        .layer(DefaultBodyLimit::max(state.images.max_bytes.saturating_mul(2)));

    let app = Router::new()
        .route("/health", get(public::health))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}
