use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{extract_jwt_from_headers, validate_jwt, Claims};
use crate::error::ApiError;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub role_id: Uuid,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            role_id: claims.role_id,
        }
    }
}

/// Middleware state: the signing secret and the permission a route needs.
#[derive(Clone)]
pub struct PermissionGate {
    secret: Arc<str>,
    permission: &'static str,
}

impl PermissionGate {
    pub fn new(secret: Arc<str>, permission: &'static str) -> Self {
        Self { secret, permission }
    }
}

/// JWT middleware: validates the bearer token, requires the gate's
/// permission in its claims, and injects `AuthUser` into the request.
pub async fn require_permission(
    State(gate): State<PermissionGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = validate_jwt(extract_jwt_from_headers(request.headers())?, &gate.secret)?;

    if !claims.has_permission(gate.permission) {
        tracing::warn!(user_id = %claims.id, permission = gate.permission, "Permission denied");
        return Err(ApiError::unauthorized(format!("missing permission {}", gate.permission)));
    }

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}
