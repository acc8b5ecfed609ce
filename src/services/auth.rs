use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::outcome::{with_deadline, Outcome, ServiceError, ServiceResult};
use crate::auth::{generate_jwt, verify_password, Claims};
use crate::database::models::User;
use crate::database::EntityStore;
use crate::filter::{Preload, QueryDescriptor};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginToken {
    pub token: String,
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, req: LoginRequest) -> ServiceResult<LoginToken>;
}

pub struct AuthService<U> {
    users: U,
    jwt_secret: String,
    jwt_expiry_hours: u64,
    deadline: Duration,
}

impl<U: EntityStore<User>> AuthService<U> {
    pub fn new(users: U, jwt_secret: impl Into<String>, jwt_expiry_hours: u64, deadline: Duration) -> Self {
        Self {
            users,
            jwt_secret: jwt_secret.into(),
            jwt_expiry_hours,
            deadline,
        }
    }

    async fn login_inner(&self, req: LoginRequest) -> Result<LoginToken, ServiceError> {
        let query = QueryDescriptor::new()
            .select(&["id", "encrypted_password", "role_id"])
            .where_eq(User::EMAIL_EQ, req.email.as_str())
            .preload(Preload::Role)
            .preload(Preload::RolePermissions);

        let user = self
            .users
            .first(&query)
            .await
            .map_err(|e| ServiceError::server("failed to get user", e))?
            .ok_or_else(|| ServiceError::client("email or password is incorrect", "no user with this email"))?;

        let matches = verify_password(&req.password, &user.encrypted_password)
            .map_err(|e| ServiceError::client("email or password is incorrect", e))?;
        if !matches {
            return Err(ServiceError::client("email or password is incorrect", "password mismatch"));
        }

        let permission = user.role.map(|r| r.permissions).unwrap_or_default();
        let claims = Claims::new(user.id, user.role_id, permission, self.jwt_expiry_hours);
        let token =
            generate_jwt(&claims, &self.jwt_secret).map_err(|e| ServiceError::server("failed to generate token", e))?;

        debug!(user_id = %user.id, "Issued token");
        Ok(LoginToken { token })
    }
}

#[async_trait]
impl<U: EntityStore<User> + 'static> Authenticator for AuthService<U> {
    async fn login(&self, req: LoginRequest) -> ServiceResult<LoginToken> {
        let token = with_deadline(self.deadline, self.login_inner(req)).await?;
        Ok(Outcome::ok(token, "login successfully"))
    }
}
