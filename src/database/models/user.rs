use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct User {
    #[sqlx(default)]
    pub id: Uuid,
    #[sqlx(default)]
    pub name: String,
    #[sqlx(default)]
    pub email: String,
    #[sqlx(default)]
    #[serde(skip_serializing)]
    pub encrypted_password: String,
    #[sqlx(default)]
    pub role_id: Uuid,
    #[sqlx(default)]
    pub created_at: DateTime<Utc>,
    #[sqlx(default)]
    pub updated_at: DateTime<Utc>,

    #[sqlx(skip)]
    pub role: Option<Role>,
}

impl User {
    pub const TABLE: &'static str = "users";
    pub const ID_EQ: &'static str = "users.id = ?";
    pub const EMAIL_EQ: &'static str = "users.email = ?";
}

#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,

    #[sqlx(skip)]
    pub permissions: Vec<Permission>,
}

impl Role {
    pub const TABLE: &'static str = "roles";
    pub const ID_IN: &'static str = "roles.id IN (?)";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub action: String,

    /// Owning role when loaded through `role_permissions`
    #[sqlx(default)]
    #[serde(skip)]
    pub role_id: Uuid,
}

impl Permission {
    pub const TABLE: &'static str = "permissions";
    pub const ROLE_ID_IN: &'static str = "rp.role_id IN (?)";
}
