use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::filter::FilterError;

/// Vendor-neutral classification of an integrity-constraint failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    ForeignKey,
    Unique,
    Other,
}

impl ConstraintKind {
    /// Maps a SQLSTATE of class 23 (integrity constraint violation).
    pub fn from_sqlstate(code: &str) -> Option<Self> {
        if !code.starts_with("23") {
            return None;
        }
        Some(match code {
            "23503" => ConstraintKind::ForeignKey,
            "23505" => ConstraintKind::Unique,
            _ => ConstraintKind::Other,
        })
    }
}

/// Errors from the store layer. Callers branch on the variant, never on the
/// driver's message text.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation ({kind:?}): {message}")]
    Constraint {
        kind: ConstraintKind,
        constraint: Option<String>,
        message: String,
    },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    QueryError(String),
}

impl DatabaseError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, DatabaseError::Constraint { kind: ConstraintKind::ForeignKey, .. })
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db) => {
                let kind = db.code().as_deref().and_then(ConstraintKind::from_sqlstate);
                match kind {
                    Some(kind) => DatabaseError::Constraint {
                        kind,
                        constraint: db.constraint().map(str::to_string),
                        message: db.message().to_string(),
                    },
                    None => DatabaseError::QueryError(db.message().to_string()),
                }
            }
            sqlx::Error::PoolTimedOut => DatabaseError::Timeout("connection pool timed out".to_string()),
            sqlx::Error::PoolClosed => DatabaseError::Connection("connection pool closed".to_string()),
            sqlx::Error::Io(e) => DatabaseError::Connection(e.to_string()),
            sqlx::Error::Tls(e) => DatabaseError::Connection(e.to_string()),
            other => DatabaseError::QueryError(other.to_string()),
        }
    }
}

impl From<FilterError> for DatabaseError {
    fn from(err: FilterError) -> Self {
        DatabaseError::QueryError(err.to_string())
    }
}

/// Owns the bounded connection pool shared by every store.
#[derive(Clone)]
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections.min(config.max_connections))
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(url)
            .await?;

        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Created database pool"
        );
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

/// Liveness check used by the health route.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;
}

#[async_trait]
impl HealthProbe for DatabaseManager {
    async fn ping(&self) -> Result<(), DatabaseError> {
        self.health_check().await
    }
}
