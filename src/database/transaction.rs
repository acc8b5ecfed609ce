use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, warn};

use super::manager::DatabaseError;

/// An open atomic unit of work.
///
/// Exactly one of `commit`/`rollback` consumes the scope. A scope dropped
/// without either is rolled back by the driver, so every path that does not
/// reach a successful commit leaves the store untouched.
#[async_trait]
pub trait TxScope: Send + Sized {
    async fn commit(self) -> Result<(), DatabaseError>;

    /// Never fails from the caller's point of view; a failed rollback is logged.
    async fn rollback(self);
}

/// Hands out transaction scopes.
#[async_trait]
pub trait TransactionCoordinator: Send + Sync {
    type Scope: TxScope;

    async fn begin(&self) -> Result<Self::Scope, DatabaseError>;
}

#[derive(Clone)]
pub struct PgCoordinator {
    pool: PgPool,
}

impl PgCoordinator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionCoordinator for PgCoordinator {
    type Scope = PgScope;

    async fn begin(&self) -> Result<PgScope, DatabaseError> {
        let tx = self.pool.begin().await?;
        debug!("Transaction scope opened");
        Ok(PgScope { tx })
    }
}

pub struct PgScope {
    tx: Transaction<'static, Postgres>,
}

impl PgScope {
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut *self.tx
    }
}

#[async_trait]
impl TxScope for PgScope {
    async fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        debug!("Transaction scope committed");
        Ok(())
    }

    async fn rollback(self) {
        match self.tx.rollback().await {
            Ok(()) => debug!("Transaction scope rolled back"),
            Err(e) => warn!(error = %e, "Transaction rollback failed"),
        }
    }
}
