use async_trait::async_trait;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{Monster, MonsterTypeMapping};
use super::transaction::TxScope;
use crate::filter::{Changeset, QueryDescriptor};

/// Data access for one entity type.
///
/// Mutations take an optional scope: with `Some`, the statement runs inside
/// that transaction; with `None`, it runs on its own.
#[async_trait]
pub trait EntityStore<T>: Send + Sync {
    type Scope: TxScope;

    /// `NotFound` when no live row has this id.
    async fn find(&self, id: Uuid, query: &QueryDescriptor) -> Result<T, DatabaseError>;

    async fn first(&self, query: &QueryDescriptor) -> Result<Option<T>, DatabaseError>;

    async fn list(&self, query: &QueryDescriptor) -> Result<Vec<T>, DatabaseError>;

    /// Rows `list` would return, ignoring limit and offset.
    async fn count(&self, query: &QueryDescriptor) -> Result<i64, DatabaseError>;

    async fn create(&self, row: &Changeset, scope: Option<&mut Self::Scope>) -> Result<Uuid, DatabaseError>;

    async fn update(
        &self,
        filter: &QueryDescriptor,
        changes: &Changeset,
        scope: Option<&mut Self::Scope>,
    ) -> Result<u64, DatabaseError>;

    async fn soft_delete(&self, filter: &QueryDescriptor, scope: Option<&mut Self::Scope>) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait MonsterStore: EntityStore<Monster> {
    /// Highest code ever assigned, soft-deleted rows included; 0 when empty.
    /// Inside a scope this also serializes concurrent code assignment until
    /// the scope ends.
    async fn last_assigned_code(&self, scope: Option<&mut Self::Scope>) -> Result<u16, DatabaseError>;

    async fn create_mappings(
        &self,
        mappings: &[MonsterTypeMapping],
        scope: Option<&mut Self::Scope>,
    ) -> Result<(), DatabaseError>;

    async fn delete_mappings(&self, monster_id: Uuid, scope: Option<&mut Self::Scope>) -> Result<u64, DatabaseError>;
}
