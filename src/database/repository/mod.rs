mod monster;
mod user;

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{MonsterCategory, MonsterType};
use crate::database::query_builder::{self, Conn};
use crate::database::store::EntityStore;
use crate::database::transaction::PgScope;
use crate::filter::{Changeset, Filter, QueryDescriptor};

/// Table binding plus the hook that resolves eager-loaded relations.
#[async_trait]
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin + 'static {
    const TABLE: &'static str;
    const ID_EQ: &'static str;

    async fn load_relations(
        _rows: &mut [Self],
        _query: &QueryDescriptor,
        _pool: &PgPool,
    ) -> Result<(), DatabaseError> {
        Ok(())
    }
}

impl Entity for MonsterCategory {
    const TABLE: &'static str = MonsterCategory::TABLE;
    const ID_EQ: &'static str = MonsterCategory::ID_EQ;
}

impl Entity for MonsterType {
    const TABLE: &'static str = MonsterType::TABLE;
    const ID_EQ: &'static str = MonsterType::ID_EQ;
}

/// Postgres-backed `EntityStore` for any `Entity`.
pub struct Repository<T> {
    pool: PgPool,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

impl<T> Repository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: PhantomData,
        }
    }
}

pub(crate) fn filter_for(table: &str, query: &QueryDescriptor) -> Result<Filter, DatabaseError> {
    let mut filter = Filter::new(table)?;
    filter.assign(query)?;
    Ok(filter)
}

pub(crate) fn conn<'a>(pool: &'a PgPool, scope: Option<&'a mut PgScope>) -> Conn<'a> {
    match scope {
        Some(scope) => Conn::Tx(scope.conn()),
        None => Conn::Pool(pool),
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for Repository<T> {
    type Scope = PgScope;

    async fn find(&self, id: Uuid, query: &QueryDescriptor) -> Result<T, DatabaseError> {
        let query = query.clone().where_eq(T::ID_EQ, id);
        let sql = filter_for(T::TABLE, &query)?.to_sql()?;
        let mut row = query_builder::fetch_optional::<T>(Conn::Pool(&self.pool), &sql)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {}", T::TABLE, id)))?;
        T::load_relations(std::slice::from_mut(&mut row), &query, &self.pool).await?;
        Ok(row)
    }

    async fn first(&self, query: &QueryDescriptor) -> Result<Option<T>, DatabaseError> {
        let query = query.clone().limit(1, None);
        let mut rows = self.list(&query).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
    }

    async fn list(&self, query: &QueryDescriptor) -> Result<Vec<T>, DatabaseError> {
        let sql = filter_for(T::TABLE, query)?.to_sql()?;
        let mut rows = query_builder::fetch_all::<T>(Conn::Pool(&self.pool), &sql).await?;
        if !query.preload.is_empty() && !rows.is_empty() {
            T::load_relations(&mut rows, query, &self.pool).await?;
        }
        Ok(rows)
    }

    async fn count(&self, query: &QueryDescriptor) -> Result<i64, DatabaseError> {
        let sql = filter_for(T::TABLE, query)?.to_count_sql()?;
        query_builder::fetch_count(Conn::Pool(&self.pool), &sql).await
    }

    async fn create(&self, row: &Changeset, scope: Option<&mut PgScope>) -> Result<Uuid, DatabaseError> {
        let sql = Filter::new(T::TABLE)?.to_insert_sql(row)?;
        query_builder::insert_returning_id(conn(&self.pool, scope), &sql).await
    }

    async fn update(
        &self,
        filter: &QueryDescriptor,
        changes: &Changeset,
        scope: Option<&mut PgScope>,
    ) -> Result<u64, DatabaseError> {
        // Empty changeset is a no-op write.
        if changes.is_empty() {
            return Ok(0);
        }
        let sql = filter_for(T::TABLE, filter)?.to_update_sql(changes)?;
        query_builder::execute(conn(&self.pool, scope), &sql).await
    }

    async fn soft_delete(&self, filter: &QueryDescriptor, scope: Option<&mut PgScope>) -> Result<u64, DatabaseError> {
        let sql = filter_for(T::TABLE, filter)?.to_soft_delete_sql()?;
        query_builder::execute(conn(&self.pool, scope), &sql).await
    }
}
