use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::{conn, filter_for, Entity, Repository};
use crate::database::manager::DatabaseError;
use crate::database::models::{Monster, MonsterCategory, MonsterType, MonsterTypeMapping};
use crate::database::query_builder::{self, Conn};
use crate::database::store::MonsterStore;
use crate::database::transaction::PgScope;
use crate::filter::{Filter, Join, Preload, QueryDescriptor, SqlResult};

/// A type row tagged with the monster it was loaded for.
#[derive(FromRow)]
struct TypeLink {
    monster_id: Uuid,
    id: Uuid,
    name: String,
}

const TYPE_LINK_MONSTER_IN: &str = "map.monster_id IN (?)";

#[async_trait]
impl Entity for Monster {
    const TABLE: &'static str = Monster::TABLE;
    const ID_EQ: &'static str = Monster::ID_EQ;

    async fn load_relations(
        rows: &mut [Monster],
        query: &QueryDescriptor,
        pool: &PgPool,
    ) -> Result<(), DatabaseError> {
        if query.preloads(Preload::Category) {
            let mut ids: Vec<Uuid> = rows.iter().map(|m| m.monster_category_id).collect();
            ids.sort_unstable();
            ids.dedup();

            let q = QueryDescriptor::new()
                .select(Preload::Category.columns())
                .where_in(MonsterCategory::ID_IN, ids);
            let sql = filter_for(MonsterCategory::TABLE, &q)?.to_sql()?;
            let categories: HashMap<Uuid, MonsterCategory> =
                query_builder::fetch_all::<MonsterCategory>(Conn::Pool(pool), &sql)
                    .await?
                    .into_iter()
                    .map(|c| (c.id, c))
                    .collect();

            for monster in rows.iter_mut() {
                monster.monster_category = categories.get(&monster.monster_category_id).cloned();
            }
        }

        if query.preloads(Preload::Types) {
            let ids: Vec<Uuid> = rows.iter().map(|m| m.id).collect();
            let mut columns: Vec<&'static str> = Preload::Types.columns().to_vec();
            columns.push("map.monster_id");

            let q = QueryDescriptor::new()
                .select(&columns)
                .join(Join::TypeMonsterMapping)
                .where_in(TYPE_LINK_MONSTER_IN, ids)
                .order_by("name", Default::default());
            let sql = filter_for(MonsterType::TABLE, &q)?.to_sql()?;
            let links = query_builder::fetch_all::<TypeLink>(Conn::Pool(pool), &sql).await?;

            let mut by_monster: HashMap<Uuid, Vec<MonsterType>> = HashMap::new();
            for link in links {
                by_monster
                    .entry(link.monster_id)
                    .or_default()
                    .push(MonsterType { id: link.id, name: link.name });
            }
            for monster in rows.iter_mut() {
                monster.monster_types = by_monster.remove(&monster.id).unwrap_or_default();
            }
        }

        Ok(())
    }
}

#[async_trait]
impl MonsterStore for Repository<Monster> {
    async fn last_assigned_code(&self, mut scope: Option<&mut PgScope>) -> Result<u16, DatabaseError> {
        // Held until the surrounding transaction ends
        let lock = SqlResult {
            query: "SELECT pg_advisory_xact_lock(hashtext('monsters.monster_code'))".to_string(),
            params: vec![],
        };
        query_builder::execute(conn(&self.pool, scope.as_deref_mut()), &lock).await?;

        let max = SqlResult {
            query: "SELECT COALESCE(MAX(monster_code), 0)::BIGINT AS count FROM monsters".to_string(),
            params: vec![],
        };
        let code = query_builder::fetch_count(conn(&self.pool, scope), &max).await?;
        u16::try_from(code)
            .map_err(|_| DatabaseError::QueryError(format!("monster code {} out of range", code)))
    }

    async fn create_mappings(
        &self,
        mappings: &[MonsterTypeMapping],
        scope: Option<&mut PgScope>,
    ) -> Result<(), DatabaseError> {
        if mappings.is_empty() {
            return Ok(());
        }
        let rows: Vec<_> = mappings.iter().map(MonsterTypeMapping::to_changeset).collect();
        let sql = Filter::new(MonsterTypeMapping::TABLE)?.to_insert_many_sql(&rows)?;
        let inserted = query_builder::execute(conn(&self.pool, scope), &sql).await?;
        debug!(inserted, "Created monster type mappings");
        Ok(())
    }

    async fn delete_mappings(&self, monster_id: Uuid, scope: Option<&mut PgScope>) -> Result<u64, DatabaseError> {
        // Mapping rows have no deleted_at; they are removed outright.
        let q = QueryDescriptor::new()
            .where_eq(MonsterTypeMapping::MONSTER_ID_EQ, monster_id)
            .with_deleted();
        let sql = filter_for(MonsterTypeMapping::TABLE, &q)?.to_delete_sql()?;
        query_builder::execute(conn(&self.pool, scope), &sql).await
    }
}
