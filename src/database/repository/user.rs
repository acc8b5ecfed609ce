use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{filter_for, Entity};
use crate::database::manager::DatabaseError;
use crate::database::models::{Permission, Role, User};
use crate::database::query_builder::{self, Conn};
use crate::filter::{Join, Preload, QueryDescriptor};

#[async_trait]
impl Entity for User {
    const TABLE: &'static str = User::TABLE;
    const ID_EQ: &'static str = User::ID_EQ;

    async fn load_relations(rows: &mut [User], query: &QueryDescriptor, pool: &PgPool) -> Result<(), DatabaseError> {
        if !query.preloads(Preload::Role) {
            return Ok(());
        }

        let mut role_ids: Vec<Uuid> = rows.iter().map(|u| u.role_id).collect();
        role_ids.sort_unstable();
        role_ids.dedup();

        let q = QueryDescriptor::new()
            .select(Preload::Role.columns())
            .where_in(Role::ID_IN, role_ids.iter().copied());
        let sql = filter_for(Role::TABLE, &q)?.to_sql()?;
        let mut roles: HashMap<Uuid, Role> = query_builder::fetch_all::<Role>(Conn::Pool(pool), &sql)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        if query.preloads(Preload::RolePermissions) {
            let mut columns: Vec<&'static str> = Preload::RolePermissions.columns().to_vec();
            columns.push("rp.role_id");
            let q = QueryDescriptor::new()
                .select(&columns)
                .join(Join::PermissionRoleMapping)
                .where_in(Permission::ROLE_ID_IN, role_ids);
            let sql = filter_for(Permission::TABLE, &q)?.to_sql()?;
            for permission in query_builder::fetch_all::<Permission>(Conn::Pool(pool), &sql).await? {
                if let Some(role) = roles.get_mut(&permission.role_id) {
                    role.permissions.push(permission);
                }
            }
        }

        for user in rows.iter_mut() {
            user.role = roles.get(&user.role_id).cloned();
        }
        Ok(())
    }
}
