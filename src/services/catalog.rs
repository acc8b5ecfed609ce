use std::time::Duration;

use async_trait::async_trait;

use super::outcome::{with_deadline, Outcome, ServiceError, ServiceResult};
use crate::database::models::{MonsterCategory, MonsterType};
use crate::database::EntityStore;
use crate::filter::{QueryDescriptor, SortDirection};

/// Read-only lookups behind the category and type pickers.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    async fn list_categories(&self) -> ServiceResult<Vec<MonsterCategory>>;
    async fn list_types(&self) -> ServiceResult<Vec<MonsterType>>;
}

pub struct CatalogService<C, T> {
    categories: C,
    types: T,
    deadline: Duration,
}

impl<C, T> CatalogService<C, T>
where
    C: EntityStore<MonsterCategory>,
    T: EntityStore<MonsterType>,
{
    pub fn new(categories: C, types: T, deadline: Duration) -> Self {
        Self {
            categories,
            types,
            deadline,
        }
    }
}

fn by_name() -> QueryDescriptor {
    QueryDescriptor::new()
        .select(&["id", "name"])
        .order_by("name", SortDirection::Asc)
}

#[async_trait]
impl<C, T> CatalogReader for CatalogService<C, T>
where
    C: EntityStore<MonsterCategory> + 'static,
    T: EntityStore<MonsterType> + 'static,
{
    async fn list_categories(&self) -> ServiceResult<Vec<MonsterCategory>> {
        let rows = with_deadline(self.deadline, async {
            self.categories
                .list(&by_name())
                .await
                .map_err(|e| ServiceError::server("failed to get all monster category", e))
        })
        .await?;
        Ok(Outcome::ok(rows, "get all monster category successfully"))
    }

    async fn list_types(&self) -> ServiceResult<Vec<MonsterType>> {
        let rows = with_deadline(self.deadline, async {
            self.types
                .list(&by_name())
                .await
                .map_err(|e| ServiceError::server("failed to get all monster type", e))
        })
        .await?;
        Ok(Outcome::ok(rows, "get all monster type successfully"))
    }
}
