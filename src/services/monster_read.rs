use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use super::outcome::{with_deadline, Outcome, ServiceError, ServiceResult};
use crate::api::pagination::Pagination;
use crate::database::models::{Monster, MonsterCategory, MonsterType};
use crate::database::EntityStore;
use crate::filter::{Join, Preload, QueryDescriptor, SortDirection};

/// Sortable list columns. Anything else is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortColumn {
    Name,
    MonsterCode,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortColumn {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" | "created_at" => Some(SortColumn::CreatedAt),
            "name" => Some(SortColumn::Name),
            "monster_code" => Some(SortColumn::MonsterCode),
            "updated_at" => Some(SortColumn::UpdatedAt),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortColumn::Name => "name",
            SortColumn::MonsterCode => "monster_code",
            SortColumn::CreatedAt => "created_at",
            SortColumn::UpdatedAt => "updated_at",
        }
    }
}

/// Raw list parameters as received from the client.
#[derive(Debug, Clone, Default)]
pub struct MonsterListQuery {
    pub sort_by: Option<String>,
    pub order_by: Option<String>,
    pub name: Option<String>,
    pub monster_type_ids: Vec<Uuid>,
    pub is_caught: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonsterDetail {
    pub id: Uuid,
    pub monster_code: i32,
    pub name: String,
    pub monster_category: Option<MonsterCategory>,
    pub monster_types: Vec<MonsterType>,
    pub description: String,
    pub length: f32,
    pub weight: i32,
    pub hp: i32,
    pub attack: i32,
    pub defends: i32,
    pub speed: i32,
    pub is_caught: bool,
    pub image_name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonsterListItem {
    pub id: Uuid,
    pub monster_code: i32,
    pub name: String,
    pub monster_category: Option<MonsterCategory>,
    pub monster_types: Vec<MonsterType>,
    pub is_caught: bool,
    pub image_name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonsterPage {
    pub items: Vec<MonsterListItem>,
    pub pagination: Option<Pagination>,
}

#[async_trait]
pub trait MonsterReader: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> ServiceResult<MonsterDetail>;
    async fn list(&self, query: MonsterListQuery) -> ServiceResult<MonsterPage>;
}

const LIST_COLUMNS: &[&str] = &[
    "id",
    "monster_code",
    "name",
    "monster_category_id",
    "is_caught",
    "image_name",
    "created_at",
    "updated_at",
];

/// `{base_url}/api/v1/monster/images/{name}`; no image renders no URL.
pub fn image_url(base_url: &str, image_name: Option<&str>) -> Option<String> {
    image_name
        .filter(|n| !n.is_empty())
        .map(|n| format!("{}/api/v1/monster/images/{}", base_url.trim_end_matches('/'), n))
}

/// Strict boolean as accepted by the list filter.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Case-insensitive substring pattern with LIKE wildcards escaped.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Builds the list descriptor; malformed filter values are client errors.
pub fn list_descriptor(query: &MonsterListQuery) -> Result<QueryDescriptor, ServiceError> {
    let sort = SortColumn::parse(query.sort_by.as_deref().unwrap_or_default())
        .ok_or_else(|| ServiceError::client("sort_by format not valid", format!("{:?}", query.sort_by)))?;
    let direction = SortDirection::normalize(query.order_by.as_deref().unwrap_or_default());

    let mut descriptor = QueryDescriptor::new()
        .select(LIST_COLUMNS)
        .preload(Preload::Category)
        .preload(Preload::Types)
        .order_by(sort.column(), direction);

    if let Some(name) = query.name.as_deref().filter(|n| !n.is_empty()) {
        descriptor = descriptor.where_eq(Monster::NAME_ILIKE, contains_pattern(name));
    }
    if !query.monster_type_ids.is_empty() {
        descriptor = descriptor
            .distinct()
            .join(Join::MonsterTypeMapping)
            .where_in(Monster::TYPE_ID_IN, query.monster_type_ids.iter().copied());
    }
    if let Some(raw) = query.is_caught.as_deref().filter(|s| !s.is_empty()) {
        let is_caught =
            parse_bool(raw).ok_or_else(|| ServiceError::client("is_caught format not valid", raw))?;
        descriptor = descriptor.where_eq(Monster::IS_CAUGHT_EQ, is_caught);
    }
    Ok(descriptor)
}

pub struct MonsterReadService<M> {
    monsters: M,
    base_url: String,
    deadline: Duration,
}

impl<M: EntityStore<Monster>> MonsterReadService<M> {
    pub fn new(monsters: M, base_url: impl Into<String>, deadline: Duration) -> Self {
        Self {
            monsters,
            base_url: base_url.into(),
            deadline,
        }
    }

    fn detail(&self, m: Monster) -> MonsterDetail {
        let image_url = image_url(&self.base_url, m.image_name.as_deref());
        MonsterDetail {
            id: m.id,
            monster_code: m.monster_code,
            name: m.name,
            monster_category: m.monster_category,
            monster_types: m.monster_types,
            description: m.description,
            length: m.length,
            weight: m.weight,
            hp: m.hp,
            attack: m.attack,
            defends: m.defends,
            speed: m.speed,
            is_caught: m.is_caught,
            image_name: m.image_name,
            image_url,
        }
    }

    fn list_item(&self, m: Monster) -> MonsterListItem {
        let image_url = image_url(&self.base_url, m.image_name.as_deref());
        MonsterListItem {
            id: m.id,
            monster_code: m.monster_code,
            name: m.name,
            monster_category: m.monster_category,
            monster_types: m.monster_types,
            is_caught: m.is_caught,
            image_name: m.image_name,
            image_url,
        }
    }

    async fn list_inner(&self, query: MonsterListQuery) -> Result<MonsterPage, ServiceError> {
        let mut descriptor = list_descriptor(&query)?;

        let pagination = if query.page.is_some() || query.per_page.is_some() {
            let total = self
                .monsters
                .count(&descriptor)
                .await
                .map_err(|e| ServiceError::server("failed to get list monster", e))?;
            let p = Pagination::new(query.page.unwrap_or(1), query.per_page.unwrap_or(10), total);
            descriptor = descriptor.limit(p.limit(), Some(p.offset()));
            Some(p)
        } else {
            None
        };

        let rows = self
            .monsters
            .list(&descriptor)
            .await
            .map_err(|e| ServiceError::server("failed to get list monster", e))?;

        Ok(MonsterPage {
            items: rows.into_iter().map(|m| self.list_item(m)).collect(),
            pagination,
        })
    }
}

#[async_trait]
impl<M: EntityStore<Monster> + 'static> MonsterReader for MonsterReadService<M> {
    async fn get_by_id(&self, id: Uuid) -> ServiceResult<MonsterDetail> {
        let query = QueryDescriptor::new()
            .preload(Preload::Category)
            .preload(Preload::Types);
        let monster = with_deadline(self.deadline, async {
            self.monsters
                .find(id, &query)
                .await
                .map_err(|e| ServiceError::from_lookup(e, "monster not found", "failed to get monster by id"))
        })
        .await?;
        Ok(Outcome::ok(self.detail(monster), "get monster successfully"))
    }

    async fn list(&self, query: MonsterListQuery) -> ServiceResult<MonsterPage> {
        let page = with_deadline(self.deadline, self.list_inner(query)).await?;
        Ok(Outcome::ok(page, "get all monster successfully"))
    }
}
