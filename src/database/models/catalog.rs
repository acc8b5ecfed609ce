use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct MonsterCategory {
    pub id: Uuid,
    pub name: String,
}

impl MonsterCategory {
    pub const TABLE: &'static str = "monster_categories";
    pub const ID_EQ: &'static str = "monster_categories.id = ?";
    pub const ID_IN: &'static str = "monster_categories.id IN (?)";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct MonsterType {
    pub id: Uuid,
    pub name: String,
}

impl MonsterType {
    pub const TABLE: &'static str = "monster_types";
    pub const ID_EQ: &'static str = "monster_types.id = ?";
}
