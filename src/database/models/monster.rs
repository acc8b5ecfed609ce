use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::catalog::{MonsterCategory, MonsterType};
use crate::filter::Changeset;

/// A catalog entry. Every column is optional on read so that projected
/// queries (`select`) decode into the same type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct Monster {
    #[sqlx(default)]
    pub id: Uuid,
    #[sqlx(default)]
    pub monster_code: i32,
    #[sqlx(default)]
    pub name: String,
    #[sqlx(default)]
    pub monster_category_id: Uuid,
    #[sqlx(default)]
    pub description: String,
    #[sqlx(default)]
    pub length: f32,
    #[sqlx(default)]
    pub weight: i32,
    #[sqlx(default)]
    pub hp: i32,
    #[sqlx(default)]
    pub attack: i32,
    #[sqlx(default)]
    pub defends: i32,
    #[sqlx(default)]
    pub speed: i32,
    #[sqlx(default)]
    pub is_caught: bool,
    #[sqlx(default)]
    pub image_name: Option<String>,
    #[sqlx(default)]
    pub created_at: DateTime<Utc>,
    #[sqlx(default)]
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    pub deleted_at: Option<DateTime<Utc>>,

    #[sqlx(skip)]
    pub monster_category: Option<MonsterCategory>,
    #[sqlx(skip)]
    pub monster_types: Vec<MonsterType>,
}

impl Monster {
    pub const TABLE: &'static str = "monsters";

    // Predicate fragments
    pub const ID_EQ: &'static str = "monsters.id = ?";
    pub const NAME_ILIKE: &'static str = "monsters.name ILIKE ?";
    pub const IS_CAUGHT_EQ: &'static str = "monsters.is_caught = ?";
    pub const TYPE_ID_IN: &'static str = "map.monster_type_id IN (?)";
}

/// Column values for a freshly created monster.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMonster {
    pub monster_code: u16,
    pub name: String,
    pub monster_category_id: Uuid,
    pub description: String,
    pub length: f32,
    pub weight: u16,
    pub hp: u16,
    pub attack: u16,
    pub defends: u16,
    pub speed: u16,
    pub image_name: Option<String>,
}

impl NewMonster {
    pub fn to_changeset(&self) -> Changeset {
        let mut row = Changeset::new();
        row.set("monster_code", self.monster_code)
            .set("name", self.name.as_str())
            .set("monster_category_id", self.monster_category_id)
            .set("description", self.description.as_str())
            .set("length", self.length)
            .set("weight", self.weight)
            .set("hp", self.hp)
            .set("attack", self.attack)
            .set("defends", self.defends)
            .set("speed", self.speed)
            .set("is_caught", false)
            .set("image_name", self.image_name.clone());
        row
    }
}

/// Join row expressing monster/type membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRow)]
pub struct MonsterTypeMapping {
    pub monster_id: Uuid,
    pub monster_type_id: Uuid,
}

impl MonsterTypeMapping {
    pub const TABLE: &'static str = "mapping_monster_and_types";
    pub const MONSTER_ID_EQ: &'static str = "mapping_monster_and_types.monster_id = ?";

    pub fn for_monster(monster_id: Uuid, type_ids: &[Uuid]) -> Vec<Self> {
        type_ids
            .iter()
            .map(|t| Self { monster_id, monster_type_id: *t })
            .collect()
    }

    pub fn to_changeset(&self) -> Changeset {
        let mut row = Changeset::new();
        row.set("monster_id", self.monster_id)
            .set("monster_type_id", self.monster_type_id);
        row
    }
}
