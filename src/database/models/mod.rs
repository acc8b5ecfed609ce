pub mod catalog;
pub mod monster;
pub mod user;

pub use catalog::{MonsterCategory, MonsterType};
pub use monster::{Monster, MonsterTypeMapping, NewMonster};
pub use user::{Permission, Role, User};
