// handlers/public/mod.rs - routes that need no token

pub mod auth;
pub mod catalog;
pub mod health;
pub mod monster;

pub use auth::login_post;
pub use catalog::{category_list, type_list};
pub use health::health;
pub use monster::{monster_captured_put, monster_get, monster_list};
