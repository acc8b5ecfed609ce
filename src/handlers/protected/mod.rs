// handlers/protected/mod.rs - routes behind the permission middleware
//
// Each route is layered with `require_permission` for its own permission
// name; see `handlers::router`.

pub mod monster;

pub use monster::{monster_delete, monster_post, monster_put};
