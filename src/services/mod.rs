pub mod auth;
pub mod catalog;
pub mod monster_read;
pub mod monster_write;
pub mod outcome;

pub use auth::{AuthService, Authenticator, LoginRequest, LoginToken};
pub use catalog::{CatalogReader, CatalogService};
pub use monster_read::{MonsterDetail, MonsterListItem, MonsterListQuery, MonsterPage, MonsterReadService, MonsterReader};
pub use monster_write::{CreateMonster, ImageUpload, MonsterId, MonsterWriteService, MonsterWriter, UpdateMonster};
pub use outcome::{ErrorClass, Outcome, ServiceError, ServiceResult};
