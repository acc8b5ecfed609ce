pub mod manager;
pub mod models;
pub mod query_builder;
pub mod repository;
pub mod store;
pub mod transaction;

pub use manager::{ConstraintKind, DatabaseError, DatabaseManager, HealthProbe};
pub use repository::{Entity, Repository};
pub use store::{EntityStore, MonsterStore};
pub use transaction::{PgCoordinator, PgScope, TransactionCoordinator, TxScope};
