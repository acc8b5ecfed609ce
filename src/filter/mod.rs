//! Typed query descriptors and their rendering to parameterized SQL.

pub mod error;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod types;

pub use error::FilterError;
pub use filter::Filter;
pub use types::{BindValue, Changeset, Join, OrderBy, Preload, QueryDescriptor, SortDirection, SqlResult, WhereEq, WhereIn};
