use thiserror::Error;

/// Rejections raised while rendering a `QueryDescriptor` into SQL.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Invalid WHERE clause: {0}")]
    InvalidWhereClause(String),

    #[error("Joins not supported when writing {0}")]
    JoinOnWrite(String),

    #[error("Invalid page window: {0}")]
    InvalidWindow(String),

    #[error("Empty changeset for {0}")]
    EmptyChangeset(String),
}
