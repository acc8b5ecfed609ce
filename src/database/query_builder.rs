use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Arguments, FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::filter::{BindValue, SqlResult};

/// Where a statement runs: straight on the pool, or inside an open scope.
pub enum Conn<'a> {
    Pool(&'a PgPool),
    Tx(&'a mut PgConnection),
}

pub fn arguments(params: &[BindValue]) -> PgArguments {
    let mut args = PgArguments::default();
    for p in params {
        match p {
            BindValue::Uuid(v) => args.add(*v),
            BindValue::Text(v) => args.add(v.clone()),
            BindValue::Bool(v) => args.add(*v),
            BindValue::Int(v) => args.add(*v),
            BindValue::Real(v) => args.add(*v),
            BindValue::Timestamp(v) => args.add(*v),
            BindValue::Null => args.add(None::<String>),
        }
    }
    args
}

pub async fn fetch_all<T>(conn: Conn<'_>, sql: &SqlResult) -> Result<Vec<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let query = sqlx::query_as_with::<_, T, _>(&sql.query, arguments(&sql.params));
    let rows = match conn {
        Conn::Pool(pool) => query.fetch_all(pool).await?,
        Conn::Tx(tx) => query.fetch_all(tx).await?,
    };
    Ok(rows)
}

pub async fn fetch_optional<T>(conn: Conn<'_>, sql: &SqlResult) -> Result<Option<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let query = sqlx::query_as_with::<_, T, _>(&sql.query, arguments(&sql.params));
    let row = match conn {
        Conn::Pool(pool) => query.fetch_optional(pool).await?,
        Conn::Tx(tx) => query.fetch_optional(tx).await?,
    };
    Ok(row)
}

pub async fn fetch_count(conn: Conn<'_>, sql: &SqlResult) -> Result<i64, DatabaseError> {
    let query = sqlx::query_scalar_with::<_, i64, _>(&sql.query, arguments(&sql.params));
    let count = match conn {
        Conn::Pool(pool) => query.fetch_one(pool).await?,
        Conn::Tx(tx) => query.fetch_one(tx).await?,
    };
    Ok(count)
}

/// Runs an `INSERT ... RETURNING id`.
pub async fn insert_returning_id(conn: Conn<'_>, sql: &SqlResult) -> Result<Uuid, DatabaseError> {
    let query = sqlx::query_scalar_with::<_, Uuid, _>(&sql.query, arguments(&sql.params));
    let id = match conn {
        Conn::Pool(pool) => query.fetch_one(pool).await?,
        Conn::Tx(tx) => query.fetch_one(tx).await?,
    };
    Ok(id)
}

/// Runs a statement and returns the affected row count.
pub async fn execute(conn: Conn<'_>, sql: &SqlResult) -> Result<u64, DatabaseError> {
    let query = sqlx::query_with(&sql.query, arguments(&sql.params));
    let result = match conn {
        Conn::Pool(pool) => query.execute(pool).await?,
        Conn::Tx(tx) => query.execute(tx).await?,
    };
    Ok(result.rows_affected())
}
