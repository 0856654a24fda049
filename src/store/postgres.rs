//! PostgreSQL repository on a shared `PgPool`, plus database and table bootstrap.

use super::{entity_to_object, Repository};
use crate::entity::{Entity, ENTITY_TABLES};
use crate::error::{AppError, BootstrapError, ConfigError};
use crate::sort::Sort;
use crate::sql::{self, PgBindValue, QueryBuf, TableRef};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgRow};
use sqlx::query::Query;
use sqlx::{ConnectOptions, PgPool, Postgres};
use std::str::FromStr;

#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
    schema: String,
}

impl PgRepository {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgRepository {
            pool,
            schema: schema.into(),
        }
    }

    fn table<E: Entity>(&self) -> TableRef<'_> {
        TableRef {
            schema: &self.schema,
            name: E::TABLE,
            columns: E::COLUMNS,
        }
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(q).fetch_optional(&self.pool).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_all(q).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

fn bind_all(q: &QueryBuf) -> Query<'_, Postgres, PgArguments> {
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(PgBindValue::from(p));
    }
    query
}

#[async_trait]
impl Repository for PgRepository {
    async fn find_all<E: Entity>(&self, sort: &[Sort]) -> Result<Vec<E>, AppError> {
        Sort::check_columns::<E>(sort)?;
        let q = sql::select_all(&self.table::<E>(), sort);
        self.fetch_all(&q)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(AppError::from))
            .collect()
    }

    async fn find_by_id<E: Entity>(&self, id: i64) -> Result<Option<E>, AppError> {
        let q = sql::select_by_id(&self.table::<E>(), id);
        match self.fetch_optional(&q).await? {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    async fn exists_by_id<E: Entity>(&self, id: i64) -> Result<bool, AppError> {
        let q = sql::exists_by_id(&self.table::<E>(), id);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let (exists,): (bool,) = sqlx::query_as(&q.sql).bind(id).fetch_one(&self.pool).await?;
        Ok(exists)
    }

    async fn save<E: Entity>(&self, entity: E) -> Result<E, AppError> {
        let body = entity_to_object(&entity)?;
        let table = self.table::<E>();
        let q = match entity.id() {
            Some(id) => sql::upsert(&table, id, &body),
            None => sql::insert(&table, &body),
        };
        let row = self
            .fetch_optional(&q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))?;
        Ok(serde_json::from_value(row)?)
    }

    async fn delete_by_id<E: Entity>(&self, id: i64) -> Result<(), AppError> {
        let q = sql::delete_by_id(&self.table::<E>(), id);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let done = bind_all(&q).execute(&self.pool).await?;
        tracing::debug!(rows = done.rows_affected(), "deleted");
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create the schema and one table per entity kind when missing.
pub async fn ensure_entity_tables(pool: &PgPool, schema: &str) -> Result<(), BootstrapError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", sql::quoted(schema)))
        .execute(pool)
        .await?;
    for table in ENTITY_TABLES {
        let ddl = sql::create_table(schema, table);
        tracing::debug!(sql = %ddl, "ensure table");
        sqlx::query(&ddl).execute(pool).await?;
    }
    Ok(())
}

/// Ensure the database named in `database_url` exists; create it if not. Connects to the
/// `postgres` database on the same server to run CREATE DATABASE. Call before creating the main pool.
/// A URL without a database name is left alone.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), BootstrapError> {
    let Some((admin, db_name)) = admin_options(database_url)? else {
        return Ok(());
    };
    let mut conn: sqlx::PgConnection = admin.connect().await?;
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", sql::quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Connection options for the `postgres` maintenance database plus the target database name.
/// `None` when the URL names no database or names `postgres` itself.
fn admin_options(database_url: &str) -> Result<Option<(PgConnectOptions, String)>, ConfigError> {
    let opts = PgConnectOptions::from_str(database_url).map_err(|_| ConfigError::Invalid {
        key: "DATABASE_URL",
        value: database_url.to_string(),
        reason: "not a PostgreSQL connection URL",
    })?;
    let db_name = match opts.get_database() {
        Some(name) if !name.is_empty() && name != "postgres" => name.to_string(),
        _ => return Ok(None),
    };
    Ok(Some((opts.database("postgres"), db_name)))
}

fn row_to_json(row: &PgRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Value::Object(map)
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::from(n);
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::from(n);
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        return serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null);
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_options_keep_host_and_query() {
        let (admin, name) = admin_options("postgres://u@h/myapp?sslrootcert=/etc/ssl/ca.pem")
            .unwrap()
            .expect("database named");
        assert_eq!(name, "myapp");
        assert_eq!(admin.get_database(), Some("postgres"));
        assert_eq!(admin.get_host(), "h");
        assert_eq!(admin.get_username(), "u");
    }

    #[test]
    fn admin_options_with_port_and_credentials() {
        let (admin, name) = admin_options("postgres://u:p@localhost:5433/shop").unwrap().unwrap();
        assert_eq!(name, "shop");
        assert_eq!(admin.get_port(), 5433);
        assert_eq!(admin.get_database(), Some("postgres"));
    }

    #[test]
    fn url_without_database_is_left_alone() {
        assert!(admin_options("postgres://user@dbhost:5432").unwrap().is_none());
        assert!(admin_options("postgres://user@dbhost:5432/postgres").unwrap().is_none());
    }

    #[test]
    fn invalid_url_is_a_config_error() {
        let err = admin_options("postgres://localhost:notaport/myapp").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DATABASE_URL", .. }));
    }
}
