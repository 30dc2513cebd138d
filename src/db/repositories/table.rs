//! Generic table store
//!
//! One repository serves every content table. SQL is assembled from the
//! static [`TableDef`] descriptors, values are bound per driver and rows are
//! decoded column by column into JSON maps, which callers turn into typed
//! records with [`decode_record`].
//!
//! Column names never come from user input directly: every key is checked
//! against the descriptor before it reaches a SQL string.

use crate::config::DatabaseDriver;
use crate::db::schema::{Column, ColumnKind, TableDef};
use crate::db::DynDatabasePool;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{MySql, MySqlPool, Row as _, Sqlite, SqlitePool};
use std::sync::Arc;

/// A row as a JSON object keyed by column name
pub type Row = Map<String, Value>;

/// Errors raised by the table store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{table} record '{id}' not found")]
    NotFound { table: &'static str, id: String },

    #[error("Unknown column '{column}' for table {table}")]
    UnknownColumn { table: &'static str, column: String },

    #[error("Invalid value for column '{column}': {message}")]
    InvalidValue { column: String, message: String },

    #[error("Failed to decode {table} row: {message}")]
    Decode { table: &'static str, message: String },

    #[error("Duplicate value: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Database driver mismatch")]
    DriverMismatch,
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::Conflict(db.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

/// A value ready to be bound to a placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl SqlValue {
    /// Convert a JSON value into the storage representation of `column`.
    pub fn from_json(column: &Column, value: &Value) -> Result<Self, StoreError> {
        let invalid = |message: &str| StoreError::InvalidValue {
            column: column.name.to_string(),
            message: message.to_string(),
        };

        if value.is_null() {
            return Ok(SqlValue::Null);
        }

        match column.kind {
            ColumnKind::Text => match value {
                Value::String(s) => Ok(SqlValue::Text(s.clone())),
                Value::Number(n) => Ok(SqlValue::Text(n.to_string())),
                Value::Bool(b) => Ok(SqlValue::Text(b.to_string())),
                _ => Err(invalid("expected text")),
            },
            ColumnKind::Integer => match value {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                    .map(SqlValue::Integer)
                    .ok_or_else(|| invalid("expected an integer")),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(SqlValue::Integer)
                    .map_err(|_| invalid("expected an integer")),
                _ => Err(invalid("expected an integer")),
            },
            ColumnKind::Real => match value {
                Value::Number(n) => n
                    .as_f64()
                    .map(SqlValue::Real)
                    .ok_or_else(|| invalid("expected a number")),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(SqlValue::Real)
                    .map_err(|_| invalid("expected a number")),
                _ => Err(invalid("expected a number")),
            },
            ColumnKind::Boolean => match value {
                Value::Bool(b) => Ok(SqlValue::Bool(*b)),
                Value::Number(n) if n.as_i64() == Some(0) => Ok(SqlValue::Bool(false)),
                Value::Number(n) if n.as_i64() == Some(1) => Ok(SqlValue::Bool(true)),
                Value::String(s) if s == "true" => Ok(SqlValue::Bool(true)),
                Value::String(s) if s == "false" => Ok(SqlValue::Bool(false)),
                _ => Err(invalid("expected a boolean")),
            },
            ColumnKind::Timestamp => match value {
                Value::String(s) => parse_timestamp(s)
                    .map(SqlValue::Timestamp)
                    .ok_or_else(|| invalid("expected an RFC 3339 timestamp")),
                _ => Err(invalid("expected an RFC 3339 timestamp")),
            },
            ColumnKind::TextList => match value {
                Value::Array(items) if items.iter().all(Value::is_string) => {
                    Ok(SqlValue::Text(value.to_string()))
                }
                _ => Err(invalid("expected a list of strings")),
            },
            ColumnKind::Json => Ok(SqlValue::Text(value.to_string())),
        }
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// List parameters shared by the admin and public screens
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Case-insensitive substring over the table's search columns
    pub search: Option<String>,
    /// Equality filter on the table's filter column
    pub filter: Option<String>,
    /// Fixed server-side conditions (`column = value`)
    pub conditions: Vec<(&'static str, SqlValue)>,
    pub limit: Option<i64>,
}

impl ListQuery {
    /// Build a query from raw screen inputs. Blank search and the `all`
    /// category are treated as absent.
    pub fn new(search: Option<String>, filter: Option<String>) -> Self {
        let search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let filter = filter
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty() && !f.eq_ignore_ascii_case("all"));
        Self {
            search,
            filter,
            ..Default::default()
        }
    }

    pub fn with_condition(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.conditions.push((column, value.into()));
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Stable string form used in cache keys
    pub fn cache_key(&self) -> String {
        let conditions: Vec<String> = self
            .conditions
            .iter()
            .map(|(c, v)| format!("{}={:?}", c, v))
            .collect();
        format!(
            "q={}&f={}&c={}&l={}",
            self.search.as_deref().unwrap_or(""),
            self.filter.as_deref().unwrap_or(""),
            conditions.join(","),
            self.limit.map(|l| l.to_string()).unwrap_or_default()
        )
    }
}

/// Table store trait
#[async_trait]
pub trait TableRepository: Send + Sync {
    /// List rows in the table's sort order
    async fn list(&self, table: &'static TableDef, query: &ListQuery)
        -> Result<Vec<Row>, StoreError>;

    /// Get a row by primary key
    async fn get(&self, table: &'static TableDef, id: &str) -> Result<Option<Row>, StoreError>;

    /// Get the first row where `column = value`
    async fn find_by(
        &self,
        table: &'static TableDef,
        column: &str,
        value: SqlValue,
    ) -> Result<Option<Row>, StoreError>;

    /// Insert a row; `id` and timestamps are assigned here
    async fn insert(&self, table: &'static TableDef, values: Row) -> Result<Row, StoreError>;

    /// Apply a partial patch; columns not present in `patch` are untouched
    async fn update(
        &self,
        table: &'static TableDef,
        id: &str,
        patch: Row,
    ) -> Result<Row, StoreError>;

    /// Delete a row by primary key
    async fn delete(&self, table: &'static TableDef, id: &str) -> Result<(), StoreError>;
}

/// SQLx-based table store for SQLite and MySQL
pub struct SqlxTableRepository {
    pool: DynDatabasePool,
}

impl SqlxTableRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TableRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch_all(
        &self,
        table: &'static TableDef,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> Result<Vec<Row>, StoreError> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let pool = self.pool.as_sqlite().ok_or(StoreError::DriverMismatch)?;
                fetch_all_sqlite(pool, table, sql, params).await
            }
            DatabaseDriver::Mysql => {
                let pool = self.pool.as_mysql().ok_or(StoreError::DriverMismatch)?;
                fetch_all_mysql(pool, table, sql, params).await
            }
        }
    }

    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<u64, StoreError> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let pool = self.pool.as_sqlite().ok_or(StoreError::DriverMismatch)?;
                execute_sqlite(pool, sql, params).await
            }
            DatabaseDriver::Mysql => {
                let pool = self.pool.as_mysql().ok_or(StoreError::DriverMismatch)?;
                execute_mysql(pool, sql, params).await
            }
        }
    }

    async fn fetch_one_by(
        &self,
        table: &'static TableDef,
        column: &str,
        value: SqlValue,
    ) -> Result<Option<Row>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ? LIMIT 1",
            table.select_list(),
            table.name,
            column
        );
        Ok(self.fetch_all(table, &sql, vec![value]).await?.into_iter().next())
    }
}

#[async_trait]
impl TableRepository for SqlxTableRepository {
    async fn list(
        &self,
        table: &'static TableDef,
        query: &ListQuery,
    ) -> Result<Vec<Row>, StoreError> {
        let (sql, params) = build_list_sql(table, query)?;
        self.fetch_all(table, &sql, params).await
    }

    async fn get(&self, table: &'static TableDef, id: &str) -> Result<Option<Row>, StoreError> {
        self.fetch_one_by(table, "id", SqlValue::Text(id.to_string()))
            .await
    }

    async fn find_by(
        &self,
        table: &'static TableDef,
        column: &str,
        value: SqlValue,
    ) -> Result<Option<Row>, StoreError> {
        let column = checked_column(table, column)?;
        self.fetch_one_by(table, column.name, value).await
    }

    async fn insert(&self, table: &'static TableDef, values: Row) -> Result<Row, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut columns = vec!["id", "created_at", "updated_at"];
        let mut params = vec![
            SqlValue::Text(id.clone()),
            SqlValue::Timestamp(now),
            SqlValue::Timestamp(now),
        ];
        for (key, value) in &values {
            let column = writable_column(table, key)?;
            columns.push(column.name);
            params.push(SqlValue::from_json(&column, value)?);
        }

        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name,
            columns.join(", "),
            placeholders
        );
        self.execute(&sql, params).await?;

        self.get(table, &id).await?.ok_or(StoreError::NotFound {
            table: table.name,
            id,
        })
    }

    async fn update(
        &self,
        table: &'static TableDef,
        id: &str,
        patch: Row,
    ) -> Result<Row, StoreError> {
        let mut assignments = Vec::with_capacity(patch.len() + 1);
        let mut params = Vec::with_capacity(patch.len() + 2);
        for (key, value) in &patch {
            let column = writable_column(table, key)?;
            assignments.push(format!("{} = ?", column.name));
            params.push(SqlValue::from_json(&column, value)?);
        }
        assignments.push("updated_at = ?".to_string());
        params.push(SqlValue::Timestamp(Utc::now()));
        params.push(SqlValue::Text(id.to_string()));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            table.name,
            assignments.join(", ")
        );
        let affected = self.execute(&sql, params).await?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                table: table.name,
                id: id.to_string(),
            });
        }

        self.get(table, id).await?.ok_or_else(|| StoreError::NotFound {
            table: table.name,
            id: id.to_string(),
        })
    }

    async fn delete(&self, table: &'static TableDef, id: &str) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", table.name);
        let affected = self
            .execute(&sql, vec![SqlValue::Text(id.to_string())])
            .await?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                table: table.name,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

/// Decode a row into its typed record
pub fn decode_record<T: DeserializeOwned>(
    table: &'static TableDef,
    row: Row,
) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| StoreError::Decode {
        table: table.name,
        message: e.to_string(),
    })
}

fn checked_column(table: &'static TableDef, name: &str) -> Result<Column, StoreError> {
    table.column(name).ok_or_else(|| StoreError::UnknownColumn {
        table: table.name,
        column: name.to_string(),
    })
}

fn writable_column(table: &'static TableDef, name: &str) -> Result<Column, StoreError> {
    match name {
        "id" | "created_at" | "updated_at" => Err(StoreError::UnknownColumn {
            table: table.name,
            column: name.to_string(),
        }),
        _ => checked_column(table, name),
    }
}

/// Escape character for LIKE patterns; `!` reads the same in SQLite and MySQL
const LIKE_ESCAPE: char = '!';

/// `%search%` with the search text matched literally
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.to_lowercase().chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn build_list_sql(
    table: &'static TableDef,
    query: &ListQuery,
) -> Result<(String, Vec<SqlValue>), StoreError> {
    let mut clauses = Vec::new();
    let mut params = Vec::new();

    if let Some(search) = &query.search {
        let pattern = like_pattern(search);
        let ors: Vec<String> = table
            .search_columns
            .iter()
            .map(|c| format!("LOWER({}) LIKE ? ESCAPE '{}'", c, LIKE_ESCAPE))
            .collect();
        for _ in table.search_columns {
            params.push(SqlValue::Text(pattern.clone()));
        }
        clauses.push(format!("({})", ors.join(" OR ")));
    }

    if let (Some(filter), Some(column)) = (&query.filter, table.filter_column) {
        clauses.push(format!("{} = ?", column));
        params.push(SqlValue::Text(filter.clone()));
    }

    for (name, value) in &query.conditions {
        let column = checked_column(table, name)?;
        clauses.push(format!("{} = ?", column.name));
        params.push(value.clone());
    }

    let mut sql = format!("SELECT {} FROM {}", table.select_list(), table.name);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(&format!(
        " ORDER BY {} {}",
        table.order_by,
        if table.descending { "DESC" } else { "ASC" }
    ));
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit.max(0)));
    }

    Ok((sql, params))
}

fn timestamp_value(dt: DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Parse stored JSON text back into a value
fn json_text_value(
    table: &'static TableDef,
    column: &Column,
    text: Option<String>,
) -> Result<Value, StoreError> {
    match text {
        None => Ok(Value::Null),
        Some(text) if text.trim().is_empty() => Ok(Value::Null),
        Some(text) => serde_json::from_str(&text).map_err(|e| StoreError::Decode {
            table: table.name,
            message: format!("column {}: {}", column.name, e),
        }),
    }
}

fn decode_error(table: &'static TableDef, column: &Column, err: sqlx::Error) -> StoreError {
    StoreError::Decode {
        table: table.name,
        message: format!("column {}: {}", column.name, err),
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

fn bind_sqlite(query: SqliteQuery<'_>, value: SqlValue) -> SqliteQuery<'_> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Integer(i) => query.bind(i),
        SqlValue::Real(f) => query.bind(f),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Timestamp(t) => query.bind(t),
    }
}

async fn fetch_all_sqlite(
    pool: &SqlitePool,
    table: &'static TableDef,
    sql: &str,
    params: Vec<SqlValue>,
) -> Result<Vec<Row>, StoreError> {
    let query = params
        .into_iter()
        .fold(sqlx::query(sql), bind_sqlite);
    let rows = query.fetch_all(pool).await?;
    rows.iter().map(|row| decode_sqlite_row(table, row)).collect()
}

async fn execute_sqlite(
    pool: &SqlitePool,
    sql: &str,
    params: Vec<SqlValue>,
) -> Result<u64, StoreError> {
    let query = params
        .into_iter()
        .fold(sqlx::query(sql), bind_sqlite);
    Ok(query.execute(pool).await?.rows_affected())
}

fn decode_sqlite_row(table: &'static TableDef, row: &SqliteRow) -> Result<Row, StoreError> {
    let mut map = Row::new();
    for column in table.all_columns() {
        let name = column.name;
        let value = match column.kind {
            ColumnKind::Text => row
                .try_get::<Option<String>, _>(name)
                .map(|v| v.map(Value::String).unwrap_or(Value::Null)),
            ColumnKind::Integer => row
                .try_get::<Option<i64>, _>(name)
                .map(|v| v.map(Value::from).unwrap_or(Value::Null)),
            ColumnKind::Real => row
                .try_get::<Option<f64>, _>(name)
                .map(|v| v.map(Value::from).unwrap_or(Value::Null)),
            ColumnKind::Boolean => row
                .try_get::<Option<bool>, _>(name)
                .map(|v| v.map(Value::Bool).unwrap_or(Value::Null)),
            ColumnKind::Timestamp => row
                .try_get::<Option<DateTime<Utc>>, _>(name)
                .map(|v| v.map(timestamp_value).unwrap_or(Value::Null)),
            ColumnKind::TextList | ColumnKind::Json => {
                let text = row
                    .try_get::<Option<String>, _>(name)
                    .map_err(|e| decode_error(table, &column, e))?;
                Ok(json_text_value(table, &column, text)?)
            }
        }
        .map_err(|e| decode_error(table, &column, e))?;
        map.insert(name.to_string(), value);
    }
    Ok(map)
}

// ============================================================================
// MySQL implementations
// ============================================================================

type MySqlQuery<'q> = Query<'q, MySql, MySqlArguments>;

fn bind_mysql(query: MySqlQuery<'_>, value: SqlValue) -> MySqlQuery<'_> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Integer(i) => query.bind(i),
        SqlValue::Real(f) => query.bind(f),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Timestamp(t) => query.bind(t),
    }
}

async fn fetch_all_mysql(
    pool: &MySqlPool,
    table: &'static TableDef,
    sql: &str,
    params: Vec<SqlValue>,
) -> Result<Vec<Row>, StoreError> {
    let query = params.into_iter().fold(sqlx::query(sql), bind_mysql);
    let rows = query.fetch_all(pool).await?;
    rows.iter().map(|row| decode_mysql_row(table, row)).collect()
}

async fn execute_mysql(
    pool: &MySqlPool,
    sql: &str,
    params: Vec<SqlValue>,
) -> Result<u64, StoreError> {
    let query = params.into_iter().fold(sqlx::query(sql), bind_mysql);
    Ok(query.execute(pool).await?.rows_affected())
}

fn decode_mysql_row(table: &'static TableDef, row: &MySqlRow) -> Result<Row, StoreError> {
    let mut map = Row::new();
    for column in table.all_columns() {
        let name = column.name;
        let value = match column.kind {
            ColumnKind::Text => row
                .try_get::<Option<String>, _>(name)
                .map(|v| v.map(Value::String).unwrap_or(Value::Null)),
            ColumnKind::Integer => row
                .try_get::<Option<i64>, _>(name)
                .map(|v| v.map(Value::from).unwrap_or(Value::Null)),
            ColumnKind::Real => row
                .try_get::<Option<f64>, _>(name)
                .map(|v| v.map(Value::from).unwrap_or(Value::Null)),
            ColumnKind::Boolean => row
                .try_get::<Option<bool>, _>(name)
                .map(|v| v.map(Value::Bool).unwrap_or(Value::Null)),
            ColumnKind::Timestamp => row
                .try_get::<Option<DateTime<Utc>>, _>(name)
                .map(|v| v.map(timestamp_value).unwrap_or(Value::Null)),
            ColumnKind::TextList | ColumnKind::Json => {
                let text = row
                    .try_get::<Option<String>, _>(name)
                    .map_err(|e| decode_error(table, &column, e))?;
                Ok(json_text_value(table, &column, text)?)
            }
        }
        .map_err(|e| decode_error(table, &column, e))?;
        map.insert(name.to_string(), value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::{CATEGORIES, GALLERY_IMAGES, PRODUCTS};
    use crate::db::{create_test_pool, migrations};
    use serde_json::json;

    async fn setup() -> (DynDatabasePool, Arc<dyn TableRepository>) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxTableRepository::boxed(pool.clone());
        (pool, repo)
    }

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamps() {
        let (_pool, repo) = setup().await;

        let created = repo
            .insert(&CATEGORIES, row(json!({"name": "Spices", "slug": "spices"})))
            .await
            .unwrap();

        assert_eq!(created["name"], "Spices");
        assert_eq!(created["is_active"], true);
        assert_eq!(created["sort_order"], 0);
        assert!(created["id"].as_str().is_some_and(|id| id.len() == 36));
        assert_eq!(created["created_at"], created["updated_at"]);
    }

    #[tokio::test]
    async fn test_list_arrays_round_trip() {
        let (_pool, repo) = setup().await;

        repo.insert(
            &GALLERY_IMAGES,
            row(json!({
                "title": "Cumin harvest",
                "image_url": "/uploads/a.jpg",
                "category": "harvest",
                "tags": ["cumin", "field", "rajasthan"]
            })),
        )
        .await
        .unwrap();

        let rows = repo.list(&GALLERY_IMAGES, &ListQuery::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["tags"], json!(["cumin", "field", "rajasthan"]));
        assert_eq!(rows[0]["description"], Value::Null);
    }

    #[tokio::test]
    async fn test_list_search_filter_and_order() {
        let (_pool, repo) = setup().await;

        for (title, category, order) in [
            ("Mustard bloom", "fields", 2),
            ("Cumin seeds", "produce", 1),
            ("Guar pods", "produce", 3),
        ] {
            repo.insert(
                &GALLERY_IMAGES,
                row(json!({
                    "title": title,
                    "image_url": "/x.jpg",
                    "category": category,
                    "sort_order": order
                })),
            )
            .await
            .unwrap();
        }

        let all = repo.list(&GALLERY_IMAGES, &ListQuery::default()).await.unwrap();
        let titles: Vec<_> = all.iter().map(|r| r["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["Cumin seeds", "Mustard bloom", "Guar pods"]);

        let searched = repo
            .list(&GALLERY_IMAGES, &ListQuery::new(Some("CUMIN".into()), None))
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);

        let filtered = repo
            .list(&GALLERY_IMAGES, &ListQuery::new(None, Some("produce".into())))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 2);

        let absent = repo
            .list(&GALLERY_IMAGES, &ListQuery::new(None, Some("nursery".into())))
            .await
            .unwrap();
        assert!(absent.is_empty());

        let everything = repo
            .list(&GALLERY_IMAGES, &ListQuery::new(None, Some("all".into())))
            .await
            .unwrap();
        assert_eq!(everything.len(), 3);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Cumin"), "%cumin%");
        assert_eq!(like_pattern("100%"), "%100!%%");
        assert_eq!(like_pattern("a_b!"), "%a!_b!!%");
    }

    #[tokio::test]
    async fn test_search_matches_wildcards_literally() {
        let (_pool, repo) = setup().await;

        for title in ["Cumin", "Guar", "100% organic", "Wow!"] {
            repo.insert(
                &GALLERY_IMAGES,
                row(json!({ "title": title, "image_url": "/x.jpg" })),
            )
            .await
            .unwrap();
        }

        let search = |text: &str| ListQuery::new(Some(text.to_string()), None);

        let percent = repo.list(&GALLERY_IMAGES, &search("%")).await.unwrap();
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0]["title"], "100% organic");

        let underscore = repo.list(&GALLERY_IMAGES, &search("_")).await.unwrap();
        assert!(underscore.is_empty());

        let bang = repo.list(&GALLERY_IMAGES, &search("!")).await.unwrap();
        assert_eq!(bang.len(), 1);
        assert_eq!(bang[0]["title"], "Wow!");

        let mixed = repo.list(&GALLERY_IMAGES, &search("0% ORG")).await.unwrap();
        assert_eq!(mixed.len(), 1);
    }

    #[tokio::test]
    async fn test_update_changes_only_supplied_fields() {
        let (_pool, repo) = setup().await;

        let created = repo
            .insert(
                &PRODUCTS,
                row(json!({
                    "name": "Cumin",
                    "slug": "cumin",
                    "description": "Aromatic seeds",
                    "certifications": ["organic", "fssai"],
                    "specifications": {"moisture": "9%"}
                })),
            )
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let updated = repo
            .update(&PRODUCTS, &id, row(json!({"description": "Bold aroma"})))
            .await
            .unwrap();

        assert_eq!(updated["description"], "Bold aroma");
        for key in created.keys() {
            if key != "description" && key != "updated_at" {
                assert_eq!(updated[key], created[key], "{} changed", key);
            }
        }
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_row() {
        let (_pool, repo) = setup().await;

        let err = repo
            .update(&CATEGORIES, "missing", row(json!({"name": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        let err = repo.delete(&CATEGORIES, "missing").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        assert!(repo.list(&CATEGORIES, &ListQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let (_pool, repo) = setup().await;

        let created = repo
            .insert(&CATEGORIES, row(json!({"name": "Pulses", "slug": "pulses"})))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap();

        repo.delete(&CATEGORIES, id).await.unwrap();
        assert!(repo.get(&CATEGORIES, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_column_rejected() {
        let (_pool, repo) = setup().await;

        let err = repo
            .insert(
                &CATEGORIES,
                row(json!({"name": "x", "slug": "x", "name; DROP TABLE": 1})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownColumn { .. }));

        let err = repo
            .insert(&CATEGORIES, row(json!({"id": "forced", "name": "x", "slug": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownColumn { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_unique_value_is_conflict() {
        let (_pool, repo) = setup().await;

        repo.insert(&CATEGORIES, row(json!({"name": "A", "slug": "same"})))
            .await
            .unwrap();
        let err = repo
            .insert(&CATEGORIES, row(json!({"name": "B", "slug": "same"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_corrupt_json_column_is_decode_error() {
        let (pool, repo) = setup().await;

        sqlx::query("INSERT INTO gallery_images (id, title, image_url, tags) VALUES ('g1', 't', 'u', 'not json')")
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();

        let err = repo.get(&GALLERY_IMAGES, "g1").await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_find_by_column() {
        let (_pool, repo) = setup().await;

        repo.insert(&CATEGORIES, row(json!({"name": "Seeds", "slug": "seeds"})))
            .await
            .unwrap();

        let found = repo
            .find_by(&CATEGORIES, "slug", SqlValue::from("seeds"))
            .await
            .unwrap();
        assert_eq!(found.unwrap()["name"], "Seeds");

        let err = repo
            .find_by(&CATEGORIES, "nope", SqlValue::from("seeds"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownColumn { .. }));
    }

    #[test]
    fn test_sql_value_conversions() {
        let int = Column::new("n", ColumnKind::Integer);
        assert_eq!(SqlValue::from_json(&int, &json!("42")).unwrap(), SqlValue::Integer(42));
        assert_eq!(SqlValue::from_json(&int, &json!(7.0)).unwrap(), SqlValue::Integer(7));
        assert!(SqlValue::from_json(&int, &json!("seven")).is_err());

        let text = Column::new("t", ColumnKind::Text);
        assert_eq!(SqlValue::from_json(&text, &json!(500)).unwrap(), SqlValue::Text("500".into()));
        assert_eq!(SqlValue::from_json(&text, &Value::Null).unwrap(), SqlValue::Null);

        let list = Column::new("l", ColumnKind::TextList);
        assert!(SqlValue::from_json(&list, &json!([1, 2])).is_err());

        let ts = Column::new("ts", ColumnKind::Timestamp);
        assert!(matches!(
            SqlValue::from_json(&ts, &json!("2024-03-01T10:00:00Z")).unwrap(),
            SqlValue::Timestamp(_)
        ));
        assert!(matches!(
            SqlValue::from_json(&ts, &json!("2024-03-01")).unwrap(),
            SqlValue::Timestamp(_)
        ));
    }

    #[test]
    fn test_list_query_normalises_inputs() {
        let q = ListQuery::new(Some("  ".into()), Some("All".into()));
        assert!(q.search.is_none());
        assert!(q.filter.is_none());

        let q = ListQuery::new(Some(" cumin ".into()), Some("spices".into()));
        assert_eq!(q.search.as_deref(), Some("cumin"));
        assert_eq!(q.filter.as_deref(), Some("spices"));
    }

    #[test]
    fn test_build_list_sql() {
        let q = ListQuery::new(Some("a".into()), Some("produce".into()))
            .with_condition("is_active", true)
            .with_limit(5);
        let (sql, params) = build_list_sql(&GALLERY_IMAGES, &q).unwrap();
        assert!(sql.contains(
            "(LOWER(title) LIKE ? ESCAPE '!' OR LOWER(description) LIKE ? ESCAPE '!')"
        ));
        assert!(sql.contains("category = ?"));
        assert!(sql.contains("is_active = ?"));
        assert!(sql.ends_with("ORDER BY sort_order ASC LIMIT 5"));
        assert_eq!(params.len(), 4);
    }
}
