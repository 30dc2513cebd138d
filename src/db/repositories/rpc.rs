//! Database-side procedures
//!
//! Small operations that must run as one statement or one transaction:
//! the blog view counter, the yearly inquiry number sequence, and role
//! lookups used by the admin guard.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Role name granting admin console access
pub const ADMIN_ROLE: &str = "admin";

#[async_trait]
pub trait RpcRepository: Send + Sync {
    /// Add one to a published post's view count. Returns false when no
    /// published post has the slug.
    async fn increment_blog_view_count(&self, slug: &str) -> Result<bool>;

    /// Next inquiry number for the current year, e.g. `INQ-2024-00042`
    async fn generate_inquiry_number(&self) -> Result<String>;

    async fn get_user_role(&self, user_id: &str) -> Result<Option<String>>;

    /// True when the profile exists, is active and has the admin role
    async fn is_admin(&self, user_id: &str) -> Result<bool>;

    async fn keep_database_warm(&self) -> Result<()>;
}

pub struct SqlxRpcRepository {
    pool: DynDatabasePool,
}

impl SqlxRpcRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn RpcRepository> {
        Arc::new(Self::new(pool))
    }

    fn sqlite(&self) -> Result<&SqlitePool> {
        self.pool.as_sqlite().context("SQLite pool expected")
    }

    fn mysql(&self) -> Result<&MySqlPool> {
        self.pool.as_mysql().context("MySQL pool expected")
    }
}

/// Format an inquiry number from its year and sequence
pub fn format_inquiry_number(year: i32, sequence: i64) -> String {
    format!("INQ-{}-{:05}", year, sequence)
}

const INCREMENT_VIEW_SQL: &str =
    "UPDATE agri_blog_posts SET view_count = view_count + 1 WHERE slug = ? AND status = 'published'";
const ROLE_SQL: &str = "SELECT role, is_active FROM profiles WHERE id = ?";
const COUNTER_SQL: &str = "SELECT last_number FROM inquiry_counter WHERE year = ?";

#[async_trait]
impl RpcRepository for SqlxRpcRepository {
    async fn increment_blog_view_count(&self, slug: &str) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(INCREMENT_VIEW_SQL)
                .bind(slug)
                .execute(self.sqlite()?)
                .await?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(INCREMENT_VIEW_SQL)
                .bind(slug)
                .execute(self.mysql()?)
                .await?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn generate_inquiry_number(&self) -> Result<String> {
        let year = Utc::now().year();
        let sequence = match self.pool.driver() {
            DatabaseDriver::Sqlite => next_sequence_sqlite(self.sqlite()?, year).await?,
            DatabaseDriver::Mysql => next_sequence_mysql(self.mysql()?, year).await?,
        };
        Ok(format_inquiry_number(year, sequence))
    }

    async fn get_user_role(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.role_and_status(user_id).await?.map(|(role, _)| role))
    }

    async fn is_admin(&self, user_id: &str) -> Result<bool> {
        Ok(matches!(
            self.role_and_status(user_id).await?,
            Some((role, true)) if role == ADMIN_ROLE
        ))
    }

    async fn keep_database_warm(&self) -> Result<()> {
        self.pool.ping().await
    }
}

impl SqlxRpcRepository {
    async fn role_and_status(&self, user_id: &str) -> Result<Option<(String, bool)>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(ROLE_SQL)
                    .bind(user_id)
                    .fetch_optional(self.sqlite()?)
                    .await
                    .context("Failed to read profile role")?;
                row.map(|r| -> Result<(String, bool)> {
                    Ok((r.try_get("role")?, r.try_get("is_active")?))
                })
                    .transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(ROLE_SQL)
                    .bind(user_id)
                    .fetch_optional(self.mysql()?)
                    .await
                    .context("Failed to read profile role")?;
                row.map(|r| -> Result<(String, bool)> {
                    Ok((r.try_get("role")?, r.try_get("is_active")?))
                })
                    .transpose()
            }
        }
    }
}

async fn next_sequence_sqlite(pool: &SqlitePool, year: i32) -> Result<i64> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO inquiry_counter (year, last_number) VALUES (?, 1) \
         ON CONFLICT(year) DO UPDATE SET last_number = last_number + 1",
    )
    .bind(year as i64)
    .execute(&mut *tx)
    .await
    .context("Failed to advance inquiry counter")?;
    let row = sqlx::query(COUNTER_SQL)
        .bind(year as i64)
        .fetch_one(&mut *tx)
        .await?;
    let sequence: i64 = row.try_get("last_number")?;
    tx.commit().await?;
    Ok(sequence)
}

async fn next_sequence_mysql(pool: &MySqlPool, year: i32) -> Result<i64> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO inquiry_counter (year, last_number) VALUES (?, 1) \
         ON DUPLICATE KEY UPDATE last_number = last_number + 1",
    )
    .bind(year as i64)
    .execute(&mut *tx)
    .await
    .context("Failed to advance inquiry counter")?;
    let row = sqlx::query(COUNTER_SQL)
        .bind(year as i64)
        .fetch_one(&mut *tx)
        .await?;
    let sequence: i64 = row.try_get("last_number")?;
    tx.commit().await?;
    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> (DynDatabasePool, SqlxRpcRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (pool.clone(), SqlxRpcRepository::new(pool))
    }

    #[test]
    fn test_format_inquiry_number() {
        assert_eq!(format_inquiry_number(2024, 7), "INQ-2024-00007");
        assert_eq!(format_inquiry_number(2025, 123456), "INQ-2025-123456");
    }

    #[tokio::test]
    async fn test_generate_inquiry_number_is_sequential() {
        let (_pool, rpc) = setup().await;
        let year = Utc::now().year();

        let first = rpc.generate_inquiry_number().await.unwrap();
        let second = rpc.generate_inquiry_number().await.unwrap();

        assert_eq!(first, format_inquiry_number(year, 1));
        assert_eq!(second, format_inquiry_number(year, 2));
    }

    #[tokio::test]
    async fn test_increment_blog_view_count() {
        let (pool, rpc) = setup().await;
        let sqlite = pool.as_sqlite().unwrap();
        for (id, slug, status) in [("b1", "drip-irrigation", "published"), ("b2", "draft-notes", "draft")] {
            sqlx::query("INSERT INTO agri_blog_posts (id, title, slug, content, status) VALUES (?, 'T', ?, 'body', ?)")
                .bind(id)
                .bind(slug)
                .bind(status)
                .execute(sqlite)
                .await
                .unwrap();
        }

        assert!(rpc.increment_blog_view_count("drip-irrigation").await.unwrap());
        assert!(rpc.increment_blog_view_count("drip-irrigation").await.unwrap());
        assert!(!rpc.increment_blog_view_count("missing").await.unwrap());
        assert!(!rpc.increment_blog_view_count("draft-notes").await.unwrap());

        let count: i64 = sqlx::query_scalar("SELECT view_count FROM agri_blog_posts WHERE id = 'b1'")
            .fetch_one(sqlite)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let draft: i64 = sqlx::query_scalar("SELECT view_count FROM agri_blog_posts WHERE id = 'b2'")
            .fetch_one(sqlite)
            .await
            .unwrap();
        assert_eq!(draft, 0);
    }

    #[tokio::test]
    async fn test_roles() {
        let (pool, rpc) = setup().await;
        let sqlite = pool.as_sqlite().unwrap();
        for (id, role, active) in [("a", "admin", true), ("u", "user", true), ("x", "admin", false)] {
            sqlx::query("INSERT INTO profiles (id, email, role, is_active) VALUES (?, ?, ?, ?)")
                .bind(id)
                .bind(format!("{}@example.com", id))
                .bind(role)
                .bind(active)
                .execute(sqlite)
                .await
                .unwrap();
        }

        assert_eq!(rpc.get_user_role("a").await.unwrap().as_deref(), Some("admin"));
        assert_eq!(rpc.get_user_role("nobody").await.unwrap(), None);
        assert!(rpc.is_admin("a").await.unwrap());
        assert!(!rpc.is_admin("u").await.unwrap());
        assert!(!rpc.is_admin("x").await.unwrap());
        assert!(!rpc.is_admin("nobody").await.unwrap());
    }

    #[tokio::test]
    async fn test_keep_database_warm() {
        let (_pool, rpc) = setup().await;
        rpc.keep_database_warm().await.unwrap();
    }
}
