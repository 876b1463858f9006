//! News repository

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql_pool, sqlite_pool};
use crate::db::DynDatabasePool;
use crate::models::{CreateNewsInput, ListParams, News};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// News repository trait
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Publish a news item
    async fn create(&self, input: &CreateNewsInput) -> Result<News>;

    /// Get news by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<News>>;

    /// List news, newest date first, ties broken by newest id
    async fn list(&self, params: &ListParams) -> Result<Vec<News>>;

    /// Count all news items
    async fn count(&self) -> Result<i64>;

    /// Delete a news item together with its comments
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based news repository implementation
pub struct SqlxNewsRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsRepository for SqlxNewsRepository {
    async fn create(&self, input: &CreateNewsInput) -> Result<News> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_news_sqlite(sqlite_pool(self.pool.as_ref())?, input).await,
            DatabaseDriver::Mysql => create_news_mysql(mysql_pool(self.pool.as_ref())?, input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<News>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_news_by_id_sqlite(sqlite_pool(self.pool.as_ref())?, id).await,
            DatabaseDriver::Mysql => get_news_by_id_mysql(mysql_pool(self.pool.as_ref())?, id).await,
        }
    }

    async fn list(&self, params: &ListParams) -> Result<Vec<News>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_news_sqlite(sqlite_pool(self.pool.as_ref())?, params).await,
            DatabaseDriver::Mysql => list_news_mysql(mysql_pool(self.pool.as_ref())?, params).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) as count FROM news";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .fetch_one(sqlite_pool(self.pool.as_ref())?)
                    .await
                    .context("Failed to count news")?;
                Ok(row.get("count"))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .fetch_one(mysql_pool(self.pool.as_ref())?)
                    .await
                    .context("Failed to count news")?;
                Ok(row.get("count"))
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query("DELETE FROM news WHERE id = ?")
                .bind(id)
                .execute(sqlite_pool(self.pool.as_ref())?)
                .await
                .context("Failed to delete news")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query("DELETE FROM news WHERE id = ?")
                .bind(id)
                .execute(mysql_pool(self.pool.as_ref())?)
                .await
                .context("Failed to delete news")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_news_sqlite(pool: &SqlitePool, input: &CreateNewsInput) -> Result<News> {
    let result = sqlx::query("INSERT INTO news (title, text, date) VALUES (?, ?, ?)")
        .bind(&input.title)
        .bind(&input.text)
        .bind(input.date)
        .execute(pool)
        .await
        .context("Failed to create news")?;

    Ok(News {
        id: result.last_insert_rowid(),
        title: input.title.clone(),
        text: input.text.clone(),
        date: input.date,
    })
}

async fn get_news_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<News>> {
    let row = sqlx::query("SELECT id, title, text, date FROM news WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get news by ID")?;

    Ok(row.map(|row| row_to_news_sqlite(&row)))
}

async fn list_news_sqlite(pool: &SqlitePool, params: &ListParams) -> Result<Vec<News>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, text, date
        FROM news
        ORDER BY date DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list news")?;

    Ok(rows.iter().map(row_to_news_sqlite).collect())
}

fn row_to_news_sqlite(row: &sqlx::sqlite::SqliteRow) -> News {
    News {
        id: row.get("id"),
        title: row.get("title"),
        text: row.get("text"),
        date: row.get("date"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_news_mysql(pool: &MySqlPool, input: &CreateNewsInput) -> Result<News> {
    let result = sqlx::query("INSERT INTO news (title, text, date) VALUES (?, ?, ?)")
        .bind(&input.title)
        .bind(&input.text)
        .bind(input.date)
        .execute(pool)
        .await
        .context("Failed to create news")?;

    Ok(News {
        id: result.last_insert_id() as i64,
        title: input.title.clone(),
        text: input.text.clone(),
        date: input.date,
    })
}

async fn get_news_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<News>> {
    let row = sqlx::query("SELECT id, title, text, date FROM news WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get news by ID")?;

    Ok(row.map(|row| row_to_news_mysql(&row)))
}

async fn list_news_mysql(pool: &MySqlPool, params: &ListParams) -> Result<Vec<News>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, text, date
        FROM news
        ORDER BY date DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list news")?;

    Ok(rows.iter().map(row_to_news_mysql).collect())
}

fn row_to_news_mysql(row: &sqlx::mysql::MySqlRow) -> News {
    News {
        id: row.get("id"),
        title: row.get("title"),
        text: row.get("text"),
        date: row.get("date"),
    }
}
