//! Comment repository

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql_pool, sqlite_pool};
use crate::db::DynDatabasePool;
use crate::models::{Comment, CommentWithAuthor};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a new comment
    async fn create(&self, comment: &Comment) -> Result<Comment>;

    /// Get a comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Comments of one news item in chronological order
    async fn list_by_news(&self, news_id: i64) -> Result<Vec<CommentWithAuthor>>;

    /// Replace the text of a comment
    async fn update_text(&self, id: i64, text: &str) -> Result<bool>;

    /// Delete a comment
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Count all comments
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, comment: &Comment) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_comment_sqlite(sqlite_pool(self.pool.as_ref())?, comment).await
            }
            DatabaseDriver::Mysql => {
                create_comment_mysql(mysql_pool(self.pool.as_ref())?, comment).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_comment_by_id_sqlite(sqlite_pool(self.pool.as_ref())?, id).await
            }
            DatabaseDriver::Mysql => {
                get_comment_by_id_mysql(mysql_pool(self.pool.as_ref())?, id).await
            }
        }
    }

    async fn list_by_news(&self, news_id: i64) -> Result<Vec<CommentWithAuthor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_comments_by_news_sqlite(sqlite_pool(self.pool.as_ref())?, news_id).await
            }
            DatabaseDriver::Mysql => {
                list_comments_by_news_mysql(mysql_pool(self.pool.as_ref())?, news_id).await
            }
        }
    }

    async fn update_text(&self, id: i64, text: &str) -> Result<bool> {
        let sql = "UPDATE comments SET text = ? WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(text)
                .bind(id)
                .execute(sqlite_pool(self.pool.as_ref())?)
                .await
                .context("Failed to update comment")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(text)
                .bind(id)
                .execute(mysql_pool(self.pool.as_ref())?)
                .await
                .context("Failed to update comment")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM comments WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .execute(sqlite_pool(self.pool.as_ref())?)
                .await
                .context("Failed to delete comment")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .execute(mysql_pool(self.pool.as_ref())?)
                .await
                .context("Failed to delete comment")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) as count FROM comments";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .fetch_one(sqlite_pool(self.pool.as_ref())?)
                    .await
                    .context("Failed to count comments")?;
                Ok(row.get("count"))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .fetch_one(mysql_pool(self.pool.as_ref())?)
                    .await
                    .context("Failed to count comments")?;
                Ok(row.get("count"))
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_comment_sqlite(pool: &SqlitePool, comment: &Comment) -> Result<Comment> {
    let result = sqlx::query(
        r#"
        INSERT INTO comments (news_id, author_id, text, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(comment.news_id)
    .bind(comment.author_id)
    .bind(&comment.text)
    .bind(comment.created_at)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        ..comment.clone()
    })
}

async fn get_comment_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(
        "SELECT id, news_id, author_id, text, created_at FROM comments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get comment by ID")?;

    Ok(row.map(|row| row_to_comment_sqlite(&row)))
}

async fn list_comments_by_news_sqlite(
    pool: &SqlitePool,
    news_id: i64,
) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.news_id, c.author_id, c.text, c.created_at, u.username
        FROM comments c
        JOIN users u ON u.id = c.author_id
        WHERE c.news_id = ?
        ORDER BY c.created_at ASC, c.id ASC
        "#,
    )
    .bind(news_id)
    .fetch_all(pool)
    .await
    .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentWithAuthor {
            comment: row_to_comment_sqlite(row),
            author: row.get("username"),
        })
        .collect())
}

fn row_to_comment_sqlite(row: &sqlx::sqlite::SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        news_id: row.get("news_id"),
        author_id: row.get("author_id"),
        text: row.get("text"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_comment_mysql(pool: &MySqlPool, comment: &Comment) -> Result<Comment> {
    let result = sqlx::query(
        r#"
        INSERT INTO comments (news_id, author_id, text, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(comment.news_id)
    .bind(comment.author_id)
    .bind(&comment.text)
    .bind(comment.created_at)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_id() as i64,
        ..comment.clone()
    })
}

async fn get_comment_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(
        "SELECT id, news_id, author_id, text, created_at FROM comments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get comment by ID")?;

    Ok(row.map(|row| row_to_comment_mysql(&row)))
}

async fn list_comments_by_news_mysql(
    pool: &MySqlPool,
    news_id: i64,
) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.news_id, c.author_id, c.text, c.created_at, u.username
        FROM comments c
        JOIN users u ON u.id = c.author_id
        WHERE c.news_id = ?
        ORDER BY c.created_at ASC, c.id ASC
        "#,
    )
    .bind(news_id)
    .fetch_all(pool)
    .await
    .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentWithAuthor {
            comment: row_to_comment_mysql(row),
            author: row.get("username"),
        })
        .collect())
}

fn row_to_comment_mysql(row: &sqlx::mysql::MySqlRow) -> Comment {
    Comment {
        id: row.get("id"),
        news_id: row.get("news_id"),
        author_id: row.get("author_id"),
        text: row.get("text"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        NewsRepository, SqlxNewsRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateNewsInput, User};
    use chrono::{Duration, NaiveDate, Utc};

    struct Fixture {
        repo: SqlxCommentRepository,
        news_id: i64,
        author_id: i64,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let author_id = SqlxUserRepository::new(pool.clone())
            .create(&User::new("author".to_string(), "hash".to_string()))
            .await
            .unwrap()
            .id;
        let news_id = SqlxNewsRepository::new(pool.clone())
            .create(&CreateNewsInput::new(
                "Заголовок",
                "Текст",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ))
            .await
            .unwrap()
            .id;

        Fixture {
            repo: SqlxCommentRepository::new(pool),
            news_id,
            author_id,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_comment() {
        let f = setup().await;
        let created = f
            .repo
            .create(&Comment::new(f.news_id, f.author_id, "Текст комментария".to_string()))
            .await
            .unwrap();

        let found = f.repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.text, "Текст комментария");
        assert_eq!(found.author_id, f.author_id);
        assert_eq!(found.news_id, f.news_id);
    }

    #[tokio::test]
    async fn test_list_is_chronological() {
        let f = setup().await;
        let now = Utc::now();
        // Inserted out of order on purpose
        for offset in [3, 1, 2] {
            let mut comment = Comment::new(f.news_id, f.author_id, format!("c{}", offset));
            comment.created_at = now + Duration::days(offset);
            f.repo.create(&comment).await.unwrap();
        }

        let listed = f.repo.list_by_news(f.news_id).await.unwrap();
        let texts: Vec<_> = listed.iter().map(|c| c.comment.text.as_str()).collect();
        assert_eq!(texts, vec!["c1", "c2", "c3"]);
        assert!(listed.iter().all(|c| c.author == "author"));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let f = setup().await;
        let comment = f
            .repo
            .create(&Comment::new(f.news_id, f.author_id, "old".to_string()))
            .await
            .unwrap();

        assert!(f.repo.update_text(comment.id, "new").await.unwrap());
        assert_eq!(f.repo.get_by_id(comment.id).await.unwrap().unwrap().text, "new");

        assert!(f.repo.delete(comment.id).await.unwrap());
        assert!(!f.repo.delete(comment.id).await.unwrap());
        assert!(!f.repo.update_text(comment.id, "gone").await.unwrap());
        assert_eq!(f.repo.count().await.unwrap(), 0);
    }
}
