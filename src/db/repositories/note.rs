//! Note repository

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql_pool, sqlite_pool};
use crate::db::DynDatabasePool;
use crate::models::{Note, NoteDraft};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Note repository trait
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Create a note owned by `author_id`
    async fn create(&self, author_id: i64, draft: &NoteDraft) -> Result<Note>;

    /// Get note by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Note>>;

    /// Get note by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Note>>;

    /// Notes of one author, oldest first
    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Note>>;

    /// Overwrite title, text and slug
    async fn update(&self, id: i64, draft: &NoteDraft) -> Result<bool>;

    /// Delete a note
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Whether `slug` is used by any note other than `exclude_id`
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// Count all notes
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based note repository implementation
pub struct SqlxNoteRepository {
    pool: DynDatabasePool,
}

impl SqlxNoteRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NoteRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NoteRepository for SqlxNoteRepository {
    async fn create(&self, author_id: i64, draft: &NoteDraft) -> Result<Note> {
        let sql = "INSERT INTO notes (title, text, slug, author_id) VALUES (?, ?, ?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(&draft.title)
                .bind(&draft.text)
                .bind(&draft.slug)
                .bind(author_id)
                .execute(sqlite_pool(self.pool.as_ref())?)
                .await
                .context("Failed to create note")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(&draft.title)
                .bind(&draft.text)
                .bind(&draft.slug)
                .bind(author_id)
                .execute(mysql_pool(self.pool.as_ref())?)
                .await
                .context("Failed to create note")?
                .last_insert_id() as i64,
        };

        Ok(Note {
            id,
            title: draft.title.clone(),
            text: draft.text.clone(),
            slug: draft.slug.clone(),
            author_id,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Note>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_note_by_id_sqlite(sqlite_pool(self.pool.as_ref())?, id).await
            }
            DatabaseDriver::Mysql => get_note_by_id_mysql(mysql_pool(self.pool.as_ref())?, id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Note>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_note_by_slug_sqlite(sqlite_pool(self.pool.as_ref())?, slug).await
            }
            DatabaseDriver::Mysql => {
                get_note_by_slug_mysql(mysql_pool(self.pool.as_ref())?, slug).await
            }
        }
    }

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Note>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_notes_by_author_sqlite(sqlite_pool(self.pool.as_ref())?, author_id).await
            }
            DatabaseDriver::Mysql => {
                list_notes_by_author_mysql(mysql_pool(self.pool.as_ref())?, author_id).await
            }
        }
    }

    async fn update(&self, id: i64, draft: &NoteDraft) -> Result<bool> {
        let sql = "UPDATE notes SET title = ?, text = ?, slug = ? WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(&draft.title)
                .bind(&draft.text)
                .bind(&draft.slug)
                .bind(id)
                .execute(sqlite_pool(self.pool.as_ref())?)
                .await
                .context("Failed to update note")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(&draft.title)
                .bind(&draft.text)
                .bind(&draft.slug)
                .bind(id)
                .execute(mysql_pool(self.pool.as_ref())?)
                .await
                .context("Failed to update note")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM notes WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .execute(sqlite_pool(self.pool.as_ref())?)
                .await
                .context("Failed to delete note")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .execute(mysql_pool(self.pool.as_ref())?)
                .await
                .context("Failed to delete note")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        // -1 never matches an AUTOINCREMENT id
        let exclude_id = exclude_id.unwrap_or(-1);
        let sql = "SELECT COUNT(*) as count FROM notes WHERE slug = ? AND id != ?";
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(slug)
                .bind(exclude_id)
                .fetch_one(sqlite_pool(self.pool.as_ref())?)
                .await
                .context("Failed to check slug")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(slug)
                .bind(exclude_id)
                .fetch_one(mysql_pool(self.pool.as_ref())?)
                .await
                .context("Failed to check slug")?
                .get("count"),
        };
        Ok(count > 0)
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) as count FROM notes";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .fetch_one(sqlite_pool(self.pool.as_ref())?)
                    .await
                    .context("Failed to count notes")?;
                Ok(row.get("count"))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .fetch_one(mysql_pool(self.pool.as_ref())?)
                    .await
                    .context("Failed to count notes")?;
                Ok(row.get("count"))
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn get_note_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Note>> {
    let row = sqlx::query("SELECT id, title, text, slug, author_id FROM notes WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get note by ID")?;

    Ok(row.map(|row| row_to_note_sqlite(&row)))
}

async fn get_note_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Note>> {
    let row = sqlx::query("SELECT id, title, text, slug, author_id FROM notes WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get note by slug")?;

    Ok(row.map(|row| row_to_note_sqlite(&row)))
}

async fn list_notes_by_author_sqlite(pool: &SqlitePool, author_id: i64) -> Result<Vec<Note>> {
    let rows = sqlx::query(
        "SELECT id, title, text, slug, author_id FROM notes WHERE author_id = ? ORDER BY id",
    )
    .bind(author_id)
    .fetch_all(pool)
    .await
    .context("Failed to list notes")?;

    Ok(rows.iter().map(row_to_note_sqlite).collect())
}

fn row_to_note_sqlite(row: &sqlx::sqlite::SqliteRow) -> Note {
    Note {
        id: row.get("id"),
        title: row.get("title"),
        text: row.get("text"),
        slug: row.get("slug"),
        author_id: row.get("author_id"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn get_note_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Note>> {
    let row = sqlx::query("SELECT id, title, text, slug, author_id FROM notes WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get note by ID")?;

    Ok(row.map(|row| row_to_note_mysql(&row)))
}

async fn get_note_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Note>> {
    let row = sqlx::query("SELECT id, title, text, slug, author_id FROM notes WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get note by slug")?;

    Ok(row.map(|row| row_to_note_mysql(&row)))
}

async fn list_notes_by_author_mysql(pool: &MySqlPool, author_id: i64) -> Result<Vec<Note>> {
    let rows = sqlx::query(
        "SELECT id, title, text, slug, author_id FROM notes WHERE author_id = ? ORDER BY id",
    )
    .bind(author_id)
    .fetch_all(pool)
    .await
    .context("Failed to list notes")?;

    Ok(rows.iter().map(row_to_note_mysql).collect())
}

fn row_to_note_mysql(row: &sqlx::mysql::MySqlRow) -> Note {
    Note {
        id: row.get("id"),
        title: row.get("title"),
        text: row.get("text"),
        slug: row.get("slug"),
        author_id: row.get("author_id"),
    }
}
