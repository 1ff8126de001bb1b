// src/models/note.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

/// Represents the 'notes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Note {
    pub id: i64,
    pub title: String,

    /// Sanitized name of the file inside the upload directory.
    pub filename: String,

    /// Uploading admin; cleared if that account disappears.
    pub uploaded_by: Option<i64>,

    pub uploaded_at: DateTime<Utc>,
}

/// A note joined with its uploader's name for listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NoteListing {
    pub id: i64,
    pub title: String,
    pub filename: String,
    pub uploader: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

const NOTE_COLUMNS: &str = "id, title, filename, uploaded_by, uploaded_at";

impl Note {
    pub async fn create(
        pool: &SqlitePool,
        title: &str,
        filename: &str,
        uploaded_by: i64,
    ) -> Result<Note, sqlx::Error> {
        sqlx::query_as::<_, Note>(&format!(
            r#"
            INSERT INTO notes (title, filename, uploaded_by, uploaded_at)
            VALUES (?, ?, ?, ?)
            RETURNING {NOTE_COLUMNS}
            "#
        ))
        .bind(title)
        .bind(filename)
        .bind(uploaded_by)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<Note>, sqlx::Error> {
        sqlx::query_as::<_, Note>(&format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All notes, newest first.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<NoteListing>, sqlx::Error> {
        sqlx::query_as::<_, NoteListing>(
            r#"
            SELECT
                n.id,
                n.title,
                n.filename,
                u.fullname AS uploader,
                n.uploaded_at
            FROM notes n
            LEFT JOIN users u ON n.uploaded_by = u.id
            ORDER BY n.uploaded_at DESC, n.id DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notes")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Whether any note other than `id` still points at `filename`.
    pub async fn filename_shared(
        pool: &SqlitePool,
        filename: &str,
        id: i64,
    ) -> Result<bool, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM notes WHERE filename = ? AND id <> ?")
                .bind(filename)
                .bind(id)
                .fetch_one(pool)
                .await?;
        Ok(count > 0)
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
