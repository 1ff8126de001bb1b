// src/models/exam.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use validator::Validate;

use crate::utils::html::{clean_html, clean_text};

/// Represents the 'exams' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Exam {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Exam row on the student's exam list.
#[derive(Debug, Clone, Serialize)]
pub struct ExamListItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub question_count: i64,
    /// Whether the current user already submitted this exam.
    pub taken: bool,
}

/// Exam row on the admin dashboard.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExamOverview {
    pub id: i64,
    pub title: String,
    pub question_count: i64,
    pub participant_count: i64,
}

#[derive(FromRow)]
struct ExamListRow {
    id: i64,
    title: String,
    description: Option<String>,
    question_count: i64,
    taken: i64,
}

/// DTO for creating a new exam.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ExamForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
}

impl ExamForm {
    /// Plain-text title and sanitized optional description.
    pub fn cleaned(&self) -> (String, Option<String>) {
        let description = clean_html(&self.description);
        (
            clean_text(&self.title),
            Some(description).filter(|d| !d.is_empty()),
        )
    }
}

const EXAM_COLUMNS: &str = "id, title, description, created_at";

impl Exam {
    pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<Exam>, sqlx::Error> {
        sqlx::query_as::<_, Exam>(&format!("SELECT {EXAM_COLUMNS} FROM exams WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Exam>, sqlx::Error> {
        sqlx::query_as::<_, Exam>(&format!("SELECT {EXAM_COLUMNS} FROM exams ORDER BY id DESC"))
            .fetch_all(pool)
            .await
    }

    /// Exams in creation order, flagged with the user's attempt status.
    pub async fn list_for_user(
        pool: &SqlitePool,
        user_id: i64,
    ) -> Result<Vec<ExamListItem>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ExamListRow>(
            r#"
            SELECT
                e.id,
                e.title,
                e.description,
                (SELECT COUNT(*) FROM questions q WHERE q.exam_id = e.id) AS question_count,
                (SELECT COUNT(*) FROM results r WHERE r.exam_id = e.id AND r.user_id = ?) AS taken
            FROM exams e
            ORDER BY e.id
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ExamListItem {
                id: row.id,
                title: row.title,
                description: row.description,
                question_count: row.question_count,
                taken: row.taken > 0,
            })
            .collect())
    }

    pub async fn overview(pool: &SqlitePool) -> Result<Vec<ExamOverview>, sqlx::Error> {
        sqlx::query_as::<_, ExamOverview>(
            r#"
            SELECT
                e.id,
                e.title,
                (SELECT COUNT(*) FROM questions q WHERE q.exam_id = e.id) AS question_count,
                (SELECT COUNT(*) FROM results r WHERE r.exam_id = e.id) AS participant_count
            FROM exams e
            ORDER BY e.id DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM exams")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    pub async fn create(
        pool: &SqlitePool,
        title: &str,
        description: Option<&str>,
    ) -> Result<Exam, sqlx::Error> {
        sqlx::query_as::<_, Exam>(&format!(
            "INSERT INTO exams (title, description, created_at) VALUES (?, ?, ?) RETURNING {EXAM_COLUMNS}"
        ))
        .bind(title)
        .bind(description)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Deletes the exam with its results and questions in one transaction.
    /// Returns false when no such exam exists.
    pub async fn delete_cascade(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM results WHERE exam_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM questions WHERE exam_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM exams WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}
