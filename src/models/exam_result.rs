// src/models/exam_result.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

/// Represents the 'results' table in the database.
/// One scored attempt of one user at one exam.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExamResult {
    pub id: i64,
    pub user_id: i64,
    pub exam_id: i64,
    pub score: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

/// A result joined with the user who earned it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Participant {
    pub user_id: i64,
    pub fullname: String,
    pub email: String,
    pub score: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

/// A result joined with the exam it belongs to.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResultHistoryEntry {
    pub exam_id: i64,
    pub exam_title: String,
    pub score: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

const RESULT_COLUMNS: &str = "id, user_id, exam_id, score, total, created_at";

impl ExamResult {
    pub async fn find_for(
        pool: &SqlitePool,
        user_id: i64,
        exam_id: i64,
    ) -> Result<Option<ExamResult>, sqlx::Error> {
        sqlx::query_as::<_, ExamResult>(&format!(
            "SELECT {RESULT_COLUMNS} FROM results WHERE user_id = ? AND exam_id = ?"
        ))
        .bind(user_id)
        .bind(exam_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn insert(
        pool: &SqlitePool,
        user_id: i64,
        exam_id: i64,
        score: i64,
        total: i64,
    ) -> Result<ExamResult, sqlx::Error> {
        sqlx::query_as::<_, ExamResult>(&format!(
            r#"
            INSERT INTO results (user_id, exam_id, score, total, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {RESULT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(exam_id)
        .bind(score)
        .bind(total)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Results of an exam with their users, best score first.
    pub async fn participants(
        pool: &SqlitePool,
        exam_id: i64,
    ) -> Result<Vec<Participant>, sqlx::Error> {
        sqlx::query_as::<_, Participant>(
            r#"
            SELECT
                u.id AS user_id,
                u.fullname,
                u.email,
                r.score,
                r.total,
                r.created_at
            FROM results r
            JOIN users u ON r.user_id = u.id
            WHERE r.exam_id = ?
            ORDER BY r.score DESC, r.created_at ASC
            "#,
        )
        .bind(exam_id)
        .fetch_all(pool)
        .await
    }

    pub async fn history_for_user(
        pool: &SqlitePool,
        user_id: i64,
    ) -> Result<Vec<ResultHistoryEntry>, sqlx::Error> {
        sqlx::query_as::<_, ResultHistoryEntry>(
            r#"
            SELECT
                e.id AS exam_id,
                e.title AS exam_title,
                r.score,
                r.total,
                r.created_at
            FROM results r
            JOIN exams e ON r.exam_id = e.id
            WHERE r.user_id = ?
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Removes every result of an exam. Returns the number of rows removed.
    pub async fn delete_for_exam(pool: &SqlitePool, exam_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM results WHERE exam_id = ?")
            .bind(exam_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
