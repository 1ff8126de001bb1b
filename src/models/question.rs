// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use validator::Validate;

use crate::services::grading::answers_match;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Question {
    pub id: i64,
    pub exam_id: i64,
    pub question_text: String,
    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,

    /// Literal text of the correct option, not an index.
    pub correct_option: String,
}

impl Question {
    pub fn options(&self) -> [&str; 4] {
        [&self.option1, &self.option2, &self.option3, &self.option4]
    }
}

/// DTO for sending a question to an examinee (excludes the answer).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    /// Form field the selected option must be posted under.
    pub field: String,
    pub question_text: String,
    pub options: [String; 4],
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            field: crate::services::grading::answer_field(q.id),
            question_text: q.question_text.clone(),
            options: q.options().map(str::to_string),
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct QuestionForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 1000))]
    pub question_text: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 500))]
    pub option1: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 500))]
    pub option2: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 500))]
    pub option3: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 500))]
    pub option4: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 500))]
    pub correct_option: String,
}

impl QuestionForm {
    pub fn trimmed(self) -> Self {
        Self {
            question_text: self.question_text.trim().to_string(),
            option1: self.option1.trim().to_string(),
            option2: self.option2.trim().to_string(),
            option3: self.option3.trim().to_string(),
            option4: self.option4.trim().to_string(),
            correct_option: self.correct_option.trim().to_string(),
        }
    }

    /// The correct option must be one of the four options, compared the way
    /// submissions are graded.
    pub fn correct_option_listed(&self) -> bool {
        [&self.option1, &self.option2, &self.option3, &self.option4]
            .iter()
            .any(|option| answers_match(option, &self.correct_option))
    }
}

const QUESTION_COLUMNS: &str =
    "id, exam_id, question_text, option1, option2, option3, option4, correct_option";

impl Question {
    /// Questions of an exam in insertion order.
    pub async fn list_for_exam(
        pool: &SqlitePool,
        exam_id: i64,
    ) -> Result<Vec<Question>, sqlx::Error> {
        sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE exam_id = ? ORDER BY id"
        ))
        .bind(exam_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        exam_id: i64,
        form: &QuestionForm,
    ) -> Result<Question, sqlx::Error> {
        sqlx::query_as::<_, Question>(&format!(
            r#"
            INSERT INTO questions
            (exam_id, question_text, option1, option2, option3, option4, correct_option)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {QUESTION_COLUMNS}
            "#
        ))
        .bind(exam_id)
        .bind(&form.question_text)
        .bind(&form.option1)
        .bind(&form.option2)
        .bind(&form.option3)
        .bind(&form.option4)
        .bind(&form.correct_option)
        .fetch_one(pool)
        .await
    }
}
