// src/services/grading.rs

//! Exam attempts: grading submitted answers and recording the single
//! allowed attempt per (user, exam).

use std::collections::HashMap;

use sqlx::SqlitePool;

use crate::{
    error::is_unique_violation,
    models::{exam_result::ExamResult, question::Question},
};

/// Score of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grade {
    pub score: i64,
    pub total: i64,
}

/// Where a user stands with an exam. `Submitted` is terminal.
#[derive(Debug, Clone)]
pub enum AttemptState {
    NotStarted,
    Submitted(ExamResult),
}

/// Outcome of trying to record an attempt.
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    Recorded(ExamResult),
    AlreadyTaken,
}

/// Form field carrying the answer to a question.
pub fn answer_field(question_id: i64) -> String {
    format!("q{question_id}")
}

/// Submitted and stored answers match when equal after trimming, ignoring case.
pub fn answers_match(submitted: &str, correct: &str) -> bool {
    submitted.trim().to_lowercase() == correct.trim().to_lowercase()
}

/// Counts correctly answered questions. Unanswered questions count as wrong
/// and fields not naming a question are ignored.
pub fn grade(questions: &[Question], answers: &HashMap<String, String>) -> Grade {
    let score = questions
        .iter()
        .filter(|q| {
            answers
                .get(&answer_field(q.id))
                .is_some_and(|submitted| answers_match(submitted, &q.correct_option))
        })
        .count();

    Grade {
        score: score as i64,
        total: questions.len() as i64,
    }
}

impl AttemptState {
    pub async fn load(
        pool: &SqlitePool,
        user_id: i64,
        exam_id: i64,
    ) -> Result<AttemptState, sqlx::Error> {
        Ok(match ExamResult::find_for(pool, user_id, exam_id).await? {
            Some(result) => AttemptState::Submitted(result),
            None => AttemptState::NotStarted,
        })
    }
}

/// Persists a graded attempt unless one already exists.
///
/// The pre-check catches the common case; the unique index on
/// `results(user_id, exam_id)` catches two submissions racing past it.
pub async fn record_attempt(
    pool: &SqlitePool,
    user_id: i64,
    exam_id: i64,
    grade: Grade,
) -> Result<AttemptOutcome, sqlx::Error> {
    if let AttemptState::Submitted(_) = AttemptState::load(pool, user_id, exam_id).await? {
        return Ok(AttemptOutcome::AlreadyTaken);
    }

    match ExamResult::insert(pool, user_id, exam_id, grade.score, grade.total).await {
        Ok(result) => Ok(AttemptOutcome::Recorded(result)),
        Err(e) if is_unique_violation(&e) => {
            tracing::warn!(user_id, exam_id, "concurrent attempt rejected by unique index");
            Ok(AttemptOutcome::AlreadyTaken)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64, correct: &str) -> Question {
        Question {
            id,
            exam_id: 1,
            question_text: format!("Question {id}"),
            option1: "Paris".to_string(),
            option2: "Berlin".to_string(),
            option3: "Rome".to_string(),
            option4: "Madrid".to_string(),
            correct_option: correct.to_string(),
        }
    }

    fn answers(pairs: &[(i64, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(id, ans)| (answer_field(*id), ans.to_string()))
            .collect()
    }

    #[test]
    fn test_grade_all_correct() {
        let questions = vec![question(1, "Paris"), question(2, "Rome"), question(3, "Madrid")];
        let grade = grade(&questions, &answers(&[(1, "Paris"), (2, "Rome"), (3, "Madrid")]));
        assert_eq!(grade, Grade { score: 3, total: 3 });
    }

    #[test]
    fn test_grade_all_wrong() {
        let questions = vec![question(1, "Paris"), question(2, "Rome")];
        let grade = grade(&questions, &answers(&[(1, "Berlin"), (2, "Madrid")]));
        assert_eq!(grade, Grade { score: 0, total: 2 });
    }

    #[test]
    fn test_grade_missing_answers_count_as_wrong() {
        let questions = vec![question(1, "Paris"), question(2, "Rome")];
        let grade = grade(&questions, &answers(&[(2, "Rome")]));
        assert_eq!(grade, Grade { score: 1, total: 2 });
    }

    #[test]
    fn test_grade_ignores_case_and_whitespace() {
        let questions = vec![question(1, "Paris")];
        let grade = grade(&questions, &answers(&[(1, "  pARIS ")]));
        assert_eq!(grade.score, 1);
    }

    #[test]
    fn test_grade_ignores_unrelated_fields() {
        let questions = vec![question(1, "Paris")];
        let mut submitted = answers(&[(1, "Paris")]);
        submitted.insert("csrf".to_string(), "Paris".to_string());
        submitted.insert(answer_field(99), "Paris".to_string());

        assert_eq!(grade(&questions, &submitted), Grade { score: 1, total: 1 });
    }

    #[test]
    fn test_grade_empty_exam() {
        assert_eq!(grade(&[], &HashMap::new()), Grade { score: 0, total: 0 });
    }
}
