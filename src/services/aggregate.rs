// src/services/aggregate.rs

use serde::Serialize;
use sqlx::SqlitePool;

use crate::models::{
    exam::Exam,
    exam_result::{ExamResult, Participant},
};

/// Participation statistics of one exam.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipationSummary {
    pub exam: Exam,
    pub participants: Vec<Participant>,
    pub participant_count: usize,
    /// Mean score rounded to 2 decimals, 0 without participants.
    pub average_score: f64,
}

pub fn average_score(scores: &[i64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let mean = scores.iter().sum::<i64>() as f64 / scores.len() as f64;
    (mean * 100.0).round() / 100.0
}

/// Returns `None` when the exam does not exist.
pub async fn summarize(
    pool: &SqlitePool,
    exam_id: i64,
) -> Result<Option<ParticipationSummary>, sqlx::Error> {
    let Some(exam) = Exam::find(pool, exam_id).await? else {
        return Ok(None);
    };

    let participants = ExamResult::participants(pool, exam_id).await?;
    let scores: Vec<i64> = participants.iter().map(|p| p.score).collect();

    Ok(Some(ParticipationSummary {
        exam,
        participant_count: participants.len(),
        average_score: average_score(&scores),
        participants,
    }))
}
