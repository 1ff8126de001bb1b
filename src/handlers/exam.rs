// src/handlers/exam.rs

use std::collections::HashMap;

use axum::{
    Extension, Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        exam::{Exam, ExamListItem},
        exam_result::{ExamResult, ResultHistoryEntry},
        question::{PublicQuestion, Question},
    },
    services::grading::{self, AttemptOutcome, AttemptState},
    utils::{
        guard::login_required,
        page::{Page, PageRedirect},
        session::{FlashCategory, RequestContext, SessionUpdate},
    },
};

#[derive(Debug, Serialize)]
pub struct TakeExamView {
    pub exam: Exam,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Serialize)]
pub struct ResultView {
    pub score: i64,
    pub total: i64,
    pub history: Vec<ResultHistoryEntry>,
}

fn already_taken() -> PageRedirect {
    PageRedirect::to("/exam_list").flash(FlashCategory::Warning, "You have already taken this exam.")
}

fn no_questions() -> PageRedirect {
    PageRedirect::to("/exam_list").flash(FlashCategory::Info, "This exam has no questions yet.")
}

async fn find_exam(pool: &SqlitePool, exam_id: i64) -> Result<Exam, AppError> {
    Exam::find(pool, exam_id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))
}

/// Lists every exam, flagging the ones the user already took.
pub async fn exam_list(
    Extension(ctx): Extension<RequestContext>,
    State(pool): State<SqlitePool>,
) -> Result<Page<Vec<ExamListItem>>, AppError> {
    let user = login_required(&ctx)?;
    let exams = Exam::list_for_user(&pool, user.id).await?;
    Ok(Page::new(&ctx, exams))
}

/// Shows an exam's questions without their answers.
///
/// Users who already submitted this exam are sent back to the exam list.
pub async fn take_exam_page(
    Extension(ctx): Extension<RequestContext>,
    State(pool): State<SqlitePool>,
    Path(exam_id): Path<i64>,
) -> Result<Response, AppError> {
    let user = login_required(&ctx)?;
    let exam = find_exam(&pool, exam_id).await?;

    if let AttemptState::Submitted(_) = AttemptState::load(&pool, user.id, exam.id).await? {
        return Ok(already_taken().into_response());
    }

    let questions = Question::list_for_exam(&pool, exam.id).await?;
    if questions.is_empty() {
        return Ok(no_questions().into_response());
    }

    let view = TakeExamView {
        exam,
        questions: questions.iter().map(PublicQuestion::from).collect(),
    };
    Ok(Page::new(&ctx, view).into_response())
}

/// Grades a submission and records the user's single attempt.
///
/// * Form fields are `q<question_id>` => selected option text.
/// * Unanswered questions count as wrong.
/// * The score is kept in the session for the result page.
pub async fn submit_exam(
    Extension(ctx): Extension<RequestContext>,
    State(pool): State<SqlitePool>,
    Path(exam_id): Path<i64>,
    Form(answers): Form<HashMap<String, String>>,
) -> Result<PageRedirect, AppError> {
    let user = login_required(&ctx)?;
    let exam = find_exam(&pool, exam_id).await?;

    if let AttemptState::Submitted(_) = AttemptState::load(&pool, user.id, exam.id).await? {
        return Ok(already_taken());
    }

    let questions = Question::list_for_exam(&pool, exam.id).await?;
    if questions.is_empty() {
        return Ok(no_questions());
    }

    let grade = grading::grade(&questions, &answers);

    match grading::record_attempt(&pool, user.id, exam.id, grade).await {
        Ok(AttemptOutcome::Recorded(result)) => {
            tracing::info!(
                user_id = user.id,
                exam_id = exam.id,
                score = result.score,
                total = result.total,
                "exam submitted"
            );
            Ok(PageRedirect::to("/result")
                .update(SessionUpdate::RecordScore {
                    score: result.score,
                    total: result.total,
                })
                .flash(
                    FlashCategory::Success,
                    format!("You scored {}/{} on {}.", result.score, result.total, exam.title),
                ))
        }
        Ok(AttemptOutcome::AlreadyTaken) => Ok(already_taken()),
        Err(e) => {
            tracing::error!("Failed to record exam result: {:?}", e);
            Err(AppError::from(e))
        }
    }
}

/// Shows the last submitted score plus the user's result history.
pub async fn result_page(
    Extension(ctx): Extension<RequestContext>,
    State(pool): State<SqlitePool>,
) -> Result<Page<ResultView>, AppError> {
    let user = login_required(&ctx)?;
    let history = ExamResult::history_for_user(&pool, user.id).await?;

    let view = ResultView {
        score: ctx.session.last_score.unwrap_or(0),
        total: ctx.session.last_total.unwrap_or(0),
        history,
    };
    Ok(Page::new(&ctx, view))
}
