// src/handlers/admin.rs

use axum::{
    Extension, Form,
    extract::{Path, State},
};
use serde::Serialize;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        exam::{Exam, ExamForm, ExamOverview},
        exam_result::ExamResult,
        question::{Question, QuestionForm},
    },
    services::aggregate::{self, ParticipationSummary},
    utils::{
        guard::admin_required,
        page::{Page, PageRedirect},
        session::{FlashCategory, RequestContext},
    },
};

/// Admin view of one exam with its full questions (answers included).
#[derive(Debug, Serialize)]
pub struct ExamEditorView {
    pub exam: Exam,
    pub questions: Vec<Question>,
}

/// Exams with question and participant counts.
/// Admin only.
pub async fn dashboard(
    Extension(ctx): Extension<RequestContext>,
    State(pool): State<SqlitePool>,
) -> Result<Page<Vec<ExamOverview>>, AppError> {
    admin_required(&ctx)?;
    let exams = Exam::overview(&pool).await?;
    Ok(Page::new(&ctx, exams))
}

/// Admin only.
pub async fn add_exam_page(
    Extension(ctx): Extension<RequestContext>,
    State(pool): State<SqlitePool>,
) -> Result<Page<Vec<Exam>>, AppError> {
    admin_required(&ctx)?;
    let exams = Exam::list_all(&pool).await?;
    Ok(Page::new(&ctx, exams))
}

/// Creates a new exam and continues to its question editor.
/// Admin only.
pub async fn add_exam(
    Extension(ctx): Extension<RequestContext>,
    State(pool): State<SqlitePool>,
    Form(form): Form<ExamForm>,
) -> Result<PageRedirect, AppError> {
    let admin = admin_required(&ctx)?;

    let (title, description) = form.cleaned();
    if form.validate().is_err() || title.is_empty() {
        return Ok(PageRedirect::to("/add_exam")
            .flash(FlashCategory::Danger, "Exam title is required."));
    }

    let exam = Exam::create(&pool, &title, description.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create exam: {:?}", e);
            AppError::from(e)
        })?;

    tracing::info!(exam_id = exam.id, admin_id = admin.id, "exam created");

    Ok(PageRedirect::to(format!("/add_question/{}", exam.id)).flash(
        FlashCategory::Success,
        format!("Exam '{}' created. Now add questions.", exam.title),
    ))
}

/// Admin only.
pub async fn add_question_page(
    Extension(ctx): Extension<RequestContext>,
    State(pool): State<SqlitePool>,
    Path(exam_id): Path<i64>,
) -> Result<Page<ExamEditorView>, AppError> {
    admin_required(&ctx)?;

    let exam = Exam::find(&pool, exam_id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;
    let questions = Question::list_for_exam(&pool, exam.id).await?;

    Ok(Page::new(&ctx, ExamEditorView { exam, questions }))
}

/// Adds a question to an exam.
///
/// All fields are required and the correct option must be one of the four
/// options. Admin only.
pub async fn add_question(
    Extension(ctx): Extension<RequestContext>,
    State(pool): State<SqlitePool>,
    Path(exam_id): Path<i64>,
    Form(form): Form<QuestionForm>,
) -> Result<PageRedirect, AppError> {
    admin_required(&ctx)?;

    let exam = Exam::find(&pool, exam_id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    let editor = format!("/add_question/{}", exam.id);
    let form = form.trimmed();

    if form.validate().is_err() {
        return Ok(PageRedirect::to(editor)
            .flash(FlashCategory::Danger, "Please fill out all fields."));
    }

    if !form.correct_option_listed() {
        return Ok(PageRedirect::to(editor).flash(
            FlashCategory::Danger,
            "The correct answer must match one of the four options.",
        ));
    }

    let question = Question::create(&pool, exam.id, &form).await.map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(exam_id = exam.id, question_id = question.id, "question added");

    Ok(PageRedirect::to(editor).flash(FlashCategory::Success, "Question added."))
}

/// Deletes an exam together with its questions and results.
/// Admin only.
pub async fn delete_exam(
    Extension(ctx): Extension<RequestContext>,
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<PageRedirect, AppError> {
    admin_required(&ctx)?;

    let deleted = Exam::delete_cascade(&pool, id).await.map_err(|e| {
        tracing::error!("Failed to delete exam: {:?}", e);
        AppError::from(e)
    })?;

    if !deleted {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    tracing::info!(exam_id = id, "exam deleted");

    Ok(PageRedirect::to("/add_exam").flash(FlashCategory::Success, "Exam deleted."))
}

/// Participants of an exam with their scores and the average.
/// Admin only.
pub async fn exam_participants(
    Extension(ctx): Extension<RequestContext>,
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<Page<ParticipationSummary>, AppError> {
    admin_required(&ctx)?;

    let summary = aggregate::summarize(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    Ok(Page::new(&ctx, summary))
}

/// Removes every result of an exam so it can be taken again.
/// Admin only.
pub async fn delete_participants(
    Extension(ctx): Extension<RequestContext>,
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<PageRedirect, AppError> {
    admin_required(&ctx)?;

    let exam = Exam::find(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    let removed = ExamResult::delete_for_exam(&pool, exam.id).await?;
    tracing::info!(exam_id = exam.id, removed, "participants cleared");

    Ok(PageRedirect::to(format!("/exam_participants/{}", exam.id))
        .flash(FlashCategory::Info, format!("Removed {removed} result(s).")))
}
