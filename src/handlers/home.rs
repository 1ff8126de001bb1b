// src/handlers/home.rs

use axum::{Extension, extract::State};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{exam::Exam, note::Note},
    utils::{page::Page, session::RequestContext},
};

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub exam_count: i64,
    pub note_count: i64,
}

pub async fn index(
    Extension(ctx): Extension<RequestContext>,
    State(pool): State<SqlitePool>,
) -> Result<Page<HomeView>, AppError> {
    let view = HomeView {
        exam_count: Exam::count(&pool).await?,
        note_count: Note::count(&pool).await?,
    };
    Ok(Page::new(&ctx, view))
}
