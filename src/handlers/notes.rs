// src/handlers/notes.rs

use axum::{
    Extension,
    body::Body,
    extract::{Multipart, Path, Request, State},
    http::{HeaderValue, header},
    response::Response,
};
use sqlx::SqlitePool;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::{
    error::AppError,
    models::note::{Note, NoteListing},
    services::notes_store::{NoteStore, sanitize_filename},
    utils::{
        guard::{admin_required, login_required},
        html::clean_text,
        page::{Page, PageRedirect},
        session::{FlashCategory, RequestContext},
    },
};

/// Admin only.
pub async fn upload_page(
    Extension(ctx): Extension<RequestContext>,
    State(pool): State<SqlitePool>,
) -> Result<Page<Vec<NoteListing>>, AppError> {
    admin_required(&ctx)?;
    let notes = Note::list(&pool).await?;
    Ok(Page::new(&ctx, notes))
}

/// Stores an uploaded file and records its metadata.
///
/// Multipart fields: `title` and `file`. The client filename is sanitized
/// before it touches the filesystem. Admin only.
pub async fn upload_notes(
    Extension(ctx): Extension<RequestContext>,
    State(pool): State<SqlitePool>,
    State(notes): State<NoteStore>,
    mut multipart: Multipart,
) -> Result<PageRedirect, AppError> {
    let admin = admin_required(&ctx)?;

    let mut title = String::new();
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => {
                title = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !filename.is_empty() {
                    upload = Some((filename, data.to_vec()));
                }
            }
            _ => {}
        }
    }

    let title = clean_text(&title);
    let Some((original_name, data)) = upload.filter(|_| !title.is_empty()) else {
        return Ok(PageRedirect::to("/upload_notes")
            .flash(FlashCategory::Danger, "Please provide a title and choose a file."));
    };

    let Some(filename) = sanitize_filename(&original_name) else {
        return Ok(PageRedirect::to("/upload_notes")
            .flash(FlashCategory::Danger, "That filename is not allowed."));
    };

    notes.save(&filename, &data).await.map_err(|e| {
        tracing::error!("Failed to store note file {}: {:?}", filename, e);
        AppError::from(e)
    })?;

    let note = Note::create(&pool, &title, &filename, admin.id).await?;
    tracing::info!(note_id = note.id, filename = %note.filename, bytes = data.len(), "note uploaded");

    Ok(PageRedirect::to("/view_notes").flash(FlashCategory::Success, "Notes uploaded successfully."))
}

pub async fn view_notes(
    Extension(ctx): Extension<RequestContext>,
    State(pool): State<SqlitePool>,
) -> Result<Page<Vec<NoteListing>>, AppError> {
    login_required(&ctx)?;
    let notes = Note::list(&pool).await?;
    Ok(Page::new(&ctx, notes))
}

/// Sends a stored note file as an attachment.
pub async fn download(
    Extension(ctx): Extension<RequestContext>,
    State(notes): State<NoteStore>,
    Path(filename): Path<String>,
    req: Request,
) -> Result<Response, AppError> {
    login_required(&ctx)?;

    let path = notes
        .locate(&filename)
        .await
        .ok_or(AppError::NotFound("File not found".to_string()))?;

    let mut response = match ServeFile::new(path).oneshot(req).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };

    // `filename` passed sanitization, so it needs no escaping.
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);

    Ok(response)
}

/// Removes a note's record, and its file unless another note uses it.
/// Admin only.
pub async fn delete_note(
    Extension(ctx): Extension<RequestContext>,
    State(pool): State<SqlitePool>,
    State(notes): State<NoteStore>,
    Path(id): Path<i64>,
) -> Result<PageRedirect, AppError> {
    admin_required(&ctx)?;

    let note = Note::find(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Note not found".to_string()))?;

    // Re-uploads under the same name share one file.
    if Note::filename_shared(&pool, &note.filename, note.id).await? {
        tracing::info!(note_id = note.id, filename = %note.filename, "file kept for other notes");
    } else if let Err(e) = notes.remove(&note.filename).await {
        tracing::warn!("Could not remove note file {}: {:?}", note.filename, e);
    }

    Note::delete(&pool, note.id).await?;
    tracing::info!(note_id = note.id, "note deleted");

    Ok(PageRedirect::to("/view_notes").flash(FlashCategory::Success, "Note deleted."))
}
