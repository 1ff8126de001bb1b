// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, chatbot, exam, home, notes},
    state::AppState,
    utils::session::session_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, exams, admin, notes, chatbot).
/// * Applies global middleware (Session, Trace, CORS).
/// * Injects global state.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .allow_credentials(true);

    let auth_routes = Router::new()
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout));

    let exam_routes = Router::new()
        .route("/exam_list", get(exam::exam_list))
        .route(
            "/take_exam/{id}",
            get(exam::take_exam_page).post(exam::submit_exam),
        )
        .route("/result", get(exam::result_page));

    let admin_routes = Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/add_exam", get(admin::add_exam_page).post(admin::add_exam))
        .route(
            "/add_question/{exam_id}",
            get(admin::add_question_page).post(admin::add_question),
        )
        .route("/delete_exam/{id}", post(admin::delete_exam))
        .route("/exam_participants/{id}", get(admin::exam_participants))
        .route("/delete_participants/{id}", post(admin::delete_participants));

    let notes_routes = Router::new()
        .route(
            "/upload_notes",
            get(notes::upload_page)
                .post(notes::upload_notes)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .route("/view_notes", get(notes::view_notes))
        .route("/download/{filename}", get(notes::download))
        .route("/delete_note/{id}", post(notes::delete_note));

    Router::new()
        .route("/", get(home::index))
        .route("/chatbot", post(chatbot::chat))
        .merge(auth_routes)
        .merge(exam_routes)
        .merge(admin_routes)
        .merge(notes_routes)
        // Global Middleware (applied from outside in)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
