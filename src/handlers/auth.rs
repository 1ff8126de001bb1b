// src/handlers/auth.rs

use axum::{
    Extension, Form,
    extract::State,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::user::{LoginForm, RegisterForm, User, normalize_email},
    utils::{
        hash::{hash_password, verify_password},
        page::{Page, PageRedirect},
        session::{FlashCategory, RequestContext, SessionUpdate},
    },
};

const DUPLICATE_EMAIL: &str = "An account with that email already exists. Please log in.";

pub async fn register_page(Extension(ctx): Extension<RequestContext>) -> Page<()> {
    Page::new(&ctx, ())
}

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it. Duplicate emails and
/// names are rejected without touching the existing account.
pub async fn register(
    State(pool): State<SqlitePool>,
    Form(form): Form<RegisterForm>,
) -> Result<PageRedirect, AppError> {
    let form = form.normalized();

    if form.has_blank_field() {
        return Ok(PageRedirect::to("/register")
            .flash(FlashCategory::Danger, "Please fill out all fields."));
    }

    if let Err(validation_errors) = form.validate() {
        let message = if validation_errors.field_errors().contains_key("email") {
            "Please enter a valid email address."
        } else {
            "One of the fields is too long."
        };
        return Ok(PageRedirect::to("/register").flash(FlashCategory::Danger, message));
    }

    if User::find_by_email(&pool, &form.email).await?.is_some() {
        return Ok(PageRedirect::to("/login").flash(FlashCategory::Warning, DUPLICATE_EMAIL));
    }

    if User::fullname_taken(&pool, &form.fullname).await? {
        return Ok(PageRedirect::to("/register")
            .flash(FlashCategory::Warning, "That name is already registered."));
    }

    let hashed_password = hash_password(&form.password)?;

    match User::create(&pool, &form.fullname, &form.email, &hashed_password, false).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, "user registered");
            Ok(PageRedirect::to("/login")
                .flash(FlashCategory::Success, "Registration successful. Please log in."))
        }
        // Lost a race against another registration with the same email.
        Err(e) if is_unique_violation(&e) => {
            Ok(PageRedirect::to("/login").flash(FlashCategory::Warning, DUPLICATE_EMAIL))
        }
        Err(e) => {
            tracing::error!("Failed to register user: {:?}", e);
            Err(AppError::from(e))
        }
    }
}

pub async fn login_page(Extension(ctx): Extension<RequestContext>) -> Page<()> {
    Page::new(&ctx, ())
}

/// Authenticates a user and binds the session to them.
pub async fn login(
    State(pool): State<SqlitePool>,
    Form(form): Form<LoginForm>,
) -> Result<PageRedirect, AppError> {
    let user = User::find_by_email(&pool, &normalize_email(&form.email)).await?;

    let user = match user {
        Some(user) if verify_password(&form.password, &user.password_hash)? => user,
        _ => {
            return Ok(PageRedirect::to("/login")
                .flash(FlashCategory::Danger, "Invalid email or password."));
        }
    };

    tracing::info!(user_id = user.id, "user logged in");

    Ok(PageRedirect::to("/")
        .update(SessionUpdate::SignIn(user.id))
        .flash(FlashCategory::Success, format!("Welcome, {}!", user.fullname)))
}

pub async fn logout() -> PageRedirect {
    PageRedirect::to("/")
        .update(SessionUpdate::SignOut)
        .flash(FlashCategory::Info, "You have been logged out.")
}
