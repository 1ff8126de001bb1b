// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,

    pub fullname: String,

    /// Unique, stored trimmed and lowercased.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    pub is_admin: bool,

    pub created_at: DateTime<Utc>,
}

/// The signed-in user as seen by handlers and pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub fullname: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            fullname: user.fullname,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}

/// Registration form. Missing fields deserialize as empty strings so the
/// handler can answer with a flash instead of a rejection.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 150))]
    pub fullname: String,
    #[serde(default)]
    #[validate(email, length(max = 150))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

impl RegisterForm {
    /// Trims the name and canonicalizes the email.
    pub fn normalized(self) -> Self {
        Self {
            fullname: self.fullname.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
        }
    }

    pub fn has_blank_field(&self) -> bool {
        self.fullname.is_empty() || self.email.is_empty() || self.password.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

const USER_COLUMNS: &str = "id, fullname, email, password_hash, is_admin, created_at";

impl User {
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn fullname_taken(pool: &SqlitePool, fullname: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE fullname = ? LIMIT 1")
            .bind(fullname)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn create(
        pool: &SqlitePool,
        fullname: &str,
        email: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (fullname, email, password_hash, is_admin, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(fullname)
        .bind(email)
        .bind(password_hash)
        .bind(is_admin)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }
}
