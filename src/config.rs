// src/config.rs

use std::{env, net::SocketAddr, path::PathBuf};

use dotenvy::dotenv;
use thiserror::Error;
use url::Url;

const DEFAULT_DATABASE_URL: &str = "sqlite://elearning.db?mode=rwc";
const DEFAULT_CHATBOT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_CHATBOT_MODEL: &str = "gpt-4o-mini";

/// Raised when an environment variable is missing or cannot be parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Credentials of the admin account created at startup when absent.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub fullname: String,
    pub email: String,
    pub password: String,
}

/// Settings of the upstream chat-completions API.
#[derive(Debug, Clone)]
pub struct ChatbotConfig {
    /// `None` disables the upstream call; the chatbot answers with a fallback.
    pub api_key: Option<String>,
    pub api_url: Url,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub session_secret: String,
    pub session_ttl_secs: u64,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub bind_addr: SocketAddr,
    pub rust_log: String,
    pub cors_origins: Vec<String>,
    pub chatbot: ChatbotConfig,
    pub admin: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let session_secret =
            env::var("SESSION_SECRET").map_err(|_| ConfigError::Missing("SESSION_SECRET"))?;

        let session_ttl_secs = parse_or("SESSION_TTL_SECS", 86_400)?;
        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", 16 * 1024 * 1024)?;
        let bind_addr = parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?;

        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let cors_origins = parse_origins(
            &env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string()),
        );

        let api_url = env::var("CHATBOT_API_URL").unwrap_or_else(|_| DEFAULT_CHATBOT_URL.to_string());
        let chatbot = ChatbotConfig {
            api_key: env::var("CHATBOT_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            api_url: Url::parse(&api_url).map_err(|e| ConfigError::Invalid {
                name: "CHATBOT_API_URL",
                reason: e.to_string(),
            })?,
            model: env::var("CHATBOT_MODEL").unwrap_or_else(|_| DEFAULT_CHATBOT_MODEL.to_string()),
        };

        let admin = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminSeed {
                fullname: env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
                email: email.trim().to_lowercase(),
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            session_secret,
            session_ttl_secs,
            upload_dir,
            max_upload_bytes,
            bind_addr,
            rust_log,
            cors_origins,
            chatbot,
            admin,
        })
    }
}

fn parse_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Splits a comma separated origin list, dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
