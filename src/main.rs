// src/main.rs

use std::{str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use elearning::{
    config::{AdminSeed, Config},
    models::user::User,
    routes,
    services::{chatbot::OpenAiChat, notes_store::NoteStore},
    state::AppState,
    utils::hash::hash_password,
};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment (.env included)
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)
        .context("DATABASE_URL is not a valid SQLite URL")?
        .create_if_missing(true);

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(connect_options.clone())
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    anyhow::bail!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Migrations applied successfully.");

    // Seed Admin User
    if let Some(seed) = &config.admin {
        if let Err(e) = seed_admin_user(&pool, seed).await {
            tracing::error!("Failed to seed admin user: {:?}", e);
        }
    }

    let notes = NoteStore::new(config.upload_dir.clone());
    notes
        .ensure_dir()
        .await
        .with_context(|| format!("Cannot create upload dir {}", notes.root().display()))?;

    if config.chatbot.api_key.is_none() {
        tracing::warn!("CHATBOT_API_KEY not set; chatbot answers with a fallback message");
    }
    let chat = OpenAiChat::new(&config.chatbot).context("Failed to build chatbot client")?;

    let addr = config.bind_addr;

    // Create AppState
    let state = AppState {
        pool,
        config,
        notes,
        chat: Arc::new(chat),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on {}", addr);

    // Start the server
    axum::serve(listener, app).await?;

    Ok(())
}

async fn seed_admin_user(pool: &SqlitePool, seed: &AdminSeed) -> anyhow::Result<()> {
    if User::find_by_email(pool, &seed.email).await?.is_some() {
        return Ok(());
    }

    tracing::info!("Seeding admin user: {}", seed.email);
    let hashed_password = hash_password(&seed.password)?;
    User::create(pool, &seed.fullname, &seed.email, &hashed_password, true).await?;
    tracing::info!("Admin user created successfully.");

    Ok(())
}
