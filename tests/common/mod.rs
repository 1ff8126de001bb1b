// tests/common/mod.rs

#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use elearning::{
    config::{ChatbotConfig, Config},
    models::user::User,
    routes,
    services::{
        chatbot::{ChatClient, ChatError},
        notes_store::NoteStore,
    },
    state::AppState,
    utils::hash::hash_password,
};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tempfile::TempDir;

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub upload_dir: PathBuf,
    _dir: TempDir,
}

/// Chat client answering from a canned closure instead of the network.
pub struct StubChat(pub fn(&str) -> Result<String, ChatError>);

#[async_trait]
impl ChatClient for StubChat {
    async fn reply(&self, message: &str) -> Result<String, ChatError> {
        (self.0)(message)
    }
}

/// Spawns the app on a random port, backed by a fresh SQLite file.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_chat(Arc::new(StubChat(|msg| Ok(format!("echo: {msg}"))))).await
}

pub async fn spawn_app_with_chat(chat: Arc<dyn ChatClient>) -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    // 1. Create a pool on a throwaway database file
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("test.db"))
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("Failed to open SQLite test database");

    // 2. Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    // 3. Create test configuration and state
    let upload_dir = dir.path().join("uploads");
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        session_secret: "test_secret_for_integration_tests".to_string(),
        session_ttl_secs: 600,
        upload_dir: upload_dir.clone(),
        max_upload_bytes: 1024 * 1024,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        rust_log: "error".to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        chatbot: ChatbotConfig {
            api_key: None,
            api_url: url::Url::parse("http://127.0.0.1:9/v1/chat/completions").unwrap(),
            model: "test-model".to_string(),
        },
        admin: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
        notes: NoteStore::new(upload_dir.clone()),
        chat,
    };

    // 4. Create the router with the app state
    let app = routes::create_router(state);

    // 5. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 6. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        pool,
        upload_dir,
        _dir: dir,
    }
}

/// A browser-like client: keeps cookies, does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

pub fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get("location")
        .expect("response has no Location header")
        .to_str()
        .unwrap()
}

pub fn flash_messages(page: &serde_json::Value) -> Vec<String> {
    page["flashes"]
        .as_array()
        .map(|flashes| {
            flashes
                .iter()
                .filter_map(|f| f["message"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(
        &self,
        client: &reqwest::Client,
        fullname: &str,
        email: &str,
        password: &str,
    ) -> reqwest::Response {
        client
            .post(self.url("/register"))
            .form(&[("fullname", fullname), ("email", email), ("password", password)])
            .send()
            .await
            .expect("Register failed")
    }

    pub async fn login(
        &self,
        client: &reqwest::Client,
        email: &str,
        password: &str,
    ) -> reqwest::Response {
        client
            .post(self.url("/login"))
            .form(&[("email", email), ("password", password)])
            .send()
            .await
            .expect("Login failed")
    }

    /// Inserts an admin directly, the way the startup seed does.
    pub async fn create_admin(&self, email: &str, password: &str) -> User {
        let hash = hash_password(password).unwrap();
        User::create(&self.pool, "Admin", email, &hash, true)
            .await
            .expect("Failed to create admin")
    }

    /// Returns a client already logged in as a fresh admin.
    pub async fn admin_client(&self) -> reqwest::Client {
        let email = format!("admin_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);
        self.create_admin(&email, "adminpw").await;
        let client = client();
        let resp = self.login(&client, &email, "adminpw").await;
        assert_eq!(location(&resp), "/");
        client
    }

    /// Registers and logs in a regular user.
    pub async fn user_client(&self, fullname: &str, email: &str, password: &str) -> reqwest::Client {
        let client = client();
        self.register(&client, fullname, email, password).await;
        let resp = self.login(&client, email, password).await;
        assert_eq!(location(&resp), "/");
        client
    }

    pub async fn page(&self, client: &reqwest::Client, path: &str) -> serde_json::Value {
        let resp = client
            .get(self.url(path))
            .send()
            .await
            .expect("Page request failed");
        assert_eq!(resp.status().as_u16(), 200, "GET {path} did not render");
        resp.json().await.expect("Page is not JSON")
    }

    /// Creates an exam through the admin form and returns its id.
    pub async fn create_exam(&self, admin: &reqwest::Client, title: &str) -> i64 {
        let resp = admin
            .post(self.url("/add_exam"))
            .form(&[("title", title), ("description", "")])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 303);
        location(&resp)
            .trim_start_matches("/add_question/")
            .parse()
            .expect("redirect does not name the new exam")
    }

    /// Adds a question with options Paris/Berlin/Rome/Madrid.
    pub async fn add_question(
        &self,
        admin: &reqwest::Client,
        exam_id: i64,
        text: &str,
        correct: &str,
    ) -> reqwest::Response {
        admin
            .post(self.url(&format!("/add_question/{exam_id}")))
            .form(&[
                ("question_text", text),
                ("option1", "Paris"),
                ("option2", "Berlin"),
                ("option3", "Rome"),
                ("option4", "Madrid"),
                ("correct_option", correct),
            ])
            .send()
            .await
            .unwrap()
    }

    pub async fn question_ids(&self, exam_id: i64) -> Vec<i64> {
        sqlx::query_as::<_, (i64,)>("SELECT id FROM questions WHERE exam_id = ? ORDER BY id")
            .bind(exam_id)
            .fetch_all(&self.pool)
            .await
            .unwrap()
            .into_iter()
            .map(|(id,)| id)
            .collect()
    }

    pub async fn scalar(&self, sql: &str) -> i64 {
        let (value,): (i64,) = sqlx::query_as(sql).fetch_one(&self.pool).await.unwrap();
        value
    }

    pub async fn count(&self, sql: &str, id: i64) -> i64 {
        let (count,): (i64,) = sqlx::query_as(sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .unwrap();
        count
    }
}
