// tests/chatbot_tests.rs

mod common;

use std::sync::Arc;

use common::{StubChat, client, location, spawn_app, spawn_app_with_chat};
use elearning::{
    config::ChatbotConfig,
    services::chatbot::{ChatError, OpenAiChat, degraded_reply},
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

#[tokio::test]
async fn chat_returns_model_reply() {
    // Arrange
    let app = spawn_app().await;
    let user = app.user_client("A", "a@x.com", "pw1").await;

    // Act
    let response = user
        .post(app.url("/chatbot"))
        .json(&json!({ "message": "  What is Rust?  " }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["reply"], "echo: What is Rust?");
}

#[tokio::test]
async fn upstream_failure_degrades_to_fallback_reply() {
    let app = spawn_app_with_chat(Arc::new(StubChat(|_| Err(ChatError::RateLimited)))).await;
    let user = app.user_client("A", "a@x.com", "pw1").await;

    let response = user
        .post(app.url("/chatbot"))
        .json(&json!({ "message": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["reply"], degraded_reply(&ChatError::RateLimited));
}

#[tokio::test]
async fn chat_through_completion_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Study daily." } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let chat = OpenAiChat::new(&ChatbotConfig {
        api_key: Some("sk-test".to_string()),
        api_url: url::Url::parse(&format!("{}/v1/chat/completions", server.uri())).unwrap(),
        model: "test-model".to_string(),
    })
    .unwrap();
    let app = spawn_app_with_chat(Arc::new(chat)).await;
    let user = app.user_client("A", "a@x.com", "pw1").await;

    let response = user
        .post(app.url("/chatbot"))
        .json(&json!({ "message": "Any tips?" }))
        .send()
        .await
        .unwrap();

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["reply"], "Study daily.");
}

#[tokio::test]
async fn server_error_upstream_degrades() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let chat = OpenAiChat::new(&ChatbotConfig {
        api_key: Some("sk-test".to_string()),
        api_url: url::Url::parse(&format!("{}/v1/chat/completions", server.uri())).unwrap(),
        model: "test-model".to_string(),
    })
    .unwrap();
    let app = spawn_app_with_chat(Arc::new(chat)).await;
    let user = app.user_client("A", "a@x.com", "pw1").await;

    let response = user
        .post(app.url("/chatbot"))
        .json(&json!({ "message": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["reply"],
        degraded_reply(&ChatError::Api {
            status: 500,
            message: String::new()
        })
    );
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let app = spawn_app().await;
    let user = app.user_client("A", "a@x.com", "pw1").await;

    for body in [json!({ "message": "   " }), json!({})] {
        let response = user
            .post(app.url("/chatbot"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
    }
}

#[tokio::test]
async fn anonymous_chat_redirects_to_login() {
    let app = spawn_app().await;

    let response = client()
        .post(app.url("/chatbot"))
        .json(&json!({ "message": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(location(&response), "/login");
}
