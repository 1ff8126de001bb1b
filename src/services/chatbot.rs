// src/services/chatbot.rs

//! Client for an OpenAI-compatible chat-completions API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::ChatbotConfig;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const SYSTEM_PROMPT: &str = "You are a friendly study assistant for an e-learning site. \
Answer questions about the course material clearly and briefly.";

/// Errors that can occur when asking the upstream chat API.
#[derive(Debug, Error)]
pub enum ChatError {
    /// No API key configured.
    #[error("chatbot is not configured")]
    NotConfigured,

    /// The request never got a response (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The API returned 429.
    #[error("rate limited by upstream")]
    RateLimited,

    /// The API returned another non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The body was not the expected completion shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Text shown to the user when the chatbot could not answer.
pub fn degraded_reply(err: &ChatError) -> &'static str {
    match err {
        ChatError::NotConfigured => "The chatbot is not available right now.",
        ChatError::Network(_) => {
            "Sorry, I couldn't reach the assistant. Please check back in a moment."
        }
        ChatError::RateLimited => {
            "The assistant is receiving too many questions right now. Please try again shortly."
        }
        ChatError::Api { .. } | ChatError::MalformedResponse(_) => {
            "Sorry, something went wrong while answering. Please try again later."
        }
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn reply(&self, message: &str) -> Result<String, ChatError>;
}

pub struct OpenAiChat {
    api_key: Option<String>,
    endpoint: Url,
    model: String,
    client: reqwest::Client,
}

impl OpenAiChat {
    pub fn new(config: &ChatbotConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            api_key: config.api_key.clone(),
            endpoint: config.api_url.clone(),
            model: config.model.clone(),
            client,
        })
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionChoiceMessage,
}

#[derive(Deserialize)]
struct CompletionChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl ChatClient for OpenAiChat {
    #[instrument(skip(self, message), fields(model = %self.model))]
    async fn reply(&self, message: &str) -> Result<String, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::NotConfigured)?;

        let body = CompletionRequest {
            model: &self.model,
            messages: vec![
                CompletionMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                CompletionMessage {
                    role: "user",
                    content: message,
                },
            ],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ChatError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::MalformedResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ChatError::MalformedResponse("no completion text".to_string()))
    }
}
