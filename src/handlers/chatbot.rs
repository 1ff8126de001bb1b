// src/handlers/chatbot.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    services::chatbot::{ChatClient, degraded_reply},
    utils::{guard::login_required, session::RequestContext},
};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Forwards a message to the language model.
///
/// Upstream failures never surface as errors: each kind is logged and
/// answered with a fallback reply.
pub async fn chat(
    Extension(ctx): Extension<RequestContext>,
    State(chat): State<Arc<dyn ChatClient>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let user = login_required(&ctx)?;

    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("Message cannot be empty".to_string()));
    }

    let reply = match chat.reply(message).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(user_id = user.id, error = %e, "chatbot request failed");
            degraded_reply(&e).to_string()
        }
    };

    Ok(Json(ChatReply { reply }))
}
