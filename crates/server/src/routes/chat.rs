//! Routes for AI chat and lead outreach messages.

use std::str::FromStr;

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use services::services::{
    completion_api::{ChatMessage, CompletionParams},
    outreach::{LeadProfile, MessageTemplate, OutreachService},
};
use ts_rs::TS;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, TS)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMessageRequest {
    pub lead: LeadProfile,
    pub matched_topics: Vec<String>,
    #[serde(default)]
    pub template: Option<String>,
}

#[derive(Debug, Serialize, TS)]
pub struct GenerateMessageResponse {
    pub message: String,
    pub status: String,
}

/// POST /api/chat
/// Relay a conversation to the completion service.
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let completion = state.completion_client()?;
    let reply = completion
        .chat(payload.messages, CompletionParams::default())
        .await?;
    Ok(Json(ChatResponse { reply }))
}

/// POST /api/generate-message
/// Generate an outreach message for a lead. Unknown template names fall
/// back to the casual style.
pub async fn generate_message(
    State(state): State<AppState>,
    Json(payload): Json<GenerateMessageRequest>,
) -> Result<Json<GenerateMessageResponse>, ApiError> {
    let template = payload
        .template
        .as_deref()
        .map(|t| MessageTemplate::from_str(t).unwrap_or_default())
        .unwrap_or_default();

    let completion = state.completion_client()?;
    let message = OutreachService::new(completion)
        .generate_message(&payload.lead, &payload.matched_topics, template)
        .await?;

    Ok(Json(GenerateMessageResponse {
        message,
        status: "success".to_string(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/generate-message", post(generate_message))
}
