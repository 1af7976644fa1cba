//! Routes for drafting and dispatching marketing campaigns.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use services::services::campaign::{CampaignOutcome, CampaignService, SendOutcome};
use ts_rs::TS;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CraftEmailRequest {
    pub product: String,
    pub region: String,
    #[serde(default)]
    pub preview_only: bool,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub email_content: String,
    pub recipient_count: usize,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResponse {
    pub message: String,
    pub recipient_count: usize,
    pub failed_count: usize,
    pub total_attempted: usize,
    pub results: Vec<SendOutcome>,
}

/// POST /api/craft-email
/// Generate campaign copy for a region; send it to every matched customer
/// unless `previewOnly` is set.
pub async fn craft_email(
    State(state): State<AppState>,
    Json(payload): Json<CraftEmailRequest>,
) -> Result<Response, ApiError> {
    let completion = state.completion_client()?;
    let email = state.email_client()?;
    let service = CampaignService::new(state.db.pool.clone(), completion, Arc::new(email));

    let outcome = service
        .draft_or_send(&payload.product, &payload.region, payload.preview_only)
        .await?;

    Ok(match outcome {
        CampaignOutcome::Preview {
            email_content,
            recipient_count,
        } => Json(PreviewResponse {
            email_content,
            recipient_count,
        })
        .into_response(),
        CampaignOutcome::Dispatched {
            sent,
            failed,
            total_attempted,
            results,
        } => Json(DispatchResponse {
            message: "Emails sent successfully".to_string(),
            recipient_count: sent,
            failed_count: failed,
            total_attempted,
            results,
        })
        .into_response(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/craft-email", post(craft_email))
}
