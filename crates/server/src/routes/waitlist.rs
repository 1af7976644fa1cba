//! Public waitlist signup.

use std::sync::LazyLock;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use db::models::waitlist::WaitlistEntry;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use crate::{AppState, error::ApiError};

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

#[derive(Debug, Deserialize, TS)]
pub struct WaitlistRequest {
    pub email: String,
}

#[derive(Debug, Serialize, TS)]
pub struct WaitlistResponse {
    pub message: String,
}

/// POST /api/waitlist
/// Insert-if-absent; malformed or already-registered emails are rejected.
pub async fn join_waitlist(
    State(state): State<AppState>,
    Json(payload): Json<WaitlistRequest>,
) -> Result<(StatusCode, Json<WaitlistResponse>), ApiError> {
    if !is_valid_email(&payload.email) {
        return Err(ApiError::BadRequest("Invalid email format".to_string()));
    }

    if WaitlistEntry::find_by_email(&state.db.pool, &payload.email)
        .await?
        .is_some()
    {
        return Err(ApiError::BadRequest(
            "Email already on the waitlist".to_string(),
        ));
    }

    let entry = WaitlistEntry::create(&state.db.pool, &payload.email).await?;
    info!(email = %entry.email, "waitlist signup");

    Ok((
        StatusCode::CREATED,
        Json(WaitlistResponse {
            message: "Email added to waitlist successfully".to_string(),
        }),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/waitlist", post(join_waitlist))
}
