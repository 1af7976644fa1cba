pub mod config;
pub mod error;
pub mod routes;

use axum::Router;
use db::DBService;
use services::services::{
    completion_api::{CompletionApiClient, CompletionApiError},
    email_api::{EmailApiClient, EmailApiError},
};
use tower_http::trace::TraceLayer;

use crate::{config::Config, error::ApiError};

#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub config: Config,
}

impl AppState {
    /// Completion client from configuration. A missing credential is an
    /// explicit error at the call site, not a silent no-op.
    pub fn completion_client(&self) -> Result<CompletionApiClient, ApiError> {
        let api_key = self
            .config
            .groq_api_key
            .clone()
            .ok_or(CompletionApiError::MissingApiKey)?;
        Ok(CompletionApiClient::new(api_key, None)?)
    }

    pub fn email_client(&self) -> Result<EmailApiClient, ApiError> {
        let api_key = self
            .config
            .resend_api_key
            .clone()
            .ok_or(EmailApiError::MissingApiKey)?;
        Ok(EmailApiClient::new(api_key)?)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
