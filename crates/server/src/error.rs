//! Error-to-response mapping for the HTTP surface.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use services::services::{
    campaign::CampaignError, completion_api::CompletionApiError, csv_ingest::IngestError,
    data_query::DataQueryError, email_api::EmailApiError, outreach::OutreachError,
};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    DataQuery(#[from] DataQueryError),
    #[error(transparent)]
    Campaign(#[from] CampaignError),
    #[error(transparent)]
    Outreach(#[from] OutreachError),
    #[error(transparent)]
    Completion(#[from] CompletionApiError),
    #[error(transparent)]
    Email(#[from] EmailApiError),
}

/// All errors leave as `{"error": ..., "details": ...?}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Ingest(e) => match e {
                IngestError::Csv(_) | IngestError::InvalidRow { .. } => StatusCode::BAD_REQUEST,
                IngestError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Campaign(CampaignError::NoRecipients { .. }) => StatusCode::NOT_FOUND,
            Self::DataQuery(_)
            | Self::Campaign(_)
            | Self::Outreach(_)
            | Self::Completion(_)
            | Self::Email(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Ingest(e @ (IngestError::InvalidRow { .. } | IngestError::Database { .. })) => {
                Some(serde_json::json!({ "rowsCommitted": e.rows_committed() }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {self}");
        }
        let body = ErrorBody {
            error: self.to_string(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}
