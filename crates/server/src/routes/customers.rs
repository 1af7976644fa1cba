//! Routes for customer records: CSV import, listing, and AI queries.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::{get, post},
};
use db::models::customer::Customer;
use serde::{Deserialize, Serialize};
use services::services::{csv_ingest::CsvIngest, data_query::DataQueryService};
use tracing::info;
use ts_rs::TS;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UploadCsvResponse {
    pub message: String,
    /// Rows committed to the store. A failed import reports the committed
    /// count in the error details instead.
    pub record_count: usize,
}

#[derive(Debug, Deserialize, TS)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize, TS)]
pub struct QueryResponse {
    pub reply: String,
}

/// POST /api/upload-csv
/// Import a customer CSV: multipart form with a `file` field.
pub async fn upload_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadCsvResponse>, ApiError> {
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            file = Some(data);
            break;
        }
    }
    let file = file.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let summary = CsvIngest::new(state.db.pool.clone()).ingest(&file).await?;
    info!(
        rows_parsed = summary.rows_parsed,
        rows_committed = summary.rows_committed,
        "customer csv imported"
    );

    Ok(Json(UploadCsvResponse {
        message: "CSV data processed successfully".to_string(),
        record_count: summary.rows_committed,
    }))
}

/// POST /api/query-csv
/// Answer a free-text question about the stored customers.
pub async fn query_csv(
    State(state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let completion = state.completion_client()?;
    let reply = DataQueryService::new(state.db.pool.clone(), completion)
        .answer(&payload.query)
        .await?;
    Ok(Json(QueryResponse { reply }))
}

/// GET /api/customers
/// Full customer listing for the dashboard views.
pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    Ok(Json(Customer::find_all(&state.db.pool).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload-csv", post(upload_csv))
        .route("/query-csv", post(query_csv))
        .route("/customers", get(list_customers))
}
