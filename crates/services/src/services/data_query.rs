//! Natural-language queries over the customer dataset.

use db::models::customer::Customer;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use super::completion_api::{
    ChatMessage, CompletionApiClient, CompletionApiError, CompletionParams,
};

const QUERY_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that answers questions about customer data.";

#[derive(Debug, Error)]
pub enum DataQueryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("completion api error: {0}")]
    Completion(#[from] CompletionApiError),
    #[error("failed to serialize customer data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Answers free-text questions by handing the completion model the entire
/// record set as context. Deliberately unwindowed: the dataset this serves
/// is small, and the behavior matches what users see today.
pub struct DataQueryService {
    pool: SqlitePool,
    completion: CompletionApiClient,
}

impl DataQueryService {
    pub fn new(pool: SqlitePool, completion: CompletionApiClient) -> Self {
        Self { pool, completion }
    }

    /// Answer a question about the stored customers. The model's first
    /// completion is relayed verbatim.
    pub async fn answer(&self, question: &str) -> Result<String, DataQueryError> {
        let customers = Customer::find_all(&self.pool).await?;
        info!(customer_count = customers.len(), "answering data query");

        let dataset = serde_json::to_string_pretty(&customers)?;
        Ok(self
            .completion
            .chat(
                build_query_messages(&dataset, question),
                CompletionParams::default(),
            )
            .await?)
    }
}

fn build_query_messages(dataset: &str, question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(QUERY_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Here is the customer data:\n\n{dataset}\n\nQuestion: {question}"
        )),
    ]
}
