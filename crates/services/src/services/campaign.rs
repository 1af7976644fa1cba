//! Marketing campaign drafting and dispatch.

use std::{sync::Arc, time::Duration};

use db::models::customer::Customer;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info};
use ts_rs::TS;

use super::{
    completion_api::{ChatMessage, CompletionApiClient, CompletionApiError, CompletionParams},
    email_api::{EmailSender, render_email_html},
};

const MARKETING_SYSTEM_PROMPT: &str = "You are a marketing expert that crafts compelling, \
     personalized email content. Keep the tone professional but friendly.";

/// Pause after every send attempt so dispatch stays inside the email
/// provider's rate limit.
const SEND_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("completion api error: {0}")]
    Completion(#[from] CompletionApiError),
    #[error("no customers found in {region}")]
    NoRecipients { region: String },
    #[error("generated email content was empty")]
    EmptyCopy,
    #[error("failed to send any emails ({attempted} attempted)")]
    AllSendsFailed { attempted: usize },
}

/// Per-recipient dispatch outcome, relayed to the caller as-is.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    pub email: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum CampaignOutcome {
    Preview {
        email_content: String,
        recipient_count: usize,
    },
    Dispatched {
        sent: usize,
        failed: usize,
        total_attempted: usize,
        results: Vec<SendOutcome>,
    },
}

/// Case-insensitive match on the customer's state field.
pub fn filter_by_region(customers: Vec<Customer>, region: &str) -> Vec<Customer> {
    customers
        .into_iter()
        .filter(|c| c.state.eq_ignore_ascii_case(region))
        .collect()
}

pub struct CampaignService {
    pool: SqlitePool,
    completion: CompletionApiClient,
    email: Arc<dyn EmailSender>,
}

impl CampaignService {
    pub fn new(
        pool: SqlitePool,
        completion: CompletionApiClient,
        email: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            pool,
            completion,
            email,
        }
    }

    /// Draft campaign copy for a region and either return it (preview) or
    /// send one email per matched recipient.
    pub async fn draft_or_send(
        &self,
        product: &str,
        region: &str,
        preview_only: bool,
    ) -> Result<CampaignOutcome, CampaignError> {
        let recipients = filter_by_region(Customer::find_all(&self.pool).await?, region);
        info!(
            region,
            recipient_count = recipients.len(),
            "resolved campaign recipients"
        );

        if recipients.is_empty() {
            return Err(CampaignError::NoRecipients {
                region: region.to_string(),
            });
        }

        let email_content = self.draft_copy(product, region).await?;

        if preview_only {
            return Ok(CampaignOutcome::Preview {
                email_content,
                recipient_count: recipients.len(),
            });
        }

        self.dispatch(&recipients, product, region, &email_content)
            .await
    }

    async fn draft_copy(&self, product: &str, region: &str) -> Result<String, CampaignError> {
        let messages = vec![
            ChatMessage::system(MARKETING_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Create a marketing email for {product} targeting customers in {region}. \
                 Include a compelling subject line and a clear call to action."
            )),
        ];
        let copy = self
            .completion
            .chat(messages, CompletionParams::default())
            .await?;
        if copy.trim().is_empty() {
            return Err(CampaignError::EmptyCopy);
        }
        Ok(copy)
    }

    /// One email per recipient, sent strictly in sequence with a fixed pause
    /// after each attempt. Individual failures are recorded, not fatal;
    /// a batch where nothing went out is.
    async fn dispatch(
        &self,
        recipients: &[Customer],
        product: &str,
        region: &str,
        email_content: &str,
    ) -> Result<CampaignOutcome, CampaignError> {
        let subject = format!("Special Offer on {product} for {region} Customers");

        let mut results = Vec::with_capacity(recipients.len());
        for customer in recipients {
            let first_name = if customer.name.is_empty() {
                "Valued Customer"
            } else {
                &customer.name
            };
            let html = render_email_html(first_name, email_content);

            match self.email.send(&customer.email, &subject, &html).await {
                Ok(sent) => {
                    info!(email = %customer.email, "campaign email sent");
                    results.push(SendOutcome {
                        email: customer.email.clone(),
                        success: true,
                        id: Some(sent.id),
                        error: None,
                    });
                }
                Err(e) => {
                    error!(email = %customer.email, "campaign email failed: {e}");
                    results.push(SendOutcome {
                        email: customer.email.clone(),
                        success: false,
                        id: None,
                        error: Some(e.to_string()),
                    });
                }
            }
            tokio::time::sleep(SEND_DELAY).await;
        }

        let sent = results.iter().filter(|r| r.success).count();
        let failed = results.len() - sent;
        info!(sent, failed, "campaign dispatch finished");

        if sent == 0 {
            return Err(CampaignError::AllSendsFailed {
                attempted: results.len(),
            });
        }

        Ok(CampaignOutcome::Dispatched {
            sent,
            failed,
            total_attempted: recipients.len(),
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;
    use crate::services::email_api::{EmailApiError, SentEmail};
    use db::models::customer::CreateCustomer;

    /// Records every attempted send; fails addresses listed in `fail`.
    struct StubSender {
        attempts: Mutex<Vec<String>>,
        fail: Vec<String>,
    }

    impl StubSender {
        fn new(fail: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                attempts: Mutex::new(Vec::new()),
                fail: fail.iter().map(|s| s.to_string()).collect(),
            })
        }
    }

    #[async_trait]
    impl EmailSender for StubSender {
        async fn send(
            &self,
            to: &str,
            _subject: &str,
            _html: &str,
        ) -> Result<SentEmail, EmailApiError> {
            self.attempts.lock().unwrap().push(to.to_string());
            if self.fail.iter().any(|f| f == to) {
                Err(EmailApiError::Http {
                    status: 422,
                    body: "rejected".to_string(),
                })
            } else {
                Ok(SentEmail {
                    id: format!("email-{to}"),
                })
            }
        }
    }

    fn customer(email: &str, state: &str) -> CreateCustomer {
        CreateCustomer {
            name: "Asha".to_string(),
            age: 30,
            email: email.to_string(),
            gender: "female".to_string(),
            phone: format!("+91-{email}"),
            city: "Pune".to_string(),
            state: state.to_string(),
            purchase_history: String::new(),
            business_expenses: 100,
            business_growth_rate: 1.0,
            customer_satisfaction_score: 5,
            loyalty_points: 0,
            average_order_value: 0,
        }
    }

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::MIGRATOR.run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn region_filter_is_case_insensitive() {
        let pool = test_pool().await;
        Customer::upsert(&pool, &customer("a@example.com", "Maharashtra"))
            .await
            .unwrap();
        Customer::upsert(&pool, &customer("b@example.com", "goa"))
            .await
            .unwrap();

        let all = Customer::find_all(&pool).await.unwrap();
        let matched = filter_by_region(all, "MAHARASHTRA");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].email, "a@example.com");
    }

    #[tokio::test]
    async fn empty_region_fails_before_any_completion_call() {
        let pool = test_pool().await;
        Customer::upsert(&pool, &customer("a@example.com", "Goa"))
            .await
            .unwrap();

        // Dummy credentials: the recipient check must short-circuit before
        // either client is exercised.
        let sender = StubSender::new(&[]);
        let service = CampaignService::new(
            pool,
            CompletionApiClient::new("test-key".to_string(), None).unwrap(),
            sender.clone(),
        );

        let err = service
            .draft_or_send("Widgets", "Kerala", true)
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignError::NoRecipients { region } if region == "Kerala"));
        assert!(sender.attempts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dispatch_attempts_each_recipient_once_and_accounts_for_failures() {
        let pool = test_pool().await;
        for email in ["a@example.com", "b@example.com", "c@example.com"] {
            Customer::upsert(&pool, &customer(email, "Goa")).await.unwrap();
        }

        let sender = StubSender::new(&["b@example.com"]);
        let service = CampaignService::new(
            pool.clone(),
            CompletionApiClient::new("test-key".to_string(), None).unwrap(),
            sender.clone(),
        );

        let recipients = filter_by_region(Customer::find_all(&pool).await.unwrap(), "goa");
        let outcome = service
            .dispatch(&recipients, "Widgets", "Goa", "Big sale!")
            .await
            .unwrap();

        match outcome {
            CampaignOutcome::Dispatched {
                sent,
                failed,
                total_attempted,
                results,
            } => {
                assert_eq!(sent, 2);
                assert_eq!(failed, 1);
                assert_eq!(total_attempted, 3);
                assert_eq!(sent + failed, total_attempted);
                assert_eq!(results.len(), 3);
                let failure = results.iter().find(|r| !r.success).unwrap();
                assert_eq!(failure.email, "b@example.com");
                assert!(failure.error.is_some());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let attempts = sender.attempts.lock().unwrap();
        assert_eq!(attempts.len(), 3);
    }

    #[tokio::test]
    async fn zero_successful_sends_fail_the_whole_dispatch() {
        let pool = test_pool().await;
        Customer::upsert(&pool, &customer("a@example.com", "Goa"))
            .await
            .unwrap();

        let sender = StubSender::new(&["a@example.com"]);
        let service = CampaignService::new(
            pool.clone(),
            CompletionApiClient::new("test-key".to_string(), None).unwrap(),
            sender,
        );

        let recipients = filter_by_region(Customer::find_all(&pool).await.unwrap(), "Goa");
        let err = service
            .dispatch(&recipients, "Widgets", "Goa", "Big sale!")
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignError::AllSendsFailed { attempted: 1 }));
    }
}
