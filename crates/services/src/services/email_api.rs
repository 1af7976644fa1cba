//! Transactional email client (Resend HTTP API) and the campaign template.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const EMAILS_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone, Error)]
pub enum EmailApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("json error: {0}")]
    Serde(String),
    #[error("RESEND_API_KEY is not set")]
    MissingApiKey,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

/// Provider acknowledgement for a sent email.
#[derive(Debug, Clone, Deserialize)]
pub struct SentEmail {
    pub id: String,
}

/// Seam for dispatching one email. Lets campaign dispatch run against a
/// stub in tests.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<SentEmail, EmailApiError>;
}

/// Transactional email API client. Sends are single-shot: a failed send is
/// reported to the caller, never retried.
#[derive(Debug, Clone)]
pub struct EmailApiClient {
    http: Client,
    api_key: String,
    from: String,
}

impl EmailApiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    const DEFAULT_FROM: &'static str = "Vyapaar <onboarding@resend.dev>";

    pub fn new(api_key: String) -> Result<Self, EmailApiError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("vyapaar/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EmailApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            from: Self::DEFAULT_FROM.to_string(),
        })
    }
}

#[async_trait]
impl EmailSender for EmailApiClient {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<SentEmail, EmailApiError> {
        let request = SendEmailRequest {
            from: &self.from,
            to: vec![to],
            subject,
            html,
        };

        let res = self
            .http
            .post(EMAILS_URL)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<SentEmail>()
                .await
                .map_err(|e| EmailApiError::Serde(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(EmailApiError::InvalidApiKey),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(EmailApiError::Http { status, body })
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> EmailApiError {
    if e.is_timeout() {
        EmailApiError::Timeout
    } else {
        EmailApiError::Transport(e.to_string())
    }
}

/// Fixed campaign template: personalized greeting, generated body, thank-you
/// footer.
pub fn render_email_html(first_name: &str, content: &str) -> String {
    let first_name = escape_html(first_name);
    let content = escape_html(content).replace('\n', "<br/>");
    format!(
        r#"<div style="font-family: Arial, sans-serif; padding: 20px; max-width: 600px; margin: 0 auto;">
  <h1 style="color: #333;">Hello, {first_name}!</h1>
  <div style="margin-top: 20px; line-height: 1.6; color: #444;">{content}</div>
  <div style="margin-top: 30px; padding: 20px; background-color: #f5f5f5; border-radius: 5px; text-align: center;">
    <p style="margin: 0; color: #666;">Thank you for being our valued customer!</p>
  </div>
</div>"#
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_embeds_name_and_content() {
        let html = render_email_html("Asha", "Big sale this week.");
        assert!(html.contains("Hello, Asha!"));
        assert!(html.contains("Big sale this week."));
        assert!(html.contains("valued customer"));
    }

    #[test]
    fn template_escapes_markup() {
        let html = render_email_html("<script>", "a & b");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a &amp; b"));
    }
}
