//! Personalized outreach messages for prospective leads.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;
use tracing::info;
use ts_rs::TS;

use super::completion_api::{
    ChatMessage, CompletionApiClient, CompletionApiError, CompletionParams,
};

const OUTREACH_SYSTEM_PROMPT: &str = "You are an expert at writing personalized, engaging \
     outreach messages that start meaningful business conversations.";

#[derive(Debug, Error)]
pub enum OutreachError {
    #[error("completion api error: {0}")]
    Completion(#[from] CompletionApiError),
    #[error("no message generated")]
    EmptyMessage,
}

/// Tone of the generated message. Unknown inputs fall back to casual.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, EnumString, Display, Default, TS)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MessageTemplate {
    #[default]
    Casual,
    Professional,
    Direct,
}

impl MessageTemplate {
    fn style(self) -> &'static str {
        match self {
            Self::Casual => "friendly and conversational",
            Self::Professional => "formal and business-focused",
            Self::Direct => "concise and straightforward",
        }
    }
}

/// Lead details supplied by the caller. The lead table itself is not read
/// here; monitoring is not wired up.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct LeadProfile {
    pub name: String,
    pub username: String,
    pub bio: Option<String>,
    pub tweet: String,
    pub follower_count: i64,
}

pub struct OutreachService {
    completion: CompletionApiClient,
}

impl OutreachService {
    pub fn new(completion: CompletionApiClient) -> Self {
        Self { completion }
    }

    /// Generate a short outreach message referencing the lead's own
    /// activity and the topics they match on.
    pub async fn generate_message(
        &self,
        lead: &LeadProfile,
        matched_topics: &[String],
        template: MessageTemplate,
    ) -> Result<String, OutreachError> {
        let prompt = build_prompt(lead, matched_topics, template);
        info!(username = %lead.username, %template, "generating outreach message");

        let message = self
            .completion
            .chat(
                vec![
                    ChatMessage::system(OUTREACH_SYSTEM_PROMPT),
                    ChatMessage::user(prompt),
                ],
                CompletionParams {
                    temperature: Some(0.7),
                    max_tokens: Some(200),
                },
            )
            .await?;

        let message = message.trim();
        if message.is_empty() {
            return Err(OutreachError::EmptyMessage);
        }
        Ok(message.to_string())
    }
}

fn build_prompt(lead: &LeadProfile, matched_topics: &[String], template: MessageTemplate) -> String {
    let style = template.style();
    let topics = matched_topics.join(", ");
    format!(
        "As a business development expert, create a {style} outreach message for a potential \
         lead with the following details:\n\n\
         Name: {name}\n\
         Twitter Username: @{username}\n\
         Bio: {bio}\n\
         Recent Tweet: \"{tweet}\"\n\
         Topics of Interest: {topics}\n\
         Follower Count: {followers}\n\n\
         Requirements for the message:\n\
         1. Keep it brief and conversational (2-3 sentences)\n\
         2. Reference their recent tweet or bio naturally\n\
         3. Mention our shared interest in: {topics}\n\
         4. Include a soft call to action (like asking for a quick chat)\n\
         5. Match the {style} style\n\
         6. Don't be overly sales-focused\n\n\
         Generate only the message without any additional formatting or context.",
        name = lead.name,
        username = lead.username,
        bio = lead.bio.as_deref().unwrap_or("No bio available"),
        tweet = lead.tweet,
        followers = format_follower_count(lead.follower_count),
    )
}

/// Thousands-separated count, e.g. 12500 -> "12,500".
fn format_follower_count(count: i64) -> String {
    let digits = count.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if count < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn lead() -> LeadProfile {
        LeadProfile {
            name: "Ravi Kumar".to_string(),
            username: "ravi_builds".to_string(),
            bio: None,
            tweet: "Shipping my first SaaS this month".to_string(),
            follower_count: 12_500,
        }
    }

    #[test]
    fn unknown_template_falls_back_to_casual() {
        let parsed = MessageTemplate::from_str("snarky").unwrap_or_default();
        assert_eq!(parsed, MessageTemplate::Casual);
        assert_eq!(
            MessageTemplate::from_str("DIRECT").unwrap_or_default(),
            MessageTemplate::Direct
        );
    }

    #[test]
    fn prompt_embeds_lead_details_and_style() {
        let prompt = build_prompt(
            &lead(),
            &["saas".to_string(), "startups".to_string()],
            MessageTemplate::Professional,
        );
        assert!(prompt.contains("formal and business-focused"));
        assert!(prompt.contains("@ravi_builds"));
        assert!(prompt.contains("Bio: No bio available"));
        assert!(prompt.contains("saas, startups"));
        assert!(prompt.contains("12,500"));
    }

    #[test]
    fn follower_counts_group_thousands() {
        assert_eq!(format_follower_count(0), "0");
        assert_eq!(format_follower_count(999), "999");
        assert_eq!(format_follower_count(1_000), "1,000");
        assert_eq!(format_follower_count(1_234_567), "1,234,567");
    }
}
