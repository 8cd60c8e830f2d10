//! Post-call transcript summarization.
//!
//! Summarization runs after the relay finishes and is best-effort: any
//! failure here is logged and replaced with a fallback summary so that the
//! notification step still runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Default OpenAI Chat Completions endpoint base.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Default model used to summarize transcripts.
pub const DEFAULT_SUMMARY_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You are a concise summarizer.";

/// Errors from the summarization backend.
#[derive(Debug, thiserror::Error)]
pub enum SummarizationError {
    /// Request could not be built or sent
    #[error("Summarization request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The API returned a non-success status
    #[error("Summarization API error ({status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// The response decoded but carried no summary text
    #[error("Summarization response contained no content")]
    EmptyResponse,
}

/// Produces a short natural-language summary of a call transcript.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize the rendered transcript.
    async fn summarize(&self, transcript: &str) -> Result<String, SummarizationError>;
}

/// [`Summarizer`] backed by the OpenAI Chat Completions API.
pub struct OpenAiSummarizer {
    http_client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiSummarizer {
    /// Create a summarizer against the default OpenAI endpoint.
    pub fn new(http_client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self::with_api_base(http_client, OPENAI_API_BASE, api_key)
    }

    /// Create a summarizer against a custom endpoint base.
    pub fn with_api_base(
        http_client: reqwest::Client,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: DEFAULT_SUMMARY_MODEL.to_string(),
        }
    }

    /// Override the summary model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, transcript: &str) -> Result<String, SummarizationError> {
        let prompt = format!(
            "Summarize this call transcript in the language of the call:\n\n{transcript}"
        );
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
        };

        debug!(model = %self.model, "Requesting transcript summary");
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(Duration::from_secs(60))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let summary = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
            .ok_or(SummarizationError::EmptyResponse)?;

        info!(chars = summary.len(), "Transcript summary generated");
        Ok(summary)
    }
}
