//! OpenAI chat-completion reply generator.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use spur_core::config::LlmConfig;
use spur_core::types::ChatTurn;

use crate::generator::{ReplyGenerator, ReplyOutcome};

/// Reply generator backed by an OpenAI-compatible `/v1/chat/completions` API.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl OpenAiGenerator {
    /// Build a generator from the `[llm]` configuration section.
    ///
    /// A missing or placeholder API key is accepted here; `generate` then
    /// reports `ReplyOutcome::Unavailable` without touching the network.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_key: config.usable_api_key().map(str::to_string),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Whether a usable API key is configured.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn build_request(&self, system: &str, history: &[ChatTurn], message: &str) -> CompletionRequest {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(CompletionMessage {
            role: "system".to_string(),
            content: system.to_string(),
        });
        messages.extend(history.iter().map(|turn| CompletionMessage {
            role: turn.role.as_str().to_string(),
            content: turn.content.clone(),
        }));
        messages.push(CompletionMessage {
            role: "user".to_string(),
            content: message.to_string(),
        });

        CompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl ReplyGenerator for OpenAiGenerator {
    async fn generate(&self, system: &str, history: &[ChatTurn], message: &str) -> ReplyOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("OpenAI API key missing or invalid");
            return ReplyOutcome::Unavailable;
        };

        let start = Instant::now();
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = self.build_request(system, history, message);

        let response = match self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, model = %self.model, "LLM request failed");
                return ReplyOutcome::Failed(format!("Request failed: {}", e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "LLM API error");
            return ReplyOutcome::Failed(format!("API error {}: {}", status.as_u16(), body));
        }

        let completion: CompletionResponse = match response.json().await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to parse LLM response");
                return ReplyOutcome::Failed(format!("Failed to parse response: {}", e));
            }
        };

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        tracing::debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            reply_len = content.len(),
            history_len = history.len(),
            "LLM reply received"
        );

        ReplyOutcome::Reply(content)
    }
}

// ============================================================================
// OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<CompletionMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct CompletionMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
