//! OpenAI-compatible completion client.
//!
//! Used both for the primary AI-search research call (Perplexity-style
//! endpoints return citation URLs alongside the answer) and for the
//! structured-extraction step, which may point at a cheaper model.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::retry::CallError;

/// A chat-completions client for one configured endpoint + model.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

/// Answer text plus any citation URLs the endpoint returned.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub content: String,
    pub citations: Vec<String>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl CompletionClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Same endpoint and credentials, different model.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One chat completion. The caller wraps this in `resilient_call`,
    /// which owns the timeout and retry budget.
    pub async fn chat(&self, system: &str, user: &str) -> Result<CompletionOutcome, CallError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(CallError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CallError::from_status(
                status.as_u16(),
                super::truncate_chars(&body, 300).to_string(),
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CallError::Transport(format!("malformed completion response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        Ok(CompletionOutcome {
            content,
            citations: parsed.citations,
        })
    }
}
