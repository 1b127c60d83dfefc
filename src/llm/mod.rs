//! Chat completion plumbing for an OpenAI-compatible endpoint.
//!
//! [`ChatTransport`] is the seam: [`HttpChatTransport`] talks to the real
//! endpoint, tests substitute an in-memory transport. The callers in
//! [`summarizer`] and [`similar`] never retry.

pub mod similar;
pub mod summarizer;

use crate::config::LlmSettings;
use crate::error::{RepoError, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use similar::SimilarityFinder;
pub use summarizer::Summarizer;

/// One message of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Body of `POST /chat/completions`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Sends a chat request and returns the content of the first choice
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Returns the trimmed, non-empty content of the first choice
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

/// [`ChatTransport`] over HTTP with bearer authentication
pub struct HttpChatTransport {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpChatTransport {
    /// Builds a transport; a missing or blank API key is a configuration error
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| RepoError::Config("LLM API key not configured".to_string()))?
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", settings.api_base.trim_end_matches('/')),
            api_key,
        })
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        debug!("POST {} (model {})", self.endpoint, request.model);

        let response = self.client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| RepoError::Llm(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RepoError::Llm(format!("HTTP {}: {}", status, body.trim())));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| RepoError::Llm(format!("invalid response body: {}", e)))?;

        first_choice_content(body)
    }
}

fn first_choice_content(body: ChatResponse) -> Result<String> {
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| RepoError::Llm("response has no first choice content".to_string()))?;

    let content = content.trim();
    if content.is_empty() {
        return Err(RepoError::Llm("response content is empty".to_string()));
    }
    Ok(content.to_string())
}
