use super::{ChatMessage, ChatRequest, ChatTransport, HttpChatTransport};
use crate::config::LlmSettings;
use crate::error::Result;
use crate::models::truncate_chars;
use crate::prompts;
use log::{error, info};
use std::sync::Arc;

/// Characters of descriptive text sent to the model
pub const MAX_INPUT_CHARS: usize = 4000;

const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 500;

/// Turns descriptive text into a bullet-point summary
pub struct Summarizer {
    model: String,
    transport: Arc<dyn ChatTransport>,
}

impl Summarizer {
    /// Creates a summarizer talking to the configured endpoint
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let transport = HttpChatTransport::new(settings)?;
        Ok(Self::with_transport(settings.model.clone(), Arc::new(transport)))
    }

    pub fn with_transport(model: impl Into<String>, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            model: model.into(),
            transport,
        }
    }

    /// Builds the chat request for `text`, truncated to [`MAX_INPUT_CHARS`]
    pub fn build_request(&self, text: &str, language: Option<&str>) -> ChatRequest {
        let mut user = String::new();
        if let Some(language) = language {
            user.push_str(&prompts::fill(prompts::LANGUAGE_PREFIX, &[language]));
        }
        user.push_str(&prompts::fill(
            prompts::SUMMARY_USER,
            &[truncate_chars(text, MAX_INPUT_CHARS)],
        ));

        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(prompts::SUMMARY_SYSTEM),
                ChatMessage::user(user),
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    /// Summarizes `text`; any endpoint failure is logged and yields `None`
    pub async fn summarize(&self, text: &str, language: Option<&str>) -> Option<String> {
        let request = self.build_request(text, language);
        match self.transport.complete(&request).await {
            Ok(summary) => {
                info!("Summary generated ({} characters)", summary.chars().count());
                Some(summary)
            }
            Err(e) => {
                error!("Summary generation failed: {}", e);
                None
            }
        }
    }
}
