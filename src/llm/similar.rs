use super::{ChatMessage, ChatRequest, ChatTransport, HttpChatTransport};
use crate::config::LlmSettings;
use crate::error::Result;
use crate::prompts;
use log::{info, warn};
use std::sync::Arc;

/// Most suggestions kept from one answer
pub const MAX_SIMILAR: usize = 5;

const TEMPERATURE: f32 = 0.5;
const MAX_TOKENS: u32 = 200;

/// Asks the model for repositories similar to a summary
pub struct SimilarityFinder {
    model: String,
    transport: Arc<dyn ChatTransport>,
}

impl SimilarityFinder {
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

    pub fn build_request(&self, summary: &str, language: Option<&str>) -> ChatRequest {
        let user = prompts::fill(prompts::SIMILAR_USER, &[summary, language.unwrap_or("Unknown")]);
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(prompts::SIMILAR_SYSTEM),
                ChatMessage::user(user),
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    /// Suggests up to [`MAX_SIMILAR`] `owner/repo` names; failures yield an empty list
    pub async fn find_similar(&self, summary: &str, language: Option<&str>) -> Vec<String> {
        let request = self.build_request(summary, language);
        match self.transport.complete(&request).await {
            Ok(answer) => {
                let repos = parse_similar_repos(&answer);
                info!("Found {} similar repositories", repos.len());
                repos
            }
            Err(e) => {
                warn!("Similar repository lookup failed: {}", e);
                Vec::new()
            }
        }
    }
}

/// Keeps trimmed lines with exactly one `/`, first [`MAX_SIMILAR`] only
pub fn parse_similar_repos(answer: &str) -> Vec<String> {
    answer
        .lines()
        .map(str::trim)
        .filter(|line| line.matches('/').count() == 1)
        .take(MAX_SIMILAR)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::RecordingTransport;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_filters_and_caps() {
        let answer = "Here you go:\n  pallets/flask \nencode/starlette\nhttps://github.com/a/b\n\
                      django/django\nnot a repo\nbottlepy/bottle\nfalconry/falcon\ntornadoweb/tornado\n";
        assert_eq!(
            parse_similar_repos(answer),
            vec!["pallets/flask", "encode/starlette", "django/django", "bottlepy/bottle", "falconry/falcon"]
        );
    }

    #[test]
    fn test_parse_keeps_duplicates() {
        assert_eq!(parse_similar_repos("a/b\na/b\n"), vec!["a/b", "a/b"]);
    }

    #[test]
    fn test_parse_empty_answer() {
        assert!(parse_similar_repos("").is_empty());
    }

    #[tokio::test]
    async fn test_failure_yields_empty_list() {
        let transport = Arc::new(RecordingTransport::failing("timeout"));
        let finder = SimilarityFinder::with_transport("m", transport);
        assert!(finder.find_similar("- A tool", None).await.is_empty());
    }

    #[tokio::test]
    async fn test_request_shape() {
        let transport = Arc::new(RecordingTransport::replying("tokio-rs/axum"));
        let finder = SimilarityFinder::with_transport("m", transport.clone());

        let repos = finder.find_similar("- HTTP framework", None).await;
        let request = transport.last_request();

        assert_eq!(repos, vec!["tokio-rs/axum"]);
        assert_eq!(request.messages[0].content, "You are a GitHub repository expert.");
        assert!(request.messages[1].content.contains("- HTTP framework"));
        assert!(request.messages[1].content.contains("Language: Unknown"));
        assert_eq!(request.temperature, 0.5);
        assert_eq!(request.max_tokens, 200);
    }
}
