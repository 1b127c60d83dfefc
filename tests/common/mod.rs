#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use mockito::{Matcher, Mock, ServerGuard};
use repo_summarizer::config::{Config, GitHubSettings};
use repo_summarizer::error::{RepoError, Result};
use repo_summarizer::llm::{ChatRequest, ChatTransport};
use repo_summarizer::GitHubClient;

pub mod test_helpers {
    use super::*;

    pub fn setup_test_logger() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .try_init();
    }

    pub fn github_settings(server: &ServerGuard) -> GitHubSettings {
        GitHubSettings {
            api_base: server.url(),
            ..GitHubSettings::default()
        }
    }

    pub fn github_client(server: &ServerGuard) -> GitHubClient {
        GitHubClient::new(&github_settings(server)).expect("client builds")
    }

    pub fn create_test_config(server: &ServerGuard, database_path: &Path) -> Config {
        let mut config = Config::new(database_path.to_path_buf());
        config.github = github_settings(server);
        config.llm.api_base = server.url();
        config.llm.api_key = Some("test-key".to_string());
        config
    }

    /// Contents-API body for a base64-encoded file, wrapped like the real API
    pub fn encoded_file(text: &str) -> String {
        let encoded = STANDARD.encode(text);
        let wrapped: Vec<String> = encoded
            .as_bytes()
            .chunks(60)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect();
        serde_json::json!({
            "encoding": "base64",
            "content": wrapped.join("\n") + "\n",
        })
        .to_string()
    }

    pub fn chat_reply(content: &str) -> String {
        serde_json::json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        })
        .to_string()
    }

    pub async fn mock_metadata(server: &mut ServerGuard, repo: &str, body: &str) -> Mock {
        server.mock("GET", format!("/repos/{}", repo).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    pub async fn mock_status(server: &mut ServerGuard, path: &str, status: usize) -> Mock {
        server.mock("GET", path)
            .match_query(Matcher::Any)
            .with_status(status)
            .create_async()
            .await
    }

    pub async fn mock_json(server: &mut ServerGuard, path: &str, body: &str) -> Mock {
        server.mock("GET", path)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Chat transport answering from a queue, recording every request
    pub struct ScriptedTransport {
        replies: Mutex<Vec<Result<String>>>,
        pub requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedTransport {
        /// Replies are handed out in order
        pub fn new(replies: Vec<Result<String>>) -> Self {
            let mut replies = replies;
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn complete(&self, request: &ChatRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(RepoError::Llm("no scripted reply left".into())))
        }
    }
}
