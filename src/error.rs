use thiserror::Error;
use std::io;

/// Custom result type alias for the application
pub type Result<T> = std::result::Result<T, RepoError>;

/// Errors that can occur while summarizing a repository
#[derive(Debug, Error)]
pub enum RepoError {
    /// Repository metadata could not be fetched (not found, auth, rate limit, transport)
    #[error("Repository lookup failed: {0}")]
    Lookup(String),

    /// A GitHub endpoint answered with a status the resolver does not accept
    #[error("GitHub API error: HTTP {status} from {url}")]
    GitHubApi {
        /// HTTP status code returned by the API
        status: u16,
        /// Request URL
        url: String,
    },

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// Chat completion endpoint errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// The summarizer produced no summary
    #[error("Failed to generate summary")]
    Summarization,

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Record store errors
    #[error("Database error: {0}")]
    Database(String),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

impl RepoError {
    /// Builds a [`RepoError::GitHubApi`] from a response status and the URL it came from
    pub fn api(status: reqwest::StatusCode, url: &str) -> Self {
        Self::GitHubApi {
            status: status.as_u16(),
            url: url.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message() {
        let error = RepoError::api(reqwest::StatusCode::FORBIDDEN, "https://api.github.com/repos/a/b/readme");
        assert_eq!(
            error.to_string(),
            "GitHub API error: HTTP 403 from https://api.github.com/repos/a/b/readme"
        );
    }
}
