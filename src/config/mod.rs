mod env_manager;

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::{RepoError, Result};
use std::fs;

pub use env_manager::{get_env_value, EnvOverrides};

/// Default GitHub REST API root
pub const GITHUB_API_BASE: &str = "https://api.github.com";
/// User-Agent sent with every GitHub request
pub const DEFAULT_USER_AGENT: &str = "GitHub-Repo-Summarizer/1.0";
/// Default OpenAI-compatible chat endpoint root (xAI)
pub const LLM_API_BASE: &str = "https://api.x.ai/v1";
/// Default chat model
pub const DEFAULT_MODEL: &str = "grok-code-fast-1";

/// Main configuration struct for the application
///
/// Library code never reads the process environment; everything it needs
/// arrives through this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub API settings
    pub github: GitHubSettings,
    /// Chat completion endpoint settings
    pub llm: LlmSettings,
    /// Location of the JSON record store
    pub database_path: PathBuf,
}

/// Settings for the GitHub REST API client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
    /// API root, overridable for tests and GitHub Enterprise
    pub api_base: String,
    /// User-Agent header value
    pub user_agent: String,
    /// Optional token for authenticated requests
    pub token: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Settings for the chat completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// API root; `/chat/completions` is appended
    pub api_base: String,
    /// Bearer key for the endpoint
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Config {
    /// Creates a default configuration that stores records at `database_path`
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            github: GitHubSettings::default(),
            llm: LlmSettings::default(),
            database_path,
        }
    }

    /// Loads configuration from `path`, or from the default config file location
    ///
    /// A missing default file yields the defaults. An explicit path that cannot
    /// be read or parsed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Parses a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| RepoError::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| RepoError::Config(format!("Failed to parse config file {}: {}", path.display(), e)))
    }

    /// `<config_dir>/repo-summarizer/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("repo-summarizer").join("config.toml"))
    }

    /// Applies environment-derived values on top of the file configuration
    pub fn apply_env(mut self, env: &EnvOverrides) -> Self {
        if let Some(key) = &env.llm_api_key {
            self.llm.api_key = Some(key.clone());
        }
        if let Some(base) = &env.llm_api_base {
            self.llm.api_base = base.clone();
        }
        if let Some(model) = &env.llm_model {
            self.llm.model = model.clone();
        }
        if let Some(token) = &env.github_token {
            self.github.token = Some(token.clone());
        }
        if let Some(base) = &env.github_api_base {
            self.github.api_base = base.clone();
        }
        if let Some(path) = &env.database_path {
            self.database_path = path.clone();
        }
        self
    }

    /// Validates that the chat endpoint key is present and not blank
    pub fn ensure_llm_key(&self) -> Result<&str> {
        match self.llm.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(RepoError::Config(
                "LLM API key not configured (set GROK_API_KEY or llm.api_key)".into(),
            )),
        }
    }
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_base: GITHUB_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            token: None,
            timeout_seconds: 30,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: LLM_API_BASE.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            timeout_seconds: 60,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(PathBuf::from("data.json"))
    }
}
