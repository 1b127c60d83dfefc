use std::path::PathBuf;

/// Values read from the process environment
///
/// Collected once by the binary and handed to [`super::Config::apply_env`].
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    /// `GROK_API_KEY`
    pub llm_api_key: Option<String>,
    /// `LLM_API_BASE`
    pub llm_api_base: Option<String>,
    /// `LLM_MODEL`
    pub llm_model: Option<String>,
    /// `GITHUB_TOKEN`
    pub github_token: Option<String>,
    /// `GITHUB_API_BASE_URL`
    pub github_api_base: Option<String>,
    /// `REPO_SUMMARIZER_DB`
    pub database_path: Option<PathBuf>,
}

impl EnvOverrides {
    /// Reads every supported variable, ignoring unset or empty ones
    pub fn from_env() -> Self {
        Self {
            llm_api_key: get_env_value("GROK_API_KEY"),
            llm_api_base: get_env_value("LLM_API_BASE"),
            llm_model: get_env_value("LLM_MODEL"),
            github_token: get_env_value("GITHUB_TOKEN"),
            github_api_base: get_env_value("GITHUB_API_BASE_URL"),
            database_path: get_env_value("REPO_SUMMARIZER_DB").map(PathBuf::from),
        }
    }
}

/// Returns the value of `key`, treating an empty value as unset
pub fn get_env_value(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
