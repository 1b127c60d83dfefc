use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RepoError;

/// Number of characters of descriptive text kept in a stored record
pub const README_EXCERPT_CHARS: usize = 500;

/// A repository on the hosting platform, addressed as `owner/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryIdentity {
    /// Account or organization that owns the repository
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepositoryIdentity {
    /// Creates an identity from already-validated parts
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// The `owner/name` key used by the record store
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryIdentity {
    type Err = RepoError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        let invalid = || {
            RepoError::Validation(format!(
                "Please use format 'owner/repo' (e.g., 'tiangolo/fastapi'), got '{}'",
                input
            ))
        };

        if input.matches('/').count() != 1 {
            return Err(invalid());
        }
        let (owner, name) = input.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(owner, name))
    }
}

/// What the resolver found for a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryContent {
    /// Primary language reported by the platform, if any
    pub primary_language: Option<String>,
    /// README text, or a synthesized structural report; never empty
    pub descriptive_text: String,
}

/// One persisted lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// `owner/name`
    pub repo: String,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub name: String,
    /// Primary language
    pub language: Option<String>,
    /// First [`README_EXCERPT_CHARS`] characters of the descriptive text
    pub readme: String,
    /// Bullet-point summary
    pub summary: String,
    /// Suggested similar repositories
    #[serde(default)]
    pub similar_repos: Vec<String>,
    /// When the record was created
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Accepts RFC 3339 as well as offset-less ISO timestamps, read as UTC
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
}

impl ResultRecord {
    /// Builds the record for a finished run, stamped with the current time
    pub fn new(
        identity: &RepositoryIdentity,
        content: &RepositoryContent,
        summary: &str,
        similar_repos: Vec<String>,
    ) -> Self {
        Self {
            repo: identity.key(),
            owner: identity.owner.clone(),
            name: identity.name.clone(),
            language: content.primary_language.clone(),
            readme: truncate_chars(&content.descriptive_text, README_EXCERPT_CHARS).to_string(),
            summary: summary.to_string(),
            similar_repos,
            timestamp: Utc::now(),
        }
    }
}

/// Returns the prefix of `text` holding at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
