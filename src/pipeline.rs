//! One summarization run: resolve, summarize, find similar, save.

use crate::config::Config;
use crate::error::{RepoError, Result};
use crate::github::GitHubClient;
use crate::llm::{ChatTransport, HttpChatTransport, SimilarityFinder, Summarizer};
use crate::models::{RepositoryIdentity, ResultRecord};
use crate::resolver::ContentResolver;
use crate::store::{JsonRecordStore, RecordStore};
use log::info;
use std::fmt;
use std::sync::Arc;

/// Steps of a run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Summarize,
    FindSimilar,
    Save,
    Done,
}

impl Stage {
    pub const TOTAL: usize = 5;

    /// 1-based position of the stage
    pub fn number(self) -> usize {
        match self {
            Stage::Resolve => 1,
            Stage::Summarize => 2,
            Stage::FindSimilar => 3,
            Stage::Save => 4,
            Stage::Done => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Resolve => "Fetching repository content",
            Stage::Summarize => "Generating summary",
            Stage::FindSimilar => "Finding similar repositories",
            Stage::Save => "Saving results",
            Stage::Done => "Done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.number(), Self::TOTAL, self.label())
    }
}

/// Observer for run progress
pub trait ProgressSink: Send + Sync {
    fn stage(&self, stage: Stage);
}

/// Discards progress
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn stage(&self, _stage: Stage) {}
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub identity: RepositoryIdentity,
    pub language: Option<String>,
    pub summary: String,
    pub similar_repos: Vec<String>,
    /// Id assigned by the record store
    pub record_id: u64,
    /// Length of the resolved descriptive text, in characters
    pub content_chars: usize,
}

pub struct Pipeline {
    resolver: ContentResolver,
    summarizer: Summarizer,
    similarity: SimilarityFinder,
    store: Box<dyn RecordStore>,
}

impl Pipeline {
    pub fn new(
        resolver: ContentResolver,
        summarizer: Summarizer,
        similarity: SimilarityFinder,
        store: Box<dyn RecordStore>,
    ) -> Self {
        Self {
            resolver,
            summarizer,
            similarity,
            store,
        }
    }

    /// Wires the production components from `config`
    ///
    /// Fails before any network traffic when the LLM key is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.ensure_llm_key()?;

        let client = GitHubClient::new(&config.github)?;
        let transport: Arc<dyn ChatTransport> = Arc::new(HttpChatTransport::new(&config.llm)?);

        Ok(Self::new(
            ContentResolver::new(client),
            Summarizer::with_transport(config.llm.model.clone(), transport.clone()),
            SimilarityFinder::with_transport(config.llm.model.clone(), transport),
            Box::new(JsonRecordStore::new(config.database_path.clone())),
        ))
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Runs every stage for `identity`; nothing is saved unless a summary was produced
    pub async fn run(
        &self,
        identity: &RepositoryIdentity,
        git_ref: Option<&str>,
        progress: &dyn ProgressSink,
    ) -> Result<RunReport> {
        info!("Starting run for {}", identity);

        progress.stage(Stage::Resolve);
        let content = self.resolver.resolve(identity, git_ref).await?;
        let language = content.primary_language.as_deref();

        progress.stage(Stage::Summarize);
        let summary = self
            .summarizer
            .summarize(&content.descriptive_text, language)
            .await
            .ok_or(RepoError::Summarization)?;

        progress.stage(Stage::FindSimilar);
        let similar_repos = self.similarity.find_similar(&summary, language).await;

        progress.stage(Stage::Save);
        let record = ResultRecord::new(identity, &content, &summary, similar_repos.clone());
        let record_id = self.store.insert(&record).await?;

        progress.stage(Stage::Done);
        info!("Finished run for {} (record {})", identity, record_id);

        Ok(RunReport {
            identity: identity.clone(),
            language: content.primary_language.clone(),
            summary,
            similar_repos,
            record_id,
            content_chars: content.descriptive_text.chars().count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Resolve.to_string(), "[1/5] Fetching repository content");
        assert_eq!(Stage::Done.to_string(), "[5/5] Done");
    }

    #[test]
    fn test_missing_key_fails_before_network() {
        let config = Config::default();
        assert!(matches!(Pipeline::from_config(&config), Err(RepoError::Config(_))));
    }
}
