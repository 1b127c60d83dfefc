#![warn(clippy::all)]

//! repo-summarizer - summarize a GitHub repository with an LLM
//!
//! Fetches a repository's README (or, when there is none, a report built from
//! its file tree), asks an OpenAI-compatible chat endpoint for a bullet-point
//! summary and a few similar repositories, and appends the result to a local
//! JSON record store.
//!
//! ## Usage
//! ```rust,ignore
//! use repo_summarizer::{Config, Pipeline, RepositoryIdentity, SilentProgress};
//!
//! async fn example() -> repo_summarizer::Result<()> {
//!     let config = Config::default();
//!     let pipeline = Pipeline::from_config(&config)?;
//!     let repo: RepositoryIdentity = "tiangolo/fastapi".parse()?;
//!
//!     let report = pipeline.run(&repo, None, &SilentProgress).await?;
//!     println!("{}", report.summary);
//!     Ok(())
//! }
//! ```

/// Console output: progress, prompts and reports
pub mod cli;
/// Configuration loading and environment overrides
pub mod config;
/// Error types
pub mod error;
/// GitHub REST API client
pub mod github;
/// Chat completion transport, summarizer and similarity finder
pub mod llm;
/// Logging setup
pub mod logging;
/// Domain types shared across modules
pub mod models;
/// The staged summarization run
pub mod pipeline;
/// Prompt templates
pub mod prompts;
/// README fallback chain
pub mod resolver;
/// JSON record store
pub mod store;

pub use config::Config;
pub use error::{RepoError, Result};
pub use github::GitHubClient;
pub use llm::{ChatTransport, HttpChatTransport, SimilarityFinder, Summarizer};
pub use models::{RepositoryContent, RepositoryIdentity, ResultRecord};
pub use pipeline::{Pipeline, ProgressSink, RunReport, SilentProgress, Stage};
pub use resolver::ContentResolver;
pub use store::{JsonRecordStore, RecordStore};
