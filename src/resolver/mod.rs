//! Content resolution: find README-equivalent text for a repository.
//!
//! The resolver fetches repository metadata, settles on a ref, and then walks
//! an ordered list of [`ContentStrategy`] values, stopping at the first one
//! that produces usable text:
//!
//! 1. [`ReadmeEndpoint`]: the platform's dedicated README resource
//! 2. [`DirectoryScan`]: a README-like file in the root listing
//! 3. [`StructureSynthesis`]: a report built from the file tree
//!
//! Only the metadata call raises [`RepoError::Lookup`]; a missing README is
//! not an error.

pub mod structure;

use crate::error::Result;
use crate::github::GitHubClient;
use crate::models::{RepositoryContent, RepositoryIdentity};
use async_trait::async_trait;
use log::{debug, info};

pub use structure::StructureSynthesis;

/// Text the chain treats as "nothing found"
pub const NO_README_SENTINEL: &str = "No README found.";

/// Ref used when neither the caller nor the metadata names one
pub const FALLBACK_REF: &str = "main";

/// Root-listing names accepted as a README, compared lowercased
pub const README_CANDIDATES: &[&str] = &["readme", "readme.md", "readme.rst", "readme.txt"];

/// What every strategy gets to look at
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// Repository being resolved
    pub repo: RepositoryIdentity,
    /// Effective ref
    pub git_ref: String,
}

/// One step of the fallback chain
#[async_trait]
pub trait ContentStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Returns descriptive text, `Ok(None)` when this strategy found nothing
    async fn locate(&self, client: &GitHubClient, ctx: &ResolveContext) -> Result<Option<String>>;
}

/// Resolves repositories against GitHub
pub struct ContentResolver {
    client: GitHubClient,
    strategies: Vec<Box<dyn ContentStrategy>>,
}

impl ContentResolver {
    /// Creates a resolver with the standard fallback chain
    pub fn new(client: GitHubClient) -> Self {
        Self::with_strategies(client, default_strategies())
    }

    /// Creates a resolver with a custom chain, tried in order
    pub fn with_strategies(client: GitHubClient, strategies: Vec<Box<dyn ContentStrategy>>) -> Self {
        Self { client, strategies }
    }

    /// Resolves `repo` at `git_ref`, or at the repository's default branch
    pub async fn resolve(&self, repo: &RepositoryIdentity, git_ref: Option<&str>) -> Result<RepositoryContent> {
        let metadata = self.client.get_repository(repo).await?;
        let git_ref = effective_ref(git_ref, metadata.default_branch.as_deref());
        info!("Resolving {} at {}", repo, git_ref);

        let ctx = ResolveContext {
            repo: repo.clone(),
            git_ref,
        };

        for strategy in &self.strategies {
            match strategy.locate(&self.client, &ctx).await? {
                Some(text) if is_usable(&text) => {
                    info!("{}: content found by {} ({} characters)", repo, strategy.name(), text.chars().count());
                    return Ok(RepositoryContent {
                        primary_language: metadata.language,
                        descriptive_text: text,
                    });
                }
                _ => debug!("{}: {} found nothing", repo, strategy.name()),
            }
        }

        Ok(RepositoryContent {
            primary_language: metadata.language,
            descriptive_text: NO_README_SENTINEL.to_string(),
        })
    }
}

/// The standard chain: README endpoint, root directory scan, structural synthesis
pub fn default_strategies() -> Vec<Box<dyn ContentStrategy>> {
    vec![
        Box::new(ReadmeEndpoint),
        Box::new(DirectoryScan),
        Box::new(StructureSynthesis),
    ]
}

/// Caller ref, else the default branch, else `"main"`
pub fn effective_ref(requested: Option<&str>, default_branch: Option<&str>) -> String {
    non_blank(requested)
        .or_else(|| non_blank(default_branch))
        .unwrap_or(FALLBACK_REF)
        .to_string()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn is_usable(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed != NO_README_SENTINEL
}

/// `GET /repos/{owner}/{repo}/readme?ref=`
pub struct ReadmeEndpoint;

#[async_trait]
impl ContentStrategy for ReadmeEndpoint {
    fn name(&self) -> &'static str {
        "readme endpoint"
    }

    async fn locate(&self, client: &GitHubClient, ctx: &ResolveContext) -> Result<Option<String>> {
        client.get_readme(&ctx.repo, &ctx.git_ref).await
    }
}

/// Scans the root listing for a README-like file name
pub struct DirectoryScan;

#[async_trait]
impl ContentStrategy for DirectoryScan {
    fn name(&self) -> &'static str {
        "directory scan"
    }

    async fn locate(&self, client: &GitHubClient, ctx: &ResolveContext) -> Result<Option<String>> {
        let entries = client.list_root(&ctx.repo, &ctx.git_ref).await?;
        let Some(entry) = entries.iter().find(|e| is_readme_name(&e.name)) else {
            return Ok(None);
        };
        debug!("{}: README candidate {}", ctx.repo, entry.path);

        match entry.download_url.as_deref() {
            Some(url) => client.download_raw(url).await.map(Some),
            None => client.get_file(&ctx.repo, &entry.path, &ctx.git_ref).await,
        }
    }
}

/// Whether a root entry name is one of [`README_CANDIDATES`]
pub fn is_readme_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    README_CANDIDATES.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Some("dev"), Some("master"), "dev" ; "caller ref wins")]
    #[test_case(None, Some("master"), "master" ; "default branch")]
    #[test_case(None, None, "main" ; "literal fallback")]
    #[test_case(Some(""), Some("master"), "master" ; "blank caller ref")]
    #[test_case(None, Some(""), "main" ; "blank default branch")]
    fn test_effective_ref(requested: Option<&str>, default_branch: Option<&str>, expected: &str) {
        assert_eq!(effective_ref(requested, default_branch), expected);
    }

    #[test_case("README.md", true)]
    #[test_case("readme", true)]
    #[test_case("ReadMe.RST", true)]
    #[test_case("README.txt", true)]
    #[test_case("README.markdown", false)]
    #[test_case("docs", false)]
    fn test_is_readme_name(name: &str, expected: bool) {
        assert_eq!(is_readme_name(name), expected);
    }

    #[test]
    fn test_sentinel_is_not_usable() {
        assert!(!is_usable("No README found."));
        assert!(!is_usable("  \n"));
        assert!(is_usable("# Title"));
    }
}
