//! Typed access to the GitHub REST endpoints the resolver needs.

use crate::config::GitHubSettings;
use crate::error::{RepoError, Result};
use crate::models::RepositoryIdentity;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// GitHub REST API client
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: String,
    user_agent: String,
    token: Option<String>,
}

/// Repository metadata (`GET /repos/{owner}/{repo}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// `owner/name` as reported by the API
    #[serde(default)]
    pub full_name: Option<String>,
    /// Short description
    #[serde(default)]
    pub description: Option<String>,
    /// Primary language, null for empty or markup-only repositories
    #[serde(default)]
    pub language: Option<String>,
    /// Default branch name
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// One entry of a directory listing (`GET /repos/{owner}/{repo}/contents`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEntry {
    /// File or directory name
    pub name: String,
    /// Path from the repository root
    pub path: String,
    /// `file`, `dir`, `symlink` or `submodule`
    #[serde(rename = "type")]
    pub kind: String,
    /// Raw download URL, absent for directories
    #[serde(default)]
    pub download_url: Option<String>,
}

impl ContentEntry {
    /// Whether the entry is a directory
    pub fn is_dir(&self) -> bool {
        self.kind == "dir"
    }
}

/// One entry of a git tree (`GET /repos/{owner}/{repo}/git/trees/{ref}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Path from the repository root
    pub path: String,
    /// `blob`, `tree` or `commit`
    #[serde(rename = "type")]
    pub kind: String,
}

impl TreeEntry {
    /// Creates a blob entry
    pub fn blob(path: impl Into<String>) -> Self {
        Self { path: path.into(), kind: "blob".into() }
    }

    /// Creates a tree (directory) entry
    pub fn tree(path: impl Into<String>) -> Self {
        Self { path: path.into(), kind: "tree".into() }
    }

    /// Whether the entry is a directory
    pub fn is_tree(&self) -> bool {
        self.kind == "tree"
    }

    /// Whether the entry is a file
    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}

#[derive(Debug, Deserialize)]
struct EncodedFile {
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing {
    Entries(Vec<ContentEntry>),
    Single(serde::de::IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct GitTree {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

impl GitHubClient {
    /// Creates a client from explicit settings
    pub fn new(settings: &GitHubSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            user_agent: settings.user_agent.clone(),
            token: settings.token.clone().filter(|t| !t.trim().is_empty()),
        })
    }

    fn repo_url(&self, repo: &RepositoryIdentity, suffix: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_base, repo.owner, repo.name, suffix)
    }

    /// `/contents/{path}` with each path segment percent-encoded
    fn contents_url(&self, repo: &RepositoryIdentity, path: &str) -> Result<String> {
        let base = self.repo_url(repo, "/contents");
        let mut url = reqwest::Url::parse(&base)
            .map_err(|e| RepoError::Config(format!("invalid GitHub API URL '{}': {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| RepoError::Config(format!("GitHub API URL '{}' cannot carry a path", base)))?
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url.to_string())
    }

    fn api_get(&self, url: &str) -> RequestBuilder {
        let mut request = self.client
            .get(url)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, &self.user_agent);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        request
    }

    /// Fetches repository metadata
    ///
    /// Every failure is reported as [`RepoError::Lookup`].
    pub async fn get_repository(&self, repo: &RepositoryIdentity) -> Result<Repository> {
        let url = self.repo_url(repo, "");
        debug!("GET {}", url);

        let response = self.api_get(&url)
            .send()
            .await
            .map_err(|e| RepoError::Lookup(format!("{}: {}", repo, e)))?;

        if !response.status().is_success() {
            return Err(RepoError::Lookup(format!(
                "{}: HTTP {}",
                repo,
                response.status()
            )));
        }

        response.json::<Repository>()
            .await
            .map_err(|e| RepoError::Lookup(format!("{}: invalid metadata: {}", repo, e)))
    }

    /// Fetches the platform's README for `git_ref`
    ///
    /// 404 yields `None`; any other non-200 status is an error.
    pub async fn get_readme(&self, repo: &RepositoryIdentity, git_ref: &str) -> Result<Option<String>> {
        let url = self.repo_url(repo, "/readme");
        debug!("GET {}?ref={}", url, git_ref);

        let response = self.api_get(&url).query(&[("ref", git_ref)]).send().await?;
        match response.status() {
            StatusCode::OK => {
                let file: EncodedFile = response.json().await?;
                Ok(decode_file(file))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(RepoError::api(status, &url)),
        }
    }

    /// Lists the repository root directory at `git_ref`, in API order
    ///
    /// A single-object answer (the path is a file) yields an empty listing.
    pub async fn list_root(&self, repo: &RepositoryIdentity, git_ref: &str) -> Result<Vec<ContentEntry>> {
        let url = self.repo_url(repo, "/contents");
        debug!("GET {}?ref={}", url, git_ref);

        let response = self.api_get(&url).query(&[("ref", git_ref)]).send().await?;
        if !response.status().is_success() {
            return Err(RepoError::api(response.status(), &url));
        }

        match response.json::<Listing>().await? {
            Listing::Entries(entries) => Ok(entries),
            Listing::Single(_) => Ok(Vec::new()),
        }
    }

    /// Fetches one file through the contents API and decodes it
    ///
    /// Returns `None` when the answer carries no base64 content.
    pub async fn get_file(&self, repo: &RepositoryIdentity, path: &str, git_ref: &str) -> Result<Option<String>> {
        let url = self.contents_url(repo, path)?;
        debug!("GET {}?ref={}", url, git_ref);

        let response = self.api_get(&url).query(&[("ref", git_ref)]).send().await?;
        if !response.status().is_success() {
            return Err(RepoError::api(response.status(), &url));
        }

        let file: EncodedFile = response.json().await?;
        Ok(decode_file(file))
    }

    /// Downloads a raw file, sending only the User-Agent header
    pub async fn download_raw(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self.client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RepoError::api(response.status(), url));
        }
        Ok(response.text().await?)
    }

    /// Fetches the full recursive tree for `git_ref`, in API order
    pub async fn get_tree(&self, repo: &RepositoryIdentity, git_ref: &str) -> Result<Vec<TreeEntry>> {
        let url = self.repo_url(repo, &format!("/git/trees/{}", git_ref));
        debug!("GET {}?recursive=1", url);

        let response = self.api_get(&url).query(&[("recursive", "1")]).send().await?;
        if !response.status().is_success() {
            return Err(RepoError::api(response.status(), &url));
        }

        let tree: GitTree = response.json().await?;
        if tree.truncated {
            debug!("tree for {} at {} was truncated by the API", repo, git_ref);
        }
        Ok(tree.tree)
    }
}

fn decode_file(file: EncodedFile) -> Option<String> {
    match (file.encoding.as_deref(), file.content) {
        (Some("base64"), Some(content)) => decode_base64_text(&content),
        _ => None,
    }
}

/// Decodes GitHub's line-wrapped base64 into text, replacing invalid UTF-8
pub fn decode_base64_text(content: &str) -> Option<String> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    match STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            debug!("discarding undecodable base64 content: {}", e);
            None
        }
    }
}
