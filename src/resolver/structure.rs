//! Structural synthesis: describe a repository from its file tree when it has no README.
//!
//! Fetching and formatting are split. [`classify_tree`] and the `render_*`
//! functions are pure; [`StructureSynthesis`] does the network calls. Every
//! file-content fetch is best effort: a failed fetch becomes `None` and the
//! renderer leaves that file out.

use super::{ContentStrategy, ResolveContext};
use crate::error::Result;
use crate::github::{ContentEntry, GitHubClient, TreeEntry};
use crate::models::{truncate_chars, RepositoryIdentity};
use async_trait::async_trait;
use log::{debug, warn};
use std::collections::BTreeSet;

/// Config file names recognized anywhere in the tree
pub const CONFIG_FILES: &[&str] = &[
    "package.json", "Cargo.toml", "pyproject.toml", "requirements.txt", "setup.py",
    "Makefile", "CMakeLists.txt", ".gitignore", "Dockerfile", "docker-compose.yml",
    "composer.json", "pom.xml", "build.gradle",
];

/// Config files inlined by the root-listing fallback
pub const ROOT_CONFIG_FILES: &[&str] = &["package.json", "Cargo.toml", "pyproject.toml", "requirements.txt"];

/// Extensions that mark a blob as source code
pub const SOURCE_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".ts", ".go", ".rs", ".c", ".cpp", ".java", ".rb", ".php", ".swift", ".kt",
];

/// Path fragments that move a source file to the front of the candidates
const PRIORITY_HINTS: &[&str] = &["main", "index", "app", "server"];

const MAX_TOP_DIRS: usize = 10;
const MAX_SUBDIRS: usize = 5;
const MAX_CONFIG_FILES: usize = 5;
const CONFIG_CHAR_LIMIT: usize = 500;
const MAX_SOURCE_CANDIDATES: usize = 10;
const MAX_SOURCE_FILES: usize = 3;
const SOURCE_LINE_LIMIT: usize = 50;
const SOURCE_CHAR_LIMIT: usize = 1000;

/// The tree, partitioned into what the report shows
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TreeLayout {
    /// Top-level directories (alphabetical) with their immediate subdirectories (alphabetical)
    pub directories: Vec<(String, Vec<String>)>,
    /// Recognized config files, tree order, at most five
    pub config_files: Vec<String>,
    /// Source file candidates, priority paths first, at most ten
    pub source_candidates: Vec<String>,
}

/// A file whose content may or may not have been fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    /// Path from the repository root
    pub path: String,
    /// Content, `None` when the fetch failed
    pub content: Option<String>,
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Whether the file name at `path` is a recognized config file
pub fn is_config_file(path: &str) -> bool {
    CONFIG_FILES.contains(&file_name(path))
}

/// Whether `path` ends in a recognized source extension
pub fn is_source_file(path: &str) -> bool {
    let name = file_name(path).to_lowercase();
    SOURCE_EXTENSIONS.iter().any(|ext| name.ends_with(ext) && name.len() > ext.len())
}

fn is_priority_source(path: &str) -> bool {
    let lower = path.to_lowercase();
    PRIORITY_HINTS.iter().any(|hint| lower.contains(hint))
}

/// Partitions tree entries into directories, config files and source candidates
///
/// Entry order from the API is preserved for files; only directory names are sorted.
pub fn classify_tree(entries: &[TreeEntry]) -> TreeLayout {
    let mut top_dirs = BTreeSet::new();
    let mut config_files = Vec::new();
    let mut priority_sources = Vec::new();
    let mut other_sources = Vec::new();

    for entry in entries {
        if entry.is_tree() {
            if !entry.path.contains('/') {
                top_dirs.insert(entry.path.clone());
            }
        } else if entry.is_blob() {
            if is_config_file(&entry.path) {
                config_files.push(entry.path.clone());
            } else if is_source_file(&entry.path) {
                if is_priority_source(&entry.path) {
                    priority_sources.push(entry.path.clone());
                } else {
                    other_sources.push(entry.path.clone());
                }
            }
        }
    }

    let directories = top_dirs
        .into_iter()
        .take(MAX_TOP_DIRS)
        .map(|dir| {
            let prefix = format!("{}/", dir);
            let subdirs: BTreeSet<String> = entries
                .iter()
                .filter(|e| e.is_tree())
                .filter_map(|e| e.path.strip_prefix(&prefix))
                .filter(|rest| !rest.is_empty() && !rest.contains('/'))
                .map(str::to_string)
                .collect();
            (dir, subdirs.into_iter().take(MAX_SUBDIRS).collect())
        })
        .collect();

    config_files.truncate(MAX_CONFIG_FILES);

    let source_candidates = priority_sources
        .into_iter()
        .chain(other_sources)
        .take(MAX_SOURCE_CANDIDATES)
        .collect();

    TreeLayout {
        directories,
        config_files,
        source_candidates,
    }
}

/// First 50 lines, then at most 1000 characters
pub fn source_excerpt(content: &str) -> String {
    let lines: Vec<&str> = content.lines().take(SOURCE_LINE_LIMIT).collect();
    truncate_chars(&lines.join("\n"), SOURCE_CHAR_LIMIT).to_string()
}

fn push_file_block(out: &mut String, path: &str, content: &str) {
    out.push_str(&format!("### {}\n\n```\n{}", path, content));
    if !content.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("```\n\n");
}

/// Renders the report for a successfully fetched tree
///
/// Files without content are left out; a section with nothing left is omitted.
pub fn render_tree_report(
    repo: &RepositoryIdentity,
    git_ref: &str,
    layout: &TreeLayout,
    configs: &[FetchedFile],
    sources: &[FetchedFile],
) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", repo));
    out.push_str(&format!(
        "No README found. This overview was generated from the repository structure at `{}`.\n\n",
        git_ref
    ));

    if !layout.directories.is_empty() {
        out.push_str("## Directory Structure\n\n");
        for (dir, subdirs) in &layout.directories {
            out.push_str(&format!("- {}/\n", dir));
            for sub in subdirs {
                out.push_str(&format!("  - {}/{}/\n", dir, sub));
            }
        }
        out.push('\n');
    }

    let present_configs: Vec<_> = configs.iter().filter(|f| f.content.is_some()).collect();
    if !present_configs.is_empty() {
        out.push_str("## Configuration Files Found\n\n");
        for file in present_configs {
            if let Some(content) = &file.content {
                push_file_block(&mut out, &file.path, truncate_chars(content, CONFIG_CHAR_LIMIT));
            }
        }
    }

    let present_sources: Vec<_> = sources.iter().filter(|f| f.content.is_some()).collect();
    if !present_sources.is_empty() {
        out.push_str("## Key Source Files\n\n");
        for file in present_sources {
            if let Some(content) = &file.content {
                push_file_block(&mut out, &file.path, &source_excerpt(content));
            }
        }
    }

    if layout.directories.is_empty() && layout.config_files.is_empty() && layout.source_candidates.is_empty() {
        out.push_str("No directories, configuration files or source files were recognized.\n");
    }

    out.trim_end().to_string()
}

/// Renders the root-only listing used when the tree cannot be fetched
///
/// Root config files are inlined only when shorter than 500 characters.
pub fn render_root_listing(
    repo: &RepositoryIdentity,
    git_ref: &str,
    entries: &[ContentEntry],
    configs: &[FetchedFile],
) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", repo));
    out.push_str(&format!(
        "No README found. The file tree at `{}` was unavailable; root directory contents follow.\n\n",
        git_ref
    ));

    let (dirs, files): (Vec<&ContentEntry>, Vec<&ContentEntry>) = entries.iter().partition(|e| e.is_dir());
    if !dirs.is_empty() {
        out.push_str("## Directories\n\n");
        for dir in dirs {
            out.push_str(&format!("- {}/\n", dir.name));
        }
        out.push('\n');
    }
    if !files.is_empty() {
        out.push_str("## Files\n\n");
        for file in files {
            out.push_str(&format!("- {}\n", file.name));
        }
        out.push('\n');
    }

    let inlined: Vec<(&str, &str)> = configs
        .iter()
        .filter_map(|f| f.content.as_deref().map(|c| (f.path.as_str(), c)))
        .filter(|(_, content)| content.chars().count() < CONFIG_CHAR_LIMIT)
        .collect();
    if !inlined.is_empty() {
        out.push_str("## Configuration Files Found\n\n");
        for (path, content) in inlined {
            push_file_block(&mut out, path, content);
        }
    }

    if entries.is_empty() {
        out.push_str("The root directory is empty.\n");
    }

    out.trim_end().to_string()
}

/// The last link of the chain; always produces text
pub struct StructureSynthesis;

impl StructureSynthesis {
    async fn fetch(client: &GitHubClient, ctx: &ResolveContext, path: &str) -> Option<String> {
        match client.get_file(&ctx.repo, path, &ctx.git_ref).await {
            Ok(content) => content,
            Err(e) => {
                debug!("{}: skipping {}: {}", ctx.repo, path, e);
                None
            }
        }
    }

    async fn from_tree(client: &GitHubClient, ctx: &ResolveContext, entries: &[TreeEntry]) -> String {
        let layout = classify_tree(entries);

        let mut configs = Vec::new();
        for path in &layout.config_files {
            configs.push(FetchedFile {
                path: path.clone(),
                content: Self::fetch(client, ctx, path).await,
            });
        }

        let mut sources = Vec::new();
        for path in &layout.source_candidates {
            if sources.len() == MAX_SOURCE_FILES {
                break;
            }
            if let Some(content) = Self::fetch(client, ctx, path).await {
                sources.push(FetchedFile {
                    path: path.clone(),
                    content: Some(content),
                });
            }
        }

        render_tree_report(&ctx.repo, &ctx.git_ref, &layout, &configs, &sources)
    }

    async fn from_root(client: &GitHubClient, ctx: &ResolveContext) -> Result<String> {
        let entries = client.list_root(&ctx.repo, &ctx.git_ref).await?;

        let mut configs = Vec::new();
        for entry in entries.iter().filter(|e| !e.is_dir() && ROOT_CONFIG_FILES.contains(&e.name.as_str())) {
            configs.push(FetchedFile {
                path: entry.path.clone(),
                content: Self::fetch(client, ctx, &entry.path).await,
            });
        }

        Ok(render_root_listing(&ctx.repo, &ctx.git_ref, &entries, &configs))
    }
}

#[async_trait]
impl ContentStrategy for StructureSynthesis {
    fn name(&self) -> &'static str {
        "structural synthesis"
    }

    async fn locate(&self, client: &GitHubClient, ctx: &ResolveContext) -> Result<Option<String>> {
        let tree_error = match client.get_tree(&ctx.repo, &ctx.git_ref).await {
            Ok(entries) => return Ok(Some(Self::from_tree(client, ctx, &entries).await)),
            Err(e) => e,
        };
        warn!("{}: tree unavailable ({}), falling back to root listing", ctx.repo, tree_error);

        match Self::from_root(client, ctx).await {
            Ok(report) => Ok(Some(report)),
            Err(listing_error) => Ok(Some(format!(
                "No README found, and the structure of {} at `{}` could not be retrieved \
                 (tree: {}; root listing: {}).",
                ctx.repo, ctx.git_ref, tree_error, listing_error
            ))),
        }
    }
}
