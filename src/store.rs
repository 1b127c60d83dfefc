use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{RepoError, Result};
use crate::models::{RepositoryIdentity, ResultRecord};

/// Persistence for finished runs
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Appends `record` and returns its id
    async fn insert(&self, record: &ResultRecord) -> Result<u64>;

    /// The most recently inserted record for `identity`
    async fn get(&self, identity: &RepositoryIdentity) -> Result<Option<ResultRecord>>;

    /// Records whose README excerpt matches `pattern`, in id order
    async fn search(&self, pattern: &str) -> Result<Vec<(u64, ResultRecord)>>;

    /// Every record, in id order
    async fn all(&self) -> Result<Vec<(u64, ResultRecord)>>;
}

/// On-disk layout: `{"repositories": {"1": {...}, "2": {...}}}`
///
/// Tables other than `repositories` are carried through untouched.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    repositories: BTreeMap<String, ResultRecord>,
    #[serde(flatten)]
    other_tables: serde_json::Map<String, serde_json::Value>,
}

/// A [`RecordStore`] kept in a single JSON file
///
/// Every insert rewrites the whole document through a temporary sibling file.
/// Single process, single writer.
#[derive(Debug, Clone)]
pub struct JsonRecordStore {
    path: PathBuf,
}

impl JsonRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_document(&self) -> Result<Document> {
        if !self.path.exists() {
            return Ok(Document::default());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(Document::default());
        }

        serde_json::from_str(&content).map_err(|e| {
            RepoError::Database(format!("{} is not a valid record store: {}", self.path.display(), e))
        })
    }

    async fn load(&self) -> Result<BTreeMap<u64, ResultRecord>> {
        let document = self.load_document().await?;
        self.records(document.repositories)
    }

    fn records(&self, repositories: BTreeMap<String, ResultRecord>) -> Result<BTreeMap<u64, ResultRecord>> {
        repositories
            .into_iter()
            .map(|(id, record)| {
                id.parse::<u64>()
                    .map(|id| (id, record))
                    .map_err(|_| RepoError::Database(format!("invalid record id '{}' in {}", id, self.path.display())))
            })
            .collect()
    }

    async fn save(&self, document: &Document) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, serde_json::to_string_pretty(document)?).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonRecordStore {
    async fn insert(&self, record: &ResultRecord) -> Result<u64> {
        let mut document = self.load_document().await?;
        let table = self.records(std::mem::take(&mut document.repositories))?;
        let id = table.keys().next_back().map_or(1, |last| last + 1);

        document.repositories = table
            .into_iter()
            .chain(std::iter::once((id, record.clone())))
            .map(|(id, record)| (id.to_string(), record))
            .collect();
        self.save(&document).await?;

        info!("Saved {} as record {} in {}", record.repo, id, self.path.display());
        Ok(id)
    }

    async fn get(&self, identity: &RepositoryIdentity) -> Result<Option<ResultRecord>> {
        let key = identity.key();
        let table = self.load().await?;
        Ok(table.into_values().filter(|record| record.repo == key).last())
    }

    async fn search(&self, pattern: &str) -> Result<Vec<(u64, ResultRecord)>> {
        let regex = Regex::new(pattern)
            .map_err(|e| RepoError::Validation(format!("invalid search pattern '{}': {}", pattern, e)))?;

        let matches: Vec<_> = self
            .load()
            .await?
            .into_iter()
            .filter(|(_, record)| regex.is_match(&record.readme))
            .collect();
        debug!("pattern '{}' matched {} records", pattern, matches.len());
        Ok(matches)
    }

    async fn all(&self) -> Result<Vec<(u64, ResultRecord)>> {
        Ok(self.load().await?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepositoryContent;
    use tempfile::TempDir;

    fn record(owner: &str, name: &str, readme: &str) -> ResultRecord {
        let content = RepositoryContent {
            primary_language: None,
            descriptive_text: readme.to_string(),
        };
        ResultRecord::new(&RepositoryIdentity::new(owner, name), &content, "- summary", vec![])
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() -> Result<()> {
        let dir = TempDir::new()?;
        let store = JsonRecordStore::new(dir.path().join("nested").join("data.json"));

        assert_eq!(store.insert(&record("a", "one", "first")).await?, 1);
        assert_eq!(store.insert(&record("b", "two", "second")).await?, 2);

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(store.path())?)?;
        assert_eq!(raw["repositories"]["2"]["repo"], "b/two");
        assert!(!store.path().with_extension("json.tmp").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_get_returns_latest() -> Result<()> {
        let dir = TempDir::new()?;
        let store = JsonRecordStore::new(dir.path().join("data.json"));
        store.insert(&record("a", "one", "old")).await?;
        store.insert(&record("b", "two", "other")).await?;
        store.insert(&record("a", "one", "new")).await?;

        let latest = store.get(&RepositoryIdentity::new("a", "one")).await?;
        assert_eq!(latest.map(|r| r.readme), Some("new".to_string()));
        assert!(store.get(&RepositoryIdentity::new("c", "three")).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_search_is_case_sensitive_regex() -> Result<()> {
        let dir = TempDir::new()?;
        let store = JsonRecordStore::new(dir.path().join("data.json"));
        store.insert(&record("a", "one", "# FastAPI framework")).await?;
        store.insert(&record("b", "two", "# fastapi clone")).await?;

        let hits = store.search("Fast[A-Z]+").await?;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 1);

        assert!(matches!(store.search("(unclosed").await, Err(RepoError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() -> Result<()> {
        let dir = TempDir::new()?;
        let store = JsonRecordStore::new(dir.path().join("absent.json"));
        assert!(store.all().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_keeps_other_tables() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("data.json");
        std::fs::write(
            &path,
            r#"{"_default": {"1": {"note": "kept"}}, "repositories": {}}"#,
        )?;

        let store = JsonRecordStore::new(&path);
        assert_eq!(store.insert(&record("a", "one", "first")).await?, 1);

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(raw["_default"]["1"]["note"], "kept");
        assert_eq!(raw["repositories"]["1"]["repo"], "a/one");
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_file_is_database_error() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{ not json")?;

        let store = JsonRecordStore::new(path);
        assert!(matches!(store.all().await, Err(RepoError::Database(_))));
        Ok(())
    }
}
