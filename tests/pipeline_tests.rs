use std::sync::{Arc, Mutex};

use mockito::{Matcher, Mock, Server};
use pretty_assertions::assert_eq;
use repo_summarizer::error::RepoError;
use repo_summarizer::llm::{SimilarityFinder, Summarizer};
use repo_summarizer::models::RepositoryIdentity;
use repo_summarizer::pipeline::{Pipeline, ProgressSink, SilentProgress, Stage};
use repo_summarizer::resolver::ContentResolver;
use repo_summarizer::store::{JsonRecordStore, RecordStore};
use serde_json::json;
use tempfile::TempDir;

mod common;
use common::test_helpers::*;

const METADATA: &str = r#"{"full_name": "tiangolo/fastapi", "language": "Python", "default_branch": "master"}"#;

#[derive(Default)]
struct RecordingProgress {
    stages: Mutex<Vec<Stage>>,
}

impl ProgressSink for RecordingProgress {
    fn stage(&self, stage: Stage) {
        self.stages.lock().unwrap().push(stage);
    }
}

fn fastapi() -> RepositoryIdentity {
    RepositoryIdentity::new("tiangolo", "fastapi")
}

async fn mock_fastapi_readme(server: &mut mockito::ServerGuard) -> (Mock, Mock) {
    let metadata = mock_metadata(server, "tiangolo/fastapi", METADATA).await;
    let readme = server.mock("GET", "/repos/tiangolo/fastapi/readme")
        .match_query(Matcher::UrlEncoded("ref".into(), "master".into()))
        .with_status(200)
        .with_body(encoded_file("# FastAPI\n\nFastAPI framework, high performance."))
        .create_async()
        .await;
    (metadata, readme)
}

fn scripted_pipeline(
    server: &mockito::ServerGuard,
    transport: Arc<ScriptedTransport>,
    db: &std::path::Path,
) -> Pipeline {
    Pipeline::new(
        ContentResolver::new(github_client(server)),
        Summarizer::with_transport("grok-code-fast-1", transport.clone()),
        SimilarityFinder::with_transport("grok-code-fast-1", transport),
        Box::new(JsonRecordStore::new(db)),
    )
}

#[tokio::test]
async fn test_full_run_over_http() {
    setup_test_logger();
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("data.json");
    let mut server = Server::new_async().await;
    let _github = mock_fastapi_readme(&mut server).await;

    let summary_mock = server.mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({"max_tokens": 500})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_reply("- Python web framework\n- Built on Starlette"))
        .create_async()
        .await;
    let similar_mock = server.mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({"max_tokens": 200})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_reply("pallets/flask\nencode/starlette\nDjango is also nice\n"))
        .create_async()
        .await;

    let config = create_test_config(&server, &db);
    let pipeline = Pipeline::from_config(&config).unwrap();
    let progress = RecordingProgress::default();

    let report = pipeline.run(&fastapi(), None, &progress).await.unwrap();

    assert_eq!(report.summary, "- Python web framework\n- Built on Starlette");
    assert_eq!(report.similar_repos, vec!["pallets/flask", "encode/starlette"]);
    assert_eq!(report.language.as_deref(), Some("Python"));
    assert_eq!(report.record_id, 1);
    assert_eq!(
        *progress.stages.lock().unwrap(),
        vec![Stage::Resolve, Stage::Summarize, Stage::FindSimilar, Stage::Save, Stage::Done]
    );
    summary_mock.assert_async().await;
    similar_mock.assert_async().await;

    let stored = pipeline.store().get(&fastapi()).await.unwrap().unwrap();
    assert_eq!(stored.repo, "tiangolo/fastapi");
    assert_eq!(stored.readme, "# FastAPI\n\nFastAPI framework, high performance.");
    assert_eq!(stored.similar_repos, vec!["pallets/flask", "encode/starlette"]);
}

#[tokio::test]
async fn test_summary_failure_saves_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("data.json");
    let mut server = Server::new_async().await;
    let _github = mock_fastapi_readme(&mut server).await;

    let transport = Arc::new(ScriptedTransport::new(vec![Err(RepoError::Llm("HTTP 500".into()))]));
    let pipeline = scripted_pipeline(&server, transport.clone(), &db);

    let result = pipeline.run(&fastapi(), None, &SilentProgress).await;

    assert!(matches!(result, Err(RepoError::Summarization)));
    assert_eq!(transport.request_count(), 1);
    assert!(!db.exists());
}

#[tokio::test]
async fn test_lookup_failure_stops_before_llm() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("data.json");
    let mut server = Server::new_async().await;
    let _meta = server.mock("GET", "/repos/tiangolo/fastapi")
        .with_status(404)
        .create_async()
        .await;

    let transport = Arc::new(ScriptedTransport::new(vec![Ok("- unused".into())]));
    let pipeline = scripted_pipeline(&server, transport.clone(), &db);

    let result = pipeline.run(&fastapi(), None, &SilentProgress).await;

    assert!(matches!(result, Err(RepoError::Lookup(_))));
    assert_eq!(transport.request_count(), 0);
    assert!(!db.exists());
}

#[tokio::test]
async fn test_similarity_failure_still_saves() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("data.json");
    let mut server = Server::new_async().await;
    let _github = mock_fastapi_readme(&mut server).await;

    let transport = Arc::new(ScriptedTransport::new(vec![
        Ok("- Web framework".into()),
        Err(RepoError::Llm("timeout".into())),
    ]));
    let pipeline = scripted_pipeline(&server, transport.clone(), &db);

    let report = pipeline.run(&fastapi(), None, &SilentProgress).await.unwrap();

    assert!(report.similar_repos.is_empty());
    assert_eq!(transport.request_count(), 2);

    let records = JsonRecordStore::new(&db).all().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].1.summary, "- Web framework");
}

#[tokio::test]
async fn test_long_readme_is_capped_before_summarizing() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("data.json");
    let mut server = Server::new_async().await;
    let _meta = mock_metadata(&mut server, "tiangolo/fastapi", METADATA).await;
    let _readme = server.mock("GET", "/repos/tiangolo/fastapi/readme")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(encoded_file(&"7".repeat(9000)))
        .create_async()
        .await;

    let transport = Arc::new(ScriptedTransport::new(vec![Ok("- Sevens".into()), Ok("a/b".into())]));
    let pipeline = scripted_pipeline(&server, transport.clone(), &db);

    let report = pipeline.run(&fastapi(), None, &SilentProgress).await.unwrap();

    let requests = transport.requests.lock().unwrap();
    assert_eq!(requests[0].messages[1].content.matches('7').count(), 4000);
    assert_eq!(report.content_chars, 9000);
    assert_eq!(report.similar_repos, vec!["a/b"]);
}
