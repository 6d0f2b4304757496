mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{chat_completion, MP3_BYTES};
use notescribe::llm::Summarizer;
use notescribe::notion::{AccessToken, DocumentBlock, Publisher};
use notescribe::pipeline::{logging_hook, Pipeline, WorkerConfig, WorkerPool};
use notescribe::server::{build_router, AppContext, AUDIO_FIELD, DATABASE_FIELD, SUCCESS_PATH};
use notescribe::storage::MemoryBlobStore;
use notescribe::transcription::Transcriber;

const BOUNDARY: &str = "notescribe-test-boundary";

struct StaticTranscriber;

#[async_trait]
impl Transcriber for StaticTranscriber {
    async fn transcribe(&self, _audio: Vec<u8>, _filename: &str) -> notescribe::Result<String> {
        Ok("hello".to_string())
    }
}

struct StaticSummarizer;

#[async_trait]
impl Summarizer for StaticSummarizer {
    async fn summarize(&self, _transcript: &str) -> notescribe::Result<String> {
        let content = json!({ "logical_paragraphs": "hello", "summary": "greeting" });
        Ok(chat_completion(&content).to_string())
    }
}

#[derive(Default)]
struct RecordingPublisher {
    pages: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn create_page(
        &self,
        database_id: &str,
        _title: &str,
        _blocks: &[DocumentBlock],
        token: &AccessToken,
    ) -> notescribe::Result<()> {
        self.pages
            .lock()
            .unwrap()
            .push((database_id.to_string(), token.as_str().to_string()));
        Ok(())
    }
}

struct Harness {
    router: Router,
    store: Arc<MemoryBlobStore>,
    publisher: Arc<RecordingPublisher>,
    pool: WorkerPool,
}

fn harness(max_upload_bytes: usize) -> Harness {
    let store = Arc::new(MemoryBlobStore::new());
    let publisher = Arc::new(RecordingPublisher::default());
    let pipeline = Arc::new(Pipeline::new(
        store.clone(),
        Arc::new(StaticTranscriber),
        Arc::new(StaticSummarizer),
        publisher.clone(),
    ));
    let pool = WorkerPool::start(pipeline, WorkerConfig::default(), logging_hook());

    let router = build_router(AppContext {
        store: store.clone(),
        jobs: pool.submitter(),
        max_upload_bytes,
    });

    Harness {
        router,
        store,
        publisher,
        pool,
    }
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(cookie: Option<&str>, parts: &[Part<'_>]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/transcribe")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let h = harness(1024);
    let response = h
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "notescribe");
}

#[tokio::test]
async fn upload_is_queued_and_redirects() {
    let h = harness(1024);
    let request = upload_request(
        Some("notion_token=secret_abc"),
        &[
            Part::Text(DATABASE_FIELD, "db-42"),
            Part::File(AUDIO_FIELD, "standup.mp3", MP3_BYTES),
        ],
    );

    let response = h.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        SUCCESS_PATH
    );
    assert_eq!(h.store.len(), 1);

    h.pool.shutdown().await;
    let pages = h.publisher.pages.lock().unwrap();
    assert_eq!(
        *pages,
        vec![("db-42".to_string(), "secret_abc".to_string())]
    );
}

#[tokio::test]
async fn bearer_header_is_accepted_as_token() {
    let h = harness(1024);
    let mut request = upload_request(
        None,
        &[
            Part::Text(DATABASE_FIELD, "db-1"),
            Part::File(AUDIO_FIELD, "a.mp3", MP3_BYTES),
        ],
    );
    request.headers_mut().insert(
        header::AUTHORIZATION,
        "Bearer secret_header".parse().unwrap(),
    );

    let response = h.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    h.pool.shutdown().await;
    let pages = h.publisher.pages.lock().unwrap();
    assert_eq!(pages[0].1, "secret_header");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let h = harness(1024);
    let request = upload_request(
        None,
        &[
            Part::Text(DATABASE_FIELD, "db-1"),
            Part::File(AUDIO_FIELD, "a.mp3", MP3_BYTES),
        ],
    );

    let response = h.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn missing_database_id_is_rejected() {
    let h = harness(1024);
    let request = upload_request(
        Some("notion_token=secret"),
        &[Part::File(AUDIO_FIELD, "a.mp3", MP3_BYTES)],
    );

    let response = h.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "No Notion database id supplied");
}

#[tokio::test]
async fn missing_file_is_rejected() {
    let h = harness(1024);
    let request = upload_request(
        Some("notion_token=secret"),
        &[Part::Text(DATABASE_FIELD, "db-1")],
    );

    let response = h.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "No audio file supplied");
}

#[tokio::test]
async fn non_audio_upload_is_rejected_before_storage() {
    let h = harness(1024);
    let request = upload_request(
        Some("notion_token=secret"),
        &[
            Part::Text(DATABASE_FIELD, "db-1"),
            Part::File(AUDIO_FIELD, "notes.txt", b"just some plain text notes"),
        ],
    );

    let response = h.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Unsupported file type"));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let h = harness(MP3_BYTES.len() - 1);
    let request = upload_request(
        Some("notion_token=secret"),
        &[
            Part::Text(DATABASE_FIELD, "db-1"),
            Part::File(AUDIO_FIELD, "a.mp3", MP3_BYTES),
        ],
    );

    let response = h.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn closed_worker_pool_is_unavailable() {
    let h = harness(1024);
    h.pool.shutdown().await;

    let request = upload_request(
        Some("notion_token=secret"),
        &[
            Part::Text(DATABASE_FIELD, "db-1"),
            Part::File(AUDIO_FIELD, "a.mp3", MP3_BYTES),
        ],
    );

    let response = h.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn success_page_is_served() {
    let h = harness(1024);
    let response = h
        .router
        .clone()
        .oneshot(Request::get(SUCCESS_PATH).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
