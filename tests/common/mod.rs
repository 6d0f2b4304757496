#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Json, Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Leading bytes of an MP3 file with an ID3v2 tag.
pub const MP3_BYTES: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00";

pub fn run_notescribe(args: &[&str]) -> Output {
    TestEnv::new().run(args)
}

pub struct TestEnv {
    home: TempDir,
    config: TempDir,
    data: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("create temporary HOME dir"),
            config: tempfile::tempdir().expect("create temporary XDG config dir"),
            data: tempfile::tempdir().expect("create temporary XDG data dir"),
        }
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_notescribe"))
            .args(args)
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.config.path())
            .env("XDG_DATA_HOME", self.data.path())
            .env_remove("OPENAI_API_KEY")
            .env_remove("NOTESCRIBE_OPENAI_API_KEY")
            .env_remove("NOTESCRIBE_NOTION_TOKEN")
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to execute notescribe binary")
    }

    pub fn home(&self) -> PathBuf {
        self.home.path().to_path_buf()
    }

    pub fn config_path(&self) -> PathBuf {
        let output = self.run(&["config", "path"]);
        assert!(
            output.status.success(),
            "config path should succeed\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );

        let path = String::from_utf8_lossy(&output.stdout);
        PathBuf::from(path.trim())
    }

    pub fn write_config(&self, contents: &str) {
        let config_path = self.config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).expect("create config parent directory");
        }
        std::fs::write(&config_path, contents).expect("write config file");
    }
}

/// One request seen by a [`MockServer`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

type Responder = Arc<dyn Fn(&str) -> (StatusCode, Value) + Send + Sync>;

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    respond: Responder,
}

/// HTTP server on an ephemeral port that records every request and answers
/// with whatever the responder returns for the request path.
pub struct MockServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&str) -> (StatusCode, Value) + Send + Sync + 'static,
    {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            requests: requests.clone(),
            respond: Arc::new(respond),
        };
        let router = Router::new().fallback(record).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("mock server");
        });

        Self {
            base_url: format!("http://{}/v1", addr),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, suffix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.ends_with(suffix))
            .collect()
    }
}

async fn record(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let path = uri.path().to_string();
    let (status, response) = (state.respond)(&path);
    state.requests.lock().unwrap().push(RecordedRequest {
        method,
        path,
        headers,
        body,
    });
    (status, Json(response))
}

/// Chat-completion body whose message content is `content` serialized.
pub fn chat_completion(content: &Value) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content.to_string() },
            "finish_reason": "stop"
        }]
    })
}

/// Mock OpenAI that transcribes everything to `transcript` and summarizes
/// with `summary_content`.
pub async fn mock_openai(transcript: &str, summary_content: Value) -> MockServer {
    let transcript = transcript.to_string();
    let completion = chat_completion(&summary_content);
    MockServer::start(move |path| {
        if path.ends_with("/audio/transcriptions") {
            (StatusCode::OK, json!({ "text": transcript }))
        } else {
            (StatusCode::OK, completion.clone())
        }
    })
    .await
}

/// Mock Notion that answers every request with `status` and `body`.
pub async fn mock_notion(status: StatusCode, body: Value) -> MockServer {
    MockServer::start(move |_| (status, body.clone())).await
}

/// Plain text of every rich-text block in a create-page payload, tagged by type.
pub fn page_blocks(page: &Value) -> Vec<(String, String)> {
    page["children"]
        .as_array()
        .expect("children array")
        .iter()
        .map(|block| {
            let kind = if block.get("heading_2").is_some() {
                "heading_2"
            } else {
                "paragraph"
            };
            let text = block[kind]["rich_text"][0]["text"]["content"]
                .as_str()
                .expect("block text")
                .to_string();
            (kind.to_string(), text)
        })
        .collect()
}
