use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Settings;
use crate::llm::client::Summarizer;
use crate::llm::prompts::SUMMARY_SYSTEM_PROMPT;
use crate::llm::schema::{response_schema, SCHEMA_NAME};
use crate::{NotescribeError, Result};

pub(crate) const SERVICE: &str = "OpenAI";

/// Chat-completions client that asks for schema-constrained JSON output.
pub struct OpenAiSummarizer {
    http: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiSummarizer {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.openai.api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(NotescribeError::Config(
                "OpenAI API key is missing. Set openai.api_key in config or OPENAI_API_KEY."
                    .to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(settings.openai.timeout_secs))
            .build()
            .map_err(|e| {
                NotescribeError::Config(format!("Failed to build OpenAI HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            api_key,
            model: settings.openai.summary_model.trim().to_string(),
            endpoint: normalize_endpoint(&settings.openai.endpoint),
        })
    }

    fn request_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }

    fn build_request(&self, transcript: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SUMMARY_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: transcript.to_string(),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_schema".to_string(),
                json_schema: JsonSchemaFormat {
                    name: SCHEMA_NAME.to_string(),
                    schema: response_schema(),
                },
            },
        }
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, transcript: &str) -> Result<String> {
        let body = self.build_request(transcript);

        let response = self
            .http
            .post(self.request_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(SERVICE, response).await);
        }

        Ok(response.text().await?)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    schema: serde_json::Value,
}

/// Error envelope shared by every OpenAI endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Turn a non-success OpenAI response into a provider error.
pub(crate) async fn error_from_response(
    service: &'static str,
    response: Response,
) -> NotescribeError {
    let status = response.status();
    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => return NotescribeError::Transport(e),
    };

    match serde_json::from_slice::<ApiErrorBody>(&body) {
        Ok(parsed) => {
            tracing::debug!(
                "{} returned {} (type={:?}, param={:?}, code={:?})",
                service,
                status,
                parsed.error.kind,
                parsed.error.param,
                parsed.error.code
            );
            NotescribeError::provider(service, parsed.error.message)
        }
        Err(e) => NotescribeError::malformed(
            service,
            format!("status {} with unreadable error body: {}", status, e),
        ),
    }
}

pub(crate) fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim().trim_end_matches('/').to_string()
}
