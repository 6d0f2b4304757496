//! OpenAI Whisper transcription client

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::Settings;
use crate::llm::openai::{error_from_response, normalize_endpoint};
use crate::transcription::Transcriber;
use crate::{NotescribeError, Result};

pub(crate) const SERVICE: &str = "Whisper";

pub struct WhisperClient {
    http: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl WhisperClient {
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
                NotescribeError::Config(format!("Failed to build Whisper HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            api_key,
            model: settings.openai.transcription_model.trim().to_string(),
            endpoint: normalize_endpoint(&settings.openai.endpoint),
        })
    }

    fn request_url(&self) -> String {
        format!("{}/audio/transcriptions", self.endpoint)
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String> {
        let form = Form::new()
            .part("file", Part::bytes(audio).file_name(filename.to_string()))
            .text("model", self.model.clone());

        let response = self
            .http
            .post(self.request_url())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(SERVICE, response).await);
        }

        let body = response.bytes().await?;
        let payload: TranscriptionResponse =
            serde_json::from_slice(&body).map_err(|e| NotescribeError::malformed(SERVICE, e))?;

        Ok(payload.text)
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}
