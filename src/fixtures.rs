//! Offline fixtures for the OpenAI stages
//!
//! Replay clients serve a saved transcript and a saved chat-completion body
//! instead of calling the API. Capture decorators wrap the live clients and
//! save each successful response to the same files.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::llm::Summarizer;
use crate::transcription::Transcriber;
use crate::{NotescribeError, Result};

async fn read_fixture(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        NotescribeError::Storage(format!("Failed to read fixture {}: {}", path.display(), e))
    })
}

async fn write_fixture(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await.map_err(|e| {
        NotescribeError::Storage(format!("Failed to write fixture {}: {}", path.display(), e))
    })
}

/// Serves a fixed transcript from a text file.
pub struct FixtureTranscriber {
    path: PathBuf,
}

impl FixtureTranscriber {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.openai.transcript_fixture)
    }
}

#[async_trait]
impl Transcriber for FixtureTranscriber {
    async fn transcribe(&self, _audio: Vec<u8>, filename: &str) -> Result<String> {
        tracing::debug!("Using transcript fixture for {}", filename);
        read_fixture(&self.path).await
    }
}

/// Serves a fixed chat-completion body from a JSON file.
pub struct FixtureSummarizer {
    path: PathBuf,
}

impl FixtureSummarizer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.openai.summary_fixture)
    }
}

#[async_trait]
impl Summarizer for FixtureSummarizer {
    async fn summarize(&self, _transcript: &str) -> Result<String> {
        tracing::debug!("Using summary fixture {}", self.path.display());
        read_fixture(&self.path).await
    }
}

/// Saves every transcript produced by the inner transcriber.
pub struct CaptureTranscriber<T> {
    inner: T,
    path: PathBuf,
}

impl<T> CaptureTranscriber<T> {
    pub fn new(inner: T, path: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            path: path.into(),
        }
    }
}

#[async_trait]
impl<T: Transcriber> Transcriber for CaptureTranscriber<T> {
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String> {
        let text = self.inner.transcribe(audio, filename).await?;
        write_fixture(&self.path, &text).await?;
        Ok(text)
    }
}

/// Saves every raw response produced by the inner summarizer.
pub struct CaptureSummarizer<S> {
    inner: S,
    path: PathBuf,
}

impl<S> CaptureSummarizer<S> {
    pub fn new(inner: S, path: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            path: path.into(),
        }
    }
}

#[async_trait]
impl<S: Summarizer> Summarizer for CaptureSummarizer<S> {
    async fn summarize(&self, transcript: &str) -> Result<String> {
        let raw = self.inner.summarize(transcript).await?;
        write_fixture(&self.path, &raw).await?;
        Ok(raw)
    }
}
