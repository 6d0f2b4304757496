//! Transcription module for notescribe
//!
//! Handles speech-to-text through the OpenAI audio API.

mod whisper;

pub use whisper::WhisperClient;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Settings;
use crate::fixtures::{CaptureTranscriber, FixtureTranscriber};
use crate::Result;

/// Content types accepted for transcription.
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["audio/mpeg", "video/mp4", "video/mpeg"];

/// Returned by [`sniff_content_type`] when the bytes are not recognised.
pub const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Turn raw audio bytes into plain transcript text.
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String>;
}

/// Build the transcriber selected by the settings.
pub fn build_transcriber(settings: &Settings) -> Result<Arc<dyn Transcriber>> {
    if settings.openai.mock {
        return Ok(Arc::new(FixtureTranscriber::from_settings(settings)));
    }

    let client = WhisperClient::from_settings(settings)?;
    if settings.openai.record_fixtures {
        Ok(Arc::new(CaptureTranscriber::new(
            client,
            &settings.openai.transcript_fixture,
        )))
    } else {
        Ok(Arc::new(client))
    }
}

/// Whether a content type is on the transcription allow-list.
pub fn is_valid_audio_type(content_type: &str) -> bool {
    ALLOWED_CONTENT_TYPES.contains(&content_type)
}

/// Detect a content type from the leading bytes of a file.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    infer::get(bytes)
        .map(|kind| match kind.mime_type() {
            // MPEG program/transport streams
            "video/mp2t" | "video/mpeg" => "video/mpeg",
            // ISO-BMFF audio, e.g. voice memos branded M4A
            "audio/m4a" | "audio/x-m4a" => "video/mp4",
            other => other,
        })
        .unwrap_or(UNKNOWN_CONTENT_TYPE)
}
