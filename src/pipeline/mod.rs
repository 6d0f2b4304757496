//! Pipeline module for notescribe
//!
//! Chains blob read, transcription, summarization, formatting and
//! publishing, and runs those chains in the background.

mod orchestrator;
mod stage;
mod worker;

pub use orchestrator::{page_title, Pipeline, PipelineJob};
pub use stage::{Stage, StageError, StageResultExt};
pub use worker::{
    logging_hook, CompletionHook, JobSubmitter, RunOutcome, SubmitError, WorkerConfig, WorkerPool,
};

use std::sync::Arc;

use crate::config::Settings;
use crate::llm::build_summarizer;
use crate::notion::NotionClient;
use crate::storage::BlobStore;
use crate::transcription::build_transcriber;
use crate::Result;

/// Wire up the live (or fixture-backed) stage clients from settings.
pub fn build_pipeline(settings: &Settings, store: Arc<dyn BlobStore>) -> Result<Pipeline> {
    Ok(Pipeline::new(
        store,
        build_transcriber(settings)?,
        build_summarizer(settings)?,
        Arc::new(NotionClient::from_settings(settings)?),
    )
    .with_delete_after_publish(settings.storage.delete_after_publish))
}
