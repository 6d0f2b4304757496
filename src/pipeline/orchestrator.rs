//! Transcription-to-publish orchestration
//!
//! A run moves one stored upload through read → transcribe → summarize →
//! format → publish. Stages run strictly in order; the first failure ends
//! the run, so nothing is published unless every earlier stage succeeded.

use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::llm::{parse_structured_summary, Summarizer};
use crate::notion::{format_summary, AccessToken, Publisher};
use crate::pipeline::stage::{Stage, StageError, StageResultExt};
use crate::storage::{BlobStore, FileReference};
use crate::transcription::Transcriber;
use crate::{NotescribeError, Result};

/// Everything one pipeline run needs. The token lives only as long as the job.
#[derive(Debug, Clone)]
pub struct PipelineJob {
    pub id: Uuid,
    pub file: FileReference,
    pub filename: String,
    pub database_id: String,
    pub token: AccessToken,
}

impl PipelineJob {
    pub fn new(
        file: FileReference,
        filename: impl Into<String>,
        database_id: impl Into<String>,
        token: AccessToken,
    ) -> Result<Self> {
        let database_id = database_id.into();
        if database_id.trim().is_empty() {
            return Err(NotescribeError::Validation(
                "No Notion database id supplied".to_string(),
            ));
        }
        if token.is_empty() {
            return Err(NotescribeError::Validation(
                "No Notion access token supplied".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            file,
            filename: filename.into(),
            database_id,
            token,
        })
    }

    /// Title of the page created for this job.
    pub fn page_title(&self) -> String {
        page_title(&self.filename)
    }
}

pub fn page_title(filename: &str) -> String {
    format!("{} Transcribed Audio", filename)
}

/// The four stage collaborators plus the blob store they read from.
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<dyn BlobStore>,
    transcriber: Arc<dyn Transcriber>,
    summarizer: Arc<dyn Summarizer>,
    publisher: Arc<dyn Publisher>,
    delete_after_publish: bool,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn BlobStore>,
        transcriber: Arc<dyn Transcriber>,
        summarizer: Arc<dyn Summarizer>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            store,
            transcriber,
            summarizer,
            publisher,
            delete_after_publish: false,
        }
    }

    /// Remove each upload from the store once its page exists.
    pub fn with_delete_after_publish(mut self, enabled: bool) -> Self {
        self.delete_after_publish = enabled;
        self
    }

    /// Run every stage for `job`, logging the terminal outcome.
    pub async fn run(&self, job: &PipelineJob) -> std::result::Result<(), StageError> {
        let span = tracing::info_span!(
            "pipeline",
            job_id = %job.id,
            filename = %job.filename,
            database_id = %job.database_id,
        );

        async {
            let result = self.execute(job).await;
            match &result {
                Ok(()) => tracing::info!("Notion page created"),
                Err(e) => tracing::error!(stage = %e.stage, "Pipeline run failed: {}", e.error),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, job: &PipelineJob) -> std::result::Result<(), StageError> {
        let audio = self.store.read(&job.file).await.at(Stage::Read)?;
        tracing::debug!("Read {} bytes from {}", audio.len(), job.file);

        let transcript = self
            .transcriber
            .transcribe(audio, &job.filename)
            .await
            .at(Stage::Transcribe)?;
        tracing::debug!("Transcription completed ({} chars)", transcript.len());

        let raw = self
            .summarizer
            .summarize(&transcript)
            .await
            .at(Stage::Summarize)?;
        tracing::debug!("Summary completed");

        let summary = parse_structured_summary(&raw).at(Stage::Format)?;
        let blocks = format_summary(&summary);
        tracing::debug!(
            "Formatted {} blocks ({} action items)",
            blocks.len(),
            summary.action_items.as_ref().map_or(0, Vec::len)
        );

        self.publisher
            .create_page(&job.database_id, &job.page_title(), &blocks, &job.token)
            .await
            .at(Stage::Publish)?;

        // The page exists, so a failed cleanup does not fail the run
        if self.delete_after_publish {
            if let Err(e) = self.store.delete(&job.file).await {
                tracing::warn!("Failed to remove {} after publishing: {}", job.file, e);
            }
        }
        Ok(())
    }
}
