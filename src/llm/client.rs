use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Settings;
use crate::fixtures::{CaptureSummarizer, FixtureSummarizer};
use crate::llm::openai::OpenAiSummarizer;
use crate::Result;

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Ask the model to paragraph and summarize a transcript.
    ///
    /// Returns the raw response body; structure is checked by
    /// [`parse_structured_summary`](crate::llm::parse_structured_summary).
    async fn summarize(&self, transcript: &str) -> Result<String>;
}

/// Build the summarizer selected by the settings.
pub fn build_summarizer(settings: &Settings) -> Result<Arc<dyn Summarizer>> {
    if settings.openai.mock {
        return Ok(Arc::new(FixtureSummarizer::from_settings(settings)));
    }

    let client = OpenAiSummarizer::from_settings(settings)?;
    if settings.openai.record_fixtures {
        Ok(Arc::new(CaptureSummarizer::new(
            client,
            &settings.openai.summary_fixture,
        )))
    } else {
        Ok(Arc::new(client))
    }
}
