//! Pipeline stages and stage-tagged errors

use std::fmt;
use thiserror::Error;

use crate::NotescribeError;

/// One step of a pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Resolve the stored file reference to bytes
    Read,
    /// Speech-to-text
    Transcribe,
    /// Paragraphing + summary via the language model
    Summarize,
    /// Parse the structured payload and lay out page blocks
    Format,
    /// Create the Notion page
    Publish,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Read,
        Stage::Transcribe,
        Stage::Summarize,
        Stage::Format,
        Stage::Publish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Transcribe => "transcribe",
            Self::Summarize => "summarize",
            Self::Format => "format",
            Self::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure together with the stage that produced it.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {error}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub error: NotescribeError,
}

impl StageError {
    pub fn new(stage: Stage, error: NotescribeError) -> Self {
        Self { stage, error }
    }
}

/// Tag a stage result with the stage it came from.
pub trait StageResultExt<T> {
    fn at(self, stage: Stage) -> Result<T, StageError>;
}

impl<T> StageResultExt<T> for crate::Result<T> {
    fn at(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|error| StageError::new(stage, error))
    }
}
