//! notescribe - Turn uploaded audio into a summarized Notion page
//!
//! An upload is persisted, transcribed, summarized into structured output,
//! formatted as Notion blocks and published under a caller-chosen database.

pub mod cli;
pub mod config;
pub mod fixtures;
pub mod llm;
pub mod notion;
pub mod pipeline;
pub mod server;
pub mod storage;
pub mod transcription;

use thiserror::Error;

/// Main error type for notescribe
#[derive(Error, Debug)]
pub enum NotescribeError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection or protocol failure talking to a provider.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status with a provider-supplied message.
    #[error("{service} error: {message}")]
    Provider {
        service: &'static str,
        message: String,
    },

    /// Response body did not have the expected structure.
    #[error("Malformed {service} response: {detail}")]
    MalformedResponse {
        service: &'static str,
        detail: String,
    },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl NotescribeError {
    pub fn provider(service: &'static str, message: impl Into<String>) -> Self {
        Self::Provider {
            service,
            message: message.into(),
        }
    }

    pub fn malformed(service: &'static str, detail: impl ToString) -> Self {
        Self::MalformedResponse {
            service,
            detail: detail.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NotescribeError>;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "notescribe";
