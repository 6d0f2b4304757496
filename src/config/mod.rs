//! Configuration module for notescribe
//!
//! Handles loading and managing application settings from TOML files.

mod settings;

pub use settings::{
    GeneralSettings, NotionSettings, OpenAiSettings, ServerSettings, Settings, StorageSettings,
    WorkerSettings, MAX_WORKER_CONCURRENCY,
};
