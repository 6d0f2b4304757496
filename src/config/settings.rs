//! Application settings management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// HTTP upload server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// OpenAI transcription + summarization settings
    #[serde(default)]
    pub openai: OpenAiSettings,

    /// Notion publishing settings
    #[serde(default)]
    pub notion: NotionSettings,

    /// Upload storage settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Background worker settings
    #[serde(default)]
    pub worker: WorkerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Data directory for stored uploads
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Listen address for the upload server
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiSettings {
    /// API key
    #[serde(default)]
    pub api_key: String,

    /// API base URL
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    /// Speech-to-text model
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,

    /// Chat model used for paragraphing and summaries
    #[serde(default = "default_summary_model")]
    pub summary_model: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_openai_timeout")]
    pub timeout_secs: u64,

    /// Replay fixture files instead of calling the API
    #[serde(default)]
    pub mock: bool,

    /// Write live API responses to the fixture files
    #[serde(default)]
    pub record_fixtures: bool,

    /// Transcript fixture (plain text)
    #[serde(default = "default_transcript_fixture")]
    pub transcript_fixture: PathBuf,

    /// Chat completion fixture (raw JSON response body)
    #[serde(default = "default_summary_fixture")]
    pub summary_fixture: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionSettings {
    /// API base URL
    #[serde(default = "default_notion_endpoint")]
    pub endpoint: String,

    /// Value sent in the Notion-Version header
    #[serde(default = "default_notion_version")]
    pub api_version: String,

    /// Integration token used by CLI commands when --token is not given
    #[serde(default)]
    pub token: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_notion_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory for stored uploads (defaults to <data_dir>/uploads)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploads_dir: Option<PathBuf>,

    /// Remove an upload once its page has been published
    #[serde(default)]
    pub delete_after_publish: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSettings {
    /// Maximum number of pipeline runs in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Maximum number of queued runs waiting for a worker
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

// Default value functions

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "notescribe", "notescribe")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.local/share/notescribe"))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_addr() -> String {
    "127.0.0.1:4000".to_string()
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_summary_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_timeout() -> u64 {
    300
}

fn default_transcript_fixture() -> PathBuf {
    PathBuf::from("fixtures/transcript.txt")
}

fn default_summary_fixture() -> PathBuf {
    PathBuf::from("fixtures/summary.json")
}

fn default_notion_endpoint() -> String {
    "https://api.notion.com/v1".to_string()
}

fn default_notion_version() -> String {
    "2022-06-28".to_string()
}

fn default_notion_timeout() -> u64 {
    30
}

/// Upper bound on `worker.concurrency`
pub const MAX_WORKER_CONCURRENCY: usize = 1024;

fn default_concurrency() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    32
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_openai_endpoint(),
            transcription_model: default_transcription_model(),
            summary_model: default_summary_model(),
            timeout_secs: default_openai_timeout(),
            mock: false,
            record_fixtures: false,
            transcript_fixture: default_transcript_fixture(),
            summary_fixture: default_summary_fixture(),
        }
    }
}

impl Default for NotionSettings {
    fn default() -> Self {
        Self {
            endpoint: default_notion_endpoint(),
            api_version: default_notion_version(),
            token: String::new(),
            timeout_secs: default_notion_timeout(),
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("No config file found, using defaults");
            let mut settings = Self::default();
            settings.apply_env_overrides();
            return Ok(settings);
        }

        let mut settings = Self::load_from(&config_path)?;
        settings.apply_env_overrides();

        Ok(settings)
    }

    /// Parse a settings file without applying environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Values already present in the config file win over the environment.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.openai.api_key.trim().is_empty() {
            if let Some(key) =
                non_empty("NOTESCRIBE_OPENAI_API_KEY").or_else(|| non_empty("OPENAI_API_KEY"))
            {
                self.openai.api_key = key;
            }
        }

        if self.notion.token.trim().is_empty() {
            if let Some(token) = non_empty("NOTESCRIBE_NOTION_TOKEN") {
                self.notion.token = token;
            }
        }
    }

    /// Check that the settings can drive a running service.
    pub fn validate(&self) -> crate::Result<()> {
        use crate::NotescribeError;

        if self.worker.concurrency == 0 {
            return Err(NotescribeError::Config(
                "worker.concurrency must be at least 1".to_string(),
            ));
        }
        if self.worker.concurrency > MAX_WORKER_CONCURRENCY {
            return Err(NotescribeError::Config(format!(
                "worker.concurrency must be at most {}",
                MAX_WORKER_CONCURRENCY
            )));
        }
        if self.worker.queue_capacity == 0 {
            return Err(NotescribeError::Config(
                "worker.queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(NotescribeError::Config(
                "server.max_upload_bytes must be greater than 0".to_string(),
            ));
        }
        self.socket_addr()?;

        if !self.openai.mock && self.openai.api_key.trim().is_empty() {
            return Err(NotescribeError::Config(
                "OpenAI API key is missing. Set openai.api_key in config or OPENAI_API_KEY."
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Parsed listen address for the upload server
    pub fn socket_addr(&self) -> crate::Result<SocketAddr> {
        self.server.addr.parse().map_err(|e| {
            crate::NotescribeError::Config(format!(
                "Invalid server.addr '{}': {}",
                self.server.addr, e
            ))
        })
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "notescribe", "notescribe")
            .context("Could not determine config directory")?;

        let config_dir = dirs.config_dir();
        Ok(config_dir.join("config.toml"))
    }

    /// Write default configuration to a file
    pub fn write_default(path: &Path) -> Result<()> {
        Self::default().save(path)
    }

    /// Serialize these settings to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Set a value by dotted key (e.g. `worker.concurrency`).
    ///
    /// The value is parsed to match the type of the existing entry.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let mut doc = toml::Value::try_from(&*self)?;

        let mut parts = key.split('.');
        let (section, field) = match (parts.next(), parts.next(), parts.next()) {
            (Some(section), Some(field), None) => (section, field),
            _ => anyhow::bail!("Config key must look like <section>.<field>, got '{}'", key),
        };

        let table = doc
            .get_mut(section)
            .and_then(toml::Value::as_table_mut)
            .with_context(|| format!("Unknown config section '{}'", section))?;

        let parsed = match table.get(field) {
            Some(toml::Value::Boolean(_)) => toml::Value::Boolean(
                value
                    .parse()
                    .with_context(|| format!("{} expects true or false", key))?,
            ),
            Some(toml::Value::Integer(_)) => toml::Value::Integer(
                value
                    .parse()
                    .with_context(|| format!("{} expects an integer", key))?,
            ),
            Some(_) => toml::Value::String(value.to_string()),
            // Optional fields are skipped when unset
            None if section == "storage" && field == "uploads_dir" => {
                toml::Value::String(value.to_string())
            }
            None => anyhow::bail!("Unknown config key '{}'", key),
        };
        table.insert(field.to_string(), parsed);

        *self = doc
            .try_into()
            .with_context(|| format!("Invalid value for {}", key))?;
        Ok(())
    }

    /// Get the directory where uploads are stored
    pub fn uploads_dir(&self) -> PathBuf {
        self.storage
            .uploads_dir
            .clone()
            .unwrap_or_else(|| self.general.data_dir.join("uploads"))
    }
}
