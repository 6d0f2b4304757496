//! CLI command implementations

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::cli::args::ConfigCommand;
use crate::config::Settings;
use crate::notion::{AccessToken, NotionClient};
use crate::pipeline::{build_pipeline, logging_hook, PipelineJob, WorkerConfig, WorkerPool};
use crate::server::{build_router, serve, AppContext};
use crate::storage::{BlobStore, FsBlobStore};
use crate::transcription::{is_valid_audio_type, sniff_content_type};

/// Run the upload server until Ctrl-C, then drain queued runs.
pub async fn run_server(settings: &Settings) -> Result<()> {
    settings.validate()?;
    let addr = settings.socket_addr()?;

    let store: Arc<dyn BlobStore> = Arc::new(FsBlobStore::from_settings(settings)?);
    let pipeline = Arc::new(build_pipeline(settings, store.clone())?);
    let pool = WorkerPool::start(
        pipeline,
        WorkerConfig::from_settings(settings),
        logging_hook(),
    );

    if settings.openai.mock {
        info!("Replaying OpenAI fixtures instead of calling the API");
    }

    let router = build_router(AppContext {
        store,
        jobs: pool.submitter(),
        max_upload_bytes: settings.server.max_upload_bytes,
    });

    let served = serve(addr, router, shutdown_signal()).await;

    info!("Waiting for queued transcriptions to finish");
    pool.shutdown().await;

    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Pick the token from the command line, falling back to settings.
fn resolve_token(settings: &Settings, token: Option<String>) -> Result<AccessToken> {
    let token = token
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| settings.notion.token.clone());

    let token = AccessToken::new(token.trim());
    if token.is_empty() {
        anyhow::bail!(
            "Notion token is missing. Pass --token, set notion.token in config or NOTESCRIBE_NOTION_TOKEN."
        );
    }
    Ok(token)
}

/// Run the full pipeline in the foreground for one local file.
pub async fn transcribe_file(
    settings: &Settings,
    file: &Path,
    database: &str,
    token: Option<String>,
) -> Result<()> {
    let token = resolve_token(settings, token)?;

    let bytes = std::fs::read(file)
        .with_context(|| format!("Failed to read audio file: {}", file.display()))?;

    let content_type = sniff_content_type(&bytes);
    if !is_valid_audio_type(content_type) {
        anyhow::bail!(
            "Unsupported file type {} for {}. Expected mp3, mp4 or mpeg audio.",
            content_type,
            file.display()
        );
    }

    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .context("Audio file name is not valid UTF-8")?
        .to_string();

    let store: Arc<dyn BlobStore> = Arc::new(FsBlobStore::from_settings(settings)?);
    let pipeline = build_pipeline(settings, store.clone())?;

    let reference = store.write(bytes, &filename, content_type).await?;
    let job = PipelineJob::new(reference, filename, database, token)?;

    pipeline.run(&job).await.map_err(|e| {
        anyhow::anyhow!("Transcription failed at the {} stage: {}", e.stage, e.error)
    })?;

    println!("Created Notion page: {}", job.page_title());
    Ok(())
}

/// List databases the token's integration can write to.
pub async fn list_databases(settings: &Settings, token: Option<String>) -> Result<()> {
    let token = resolve_token(settings, token)?;
    let client = NotionClient::from_settings(settings)?;

    client
        .verify_token(&token)
        .await
        .context("Notion rejected the access token")?;

    let databases = client.search_databases(&token).await?;
    if databases.is_empty() {
        println!("No databases are shared with this integration.");
        return Ok(());
    }

    for db in databases {
        let icon = db
            .icon
            .as_ref()
            .and_then(|i| i.emoji.as_deref())
            .unwrap_or(" ");
        let title = db.title_text();
        let title = if title.is_empty() { "(untitled)" } else { &title };
        println!("{}  {} {}", db.id, icon, title);
    }

    Ok(())
}

/// Copy of the settings with credentials masked for display.
fn redacted(settings: &Settings) -> Settings {
    let mut shown = settings.clone();
    if !shown.openai.api_key.is_empty() {
        shown.openai.api_key = "***".to_string();
    }
    if !shown.notion.token.is_empty() {
        shown.notion.token = "***".to_string();
    }
    shown
}

/// Config management commands
pub fn config_command(settings: &Settings, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let toml = toml::to_string_pretty(&redacted(settings))?;
            println!("{}", toml);
        }
        ConfigCommand::Path => {
            let path = Settings::config_path()?;
            println!("{}", path.display());
        }
        ConfigCommand::Init { force } => {
            let path = Settings::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Settings::write_default(&path)?;
            println!("Configuration initialized at: {}", path.display());
        }
        ConfigCommand::Set { key, value } => {
            // Edit the file contents only, so env credentials are never persisted
            let path = Settings::config_path()?;
            let mut file_settings = if path.exists() {
                Settings::load_from(&path)?
            } else {
                Settings::default()
            };

            file_settings.set_value(&key, &value)?;
            file_settings.save(&path)?;
            println!("Set {} = {}", key, value);
        }
    }

    Ok(())
}
