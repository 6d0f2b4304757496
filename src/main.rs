//! notescribe - Audio transcription to Notion
//!
//! Entry point for the notescribe CLI application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use notescribe::cli::{Cli, Commands};
use notescribe::config::Settings;

fn init_logging(default_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Completions { shell } => {
            notescribe::cli::completions::print(shell);
        }
        command => {
            // Load configuration only for runtime commands.
            let settings = Settings::load()?;

            let level = if cli.verbose {
                "debug"
            } else {
                settings.general.log_level.as_str()
            };
            init_logging(level);

            // Execute command
            match command {
                Commands::Serve => {
                    notescribe::cli::commands::run_server(&settings).await?;
                }
                Commands::Transcribe {
                    file,
                    database,
                    token,
                } => {
                    notescribe::cli::commands::transcribe_file(&settings, &file, &database, token)
                        .await?;
                }
                Commands::Databases { token } => {
                    notescribe::cli::commands::list_databases(&settings, token).await?;
                }
                Commands::Config(config_cmd) => {
                    notescribe::cli::commands::config_command(&settings, config_cmd)?;
                }
                Commands::Completions { .. } => unreachable!(),
            }
        }
    }

    Ok(())
}
