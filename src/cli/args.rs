//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// notescribe - Transcribe audio, summarize it and publish it to Notion
#[derive(Parser, Debug)]
#[command(name = "notescribe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the upload server and background pipeline workers
    Serve,

    /// Run the pipeline once for a local audio file
    Transcribe {
        /// Audio file (mp3, mp4 or mpeg)
        file: PathBuf,

        /// Notion database to create the page in
        #[arg(short, long)]
        database: String,

        /// Notion access token (defaults to notion.token / NOTESCRIBE_NOTION_TOKEN)
        #[arg(short, long)]
        token: Option<String>,
    },

    /// List Notion databases shared with a token
    Databases {
        /// Notion access token (defaults to notion.token / NOTESCRIBE_NOTION_TOKEN)
        #[arg(short, long)]
        token: Option<String>,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., worker.concurrency)
        key: String,

        /// Value to set
        value: String,
    },
}
