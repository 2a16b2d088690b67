//! Command-line interface definitions for News Digest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Secrets can be provided via command-line flags or environment variables,
//! and take precedence over the config file.

use crate::config::{Overrides, Requirement};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the News Digest application.
///
/// # Examples
///
/// ```sh
/// # Full run: fetch, summarize, email
/// news_digest run
///
/// # Render the newsletter to ./output/newsletter.html instead of sending it
/// news_digest run --dry-run
///
/// # Only fetch and deduplicate, then inspect ./output/fetched_articles.json
/// news_digest fetch
///
/// # Summarize a previously fetched checkpoint
/// news_digest summarize
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Directory for checkpoint files and dry-run output
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Directory for newsletter.log
    #[arg(short, long, default_value = ".")]
    pub log_dir: PathBuf,

    /// NewsAPI key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub news_api_key: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Sender address, also the SMTP username
    #[arg(long, env = "SENDER_EMAIL")]
    pub sender_email: Option<String>,

    /// SMTP app password for the sender
    #[arg(long, env = "SENDER_PASSWORD", hide_env_values = true)]
    pub sender_password: Option<String>,

    /// Newsletter recipient
    #[arg(long, env = "RECIPIENT_EMAIL")]
    pub recipient_email: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch, summarize and email the digest
    Run {
        /// Write newsletter.html to the output directory instead of sending
        #[arg(long)]
        dry_run: bool,
    },
    /// Fetch and deduplicate articles, then write fetched_articles.json
    Fetch,
    /// Summarize fetched_articles.json into summarized_articles.json
    Summarize,
}

impl Command {
    /// Settings this command cannot run without.
    pub fn requirements(&self) -> &'static [Requirement] {
        match self {
            Command::Run { dry_run: false } => &[
                Requirement::Search,
                Requirement::Summaries,
                Requirement::Delivery,
            ],
            Command::Run { dry_run: true } => &[Requirement::Search, Requirement::Summaries],
            Command::Fetch => &[Requirement::Search],
            Command::Summarize => &[Requirement::Summaries],
        }
    }
}

impl Cli {
    /// Secrets supplied through flags or the environment.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            news_api_key: self.news_api_key.clone(),
            openai_api_key: self.openai_api_key.clone(),
            sender_email: self.sender_email.clone(),
            sender_password: self.sender_password.clone(),
            recipient_email: self.recipient_email.clone(),
        }
    }
}
