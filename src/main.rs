//! # News Digest
//!
//! A single-run newsletter pipeline: it searches a news API for each
//! configured topic, keeps one unique article per topic, summarizes every
//! article through an OpenAI-compatible chat API, and emails the result as
//! an HTML newsletter.
//!
//! ## Usage
//!
//! ```sh
//! news_digest run              # fetch, summarize, email
//! news_digest run --dry-run    # write output/newsletter.html instead of sending
//! news_digest fetch            # fetch + dedup only
//! news_digest summarize        # summarize output/fetched_articles.json
//! ```
//!
//! ## Architecture
//!
//! The application follows a linear pipeline, run once per invocation
//! (e.g. from cron):
//! 1. **Validation**: Every required setting is checked before any network call
//! 2. **Fetching**: One search per topic, scored and ranked by relevance
//! 3. **Deduplication**: The first unseen url per topic is kept
//! 4. **Summarization**: Sequential chat calls with a fixed pause between them
//! 5. **Delivery**: HTML newsletter over authenticated SMTP
//!
//! Checkpoints are written after steps 3 and 4. Progress goes to the
//! console and to `newsletter.log`.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info, instrument};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod cli;
mod collector;
mod config;
mod mailer;
mod models;
mod outputs;
mod pipeline;
mod relevance;
mod search;
mod summarize;
mod utils;

use api::OpenAiClient;
use cli::{Cli, Command};
use config::Settings;
use mailer::{PreviewMailer, SmtpMailer};
use outputs::json;
use pipeline::{fetch_stage, run_newsletter, summarize_stage};
use search::NewsApiClient;
use utils::{ensure_writable_dir, today};

const LOG_FILE: &str = "newsletter.log";

/// Console plus `newsletter.log`; the guard flushes the file on drop.
fn init_tracing(log_dir: &Path) -> Result<WorkerGuard, Box<dyn Error>> {
    std::fs::create_dir_all(log_dir)?;
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, LOG_FILE));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tfmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .with_timer(UtcTime::rfc_3339()),
        )
        .with(
            tfmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(file_writer)
                .with_timer(UtcTime::rfc_3339()),
        )
        .try_init()?;

    Ok(guard)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    let _guard = match init_tracing(&args.log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging in {}: {e}", args.log_dir.display());
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(()) => {
            info!("✅ Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "❌ Run failed. Check the logs above.");
            ExitCode::FAILURE
        }
    }
}

#[instrument(level = "info", skip_all, fields(command = ?args.command))]
async fn run(args: Cli) -> Result<(), Box<dyn Error>> {
    let date_label = today();
    info!(date = %date_label, "News digest starting up");

    let mut settings = Settings::load(&args.config)?;
    settings.apply(args.overrides());
    if let Err(e) = settings.validate(args.command.requirements()) {
        error!(config = %args.config.display(), "Please fix the configuration errors below");
        return Err(e.into());
    }

    ensure_writable_dir(&args.output_dir).await?;

    match args.command {
        Command::Run { dry_run } => {
            let source = NewsApiClient::new(&settings.news_api_url, &settings.news_api_key)?;
            let chat = OpenAiClient::new(&settings.openai_api_base, &settings.openai_api_key)?;

            let summary = if dry_run {
                let mailer = PreviewMailer {
                    path: args.output_dir.join("newsletter.html"),
                };
                run_newsletter(&source, &chat, &mailer, &settings, &args.output_dir, &date_label)
                    .await?
            } else {
                let mailer = SmtpMailer::new(&settings.smtp_server, settings.smtp_port);
                run_newsletter(&source, &chat, &mailer, &settings, &args.output_dir, &date_label)
                    .await?
            };
            info!(
                articles = summary.articles,
                failed_summaries = summary.failed_summaries,
                "Newsletter successfully generated"
            );
        }
        Command::Fetch => {
            let source = NewsApiClient::new(&settings.news_api_url, &settings.news_api_key)?;
            let articles = fetch_stage(&source, &settings, &args.output_dir).await?;
            for (i, article) in articles.iter().enumerate() {
                info!(
                    index = i + 1,
                    topic = %article.topic,
                    title = %article.title,
                    source = %article.source_name,
                    published = %article.published_at,
                    url = %article.url,
                    score = article.relevance_score,
                    "Fetched article"
                );
            }
        }
        Command::Summarize => {
            let chat = OpenAiClient::new(&settings.openai_api_base, &settings.openai_api_key)?;
            let articles = json::read_articles(&args.output_dir.join(json::FETCHED_FILE)).await?;
            let batch = summarize_stage(&chat, articles, &settings, &args.output_dir).await?;
            for (i, article) in batch.articles.iter().enumerate() {
                info!(
                    index = i + 1,
                    topic = %article.topic,
                    title = %article.title,
                    summary = %article.summary.as_deref().unwrap_or_default(),
                    "Summarized article"
                );
            }
            info!(
                articles = batch.articles.len(),
                failed_summaries = batch.failed(),
                "Summaries written"
            );
        }
    }

    Ok(())
}
