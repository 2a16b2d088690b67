//! Run orchestration.
//!
//! A full run is three stages, each usable on its own from the CLI:
//!
//! 1. **Fetch**: collect one unique article per topic, write
//!    `fetched_articles.json`
//! 2. **Summarize**: attach summaries, write `summarized_articles.json`
//! 3. **Deliver**: render the HTML newsletter and hand it to a [`Mailer`]
//!
//! Topic and article failures are absorbed inside their stage. Only
//! run-level problems come back as a [`RunError`].

use crate::api::ChatCompletion;
use crate::collector::collect;
use crate::config::Settings;
use crate::mailer::{DeliveryError, Mailer};
use crate::models::Article;
use crate::outputs::{html, json};
use crate::search::ArticleSource;
use crate::summarize::{summarize_all, SummaryBatch};
use crate::utils::subject_for;
use itertools::Itertools;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("no articles survived deduplication; nothing to summarize or send")]
    NoArticles,
    #[error("no articles to summarize; the fetched checkpoint is empty")]
    NothingToSummarize,
    #[error("checkpoint {path} failed: {reason}")]
    Checkpoint { path: String, reason: String },
    #[error("failed to send newsletter: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub articles: usize,
    pub failed_summaries: usize,
    pub elapsed: Duration,
}

async fn checkpoint(articles: &[Article], output_dir: &Path, file_name: &str) -> Result<PathBuf, RunError> {
    json::write_articles(articles, output_dir, file_name)
        .await
        .map_err(|e| RunError::Checkpoint {
            path: output_dir.join(file_name).display().to_string(),
            reason: e.to_string(),
        })
}

/// Fetch and deduplicate across all topics, then write the fetch checkpoint.
///
/// # Errors
///
/// [`RunError::NoArticles`] when every topic came back empty or duplicated.
#[instrument(level = "info", skip_all)]
pub async fn fetch_stage<S: ArticleSource>(
    source: &S,
    settings: &Settings,
    output_dir: &Path,
) -> Result<Vec<Article>, RunError> {
    let topics = &settings.topics;
    info!(topics = %topics.iter().join(", "), "Fetching news articles");

    let report = collect(source, topics, settings.articles_per_topic).await;
    for outcome in &report.topics {
        debug!(
            topic = %outcome.topic,
            candidates = outcome.candidates,
            selected = ?outcome.selected,
            "Topic outcome"
        );
    }
    let empty = report.empty_topics().collect::<Vec<_>>();
    if !empty.is_empty() {
        warn!(topics = %empty.join(", "), "Some topics contributed no article");
    }

    if report.articles.is_empty() {
        error!("No articles found. Aborting.");
        return Err(RunError::NoArticles);
    }

    checkpoint(&report.articles, output_dir, json::FETCHED_FILE).await?;
    info!(count = report.articles.len(), "Fetched unique articles");
    Ok(report.articles)
}

/// Summarize `articles` and write the summary checkpoint.
///
/// # Errors
///
/// [`RunError::NothingToSummarize`] when `articles` is empty.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn summarize_stage<C: ChatCompletion>(
    chat: &C,
    articles: Vec<Article>,
    settings: &Settings,
    output_dir: &Path,
) -> Result<SummaryBatch, RunError> {
    if articles.is_empty() {
        return Err(RunError::NothingToSummarize);
    }
    info!(model = %settings.openai_model, max_tokens = settings.max_summary_tokens, "Generating AI summaries");

    let batch = summarize_all(
        chat,
        articles,
        &settings.openai_model,
        settings.max_summary_tokens,
    )
    .await;

    checkpoint(&batch.articles, output_dir, json::SUMMARIZED_FILE).await?;

    if batch.failed() > 0 {
        warn!(
            failed = batch.failed(),
            total = batch.articles.len(),
            "Some summaries failed and carry an error message"
        );
    }
    info!(count = batch.articles.len(), "Generated summaries");
    Ok(batch)
}

/// Render the newsletter and send it.
#[instrument(level = "info", skip_all, fields(count = articles.len(), %date_label))]
pub async fn deliver_stage<M: Mailer>(
    mailer: &M,
    articles: &[Article],
    settings: &Settings,
    date_label: &str,
) -> Result<(), RunError> {
    let subject = subject_for(date_label);
    let body = html::assemble_html(articles, date_label);
    info!(%subject, bytes = body.len(), "Sending email newsletter");

    mailer
        .deliver(
            &subject,
            &body,
            &settings.sender_email,
            &settings.sender_password,
            &settings.recipient_email,
        )
        .await
        .inspect_err(|e| error!(error = %e, "Failed to send email"))?;

    info!(recipient = %settings.recipient_email, "Newsletter sent");
    Ok(())
}

/// Fetch, summarize and deliver one edition.
///
/// Checkpoints are written before delivery is attempted, so a delivery
/// failure leaves the summaries on disk.
#[instrument(level = "info", skip_all, fields(%date_label))]
pub async fn run_newsletter<S, C, M>(
    source: &S,
    chat: &C,
    mailer: &M,
    settings: &Settings,
    output_dir: &Path,
    date_label: &str,
) -> Result<RunSummary, RunError>
where
    S: ArticleSource,
    C: ChatCompletion,
    M: Mailer,
{
    let start = Instant::now();

    let articles = fetch_stage(source, settings, output_dir).await?;
    let batch = summarize_stage(chat, articles, settings, output_dir).await?;
    deliver_stage(mailer, &batch.articles, settings, date_label).await?;

    let summary = RunSummary {
        articles: batch.articles.len(),
        failed_summaries: batch.failed(),
        elapsed: start.elapsed(),
    };
    info!(
        articles = summary.articles,
        failed_summaries = summary.failed_summaries,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        "Newsletter generation complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ChatRequest, SummarizeError};
    use crate::models::RawArticle;
    use crate::utils::today;
    use std::cell::RefCell;

    struct OnePerTopic;

    impl ArticleSource for OnePerTopic {
        async fn fetch(&self, topic: &str, _max_count: usize) -> Vec<Article> {
            let mut a = Article::from_raw(
                topic,
                RawArticle {
                    title: Some(format!("News about {topic}")),
                    description: Some(format!("{topic} description")),
                    ..Default::default()
                },
            );
            a.url = format!("https://example.com/{topic}");
            vec![a]
        }
    }

    struct NothingFound;

    impl ArticleSource for NothingFound {
        async fn fetch(&self, _topic: &str, _max_count: usize) -> Vec<Article> {
            Vec::new()
        }
    }

    struct EchoChat;

    impl ChatCompletion for EchoChat {
        async fn complete(&self, request: &ChatRequest) -> Result<String, SummarizeError> {
            let prompt = &request.messages[1].content;
            let title = prompt
                .lines()
                .find_map(|l| l.strip_prefix("Title: "))
                .unwrap_or_default();
            Ok(format!(" Summary of {title}. "))
        }
    }

    #[derive(Default)]
    struct RecordingMailer {
        fail: bool,
        sent: RefCell<Vec<(String, String, String, String, String)>>,
    }

    impl Mailer for RecordingMailer {
        async fn deliver(
            &self,
            subject: &str,
            html: &str,
            from: &str,
            credential: &str,
            to: &str,
        ) -> Result<(), DeliveryError> {
            self.sent.borrow_mut().push((
                subject.to_string(),
                html.to_string(),
                from.to_string(),
                credential.to_string(),
                to.to_string(),
            ));
            if self.fail {
                Err(DeliveryError::Io(std::io::Error::other("connection reset")))
            } else {
                Ok(())
            }
        }
    }

    fn settings(topics: &[&str]) -> Settings {
        Settings {
            news_api_key: "news".to_string(),
            openai_api_key: "sk".to_string(),
            sender_email: "me@example.com".to_string(),
            sender_password: "pw".to_string(),
            recipient_email: "you@example.com".to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        let mailer = RecordingMailer::default();
        let date = today();

        let summary = run_newsletter(
            &OnePerTopic,
            &EchoChat,
            &mailer,
            &settings(&["x", "y"]),
            tmp.path(),
            &date,
        )
        .await
        .unwrap();

        assert_eq!(summary.articles, 2);
        assert_eq!(summary.failed_summaries, 0);

        let sent = mailer.sent.borrow();
        assert_eq!(sent.len(), 1);
        let (subject, body, from, credential, to) = &sent[0];
        assert!(subject.contains(&date));
        assert!(body.contains("Summary of News about x."));
        assert!(body.contains("Summary of News about y."));
        assert_eq!(from, "me@example.com");
        assert_eq!(credential, "pw");
        assert_eq!(to, "you@example.com");

        let fetched = json::read_articles(&tmp.path().join(json::FETCHED_FILE))
            .await
            .unwrap();
        assert_eq!(fetched.len(), 2);
        assert!(fetched.iter().all(|a| a.summary.is_none()));

        let summarized = json::read_articles(&tmp.path().join(json::SUMMARIZED_FILE))
            .await
            .unwrap();
        assert_eq!(summarized.len(), 2);
        assert_eq!(summarized[0].summary.as_deref(), Some("Summary of News about x."));
        assert!(summarized.iter().all(|a| !a.summary.as_deref().unwrap_or_default().is_empty()));
    }

    #[tokio::test]
    async fn test_no_articles_aborts_before_summarizing() {
        let tmp = tempfile::tempdir().unwrap();
        let mailer = RecordingMailer::default();

        let result = run_newsletter(
            &NothingFound,
            &EchoChat,
            &mailer,
            &settings(&["x", "y"]),
            tmp.path(),
            "today",
        )
        .await;

        assert!(matches!(result, Err(RunError::NoArticles)));
        assert!(mailer.sent.borrow().is_empty());
        assert!(!tmp.path().join(json::FETCHED_FILE).exists());
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_checkpoints() {
        let tmp = tempfile::tempdir().unwrap();
        let mailer = RecordingMailer {
            fail: true,
            ..Default::default()
        };

        let result = run_newsletter(
            &OnePerTopic,
            &EchoChat,
            &mailer,
            &settings(&["x"]),
            tmp.path(),
            "today",
        )
        .await;

        assert!(matches!(result, Err(RunError::Delivery(_))));
        let summarized = json::read_articles(&tmp.path().join(json::SUMMARIZED_FILE))
            .await
            .unwrap();
        assert_eq!(summarized[0].summary.as_deref(), Some("Summary of News about x."));
    }

    #[tokio::test]
    async fn test_article_topics_match_configured_topics() {
        let tmp = tempfile::tempdir().unwrap();
        let mut settings = Settings::from_yaml("topics: [\" rust \", \"open source  \"]").unwrap();
        settings.news_api_key = "news".to_string();

        let articles = fetch_stage(&OnePerTopic, &settings, tmp.path()).await.unwrap();
        assert_eq!(articles.len(), 2);
        assert!(articles.iter().all(|a| settings.topics.contains(&a.topic)));
        assert_eq!(articles[0].topic, "rust");
    }

    #[tokio::test]
    async fn test_summarize_stage_rejects_empty_input() {
        let tmp = tempfile::tempdir().unwrap();
        let result = summarize_stage(&EchoChat, Vec::new(), &settings(&["x"]), tmp.path()).await;
        match result {
            Err(e @ RunError::NothingToSummarize) => {
                assert!(e.to_string().contains("checkpoint is empty"));
                assert!(!e.to_string().contains("deduplication"));
            }
            other => panic!("expected empty-input error, got {other:?}"),
        }
        assert!(!tmp.path().join(json::SUMMARIZED_FILE).exists());
    }

    #[tokio::test]
    async fn test_checkpoint_failure_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("does-not-exist");

        let result = fetch_stage(&OnePerTopic, &settings(&["x"]), &missing).await;
        match result {
            Err(RunError::Checkpoint { path, .. }) => {
                assert!(path.ends_with("fetched_articles.json"));
            }
            other => panic!("expected checkpoint error, got {other:?}"),
        }
    }
}
