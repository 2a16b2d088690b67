//! Sequential, paced article summarization.
//!
//! Articles are sent to the chat service one at a time, in order, with a
//! fixed pause between calls to stay under the service's rate limits. A
//! failed call never aborts the batch: the article keeps its place and its
//! `summary` records what went wrong.

use crate::api::{ChatCompletion, ChatMessage, ChatRequest, SummarizeError};
use crate::models::Article;
use crate::utils::truncate_for_log;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument};

/// Pause between consecutive summarization calls.
pub const PACING_INTERVAL: Duration = Duration::from_millis(500);

/// Sampling temperature for summaries.
pub const TEMPERATURE: f32 = 0.5;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that summarizes news articles concisely and accurately.";

/// Prefix of the summary text recorded when a call fails.
pub const ERROR_PREFIX: &str = "Error summarizing article:";

/// Build the user prompt for one article.
pub fn build_prompt(article: &Article) -> String {
    format!(
        "Please provide a concise, informative summary of this news article in 2-3 sentences. \n\
         Focus on the key facts and main points.\n\n\
         Title: {}\n\n\
         Description: {}\n\n\
         Content: {}\n\n\
         Summary:",
        article.title, article.description, article.content
    )
}

/// Summarize one article; the typed outcome stays inside the batch loop.
async fn summarize_article<C: ChatCompletion>(
    client: &C,
    article: &Article,
    model: &str,
    max_tokens: u32,
) -> Result<String, SummarizeError> {
    let request = ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_prompt(article)),
        ],
        max_tokens,
        temperature: TEMPERATURE,
    };

    let text = client.complete(&request).await?;
    Ok(text.trim().to_string())
}

/// Articles with summaries attached, plus which calls failed.
#[derive(Debug, Default)]
pub struct SummaryBatch {
    pub articles: Vec<Article>,
    /// Position in `articles` and reason for every failed call.
    pub failures: Vec<(usize, String)>,
}

impl SummaryBatch {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Attach a summary to every article, preserving order and length.
///
/// # Arguments
///
/// * `client` - The chat service
/// * `articles` - Articles in the order they should appear in the digest
/// * `model` - Model name sent with every request
/// * `max_tokens` - Output token limit per summary
///
/// # Returns
///
/// The same articles, each with `summary` set either to the generated text
/// or to an `"Error summarizing article: ..."` description. Failures are
/// also listed in [`SummaryBatch::failures`].
#[instrument(level = "info", skip_all, fields(count = articles.len(), %model, max_tokens = max_tokens))]
pub async fn summarize_all<C: ChatCompletion>(
    client: &C,
    articles: Vec<Article>,
    model: &str,
    max_tokens: u32,
) -> SummaryBatch {
    let total = articles.len();
    let mut batch = SummaryBatch {
        articles: Vec::with_capacity(total),
        failures: Vec::new(),
    };

    for (i, mut article) in articles.into_iter().enumerate() {
        info!(
            index = i + 1,
            total,
            title = %truncate_for_log(&article.title, 60),
            "Summarizing article"
        );

        let summary = match summarize_article(client, &article, model, max_tokens).await {
            Ok(text) => {
                info!(index = i + 1, chars = text.chars().count(), "Summary generated");
                text
            }
            Err(e) => {
                error!(index = i + 1, url = %article.url, error = %e, "Summarization failed");
                batch.failures.push((i, e.to_string()));
                format!("{ERROR_PREFIX} {e}")
            }
        };
        article.summary = Some(summary);
        batch.articles.push(article);

        if i + 1 < total {
            sleep(PACING_INTERVAL).await;
        }
    }

    batch
}
