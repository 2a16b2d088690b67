//! Data models for news articles and the raw search payload they come from.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: A normalized, scored article that flows through the pipeline
//! - [`SearchResponse`], [`RawArticle`], [`RawSource`]: The search service's
//!   JSON payload, with every field optional
//!
//! The raw types use camelCase field names to match the search API, while
//! [`Article`] is written to the checkpoint files in snake_case.

use serde::{Deserialize, Serialize};

/// Placeholder used when the search service omits an article title.
pub const NO_TITLE: &str = "No title";
/// Placeholder used when the search service omits an article description.
pub const NO_DESCRIPTION: &str = "No description";
/// Placeholder used when the search service omits the publisher name.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// A news article as it moves through the fetch, dedup and summarize stages.
///
/// Articles are created by the fetcher from a [`RawArticle`], scored against
/// the topic that produced them, and later enriched with a `summary`.
///
/// # Summary States
///
/// - `None`: summarization has not run yet
/// - `Some(text)`: either the model's summary or an
///   `"Error summarizing article: ..."` description when the call failed
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// The configured topic whose query produced this article.
    pub topic: String,
    /// The article headline.
    pub title: String,
    /// The short description supplied by the search service.
    pub description: String,
    /// Canonical link to the story; the deduplication key.
    pub url: String,
    /// The (usually truncated) body text supplied by the search service.
    pub content: String,
    /// Publication timestamp, ISO-8601 or empty.
    pub published_at: String,
    /// Publisher display name.
    #[serde(rename = "source")]
    pub source_name: String,
    /// Heuristic match between the article text and its topic.
    #[serde(default)]
    pub relevance_score: u32,
    /// Generated summary, or an error description when summarization failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Article {
    /// Normalize a raw search result into an unscored [`Article`].
    ///
    /// Missing and `null` fields are replaced with the same defaults.
    pub fn from_raw(topic: &str, raw: RawArticle) -> Self {
        Self {
            topic: topic.to_string(),
            title: raw.title.unwrap_or_else(|| NO_TITLE.to_string()),
            description: raw
                .description
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            url: raw.url.unwrap_or_default(),
            content: raw.content.unwrap_or_default(),
            published_at: raw.published_at.unwrap_or_default(),
            source_name: raw
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            relevance_score: 0,
            summary: None,
        }
    }
}

/// Top-level body returned by the search service.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    /// `"ok"` or `"error"`; informational only, the HTTP status decides.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub articles: Vec<RawArticle>,
}

/// One search result exactly as the service sends it.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub content: Option<String>,
    pub published_at: Option<String>,
    pub source: Option<RawSource>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawSource {
    pub name: Option<String>,
}
