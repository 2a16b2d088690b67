//! Topic search against a NewsAPI-compatible `/v2/everything` endpoint.
//!
//! The fetcher issues one request per topic, normalizes the results into
//! [`Article`]s, scores them with [`relevance::score`] and ranks them
//! highest-score first. Every failure mode (bad status, network error,
//! undecodable body) is logged and turned into an empty result so a single
//! topic can never stop the run.

use crate::models::{Article, SearchResponse};
use crate::relevance;
use crate::utils::truncate_for_log;
use std::error::Error;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Default search endpoint.
pub const DEFAULT_NEWS_API_URL: &str = "https://newsapi.org/v2/everything";

/// Upper bound on a single search request.
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A provider of ranked candidate articles for a topic.
///
/// Implementations never fail: problems are logged and reported as an
/// empty list.
pub trait ArticleSource {
    /// Return at most `max_count` candidates for `topic`, best match first.
    async fn fetch(&self, topic: &str, max_count: usize) -> Vec<Article>;
}

/// HTTP client for the search service.
#[derive(Clone)]
pub struct NewsApiClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
    timeout: Duration,
}

impl NewsApiClient {
    /// Build a client for `endpoint` with the fixed [`SEARCH_TIMEOUT`].
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, Box<dyn Error>> {
        Self::with_timeout(endpoint, api_key, SEARCH_TIMEOUT)
    }

    /// Build a client whose requests give up after `timeout`.
    pub fn with_timeout(
        endpoint: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, Box<dyn Error>> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: Url::parse(endpoint)?,
            api_key: api_key.to_string(),
            timeout,
        })
    }

    fn search_url(&self, topic: &str, max_count: usize) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", topic)
            .append_pair("apiKey", &self.api_key)
            .append_pair("language", "en")
            .append_pair("sortBy", "publishedAt")
            .append_pair("pageSize", &max_count.to_string());
        url
    }
}

impl fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ArticleSource for NewsApiClient {
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, topic: &str, max_count: usize) -> Vec<Article> {
        let response = match self.http.get(self.search_url(topic, max_count)).send().await {
            Ok(r) => r,
            Err(e) => {
                // reqwest errors embed the request url, which carries the api key
                error!(error = %e.without_url(), "Network error while fetching news");
                return Vec::new();
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                error!(%status, error = %e.without_url(), "Failed reading search response body");
                return Vec::new();
            }
        };

        if !status.is_success() {
            warn!(
                %status,
                body = %truncate_for_log(&body, 500),
                "Search service returned an error status"
            );
            return Vec::new();
        }

        let payload: SearchResponse = match serde_json::from_str(&body) {
            Ok(p) => p,
            Err(e) => {
                error!(
                    error = %e,
                    body = %truncate_for_log(&body, 300),
                    "Search response was not valid JSON"
                );
                return Vec::new();
            }
        };

        let service_status = payload.status.clone().unwrap_or_default();
        let articles = rank(topic, payload);
        info!(count = articles.len(), %service_status, "Fetched candidates");
        articles
    }
}

/// Normalize and score every result for `topic`, then sort best-first.
///
/// The sort is stable so equal scores keep the order the service returned.
pub fn rank(topic: &str, payload: SearchResponse) -> Vec<Article> {
    let mut articles: Vec<Article> = payload
        .articles
        .into_iter()
        .map(|raw| {
            let mut article = Article::from_raw(topic, raw);
            article.relevance_score = relevance::score(&article, topic);
            article
        })
        .collect();

    articles.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
    debug!(
        scores = ?articles.iter().map(|a| a.relevance_score).collect::<Vec<_>>(),
        "Ranked candidates"
    );
    articles
}
