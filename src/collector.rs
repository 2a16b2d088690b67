//! Cross-topic collection with url deduplication.
//!
//! Topics are visited in configured order and each contributes at most one
//! article: the highest-ranked candidate whose url has not already been
//! picked for an earlier topic. This favours breadth across topics over
//! depth within one, and keeps overlapping topics (e.g. "technology" and
//! "artificial intelligence") from filling the digest with the same story.

use crate::models::Article;
use crate::search::ArticleSource;
use std::collections::HashSet;
use tracing::{info, instrument, warn};

/// What a single topic contributed to the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicOutcome {
    pub topic: String,
    /// Number of candidates the source returned.
    pub candidates: usize,
    /// Url of the selected article, if any candidate was unseen.
    pub selected: Option<String>,
}

/// Result of [`collect`]: the selected articles plus per-topic accounting.
#[derive(Debug, Default)]
pub struct CollectReport {
    pub articles: Vec<Article>,
    pub topics: Vec<TopicOutcome>,
}

impl CollectReport {
    /// Topics that ended up contributing nothing.
    pub fn empty_topics(&self) -> impl Iterator<Item = &str> {
        self.topics
            .iter()
            .filter(|t| t.selected.is_none())
            .map(|t| t.topic.as_str())
    }
}

/// Fetch every topic from `source` and keep the first unseen article of each.
///
/// The returned articles are globally unique by url. The empty url is an
/// ordinary key, so only the first empty-url article survives.
#[instrument(level = "info", skip_all, fields(topics = topics.len(), per_topic_count = per_topic_count))]
pub async fn collect<S: ArticleSource>(
    source: &S,
    topics: &[String],
    per_topic_count: usize,
) -> CollectReport {
    let mut seen: HashSet<String> = HashSet::new();
    let mut report = CollectReport::default();

    for topic in topics {
        info!(%topic, "Fetching topic");
        let candidates = source.fetch(topic, per_topic_count).await;
        let fetched = candidates.len();

        let pick = candidates
            .into_iter()
            .find(|candidate| !seen.contains(&candidate.url));

        let selected = match pick {
            Some(article) => {
                info!(
                    %topic,
                    url = %article.url,
                    score = article.relevance_score,
                    "Selected article for topic"
                );
                seen.insert(article.url.clone());
                let url = article.url.clone();
                report.articles.push(article);
                Some(url)
            }
            None => {
                warn!(%topic, candidates = fetched, "No unique article for topic");
                None
            }
        };

        report.topics.push(TopicOutcome {
            topic: topic.clone(),
            candidates: fetched,
            selected,
        });
    }

    info!(count = report.articles.len(), "Collected unique articles");
    report
}
