//! Keyword relevance scoring.
//!
//! Each whitespace-delimited word of the topic is looked up as a
//! case-insensitive substring of the article's title, description and
//! content. Hits are weighted by where they land:
//!
//! | Field | Weight |
//! |-------|--------|
//! | title | 3 |
//! | description | 2 |
//! | content | 1 |

use crate::models::Article;

const TITLE_WEIGHT: u32 = 3;
const DESCRIPTION_WEIGHT: u32 = 2;
const CONTENT_WEIGHT: u32 = 1;

/// Score how well `article` matches `topic`.
///
/// Deterministic and total: an article with empty fields, or an empty topic,
/// scores 0.
pub fn score(article: &Article, topic: &str) -> u32 {
    let title = article.title.to_lowercase();
    let description = article.description.to_lowercase();
    let content = article.content.to_lowercase();

    topic
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            let mut points = 0;
            if title.contains(word) {
                points += TITLE_WEIGHT;
            }
            if description.contains(word) {
                points += DESCRIPTION_WEIGHT;
            }
            if content.contains(word) {
                points += CONTENT_WEIGHT;
            }
            points
        })
        .sum()
}
