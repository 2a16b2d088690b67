//! JSON checkpoint artifacts.
//!
//! After deduplication and again after summarization the article list is
//! written to the output directory as a pretty-printed UTF-8 JSON array:
//!
//! ```text
//! output_dir/
//! ├── fetched_articles.json     # after fetch + dedup
//! ├── summarized_articles.json  # after summarization
//! └── newsletter.html           # dry runs only
//! ```
//!
//! Files are overwritten on every run; there is no history.

use crate::models::Article;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Checkpoint written after fetch and dedup.
pub const FETCHED_FILE: &str = "fetched_articles.json";
/// Checkpoint written after summarization.
pub const SUMMARIZED_FILE: &str = "summarized_articles.json";

/// Write `articles` to `{output_dir}/{file_name}`, replacing any previous run.
///
/// # Returns
///
/// The path that was written.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), %file_name))]
pub async fn write_articles(
    articles: &[Article],
    output_dir: &Path,
    file_name: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(articles)?;
    let path = output_dir.join(file_name);

    fs::write(&path, json).await?;
    info!(path = %path.display(), count = articles.len(), "Wrote checkpoint");
    Ok(path)
}

/// Read a checkpoint previously written by [`write_articles`].
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_articles(path: &Path) -> Result<Vec<Article>, Box<dyn Error>> {
    let json = fs::read_to_string(path).await?;
    let articles: Vec<Article> = serde_json::from_str(&json)?;
    info!(count = articles.len(), "Loaded checkpoint");
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawArticle;

    fn sample() -> Vec<Article> {
        let mut first = Article::from_raw(
            "space exploration",
            RawArticle {
                title: Some("Über-rocket launches".to_string()),
                url: Some("https://example.com/rocket".to_string()),
                ..Default::default()
            },
        );
        first.relevance_score = 3;
        first.summary = Some("A rocket launched.".to_string());

        let second = Article::from_raw("climate change", RawArticle::default());
        vec![first, second]
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let tmp = tempfile::tempdir().unwrap();
        let articles = sample();

        let path = write_articles(&articles, tmp.path(), SUMMARIZED_FILE)
            .await
            .unwrap();
        assert_eq!(path, tmp.path().join("summarized_articles.json"));

        let loaded = read_articles(&path).await.unwrap();
        assert_eq!(loaded, articles);
    }

    #[tokio::test]
    async fn test_output_is_pretty_utf8() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_articles(&sample(), tmp.path(), FETCHED_FILE)
            .await
            .unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("[\n  {"));
        assert!(text.contains("Über-rocket launches"));
        assert!(text.contains("\"source\": \"Unknown\""));
    }

    #[tokio::test]
    async fn test_overwrites_previous_run() {
        let tmp = tempfile::tempdir().unwrap();
        write_articles(&sample(), tmp.path(), FETCHED_FILE)
            .await
            .unwrap();
        let path = write_articles(&[], tmp.path(), FETCHED_FILE).await.unwrap();

        assert!(read_articles(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(read_articles(&tmp.path().join("nope.json")).await.is_err());
    }
}
