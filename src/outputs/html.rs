//! HTML newsletter assembly.
//!
//! Produces a single self-contained document. All styling is inline, with no
//! `<style>` block or external sheet. Every piece of article text is escaped
//! before it is written.
//!
//! # Layout
//!
//! - Header with the digest date and the topics covered
//! - One card per article: topic badge, linked title, source and date line,
//!   summary, "Read more" link
//! - Footer with the article count

use crate::models::Article;
use itertools::Itertools;
use std::fmt;

const FONT: &str = "font-family: -apple-system, 'Segoe UI', Helvetica, Arial, sans-serif;";

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Only http(s) links are rendered as links; anything else becomes `#`.
fn safe_href(url: &str) -> String {
    let lower = url.trim().to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        escape_html(url.trim())
    } else {
        "#".to_string()
    }
}

/// The calendar part of an ISO-8601 timestamp, e.g. `2025-05-06`.
fn published_day(published_at: &str) -> &str {
    published_at.split('T').next().unwrap_or_default()
}

/// Render the newsletter for `articles`, dated `date_label`.
///
/// Articles without a summary fall back to their description.
pub fn assemble_html(articles: &[Article], date_label: &str) -> String {
    Newsletter {
        articles,
        date_label,
    }
    .to_string()
}

struct Newsletter<'a> {
    articles: &'a [Article],
    date_label: &'a str,
}

impl fmt::Display for Newsletter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = escape_html(self.date_label);
        let topics = self
            .articles
            .iter()
            .map(|a| a.topic.as_str())
            .unique()
            .join(" · ");

        writeln!(f, "<!DOCTYPE html>")?;
        writeln!(f, "<html lang=\"en\">")?;
        writeln!(f, "<head>")?;
        writeln!(f, "<meta charset=\"utf-8\">")?;
        writeln!(
            f,
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">"
        )?;
        writeln!(f, "<title>Daily News Digest - {date}</title>")?;
        writeln!(f, "</head>")?;
        writeln!(f, "<body style=\"margin: 0; padding: 0; background: #f4f5f7; {FONT}\">")?;
        writeln!(
            f,
            "<div style=\"max-width: 640px; margin: 0 auto; padding: 24px;\">"
        )?;

        writeln!(
            f,
            "<div style=\"background: #1f2937; color: #ffffff; padding: 24px; border-radius: 8px 8px 0 0;\">"
        )?;
        writeln!(
            f,
            "<h1 style=\"margin: 0; font-size: 24px;\">📰 Your Daily News Digest</h1>"
        )?;
        writeln!(f, "<p style=\"margin: 8px 0 0; color: #d1d5db;\">{date}</p>")?;
        if !topics.is_empty() {
            writeln!(
                f,
                "<p style=\"margin: 4px 0 0; color: #9ca3af; font-size: 13px;\">{}</p>",
                escape_html(&topics)
            )?;
        }
        writeln!(f, "</div>")?;

        for article in self.articles {
            write_card(f, article)?;
        }

        let count = self.articles.len();
        writeln!(
            f,
            "<p style=\"color: #6b7280; font-size: 12px; text-align: center; padding: 16px;\">{count} {} · summaries are AI-generated and may contain mistakes.</p>",
            if count == 1 { "article" } else { "articles" }
        )?;
        writeln!(f, "</div>")?;
        writeln!(f, "</body>")?;
        writeln!(f, "</html>")
    }
}

fn write_card(f: &mut fmt::Formatter<'_>, article: &Article) -> fmt::Result {
    let href = safe_href(&article.url);
    let body = article
        .summary
        .as_deref()
        .unwrap_or(article.description.as_str());

    writeln!(
        f,
        "<div style=\"background: #ffffff; padding: 20px 24px; border-bottom: 1px solid #e5e7eb;\">"
    )?;
    writeln!(
        f,
        "<span style=\"display: inline-block; background: #e0e7ff; color: #3730a3; font-size: 11px; font-weight: bold; text-transform: uppercase; padding: 2px 8px; border-radius: 4px;\">{}</span>",
        escape_html(&article.topic)
    )?;
    writeln!(
        f,
        "<h2 style=\"margin: 10px 0 4px; font-size: 18px;\"><a href=\"{href}\" style=\"color: #111827; text-decoration: none;\">{}</a></h2>",
        escape_html(&article.title)
    )?;

    let day = published_day(&article.published_at);
    let meta = if day.is_empty() {
        escape_html(&article.source_name)
    } else {
        format!("{} · {}", escape_html(&article.source_name), escape_html(day))
    };
    writeln!(
        f,
        "<p style=\"margin: 0 0 12px; color: #6b7280; font-size: 13px;\">{meta}</p>"
    )?;
    writeln!(
        f,
        "<p style=\"margin: 0 0 12px; color: #374151; line-height: 1.5;\">{}</p>",
        escape_html(body)
    )?;
    writeln!(
        f,
        "<a href=\"{href}\" style=\"color: #4f46e5; font-size: 14px;\">Read more →</a>"
    )?;
    writeln!(f, "</div>")
}
