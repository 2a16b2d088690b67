//! Run configuration.
//!
//! Settings are read from a YAML file (by default `config.yaml` in the
//! working directory). Every non-secret field has a default, so a file is
//! optional when the secrets arrive through the environment. Secrets passed
//! on the command line or through the environment win over the file.
//!
//! Validation is eager and exhaustive: [`Settings::validate`] reports every
//! missing or placeholder setting at once, before any network activity.
//!
//! # Example
//!
//! ```yaml
//! news_api_key: "..."
//! openai_api_key: "..."
//! sender_email: "me@gmail.com"
//! sender_password: "app-password"
//! recipient_email: "me@gmail.com"
//! topics:
//!   - artificial intelligence
//!   - space exploration
//! articles_per_topic: 3
//! ```

use crate::api::DEFAULT_OPENAI_API_BASE;
use crate::mailer::{DEFAULT_SMTP_PORT, DEFAULT_SMTP_SERVER};
use crate::search::DEFAULT_NEWS_API_URL;
use itertools::Itertools;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

/// Values shipped in `config.example.yaml`; treated as unset.
const PLACEHOLDERS: &[&str] = &[
    "your_newsapi_key_here",
    "your_openai_api_key_here",
    "your_email@gmail.com",
    "your_16_char_app_password",
    "recipient@gmail.com",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("configuration is incomplete:\n  - {}", problems.iter().join("\n  - "))]
    Invalid { problems: Vec<String> },
}

/// What a command is about to do, and therefore which settings it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Query the search service.
    Search,
    /// Call the chat-completion service.
    Summaries,
    /// Send the newsletter by email.
    Delivery,
}

/// All settings for one run.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub news_api_key: String,
    pub openai_api_key: String,
    pub sender_email: String,
    pub sender_password: String,
    pub recipient_email: String,
    /// Topics, searched in this order.
    pub topics: Vec<String>,
    /// Candidates requested per topic; one survives deduplication.
    pub articles_per_topic: usize,
    pub openai_model: String,
    /// Output token limit per summary (150 is roughly 2-3 sentences).
    pub max_summary_tokens: u32,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub news_api_url: String,
    pub openai_api_base: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            news_api_key: String::new(),
            openai_api_key: String::new(),
            sender_email: String::new(),
            sender_password: String::new(),
            recipient_email: String::new(),
            topics: [
                "artificial intelligence",
                "technology",
                "space exploration",
                "climate change",
                "cybersecurity",
            ]
            .iter()
            .map(|t| t.to_string())
            .collect(),
            articles_per_topic: 3,
            openai_model: "gpt-4o-mini".to_string(),
            max_summary_tokens: 150,
            smtp_server: DEFAULT_SMTP_SERVER.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            news_api_url: DEFAULT_NEWS_API_URL.to_string(),
            openai_api_base: DEFAULT_OPENAI_API_BASE.to_string(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(s: &str) -> &'static str {
            if s.is_empty() { "<unset>" } else { "<redacted>" }
        }
        f.debug_struct("Settings")
            .field("news_api_key", &mask(&self.news_api_key))
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("sender_email", &self.sender_email)
            .field("sender_password", &mask(&self.sender_password))
            .field("recipient_email", &self.recipient_email)
            .field("topics", &self.topics)
            .field("articles_per_topic", &self.articles_per_topic)
            .field("openai_model", &self.openai_model)
            .field("max_summary_tokens", &self.max_summary_tokens)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("news_api_url", &self.news_api_url)
            .field("openai_api_base", &self.openai_api_base)
            .finish()
    }
}

/// Secret values supplied outside the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub news_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub sender_email: Option<String>,
    pub sender_password: Option<String>,
    pub recipient_email: Option<String>,
}

fn is_unset(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || PLACEHOLDERS.contains(&value)
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when it does not exist.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config file found; using defaults and environment");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(topics = settings.topics.len(), "Loaded configuration");
        Ok(settings)
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not a map.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut settings: Self = serde_yaml::from_str(text)?;
        settings.normalize_topics();
        Ok(settings)
    }

    /// Replace file values with any non-empty override.
    pub fn apply(&mut self, overrides: Overrides) {
        let pairs = [
            (&mut self.news_api_key, overrides.news_api_key),
            (&mut self.openai_api_key, overrides.openai_api_key),
            (&mut self.sender_email, overrides.sender_email),
            (&mut self.sender_password, overrides.sender_password),
            (&mut self.recipient_email, overrides.recipient_email),
        ];
        for (slot, value) in pairs {
            if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                *slot = v;
            }
        }
    }

    /// Check every setting `needs` calls for and report all problems together.
    pub fn validate(&self, needs: &[Requirement]) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if needs.contains(&Requirement::Search) {
            if is_unset(&self.news_api_key) {
                problems.push("NewsAPI key not set (news_api_key / NEWS_API_KEY)".to_string());
            }
            if self.topics.iter().all(|t| t.trim().is_empty()) {
                problems.push("no topics configured (topics)".to_string());
            }
            if self.articles_per_topic == 0 {
                problems.push("articles_per_topic must be at least 1".to_string());
            }
        }

        if needs.contains(&Requirement::Summaries) {
            if is_unset(&self.openai_api_key) {
                problems.push("OpenAI API key not set (openai_api_key / OPENAI_API_KEY)".to_string());
            }
            if self.openai_model.trim().is_empty() {
                problems.push("OpenAI model not set (openai_model)".to_string());
            }
            if self.max_summary_tokens == 0 {
                problems.push("max_summary_tokens must be at least 1".to_string());
            }
        }

        if needs.contains(&Requirement::Delivery) {
            if is_unset(&self.sender_email) {
                problems.push("Sender email not set (sender_email / SENDER_EMAIL)".to_string());
            }
            if is_unset(&self.sender_password) {
                problems.push("Sender app password not set (sender_password / SENDER_PASSWORD)".to_string());
            }
            if is_unset(&self.recipient_email) {
                problems.push("Recipient email not set (recipient_email / RECIPIENT_EMAIL)".to_string());
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid { problems })
        }
    }

    /// Trim every topic and drop blank entries, so article topics match
    /// the stored configuration exactly.
    fn normalize_topics(&mut self) {
        self.topics = self
            .topics
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[Requirement] = &[
        Requirement::Search,
        Requirement::Summaries,
        Requirement::Delivery,
    ];

    fn complete() -> Settings {
        Settings {
            news_api_key: "news".to_string(),
            openai_api_key: "sk-test".to_string(),
            sender_email: "me@example.com".to_string(),
            sender_password: "pw".to_string(),
            recipient_email: "you@example.com".to_string(),
            ..Settings::default()
        }
    }

    fn problems(result: Result<(), ConfigError>) -> Vec<String> {
        match result {
            Err(ConfigError::Invalid { problems }) => problems,
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.topics.len(), 5);
        assert_eq!(settings.articles_per_topic, 3);
        assert_eq!(settings.openai_model, "gpt-4o-mini");
        assert_eq!(settings.max_summary_tokens, 150);
        assert_eq!(settings.smtp_server, "smtp.gmail.com");
        assert_eq!(settings.smtp_port, 587);
    }

    #[test]
    fn test_complete_settings_validate() {
        assert!(complete().validate(ALL).is_ok());
    }

    #[test]
    fn test_all_missing_reported_together() {
        let found = problems(Settings::default().validate(ALL));
        assert_eq!(found.len(), 5);
        assert!(found[0].contains("NewsAPI"));
        assert!(found[1].contains("OpenAI"));
        assert!(found[2].contains("Sender email"));
        assert!(found[3].contains("password"));
        assert!(found[4].contains("Recipient"));
    }

    #[test]
    fn test_placeholders_count_as_missing() {
        let settings = Settings {
            news_api_key: "your_newsapi_key_here".to_string(),
            recipient_email: "recipient@gmail.com".to_string(),
            ..complete()
        };
        let found = problems(settings.validate(ALL));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_requirements_scope_validation() {
        let settings = Settings {
            news_api_key: "news".to_string(),
            ..Settings::default()
        };
        assert!(settings.validate(&[Requirement::Search]).is_ok());
        assert_eq!(problems(settings.validate(&[Requirement::Summaries])).len(), 1);
    }

    #[test]
    fn test_empty_topics_rejected() {
        let settings = Settings {
            topics: vec!["  ".to_string()],
            articles_per_topic: 0,
            ..complete()
        };
        let found = problems(settings.validate(&[Requirement::Search]));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_invalid_message_lists_everything() {
        let err = Settings::default().validate(ALL).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("configuration is incomplete:"));
        assert_eq!(msg.matches("\n  - ").count(), 5);
    }

    #[test]
    fn test_from_yaml_partial() {
        let yaml = r#"
news_api_key: abc
topics:
  - rust
  - "open source"
articles_per_topic: 5
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.news_api_key, "abc");
        assert_eq!(settings.topics, vec!["rust", "open source"]);
        assert_eq!(settings.articles_per_topic, 5);
        assert_eq!(settings.openai_model, "gpt-4o-mini");
    }

    #[test]
    fn test_topics_are_normalized_on_load() {
        let yaml = r#"
topics:
  - " rust "
  - ""
  - "   "
  - "open source"
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.topics, vec!["rust", "open source"]);
    }

    #[test]
    fn test_blank_topic_list_fails_validation_after_load() {
        let mut settings = Settings::from_yaml("topics: [\"  \", \"\"]").unwrap();
        assert!(settings.topics.is_empty());

        settings.apply(Overrides {
            news_api_key: Some("news".to_string()),
            ..Overrides::default()
        });
        let found = problems(settings.validate(&[Requirement::Search]));
        assert_eq!(found, vec!["no topics configured (topics)".to_string()]);
    }

    #[test]
    fn test_from_yaml_empty_document() {
        let settings = Settings::from_yaml("   \n").unwrap();
        assert_eq!(settings.articles_per_topic, 3);
    }

    #[test]
    fn test_overrides_win() {
        let mut settings = Settings {
            news_api_key: "from-file".to_string(),
            openai_api_key: "file-openai".to_string(),
            ..Settings::default()
        };
        settings.apply(Overrides {
            news_api_key: Some("from-env".to_string()),
            openai_api_key: Some("   ".to_string()),
            ..Overrides::default()
        });
        assert_eq!(settings.news_api_key, "from-env");
        assert_eq!(settings.openai_api_key, "file-openai");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings::load(&tmp.path().join("config.yaml")).unwrap();
        assert_eq!(settings.topics.len(), 5);
    }

    #[test]
    fn test_load_rejects_bad_yaml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "topics: [unclosed").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let dbg = format!("{:?}", complete());
        assert!(!dbg.contains("sk-test"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn test_load_stores_trimmed_topics() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "topics:\n  - \" rust \"\n  - \"\"\n  - go\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.topics, vec!["rust", "go"]);
    }
}
