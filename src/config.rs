use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::validation::{InputValidator, MAX_PAGE_SIZE, MAX_SEARCH_LIMIT};

/// Prefix for environment overrides, e.g. `TWEET_SENTIMENT__COLLECTION__LIMIT`
pub const ENV_PREFIX: &str = "TWEET_SENTIMENT";

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote API access
    pub twitter: TwitterConfig,
    /// What to search for and where it lands
    pub collection: CollectionConfig,
    /// SQLite store
    pub store: StoreConfig,
    /// Scoring resources
    pub sentiment: SentimentConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// Remote search API settings; credentials have no default
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    /// OAuth consumer key
    pub consumer_key: Option<String>,
    /// OAuth consumer secret
    pub consumer_secret: Option<String>,
    /// OAuth access token
    pub access_token: Option<String>,
    /// OAuth access token secret
    pub access_token_secret: Option<String>,
    /// Base URL of the v1.1 REST API
    pub api_base_url: String,
    /// Language filter sent with every search
    pub language: String,
    /// Results requested per page (1..=100)
    pub page_size: u32,
}

/// Search terms and table naming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Terms searched in order by `run`
    pub terms: Vec<String>,
    /// Maximum results per term (at most 1000)
    pub limit: usize,
    /// Suffix of the raw table name
    pub raw_table_suffix: String,
    /// Suffix of the scored table name
    pub scored_table_suffix: String,
    /// Column that is cleaned and scored
    pub text_field: String,
}

/// Store location and failure policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite file path
    pub path: String,
    /// Abort on persistence failure instead of logging it
    pub fail_on_error: bool,
}

/// Sentiment model resources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    /// Lexicon file replacing the built-in one
    pub lexicon_path: Option<String>,
}

/// Log filter, format and optional file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level used when `RUST_LOG` is unset
    pub level: String,
    /// Daily-rotated JSON log file
    pub file_path: Option<String>,
    /// `json` or `text`
    pub format: String,
}

/// The four OAuth 1.0a credential strings
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// OAuth consumer key
    pub consumer_key: String,
    /// OAuth consumer secret
    pub consumer_secret: String,
    /// OAuth access token
    pub access_token: String,
    /// OAuth access token secret
    pub access_token_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Build credentials, rejecting any empty value
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Result<Self> {
        let credentials = Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
        };

        for (key, value) in [
            ("consumer_key", &credentials.consumer_key),
            ("consumer_secret", &credentials.consumer_secret),
            ("access_token", &credentials.access_token),
            ("access_token_secret", &credentials.access_token_secret),
        ] {
            if value.trim().is_empty() {
                return Err(missing_credential(key));
            }
        }

        Ok(credentials)
    }
}

fn missing_credential(key: &str) -> PipelineError {
    PipelineError::InvalidConfig(format!(
        "twitter.{key} is not set (set it in a config file or {ENV_PREFIX}__TWITTER__{})",
        key.to_ascii_uppercase()
    ))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            twitter: TwitterConfig {
                consumer_key: None,
                consumer_secret: None,
                access_token: None,
                access_token_secret: None,
                api_base_url: "https://api.twitter.com/1.1".to_string(),
                language: "en".to_string(),
                page_size: MAX_PAGE_SIZE,
            },
            collection: CollectionConfig {
                terms: vec!["Trump".to_string(), "Happy".to_string(), "Disgusting".to_string()],
                limit: 400,
                raw_table_suffix: "Tweets".to_string(),
                scored_table_suffix: "TweetsScored".to_string(),
                text_field: "TweetText".to_string(),
            },
            store: StoreConfig {
                path: "data/Tweets.db".to_string(),
                fail_on_error: false,
            },
            sentiment: SentimentConfig { lexicon_path: None },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration with an optional explicit file layered over the standard ones
    pub fn load_from(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            // Start with default values
            .add_source(Config::try_from(&Self::default())?)
            // Add config files if they exist
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            // Add environment variables with prefix
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("collection.terms")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| PipelineError::InvalidConfig(format!("Failed to load configuration: {e}")))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| PipelineError::InvalidConfig(format!("Failed to deserialize configuration: {e}")))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(PipelineError::InvalidConfig(message));

        // Validate twitter config
        if self.twitter.api_base_url.trim().is_empty() {
            return invalid("twitter.api_base_url must not be empty".to_string());
        }
        InputValidator::validate_language(&self.twitter.language)
            .or_else(|e| invalid(e.to_string()))?;
        InputValidator::validate_page_size(self.twitter.page_size)
            .or_else(|e| invalid(e.to_string()))?;

        // Validate collection config
        if self.collection.terms.is_empty() {
            return invalid("collection.terms must list at least one search term".to_string());
        }
        for term in &self.collection.terms {
            InputValidator::validate_search_term(term).or_else(|e| invalid(e.to_string()))?;
        }
        if self.collection.limit > MAX_SEARCH_LIMIT {
            return invalid(format!(
                "collection.limit must be <= {MAX_SEARCH_LIMIT}, got {}",
                self.collection.limit
            ));
        }
        if self.collection.raw_table_suffix == self.collection.scored_table_suffix {
            return invalid("raw and scored table suffixes must differ".to_string());
        }
        if let Err(e) = self.collection.text_field.parse::<crate::models::TextField>() {
            return invalid(e.to_string());
        }

        // Validate store config
        InputValidator::validate_store_path(Path::new(&self.store.path))
            .or_else(|e| invalid(e.to_string()))?;

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return invalid(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                self.logging.level
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return invalid(format!(
                "Invalid log format: {}. Must be one of: {valid_formats:?}",
                self.logging.format
            ));
        }

        Ok(())
    }

    /// The four credentials, or a configuration error naming the first one unset
    pub fn credentials(&self) -> Result<Credentials> {
        let twitter = &self.twitter;
        let require = |key: &str, value: &Option<String>| {
            value.clone().ok_or_else(|| missing_credential(key))
        };

        Credentials::new(
            require("consumer_key", &twitter.consumer_key)?,
            require("consumer_secret", &twitter.consumer_secret)?,
            require("access_token", &twitter.access_token)?,
            require("access_token_secret", &twitter.access_token_secret)?,
        )
    }

    /// Store path as a `PathBuf`
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.store.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.store.path, "data/Tweets.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.collection.limit, 400);
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = AppConfig::default();
        config.collection.limit = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let credentials = Credentials::new("key", "shh-consumer", "token", "shh-token").unwrap();
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("key"));
        assert!(!rendered.contains("shh-consumer"));
        assert!(!rendered.contains("shh-token"));
    }
}
