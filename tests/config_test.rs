//! Configuration defaults, validation and file layering

use std::io::Write;

use tempfile::NamedTempFile;
use tweet_sentiment::config::{AppConfig, Credentials};
use tweet_sentiment::error::PipelineError;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_default_collection_config() {
    let config = AppConfig::default();

    assert_eq!(config.collection.terms, vec!["Trump", "Happy", "Disgusting"]);
    assert_eq!(config.collection.limit, 400);
    assert_eq!(config.collection.raw_table_suffix, "Tweets");
    assert_eq!(config.collection.scored_table_suffix, "TweetsScored");
    assert_eq!(config.collection.text_field, "TweetText");
}

#[test]
fn test_default_twitter_config() {
    let config = AppConfig::default();

    assert_eq!(config.twitter.api_base_url, "https://api.twitter.com/1.1");
    assert_eq!(config.twitter.language, "en");
    assert_eq!(config.twitter.page_size, 100);
    assert!(config.twitter.consumer_key.is_none());
}

#[test]
fn test_default_store_and_logging_config() {
    let config = AppConfig::default();

    assert_eq!(config.store.path, "data/Tweets.db");
    assert!(!config.store.fail_on_error);
    assert!(config.sentiment.lexicon_path.is_none());
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, "text");
    assert_eq!(config.logging.file_path, None);
}

#[test]
fn test_config_validation_success() {
    assert!(AppConfig::default().validate().is_ok());
}

#[test]
fn test_config_validation_limit_boundary() {
    let mut config = AppConfig::default();
    config.collection.limit = 1000;
    assert!(config.validate().is_ok());

    config.collection.limit = 1001;
    assert!(matches!(config.validate(), Err(PipelineError::InvalidConfig(_))));
}

#[test]
fn test_config_validation_page_size() {
    let mut config = AppConfig::default();
    config.twitter.page_size = 0;
    assert!(config.validate().is_err());

    config.twitter.page_size = 101;
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_terms() {
    let mut config = AppConfig::default();
    config.collection.terms.clear();
    assert!(config.validate().is_err());

    config.collection.terms = vec!["ok".to_string(), " ".to_string()];
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_suffixes_and_field() {
    let mut config = AppConfig::default();
    config.collection.scored_table_suffix = "Tweets".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.collection.text_field = "Sentiment".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_logging() {
    let mut config = AppConfig::default();
    config.logging.level = "verbose".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.logging.format = "xml".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_empty_store_path() {
    let mut config = AppConfig::default();
    config.store.path = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_missing_credentials_name_the_key() {
    let mut config = AppConfig::default();
    config.twitter.consumer_key = Some("key".to_string());

    let err = config.credentials().unwrap_err();
    assert!(matches!(err, PipelineError::InvalidConfig(_)));
    assert!(err.to_string().contains("consumer_secret"));
}

#[test]
fn test_empty_credential_is_rejected() {
    let result = Credentials::new("key", "secret", "", "token-secret");
    let err = result.unwrap_err();
    assert!(err.to_string().contains("access_token"));
}

#[test]
fn test_load_from_explicit_file() {
    let file = config_file(
        r#"
[twitter]
consumer_key = "ck"
consumer_secret = "cs"
access_token = "at"
access_token_secret = "ats"

[collection]
terms = ["Rust", "Ferris"]
limit = 50

[store]
path = "out/rust.db"
fail_on_error = true
"#,
    );

    let config = AppConfig::load_from(Some(file.path())).unwrap();
    assert_eq!(config.collection.terms, vec!["Rust", "Ferris"]);
    assert_eq!(config.collection.limit, 50);
    // untouched keys keep their defaults
    assert_eq!(config.collection.raw_table_suffix, "Tweets");
    assert_eq!(config.twitter.language, "en");
    assert!(config.store.fail_on_error);

    let credentials = config.credentials().unwrap();
    assert_eq!(credentials.consumer_key, "ck");
    assert_eq!(credentials.access_token_secret, "ats");
}

#[test]
fn test_load_rejects_invalid_file_values() {
    let file = config_file("[collection]\nlimit = 5000\n");
    assert!(matches!(
        AppConfig::load_from(Some(file.path())),
        Err(PipelineError::InvalidConfig(_))
    ));
}

#[test]
fn test_load_requires_explicit_file_to_exist() {
    let result = AppConfig::load_from(Some(std::path::Path::new("/no/such/config.toml")));
    assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
}
