//! Tweet Sentiment - search collection, lexicon scoring and SQLite persistence
//!
//! A Rust library that searches a remote tweet API for a list of terms,
//! scores each result's sentiment with a rule-based lexicon model, and appends
//! both the raw and the scored batches to tables in a local SQLite file.
//!
//! # Features
//!
//! - OAuth 1.0a signed search with paginated, lazy cursors
//! - VADER-style polarity scores with a fixed Positive/Neutral/Negative rule
//! - Schema-on-write, append-only SQLite tables
//! - Layered configuration and structured logging

/// Remote search seam and paginated cursor
pub mod collector;
/// Configuration management
pub mod config;
/// Table store
pub mod db;
/// Error types
pub mod error;
/// Sentiment lexicon and word lists
pub mod lexicon;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Sentiment scoring
pub mod nlp;
/// OAuth 1.0a request signing
pub mod oauth;
/// Table layout definitions
pub mod schema;
/// Collection run over search terms
pub mod service;
/// Twitter REST client
pub mod twitter;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use collector::{Collector, SearchApi, SearchCursor, SearchSettings};
pub use config::{AppConfig, Credentials};
pub use db::{Store, TableRow};
pub use error::{PipelineError, Result};
pub use models::{Batch, PolarityScores, ScoredRecord, SearchRecord, SentimentLabel, TextField};
pub use nlp::{SentimentAnalyzer, SentimentScorer};
pub use service::{CollectionService, TermReport};
pub use twitter::TwitterClient;
