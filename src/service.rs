use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};

use crate::collector::Collector;
use crate::config::AppConfig;
use crate::db::{Store, TableRow};
use crate::error::{PipelineError, Result};
use crate::logging::OperationTimer;
use crate::metrics::PipelineMetrics;
use crate::models::{Batch, SentimentLabel, TextField};
use crate::nlp::SentimentScorer;
use crate::validation::InputValidator;

/// Per-run parameters of the collection loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Maximum results per term
    pub limit: usize,
    /// Appended to the term stem to name the raw table
    pub raw_table_suffix: String,
    /// Appended to the term stem to name the scored table
    pub scored_table_suffix: String,
    /// Field cleaned and scored
    pub text_field: TextField,
    /// Abort the run on the first persistence failure instead of logging it
    pub fail_on_error: bool,
}

impl ServiceSettings {
    /// Settings from the `collection` and `store` sections
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            limit: config.collection.limit,
            raw_table_suffix: config.collection.raw_table_suffix.clone(),
            scored_table_suffix: config.collection.scored_table_suffix.clone(),
            text_field: config.collection.text_field.parse()?,
            fail_on_error: config.store.fail_on_error,
        })
    }
}

/// What happened to one search term
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermReport {
    /// Search term as given
    pub term: String,
    /// Table holding the raw batch
    pub raw_table: String,
    /// Table holding the scored batch
    pub scored_table: String,
    /// Records returned by the search
    pub fetched: usize,
    /// Rows written to the raw table, `None` if the batch was dropped
    pub raw_rows: Option<usize>,
    /// Rows written to the scored table, `None` if the batch was dropped
    pub scored_rows: Option<usize>,
    /// Records labelled Positive
    pub positive: usize,
    /// Records labelled Neutral/Unsure
    pub neutral: usize,
    /// Records labelled Negative
    pub negative: usize,
}

/// Table-name stem for a term: its ASCII alphanumerics, prefixed when it would not start with a letter
///
/// Terms without any ASCII letter or digit are rejected, since they would all share one table.
/// Dropping other characters can still make distinct terms collide, so that is logged.
pub fn table_stem(term: &str) -> Result<String> {
    let stem: String = term.chars().filter(char::is_ascii_alphanumeric).collect();
    let Some(first) = stem.chars().next() else {
        return Err(PipelineError::InvalidArgument(format!(
            "Search term {term:?} has no ASCII letters or digits to name its tables"
        )));
    };

    if stem.len() != term.len() {
        warn!(term = %term, stem = %stem, "Characters dropped from table name; distinct terms may share tables");
    }

    if first.is_ascii_alphabetic() {
        Ok(stem)
    } else {
        Ok(format!("Term{stem}"))
    }
}

/// Runs search, scoring and persistence for each term in turn
pub struct CollectionService {
    collector: Collector,
    scorer: SentimentScorer,
    store: Store,
    settings: ServiceSettings,
    metrics: PipelineMetrics,
}

impl CollectionService {
    /// Service over a connected collector, starting with zeroed metrics
    #[must_use]
    pub fn new(collector: Collector, scorer: SentimentScorer, store: Store, settings: ServiceSettings) -> Self {
        Self {
            collector,
            scorer,
            store,
            settings,
            metrics: PipelineMetrics::default(),
        }
    }

    /// Counters accumulated so far
    #[must_use]
    pub const fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Run every term with the configured limit, stopping at the first fatal error
    pub async fn run_all(&mut self, terms: &[String]) -> Result<Vec<TermReport>> {
        let mut reports = Vec::with_capacity(terms.len());
        for term in terms {
            let limit = self.settings.limit;
            reports.push(self.run_term(term, limit).await?);
        }

        self.metrics.log_summary();
        Ok(reports)
    }

    /// Search `term`, persist the raw batch, then score and persist the scored batch
    pub async fn run_term(&mut self, term: &str, limit: usize) -> Result<TermReport> {
        let span = info_span!("term", term = %term);
        self.run_term_inner(term, limit).instrument(span).await
    }

    async fn run_term_inner(&mut self, term: &str, limit: usize) -> Result<TermReport> {
        let stem = table_stem(term)?;
        let raw_table = format!("{stem}{}", self.settings.raw_table_suffix);
        let scored_table = format!("{stem}{}", self.settings.scored_table_suffix);
        InputValidator::validate_table_name(&raw_table)?;
        InputValidator::validate_table_name(&scored_table)?;

        let timer = OperationTimer::new("search");
        let cursor = self.collector.search(term, limit)?;
        let batch = Collector::materialize(cursor).await?;
        self.metrics.record_search(term, batch.len(), timer.finish());

        let raw_rows = self.persist(&batch, &raw_table)?;

        let timer = OperationTimer::new("score");
        let scored = self.scorer.annotate(&batch, self.settings.text_field);
        self.metrics.record_scoring(&scored, timer.finish());

        let scored_rows = self.persist(&scored, &scored_table)?;

        let count = |label: SentimentLabel| scored.iter().filter(|record| record.label == label).count();
        let report = TermReport {
            term: term.to_string(),
            raw_table,
            scored_table,
            fetched: batch.len(),
            raw_rows,
            scored_rows,
            positive: count(SentimentLabel::Positive),
            neutral: count(SentimentLabel::Neutral),
            negative: count(SentimentLabel::Negative),
        };

        self.metrics.record_term_completed();
        info!(
            fetched = report.fetched,
            positive = report.positive,
            neutral = report.neutral,
            negative = report.negative,
            "Term complete"
        );
        Ok(report)
    }

    fn persist<T: TableRow>(&mut self, batch: &Batch<T>, table: &str) -> Result<Option<usize>> {
        let rows = if self.settings.fail_on_error {
            Some(self.store.try_append(batch, table)?)
        } else {
            self.store.append(batch, table)
        };
        self.metrics.record_persist(table, rows);
        Ok(rows)
    }
}
