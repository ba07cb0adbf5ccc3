use std::time::Duration;

use metrics::{counter, histogram};
use serde::Serialize;
use tracing::info;

use crate::models::{Batch, ScoredRecord, SentimentLabel};

const RECORDS_FETCHED: &str = "tweet_sentiment_records_fetched_total";
const SEARCH_DURATION: &str = "tweet_sentiment_search_duration_seconds";
const RECORDS_SCORED: &str = "tweet_sentiment_records_scored_total";
const SCORING_DURATION: &str = "tweet_sentiment_scoring_duration_seconds";
const ROWS_PERSISTED: &str = "tweet_sentiment_rows_persisted_total";
const PERSIST_FAILURES: &str = "tweet_sentiment_persist_failures_total";
const TERMS_COMPLETED: &str = "tweet_sentiment_terms_completed_total";

/// Run counters, mirrored into the `metrics` facade as they change
///
/// Without an installed recorder the facade calls are no-ops and only the
/// local counts remain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineMetrics {
    /// Records materialized from searches
    pub records_fetched: u64,
    /// Records scored
    pub records_scored: u64,
    /// Rows appended across all tables
    pub rows_persisted: u64,
    /// Batches dropped by a failed append
    pub persist_failures: u64,
    /// Scored records labelled Positive
    pub positive: u64,
    /// Scored records labelled Neutral/Unsure
    pub neutral: u64,
    /// Scored records labelled Negative
    pub negative: u64,
    /// Terms that ran to the end
    pub terms_completed: u64,
}

impl PipelineMetrics {
    /// Record a materialized search
    pub fn record_search(&mut self, term: &str, records: usize, duration: Duration) {
        let count = records as u64;
        self.records_fetched += count;

        counter!(RECORDS_FETCHED, "term" => term.to_string()).increment(count);
        histogram!(SEARCH_DURATION).record(duration.as_secs_f64());
    }

    /// Record an annotated batch and its label distribution
    pub fn record_scoring(&mut self, batch: &Batch<ScoredRecord>, duration: Duration) {
        self.records_scored += batch.len() as u64;
        for scored in batch {
            match scored.label {
                SentimentLabel::Positive => self.positive += 1,
                SentimentLabel::Neutral => self.neutral += 1,
                SentimentLabel::Negative => self.negative += 1,
            }
            counter!(RECORDS_SCORED, "label" => scored.label.as_str()).increment(1);
        }
        histogram!(SCORING_DURATION).record(duration.as_secs_f64());
    }

    /// Record the outcome of one append; `None` means the batch was dropped
    pub fn record_persist(&mut self, table: &str, rows: Option<usize>) {
        match rows {
            Some(rows) => {
                self.rows_persisted += rows as u64;
                counter!(ROWS_PERSISTED, "table" => table.to_string()).increment(rows as u64);
            },
            None => {
                self.persist_failures += 1;
                counter!(PERSIST_FAILURES, "table" => table.to_string()).increment(1);
            },
        }
    }

    /// Record a finished term
    pub fn record_term_completed(&mut self) {
        self.terms_completed += 1;
        counter!(TERMS_COMPLETED).increment(1);
    }

    /// Log the totals
    pub fn log_summary(&self) {
        info!(
            terms = self.terms_completed,
            fetched = self.records_fetched,
            scored = self.records_scored,
            persisted = self.rows_persisted,
            persist_failures = self.persist_failures,
            positive = self.positive,
            neutral = self.neutral,
            negative = self.negative,
            "Run summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_outcomes_are_counted_separately() {
        let mut metrics = PipelineMetrics::default();
        metrics.record_persist("HappyTweets", Some(400));
        metrics.record_persist("HappyTweetsScored", None);

        assert_eq!(metrics.rows_persisted, 400);
        assert_eq!(metrics.persist_failures, 1);
    }
}
