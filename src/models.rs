//! Data models for collected and scored tweets
//!
//! This module contains the records flowing between the collector, the scorer
//! and the persister, plus the ordered [`Batch`] container that carries them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// One tweet returned by a search, normalized to a fixed set of fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    /// Tweet identifier
    pub id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Declared language code
    pub language: String,
    /// True iff the tweet wraps another tweet
    pub is_retweet: bool,
    /// Author handle
    pub author_screen_name: String,
    /// Author follower count
    pub author_followers_count: u64,
    /// Author self-reported location (may be empty)
    pub author_location: String,
    /// Author self-reported time zone (absent in most payloads)
    pub author_time_zone: Option<String>,
    /// Favorite/like count
    pub favorite_count: u64,
    /// Tweet text
    pub text: String,
}

/// Text columns of a [`SearchRecord`] that the scorer can clean and score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextField {
    /// The tweet body
    TweetText,
    /// The author's location
    AuthorLocation,
    /// The author's handle
    AuthorScreenName,
}

impl TextField {
    /// Column name of this field
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::TweetText => crate::schema::tweets::TEXT,
            Self::AuthorLocation => crate::schema::tweets::AUTHOR_LOCATION,
            Self::AuthorScreenName => crate::schema::tweets::AUTHOR_SCREEN_NAME,
        }
    }
}

impl FromStr for TextField {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::TweetText, Self::AuthorLocation, Self::AuthorScreenName]
            .into_iter()
            .find(|field| field.column().eq_ignore_ascii_case(s))
            .ok_or_else(|| PipelineError::InvalidArgument(format!("Unknown text field: {s}")))
    }
}

impl SearchRecord {
    /// Borrow the value of a text field
    #[must_use]
    pub fn field(&self, field: TextField) -> &str {
        match field {
            TextField::TweetText => &self.text,
            TextField::AuthorLocation => &self.author_location,
            TextField::AuthorScreenName => &self.author_screen_name,
        }
    }

    /// Mutably borrow the value of a text field
    pub fn field_mut(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::TweetText => &mut self.text,
            TextField::AuthorLocation => &mut self.author_location,
            TextField::AuthorScreenName => &mut self.author_screen_name,
        }
    }
}

/// Sentiment category derived from a compound score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    /// compound > 0.05
    Positive,
    /// -0.05 < compound <= 0.05
    Neutral,
    /// compound <= -0.05
    Negative,
}

impl SentimentLabel {
    /// Compound scores above this are positive
    pub const POSITIVE_THRESHOLD: f64 = 0.05;
    /// Compound scores at or below this are negative
    pub const NEGATIVE_THRESHOLD: f64 = -0.05;

    /// Classify a compound score
    #[must_use]
    pub fn from_compound(compound: f64) -> Self {
        if compound > Self::POSITIVE_THRESHOLD {
            Self::Positive
        } else if compound > Self::NEGATIVE_THRESHOLD {
            Self::Neutral
        } else {
            Self::Negative
        }
    }

    /// Label text as stored in the `Sentiment` column
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral/Unsure",
            Self::Negative => "Negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Positive" => Ok(Self::Positive),
            "Neutral/Unsure" => Ok(Self::Neutral),
            "Negative" => Ok(Self::Negative),
            other => Err(PipelineError::Other(format!("Unknown sentiment label: {other}"))),
        }
    }
}

/// Polarity components produced by the lexicon model
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PolarityScores {
    /// Negative proportion
    pub neg: f64,
    /// Neutral proportion
    pub neu: f64,
    /// Positive proportion
    pub pos: f64,
    /// Normalized compound score in [-1, 1]
    pub compound: f64,
}

impl PolarityScores {
    /// Label for these scores
    #[must_use]
    pub fn label(&self) -> SentimentLabel {
        SentimentLabel::from_compound(self.compound)
    }
}

/// A search record with its cleaned text and sentiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// The record, with the scored field cleaned
    pub record: SearchRecord,
    /// Polarity components
    pub scores: PolarityScores,
    /// Label derived from `scores.compound`
    pub label: SentimentLabel,
}

impl ScoredRecord {
    /// Pair a record with its scores; the label is always derived from the compound score
    #[must_use]
    pub fn new(record: SearchRecord, scores: PolarityScores) -> Self {
        Self {
            record,
            label: scores.label(),
            scores,
        }
    }
}

/// Ordered, same-shape collection of records in fetch order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch<T> {
    records: Vec<T>,
}

impl<T> Batch<T> {
    /// Create an empty batch
    #[must_use]
    pub const fn new() -> Self {
        Self { records: Vec::new() }
    }

    /// Append a record
    pub fn push(&mut self, record: T) {
        self.records.push(record);
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the batch holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    /// Records as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.records
    }

    /// Consume the batch, returning its records
    #[must_use]
    pub fn into_inner(self) -> Vec<T> {
        self.records
    }
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for Batch<T> {
    fn from(records: Vec<T>) -> Self {
        Self { records }
    }
}

impl<T> FromIterator<T> for Batch<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Batch<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Batch<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_thresholds() {
        assert_eq!(SentimentLabel::from_compound(0.0501), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_compound(0.05), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_compound(-0.0499), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_compound(-0.05), SentimentLabel::Negative);
    }

    #[test]
    fn test_label_round_trips_through_text() {
        for label in [SentimentLabel::Positive, SentimentLabel::Neutral, SentimentLabel::Negative] {
            assert_eq!(label.as_str().parse::<SentimentLabel>().unwrap(), label);
        }
        assert!("Mixed".parse::<SentimentLabel>().is_err());
    }

    #[test]
    fn test_text_field_from_column_name() {
        assert_eq!("TweetText".parse::<TextField>().unwrap(), TextField::TweetText);
        assert_eq!("authorlocation".parse::<TextField>().unwrap(), TextField::AuthorLocation);
        assert!("Datetime".parse::<TextField>().is_err());
    }
}
