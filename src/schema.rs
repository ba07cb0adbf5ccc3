//! Table layout definitions
//!
//! Column names and SQLite types for the tables written by the persister.
//! Raw tables use [`RAW_COLUMNS`]; scored tables append [`SCORE_COLUMNS`].

/// A column in a persisted table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name as it appears in the table
    pub name: &'static str,
    /// Declared SQLite type
    pub sql_type: &'static str,
}

impl Column {
    const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self { name, sql_type }
    }
}

/// Raw tweet columns
pub mod tweets {
    /// Tweet identifier column
    pub const ID: &str = "ID";
    /// Creation timestamp column
    pub const DATETIME: &str = "Datetime";
    /// Declared language column
    pub const LANGUAGE: &str = "Language";
    /// Retweet flag column
    pub const IS_RETWEET: &str = "IsRetweet";
    /// Author handle column
    pub const AUTHOR_SCREEN_NAME: &str = "AuthorScreenName";
    /// Author follower count column
    pub const AUTHOR_FOLLOWERS_COUNT: &str = "AuthorFollowersCount";
    /// Author location column
    pub const AUTHOR_LOCATION: &str = "AuthorLocation";
    /// Author time zone column
    pub const AUTHOR_TIME_ZONE: &str = "AuthorTimeZone";
    /// Favorite count column
    pub const FAVORITE_COUNT: &str = "TweetFavoriteCount";
    /// Tweet text column
    pub const TEXT: &str = "TweetText";
}

/// Sentiment columns appended to scored tables
pub mod scores {
    /// Negative component column
    pub const NEG: &str = "neg_score";
    /// Neutral component column
    pub const NEUTRAL: &str = "neutral_score";
    /// Positive component column
    pub const POS: &str = "pos_score";
    /// Compound score column
    pub const COMPOUND: &str = "compound_score";
    /// Sentiment label column
    pub const SENTIMENT: &str = "Sentiment";
}

/// Columns of a raw tweet table, in insertion order
pub const RAW_COLUMNS: [Column; 10] = [
    Column::new(tweets::ID, "INTEGER"),
    Column::new(tweets::DATETIME, "TIMESTAMP"),
    Column::new(tweets::LANGUAGE, "TEXT"),
    Column::new(tweets::IS_RETWEET, "INTEGER"),
    Column::new(tweets::AUTHOR_SCREEN_NAME, "TEXT"),
    Column::new(tweets::AUTHOR_FOLLOWERS_COUNT, "INTEGER"),
    Column::new(tweets::AUTHOR_LOCATION, "TEXT"),
    Column::new(tweets::AUTHOR_TIME_ZONE, "TEXT"),
    Column::new(tweets::FAVORITE_COUNT, "INTEGER"),
    Column::new(tweets::TEXT, "TEXT"),
];

/// Columns appended to a raw table to form a scored table
pub const SCORE_COLUMNS: [Column; 5] = [
    Column::new(scores::NEG, "REAL"),
    Column::new(scores::NEUTRAL, "REAL"),
    Column::new(scores::POS, "REAL"),
    Column::new(scores::COMPOUND, "REAL"),
    Column::new(scores::SENTIMENT, "TEXT"),
];

/// Quote an identifier for use in SQL text
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
