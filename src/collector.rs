//! Search collection: a remote API seam plus a lazy, paginated cursor over its results

use std::collections::VecDeque;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::TwitterConfig;
use crate::error::Result;
use crate::models::{Batch, SearchRecord};
use crate::validation::{InputValidator, MAX_PAGE_SIZE};

/// One page request against the search endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Search query
    pub query: String,
    /// Language filter
    pub language: String,
    /// Requested page size
    pub count: u32,
    /// Only return items with an id at or below this one
    pub max_id: Option<i64>,
}

/// One page of normalized results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    /// Records in the order the API returned them
    pub records: Vec<SearchRecord>,
}

impl From<Vec<SearchRecord>> for SearchPage {
    fn from(records: Vec<SearchRecord>) -> Self {
        Self { records }
    }
}

/// Remote search API
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Check that the configured credentials are accepted
    async fn verify_credentials(&self) -> Result<()>;

    /// Fetch a single page of results
    async fn search_page(&self, request: &PageRequest) -> Result<SearchPage>;
}

/// Per-collector search parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    /// Language filter applied to every query
    pub language: String,
    /// Largest page requested from the API
    pub page_size: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            page_size: MAX_PAGE_SIZE,
        }
    }
}

impl From<&TwitterConfig> for SearchSettings {
    fn from(config: &TwitterConfig) -> Self {
        Self {
            language: config.language.clone(),
            page_size: config.page_size,
        }
    }
}

/// An authenticated session against a [`SearchApi`]
pub struct Collector {
    api: Box<dyn SearchApi>,
    settings: SearchSettings,
}

impl Collector {
    /// Verify credentials and return a ready collector
    ///
    /// Authentication failures propagate unchanged.
    pub async fn connect(api: Box<dyn SearchApi>, settings: SearchSettings) -> Result<Self> {
        InputValidator::validate_language(&settings.language)?;
        InputValidator::validate_page_size(settings.page_size)?;

        api.verify_credentials().await?;
        info!(language = %settings.language, page_size = settings.page_size, "Connected to search API");

        Ok(Self { api, settings })
    }

    /// Settings in use
    #[must_use]
    pub const fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Start a search for `term` yielding at most `limit` records
    ///
    /// Arguments are checked before anything is sent; nothing is fetched until
    /// the cursor is advanced.
    pub fn search(&self, term: &str, limit: usize) -> Result<SearchCursor<'_>> {
        InputValidator::validate_search_limit(limit)?;
        InputValidator::validate_search_term(term)?;

        debug!(term, limit, "Starting search");
        Ok(SearchCursor {
            api: self.api.as_ref(),
            query: term.to_string(),
            language: self.settings.language.clone(),
            page_size: self.settings.page_size,
            remaining: limit,
            max_id: None,
            buffer: VecDeque::new(),
            exhausted: limit == 0,
            pages_fetched: 0,
        })
    }

    /// Drain a cursor into a batch, in fetch order
    pub async fn materialize(mut cursor: SearchCursor<'_>) -> Result<Batch<SearchRecord>> {
        let mut batch = Batch::new();
        while let Some(record) = cursor.next().await? {
            batch.push(record);
        }

        info!(
            term = %cursor.query,
            records = batch.len(),
            pages = cursor.pages_fetched,
            "Search materialized"
        );
        Ok(batch)
    }
}

/// Single-pass cursor over paginated search results
pub struct SearchCursor<'a> {
    api: &'a dyn SearchApi,
    query: String,
    language: String,
    page_size: u32,
    remaining: usize,
    max_id: Option<i64>,
    buffer: VecDeque<SearchRecord>,
    exhausted: bool,
    pages_fetched: usize,
}

impl SearchCursor<'_> {
    /// Next record, fetching another page when the current one is used up
    pub async fn next(&mut self) -> Result<Option<SearchRecord>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                self.remaining -= 1;
                return Ok(Some(record));
            }
            if self.exhausted || self.remaining == 0 {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    /// Pages requested so far
    #[must_use]
    pub const fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Records still allowed before the limit is reached
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.remaining
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let count = self.page_size.min(u32::try_from(self.remaining).unwrap_or(u32::MAX));
        let request = PageRequest {
            query: self.query.clone(),
            language: self.language.clone(),
            count,
            max_id: self.max_id,
        };

        let page = self.api.search_page(&request).await?;
        self.pages_fetched += 1;
        metrics::counter!("tweet_sentiment_pages_fetched_total").increment(1);
        debug!(
            term = %self.query,
            page = self.pages_fetched,
            requested = count,
            received = page.records.len(),
            max_id = ?self.max_id,
            "Fetched search page"
        );

        let mut records = page.records;
        let Some(oldest) = records.iter().map(|record| record.id).min() else {
            self.exhausted = true;
            return Ok(());
        };
        self.max_id = Some(oldest.saturating_sub(1));

        records.truncate(self.remaining);
        self.buffer.extend(records);
        Ok(())
    }
}
