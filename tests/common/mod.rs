//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use tweet_sentiment::collector::{PageRequest, SearchApi, SearchPage};
use tweet_sentiment::error::{PipelineError, Result};
use tweet_sentiment::models::SearchRecord;
use tweet_sentiment::twitter::RawStatus;

/// Id of the newest synthetic status; ids count down from here
pub const NEWEST_ID: i64 = 1_000_000;

pub const TEXTS: [&str; 5] = [
    "So happy with this new phone @shop https://t.co/abc123",
    "This is terrible, worst service ever",
    "The sky is blue",
    "not good at all @helpdesk",
    "I love it :)",
];

/// Raw status JSON for item `i`: every third is a retweet, every fourth has no time zone
pub fn raw_status(i: usize) -> serde_json::Value {
    let id = NEWEST_ID - i as i64;
    let mut user = json!({
        "screen_name": format!("user{i}"),
        "followers_count": i * 10,
        "location": if i % 5 == 0 { serde_json::Value::Null } else { json!("Manchester") },
    });
    if i % 4 != 0 {
        user["time_zone"] = json!("Europe/London");
    }

    let mut status = json!({
        "id": id,
        "created_at": "Wed Oct 10 20:19:24 +0000 2018",
        "lang": "en",
        "text": TEXTS[i % TEXTS.len()],
        "favorite_count": i % 7,
        "user": user,
    });
    if i % 3 == 0 {
        status["retweeted_status"] = json!({"id": id + 5_000_000, "text": "original"});
    }
    status
}

/// `count` normalized records, newest first
pub fn synthetic_records(count: usize) -> Vec<SearchRecord> {
    (0..count)
        .map(|i| {
            let status: RawStatus = serde_json::from_value(raw_status(i)).unwrap();
            SearchRecord::from(status)
        })
        .collect()
}

/// In-memory search API honouring `count` and `max_id`
pub struct FakeSearchApi {
    records: Vec<SearchRecord>,
    reject_credentials: bool,
    ignore_count: bool,
    requests: Mutex<Vec<PageRequest>>,
}

impl FakeSearchApi {
    pub fn new(records: Vec<SearchRecord>) -> Self {
        Self {
            records,
            reject_credentials: false,
            ignore_count: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_items(count: usize) -> Self {
        Self::new(synthetic_records(count))
    }

    pub fn rejecting_credentials() -> Self {
        Self {
            reject_credentials: true,
            ..Self::new(Vec::new())
        }
    }

    /// Serve whole result sets regardless of the requested page size
    pub fn ignoring_count(mut self) -> Self {
        self.ignore_count = true;
        self
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchApi for FakeSearchApi {
    async fn verify_credentials(&self) -> Result<()> {
        if self.reject_credentials {
            return Err(PipelineError::Authentication("401 Unauthorized".to_string()));
        }
        Ok(())
    }

    async fn search_page(&self, request: &PageRequest) -> Result<SearchPage> {
        self.requests.lock().unwrap().push(request.clone());

        let take = if self.ignore_count { usize::MAX } else { request.count as usize };
        let records = self
            .records
            .iter()
            .filter(|record| request.max_id.map_or(true, |max_id| record.id <= max_id))
            .take(take)
            .cloned()
            .collect::<Vec<_>>();
        Ok(records.into())
    }
}

/// Shared handle so a test can inspect requests after the collector takes ownership
pub struct SharedApi(pub std::sync::Arc<FakeSearchApi>);

#[async_trait]
impl SearchApi for SharedApi {
    async fn verify_credentials(&self) -> Result<()> {
        self.0.verify_credentials().await
    }

    async fn search_page(&self, request: &PageRequest) -> Result<SearchPage> {
        self.0.search_page(request).await
    }
}
