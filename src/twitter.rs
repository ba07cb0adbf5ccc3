//! Twitter v1.1 REST client

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::collector::{PageRequest, SearchApi, SearchPage};
use crate::config::Credentials;
use crate::error::{PipelineError, Result};
use crate::models::SearchRecord;
use crate::oauth;

/// Timestamp layout of `created_at`, e.g. `Wed Oct 10 20:19:24 +0000 2018`
pub const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

const SEARCH_PATH: &str = "search/tweets.json";
const VERIFY_PATH: &str = "account/verify_credentials.json";

/// Author sub-object of a status
#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    /// Handle without the leading `@`
    pub screen_name: String,
    /// Follower count
    #[serde(default)]
    pub followers_count: u64,
    /// Free-text profile location
    #[serde(default)]
    pub location: Option<String>,
    /// Profile time zone; often absent
    #[serde(default)]
    pub time_zone: Option<String>,
}

/// Reference to the status a retweet wraps
#[derive(Debug, Clone, Deserialize)]
pub struct RetweetRef {
    /// Id of the wrapped status
    pub id: i64,
}

/// A status as returned by the search endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RawStatus {
    /// Status id
    pub id: i64,
    /// Creation time, see [`CREATED_AT_FORMAT`]
    #[serde(deserialize_with = "deserialize_created_at")]
    pub created_at: DateTime<Utc>,
    /// Detected language code
    #[serde(default)]
    pub lang: Option<String>,
    /// Present only on retweets
    #[serde(default)]
    pub retweeted_status: Option<RetweetRef>,
    /// Author
    pub user: RawUser,
    /// Favorite count
    #[serde(default)]
    pub favorite_count: Option<u64>,
    /// Status text
    pub text: String,
}

/// Body of `search/tweets.json`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    /// Matching statuses, newest first
    pub statuses: Vec<RawStatus>,
}

fn deserialize_created_at<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_str(&raw, CREATED_AT_FORMAT)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}

impl From<RawStatus> for SearchRecord {
    fn from(status: RawStatus) -> Self {
        Self {
            id: status.id,
            created_at: status.created_at,
            language: status.lang.unwrap_or_default(),
            is_retweet: status.retweeted_status.is_some(),
            author_screen_name: status.user.screen_name,
            author_followers_count: status.user.followers_count,
            author_location: status.user.location.unwrap_or_default(),
            author_time_zone: status.user.time_zone,
            favorite_count: status.favorite_count.unwrap_or_default(),
            text: status.text,
        }
    }
}

/// HTTP implementation of [`SearchApi`] signing every request with OAuth 1.0a
pub struct TwitterClient {
    client: reqwest::Client,
    credentials: Credentials,
    base_url: String,
}

impl TwitterClient {
    /// Create a client for the API rooted at `base_url`
    pub fn new(credentials: Credentials, base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            credentials,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{path}", self.base_url);
        let header = oauth::authorization_header(&self.credentials, "GET", &url, query)?;

        // Encoded by hand so the signed parameters match the sent ones byte for byte
        let request_url = if query.is_empty() {
            url
        } else {
            let query_string = query
                .iter()
                .map(|(key, value)| format!("{}={}", oauth::percent_encode(key), oauth::percent_encode(value)))
                .collect::<Vec<_>>()
                .join("&");
            format!("{url}?{query_string}")
        };

        let resp = self
            .client
            .get(&request_url)
            .header(AUTHORIZATION, header)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Authentication(format!("{path} returned {status}: {body}")));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PipelineError::RemoteFetch(format!("{path} returned {status}: {body}")));
        }

        resp.json::<T>()
            .await
            .map_err(|e| PipelineError::RemoteFetch(format!("Failed to decode {path} response: {e}")))
    }
}

#[async_trait]
impl SearchApi for TwitterClient {
    async fn verify_credentials(&self) -> Result<()> {
        let account: serde_json::Value = self
            .get_json(VERIFY_PATH, &[("include_entities", "false"), ("skip_status", "true")])
            .await?;
        debug!(screen_name = %account["screen_name"], "Credentials verified");
        Ok(())
    }

    async fn search_page(&self, request: &PageRequest) -> Result<SearchPage> {
        let count = request.count.to_string();
        let max_id = request.max_id.map(|id| id.to_string());

        let mut query = vec![
            ("q", request.query.as_str()),
            ("lang", request.language.as_str()),
            ("count", count.as_str()),
            ("result_type", "recent"),
        ];
        if let Some(max_id) = &max_id {
            query.push(("max_id", max_id.as_str()));
        }

        let response: SearchResponse = self.get_json(SEARCH_PATH, &query).await?;
        Ok(response
            .statuses
            .into_iter()
            .map(SearchRecord::from)
            .collect::<Vec<_>>()
            .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PAYLOAD: &str = r#"{
        "statuses": [
            {
                "id": 1050118621198921728,
                "created_at": "Wed Oct 10 20:19:24 +0000 2018",
                "lang": "en",
                "text": "RT @someone: so happy today https://t.co/abc",
                "favorite_count": 0,
                "retweeted_status": {"id": 1050118000000000000, "text": "so happy today"},
                "user": {"screen_name": "alice", "followers_count": 12, "location": "Leeds", "time_zone": "London"}
            },
            {
                "id": 1050118621198921700,
                "created_at": "Wed Oct 10 22:19:24 +0200 2018",
                "lang": "en",
                "text": "original thought",
                "favorite_count": 7,
                "user": {"screen_name": "bob", "followers_count": 3, "location": null}
            }
        ],
        "search_metadata": {"count": 2}
    }"#;

    #[test]
    fn test_search_response_normalizes_statuses() {
        let response: SearchResponse = serde_json::from_str(PAYLOAD).unwrap();
        let records: Vec<SearchRecord> = response.statuses.into_iter().map(SearchRecord::from).collect();

        assert_eq!(records.len(), 2);
        assert!(records[0].is_retweet);
        assert_eq!(records[0].author_time_zone.as_deref(), Some("London"));
        assert!(!records[1].is_retweet);
        assert_eq!(records[1].author_time_zone, None);
        assert_eq!(records[1].author_location, "");
        assert_eq!(records[1].favorite_count, 7);
    }

    #[test]
    fn test_created_at_is_converted_to_utc() {
        let response: SearchResponse = serde_json::from_str(PAYLOAD).unwrap();
        let expected = Utc.with_ymd_and_hms(2018, 10, 10, 20, 19, 24).unwrap();
        assert_eq!(response.statuses[0].created_at, expected);
        assert_eq!(response.statuses[1].created_at, expected);
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let payload = r#"{"statuses": [{"id": 1, "created_at": "2018-10-10", "text": "x", "user": {"screen_name": "a"}}]}"#;
        assert!(serde_json::from_str::<SearchResponse>(payload).is_err());
    }
}
