//! Source lookup: the single most recent video on the monitored channel.

use std::time::Duration;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::Deserialize;
use tracing::{error, info};

use crate::config::RelayConfig;

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/search";

/// Wall-clock bound on the search request. The API answers in well under a
/// second when healthy; anything longer is a stalled connection.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// The one video reference fetched per run. Immutable once fetched.
#[derive(Debug, Clone)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
}

/// Seam for the read-only channel query. Implemented by the real search
/// client and by test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait VideoLookup: Send + Sync {
    /// Fetch the newest video on the configured channel. Any non-success
    /// response or malformed payload is fatal; there is no retry.
    async fn latest_video(&self) -> Result<Video, Box<dyn std::error::Error + Send + Sync>>;
}

pub struct YouTubeSearchClient {
    http: reqwest::Client,
    api_key: String,
    channel_id: String,
}

impl YouTubeSearchClient {
    pub fn new(config: &RelayConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(SEARCH_TIMEOUT).build()?;
        Ok(YouTubeSearchClient {
            http,
            api_key: config.youtube_api_key.clone(),
            channel_id: config.youtube_channel_id.clone(),
        })
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: SearchSnippet,
}

#[derive(Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: String,
}

#[derive(Deserialize)]
struct SearchSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

#[async_trait]
impl VideoLookup for YouTubeSearchClient {
    async fn latest_video(&self) -> Result<Video, Box<dyn std::error::Error + Send + Sync>> {
        let response = self
            .http
            .get(SEARCH_ENDPOINT)
            .query(&[
                ("part", "snippet"),
                ("channelId", self.channel_id.as_str()),
                ("order", "date"),
                ("maxResults", "1"),
                ("type", "video"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to decode response body>"));
            error!(
                status = %status,
                channel_id = %self.channel_id,
                "YouTube search returned error. Response body: {body}"
            );
            return Err(format!("YouTube search failed with status {status}: {body}").into());
        }

        let parsed: SearchResponse = response.json().await?;
        let item = parsed
            .items
            .into_iter()
            .next()
            .ok_or("YouTube search returned no videos for channel")?;

        info!(
            video_id = %item.id.video_id,
            title = %item.snippet.title,
            "Found latest channel video"
        );
        Ok(Video {
            id: item.id.video_id,
            title: item.snippet.title,
            description: item.snippet.description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_payload_deserialises() {
        let body = r#"{
            "items": [
                {
                    "id": {"kind": "youtube#video", "videoId": "abc123"},
                    "snippet": {"title": "T", "description": "D", "channelTitle": "c"}
                }
            ]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        let item = parsed.items.into_iter().next().unwrap();
        assert_eq!(item.id.video_id, "abc123");
        assert_eq!(item.snippet.title, "T");
        assert_eq!(item.snippet.description, "D");
    }

    #[test]
    fn empty_items_list_deserialises() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(parsed.items.is_empty());
    }

    #[test]
    fn missing_items_field_defaults_to_empty() {
        let parsed: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.items.is_empty());
    }
}
