//! Destination publish: one multipart upload to the page's video feed.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use reqwest::multipart;
use tokio_util::io::ReaderStream;
use tracing::{error, info};

use crate::config::RelayConfig;

const GRAPH_API_BASE: &str = "https://graph.facebook.com/v25.0";

/// Wall-clock bound on the whole multipart upload. Generous, since the body
/// is an entire video file.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Seam for the publish step. One shot: no retry, no chunked upload.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PagePublisher: Send + Sync {
    async fn publish(
        &self,
        file_path: &Path,
        title: &str,
        description: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

pub struct FacebookPageClient {
    http: reqwest::Client,
    page_id: String,
    access_token: String,
}

impl FacebookPageClient {
    pub fn new(config: &RelayConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(UPLOAD_TIMEOUT).build()?;
        Ok(FacebookPageClient {
            http,
            page_id: config.fb_page_id.clone(),
            access_token: config.fb_page_token.clone(),
        })
    }

    fn videos_url(&self) -> String {
        format!("{GRAPH_API_BASE}/{}/videos", self.page_id)
    }
}

fn compose_caption(title: &str, description: &str) -> String {
    format!("{title}\n\n{description}")
}

#[async_trait]
impl PagePublisher for FacebookPageClient {
    async fn publish(
        &self,
        file_path: &Path,
        title: &str,
        description: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let url = self.videos_url();
        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("video.mp4")
            .to_string();

        // Stream the file rather than buffering it; these are whole videos.
        let file = tokio::fs::File::open(file_path).await?;
        let length = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let source = multipart::Part::stream_with_length(body, length)
            .file_name(file_name)
            .mime_str("video/mp4")?;
        let form = multipart::Form::new()
            .part("source", source)
            .text("description", compose_caption(title, description))
            .text("access_token", self.access_token.clone());

        info!(page_id = %self.page_id, file = %file_path.display(), "Uploading video to page feed");
        let response = self.http.post(&url).multipart(form).send().await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<failed to decode response body>"));
        if !status.is_success() {
            error!(
                status = %status,
                page_id = %self.page_id,
                "Facebook upload returned error. Response body: {body}"
            );
            return Err(format!("Upload failed with status {status}: {body}").into());
        }

        info!(status = %status, "Video uploaded successfully: {body}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_joins_title_and_description() {
        assert_eq!(compose_caption("T", "D"), "T\n\nD");
    }

    #[test]
    fn caption_keeps_empty_description() {
        assert_eq!(compose_caption("T", ""), "T\n\n");
    }
}
