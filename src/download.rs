//! Media acquisition via the yt-dlp subprocess.
//!
//! The utility is invoked with an output template keyed by the video id so the
//! produced file can be located afterwards by scanning the working directory,
//! rather than by parsing the utility's output.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error, info};

/// Prefer a pre-muxed MP4; otherwise take best video+audio and let yt-dlp
/// merge into MP4.
const FORMAT_SELECTOR: &str = "bv*[ext=mp4]+ba/b[ext=mp4]/best";

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("failed to launch yt-dlp: {0}")]
    Launch(#[source] std::io::Error),
    #[error("yt-dlp exited with {0}")]
    Failed(ExitStatus),
    #[error("no .mp4 output matching video-{video_id}.* in {}", .dir.display())]
    OutputNotFound { video_id: String, dir: PathBuf },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Seam for the download step: one video id in, one resolved local MP4 out.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait MediaAcquirer: Send + Sync {
    async fn acquire(&self, video_id: &str) -> Result<PathBuf, AcquireError>;
}

pub struct YtDlpAcquirer {
    cookie_path: PathBuf,
    work_dir: PathBuf,
}

impl YtDlpAcquirer {
    pub fn new(cookie_path: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        YtDlpAcquirer {
            cookie_path: cookie_path.into(),
            work_dir: work_dir.into(),
        }
    }

    /// Locate the file the utility produced. The output template pins the stem
    /// to `video-<id>`; the merge step pins the extension to `.mp4`.
    fn resolve_output(&self, video_id: &str) -> Result<PathBuf, AcquireError> {
        let stem_prefix = format!("video-{video_id}.");
        for entry in std::fs::read_dir(&self.work_dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with(&stem_prefix)
                && path.extension().map_or(false, |ext| ext == "mp4")
            {
                debug!(path = %path.display(), "Resolved downloaded media file");
                return Ok(path);
            }
        }
        Err(AcquireError::OutputNotFound {
            video_id: video_id.to_string(),
            dir: self.work_dir.clone(),
        })
    }
}

#[async_trait]
impl MediaAcquirer for YtDlpAcquirer {
    async fn acquire(&self, video_id: &str) -> Result<PathBuf, AcquireError> {
        let template = self.work_dir.join(format!("video-{video_id}.%(ext)s"));
        let url = format!("https://www.youtube.com/watch?v={video_id}");

        info!(video_id = video_id, url = %url, "Downloading video with yt-dlp");

        // --js-runtime and --remote-components work around the source
        // platform's bot detection; they are required, not tunable. Verbose
        // output goes straight to our stderr, as does download progress.
        let status = Command::new("yt-dlp")
            .arg("--verbose")
            .arg("--cookies")
            .arg(&self.cookie_path)
            .arg("-f")
            .arg(FORMAT_SELECTOR)
            .arg("--merge-output-format")
            .arg("mp4")
            .arg("--no-cache-dir")
            .arg("--js-runtime")
            .arg("node")
            .arg("--remote-components")
            .arg("ejs:github")
            .arg("-o")
            .arg(&template)
            .arg(&url)
            .status()
            .await
            .map_err(AcquireError::Launch)?;

        if !status.success() {
            error!(video_id = video_id, status = ?status, "yt-dlp exited with non-zero code");
            return Err(AcquireError::Failed(status));
        }

        let path = self.resolve_output(video_id)?;
        info!(video_id = video_id, path = %path.display(), "Download complete");
        Ok(path)
    }
}
