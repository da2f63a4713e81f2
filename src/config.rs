use std::env;
use std::path::PathBuf;

use anyhow::{bail, Result};
use tracing::{error, info};

/// Default ledger location, relative to the working directory.
pub const DEFAULT_LEDGER_FILE: &str = "uploaded.txt";

/// Process-scoped configuration, read once at startup. No other component
/// touches the ambient environment.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub youtube_api_key: String,
    pub youtube_channel_id: String,
    pub fb_page_id: String,
    pub fb_page_token: String,
    /// Netscape cookie file handed to the download utility.
    pub cookie_path: PathBuf,
    /// Newline-delimited file of already-relayed video ids.
    pub ledger_path: PathBuf,
}

/// CLI overrides for the optional, defaulted paths.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub ledger: Option<PathBuf>,
    pub cookies: Option<PathBuf>,
}

fn required_var(key: &str) -> Result<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => {
            error!(key = key, "Required environment variable is empty");
            bail!("{key} environment variable is empty");
        }
        Err(_) => {
            error!(key = key, "Required environment variable not set");
            bail!("{key} environment variable not set");
        }
    }
}

fn optional_path_var(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

fn default_cookie_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cookies.txt")
}

impl RelayConfig {
    /// Reads every required setting from the environment, failing with the
    /// name of the first missing key before any network or file I/O happens.
    pub fn from_env(overrides: Overrides) -> Result<Self> {
        let youtube_api_key = required_var("YOUTUBE_API_KEY")?;
        let youtube_channel_id = required_var("YOUTUBE_CHANNEL_ID")?;
        let fb_page_id = required_var("FB_PAGE_ID")?;
        let fb_page_token = required_var("FB_PAGE_TOKEN")?;

        let cookie_path = overrides
            .cookies
            .or_else(|| optional_path_var("COOKIE_PATH"))
            .unwrap_or_else(default_cookie_path);
        let ledger_path = overrides
            .ledger
            .or_else(|| optional_path_var("LEDGER_PATH"))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_FILE));

        Ok(RelayConfig {
            youtube_api_key,
            youtube_channel_id,
            fb_page_id,
            fb_page_token,
            cookie_path,
            ledger_path,
        })
    }

    /// Fatal preconditions, checked once before the pipeline starts: yt-dlp
    /// needs a JS runtime on PATH for YouTube's bot-detection challenges, and
    /// the cookie file must exist at the resolved location.
    pub fn preflight(&self) -> Result<()> {
        if which::which("node").is_err() {
            error!("node runtime not found on PATH");
            bail!("node runtime not found on PATH (required by the download utility)");
        }
        if !self.cookie_path.exists() {
            error!(path = %self.cookie_path.display(), "Cookie file not found");
            bail!("cookie file not found at {}", self.cookie_path.display());
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            channel_id = %self.youtube_channel_id,
            page_id = %self.fb_page_id,
            cookie_path = %self.cookie_path.display(),
            ledger_path = %self.ledger_path.display(),
            "Loaded relay config"
        );
    }
}
