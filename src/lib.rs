pub mod config;
pub mod download;
pub mod ledger;
pub mod lookup;
pub mod publish;
pub mod relay;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use config::{Overrides, RelayConfig};
use relay::RelayOutcome;

/// CLI for video-relay: republish a channel's newest video to a page feed.
#[derive(Parser)]
#[clap(
    name = "video-relay",
    version,
    about = "Relay the newest video of a YouTube channel to a Facebook page feed"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the channel's newest video and republish it once
    Run {
        /// Path to the ledger of already-relayed video ids
        #[clap(long)]
        ledger: Option<PathBuf>,
        /// Path to the Netscape cookie file for the download step
        #[clap(long)]
        cookies: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main().
pub async fn run(cli: Cli) -> Result<RelayOutcome> {
    match cli.command {
        Commands::Run { ledger, cookies } => {
            let config = RelayConfig::from_env(Overrides { ledger, cookies })?;
            config.trace_loaded();
            config.preflight()?;

            let lookup = lookup::YouTubeSearchClient::new(&config)?;
            let acquirer =
                download::YtDlpAcquirer::new(&config.cookie_path, std::env::current_dir()?);
            let publisher = publish::FacebookPageClient::new(&config)?;

            relay::relay(&config, &lookup, &acquirer, &publisher).await
        }
    }
}
