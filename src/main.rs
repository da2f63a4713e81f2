use clap::Parser;

use video_relay::relay::RelayOutcome;
use video_relay::{run, Cli};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(RelayOutcome::Published { video_id }) => {
            println!("Relayed video {video_id}.");
            std::process::exit(0);
        }
        Ok(RelayOutcome::AlreadyUploaded { video_id }) => {
            println!("Video {video_id} already uploaded. Skipping.");
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("[ERROR] Relay failed: {e:#}");
            std::process::exit(1);
        }
    }
}
