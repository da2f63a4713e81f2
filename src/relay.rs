//! Coordinating module for the lookup-acquire-publish-cleanup pipeline.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::config::RelayConfig;
use crate::download::MediaAcquirer;
use crate::ledger::UploadLedger;
use crate::lookup::VideoLookup;
use crate::publish::PagePublisher;

/// How a run ended. "Already uploaded" is a successful outcome, not an error,
/// so it maps to exit code 0 without abusing process exit as control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Published { video_id: String },
    AlreadyUploaded { video_id: String },
}

/// Runs the pipeline once, strictly in sequence. No step is retried; the
/// first error aborts the run. The only branch is the dedup gate.
pub async fn relay(
    config: &RelayConfig,
    lookup: &dyn VideoLookup,
    acquirer: &dyn MediaAcquirer,
    publisher: &dyn PagePublisher,
) -> Result<RelayOutcome> {
    let ledger = UploadLedger::new(&config.ledger_path);

    info!("Starting relay run");
    let video = lookup
        .latest_video()
        .await
        .map_err(|e| anyhow::anyhow!("Channel lookup failed: {e}"))?;

    if ledger
        .contains(&video.id)
        .with_context(|| format!("Failed to read ledger {}", ledger.path().display()))?
    {
        info!(video_id = %video.id, "Video already uploaded, nothing to do");
        return Ok(RelayOutcome::AlreadyUploaded { video_id: video.id });
    }

    let file_path = acquirer
        .acquire(&video.id)
        .await
        .with_context(|| format!("Download failed for video {}", video.id))?;

    // The ledger marks "acquired", not "published": a publish failure below
    // will never be retried on a later run. Designed idempotence boundary,
    // kept to avoid re-downloading on a flaky destination.
    ledger
        .record(&video.id)
        .with_context(|| format!("Failed to record {} in ledger", video.id))?;

    let publish_result = publisher
        .publish(&file_path, &video.title, &video.description)
        .await;

    // Cleanup runs whether or not publish succeeded, and never fails the run.
    delete_media_file(&file_path);

    publish_result.map_err(|e| anyhow::anyhow!("Upload failed for video {}: {e}", video.id))?;

    info!(video_id = %video.id, "Relay run complete");
    Ok(RelayOutcome::Published { video_id: video.id })
}

fn delete_media_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => info!(path = %path.display(), "Deleted local video file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => error!(error = ?e, path = %path.display(), "Failed to delete local video file"),
    }
}
