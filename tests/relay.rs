//! Orchestration scenarios over mocked lookup/acquire/publish seams.

use std::fs;
use std::path::Path;

use video_relay::config::RelayConfig;
use video_relay::download::MockMediaAcquirer;
use video_relay::ledger::UploadLedger;
use video_relay::lookup::{MockVideoLookup, Video};
use video_relay::publish::MockPagePublisher;
use video_relay::relay::{relay, RelayOutcome};

fn test_config(dir: &Path) -> RelayConfig {
    RelayConfig {
        youtube_api_key: "key".into(),
        youtube_channel_id: "channel".into(),
        fb_page_id: "page".into(),
        fb_page_token: "token".into(),
        cookie_path: dir.join("cookies.txt"),
        ledger_path: dir.join("uploaded.txt"),
    }
}

fn lookup_returning(video: Video) -> MockVideoLookup {
    let mut lookup = MockVideoLookup::new();
    lookup
        .expect_latest_video()
        .times(1)
        .returning(move || Ok(video.clone()));
    lookup
}

#[tokio::test]
async fn happy_path_publishes_records_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let media_path = dir.path().join("video-abc123.mp4");

    let lookup = lookup_returning(Video {
        id: "abc123".into(),
        title: "T".into(),
        description: "D".into(),
    });

    let mut acquirer = MockMediaAcquirer::new();
    let produced = media_path.clone();
    acquirer
        .expect_acquire()
        .withf(|id| id == "abc123")
        .times(1)
        .returning(move |_| {
            fs::write(&produced, b"fake mp4 bytes").unwrap();
            Ok(produced.clone())
        });

    let mut publisher = MockPagePublisher::new();
    let expected_path = media_path.clone();
    publisher
        .expect_publish()
        .withf(move |path, title, description| {
            path == expected_path && title == "T" && description == "D"
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let outcome = relay(&config, &lookup, &acquirer, &publisher)
        .await
        .expect("relay should succeed");

    assert_eq!(
        outcome,
        RelayOutcome::Published {
            video_id: "abc123".into()
        }
    );
    // Exactly one new ledger line, and the media file is gone.
    assert_eq!(fs::read_to_string(&config.ledger_path).unwrap(), "abc123\n");
    assert!(!media_path.exists());
}

#[tokio::test]
async fn already_uploaded_short_circuits_with_zero_calls() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    UploadLedger::new(&config.ledger_path).record("abc123").unwrap();

    let lookup = lookup_returning(Video {
        id: "abc123".into(),
        title: "T".into(),
        description: "D".into(),
    });

    let mut acquirer = MockMediaAcquirer::new();
    acquirer.expect_acquire().times(0);
    let mut publisher = MockPagePublisher::new();
    publisher.expect_publish().times(0);

    let outcome = relay(&config, &lookup, &acquirer, &publisher)
        .await
        .expect("dedup short-circuit is a success");

    assert_eq!(
        outcome,
        RelayOutcome::AlreadyUploaded {
            video_id: "abc123".into()
        }
    );
    // The ledger is untouched beyond the pre-existing entry.
    assert_eq!(fs::read_to_string(&config.ledger_path).unwrap(), "abc123\n");
}

#[tokio::test]
async fn substring_ledger_entry_does_not_block_the_relay() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    UploadLedger::new(&config.ledger_path).record("abc123456").unwrap();

    let lookup = lookup_returning(Video {
        id: "abc123".into(),
        title: "T".into(),
        description: "D".into(),
    });

    let mut acquirer = MockMediaAcquirer::new();
    let produced = dir.path().join("video-abc123.mp4");
    acquirer.expect_acquire().times(1).returning(move |_| {
        fs::write(&produced, b"x").unwrap();
        Ok(produced.clone())
    });
    let mut publisher = MockPagePublisher::new();
    publisher.expect_publish().times(1).returning(|_, _, _| Ok(()));

    let outcome = relay(&config, &lookup, &acquirer, &publisher)
        .await
        .expect("a longer id in the ledger must not match");
    assert_eq!(
        outcome,
        RelayOutcome::Published {
            video_id: "abc123".into()
        }
    );
}

#[tokio::test]
async fn cleanup_of_a_never_created_file_does_not_fail_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let lookup = lookup_returning(Video {
        id: "abc123".into(),
        title: "T".into(),
        description: "D".into(),
    });

    // The acquirer reports a path it never materialised, so cleanup finds
    // nothing to delete.
    let mut acquirer = MockMediaAcquirer::new();
    let ghost = dir.path().join("video-abc123.mp4");
    acquirer
        .expect_acquire()
        .times(1)
        .returning(move |_| Ok(ghost.clone()));

    let mut publisher = MockPagePublisher::new();
    publisher.expect_publish().times(1).returning(|_, _, _| Ok(()));

    let outcome = relay(&config, &lookup, &acquirer, &publisher)
        .await
        .expect("deleting an absent media file must not raise");

    assert_eq!(
        outcome,
        RelayOutcome::Published {
            video_id: "abc123".into()
        }
    );
    assert_eq!(fs::read_to_string(&config.ledger_path).unwrap(), "abc123\n");
}

#[tokio::test]
async fn publish_failure_still_deletes_file_and_keeps_ledger_mark() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let media_path = dir.path().join("video-abc123.mp4");

    let lookup = lookup_returning(Video {
        id: "abc123".into(),
        title: "T".into(),
        description: "D".into(),
    });

    let mut acquirer = MockMediaAcquirer::new();
    let produced = media_path.clone();
    acquirer.expect_acquire().times(1).returning(move |_| {
        fs::write(&produced, b"fake mp4 bytes").unwrap();
        Ok(produced.clone())
    });

    let mut publisher = MockPagePublisher::new();
    publisher
        .expect_publish()
        .times(1)
        .returning(|_, _, _| Err("Upload failed with status 500: {\"error\":\"boom\"}".into()));

    let err = relay(&config, &lookup, &acquirer, &publisher)
        .await
        .expect_err("publish failure must abort the run");

    assert!(err.to_string().contains("Upload failed"), "got: {err:#}");
    // Cleanup ran despite the failure, and the dedup mark (written before
    // publish) is already in place, so the next run will not retry.
    assert!(!media_path.exists());
    assert!(UploadLedger::new(&config.ledger_path).contains("abc123").unwrap());
}

#[tokio::test]
async fn lookup_failure_aborts_before_any_download() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let mut lookup = MockVideoLookup::new();
    lookup
        .expect_latest_video()
        .times(1)
        .returning(|| Err("YouTube search failed with status 403: quota".into()));

    let mut acquirer = MockMediaAcquirer::new();
    acquirer.expect_acquire().times(0);
    let mut publisher = MockPagePublisher::new();
    publisher.expect_publish().times(0);

    let err = relay(&config, &lookup, &acquirer, &publisher)
        .await
        .expect_err("lookup failure must abort the run");
    assert!(err.to_string().contains("Channel lookup failed"), "got: {err:#}");
    assert!(!config.ledger_path.exists());
}
