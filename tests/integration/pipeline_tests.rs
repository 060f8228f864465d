//! End-to-end ingestion pipeline tests.
//!
//! These exercise the real engine and collaborators and are gated behind
//! environment configuration.

/// Test loading a real audio file and trimming it through both profiles.
#[tokio::test]
#[ignore = "requires ffmpeg and RBOX_TEST_AUDIO_FILE"]
async fn test_load_trim_and_transcode() {
    use rbox_ingest::EditingSession;
    use rbox_models::{DEVICE_PROFILE, UNIVERSAL_PROFILE};

    dotenvy::dotenv().ok();

    let path = std::env::var("RBOX_TEST_AUDIO_FILE").expect("RBOX_TEST_AUDIO_FILE not set");
    let session = EditingSession::open(&path)
        .await
        .expect("Failed to open editing session");

    assert!(session.source().duration_secs > 0.0);
    assert!(!session.source().peaks.is_empty());

    session.region().set_both(0.0, 15.0);
    session.region().toggle_fade_out();
    let region = session.region().current();

    let universal = rbox_engine::transcode(session.source(), &region, &UNIVERSAL_PROFILE)
        .await
        .expect("Universal transcode failed");
    assert!(universal.size_bytes > 0);
    println!("Universal output: {} bytes", universal.size_bytes);

    let device = rbox_engine::transcode(session.source(), &region, &DEVICE_PROFILE)
        .await
        .expect("Device transcode failed");
    assert!(device.size_bytes > 0);
    println!("Device output: {} bytes", device.size_bytes);
}

/// Test a full submission against real storage and catalog.
#[tokio::test]
#[ignore = "requires ffmpeg, storage and catalog credentials"]
async fn test_full_submission() {
    use rbox_ingest::{EditingSession, IngestConfig, SubmissionCoordinator};
    use rbox_models::RingMetadata;

    dotenvy::dotenv().ok();

    let path = std::env::var("RBOX_TEST_AUDIO_FILE").expect("RBOX_TEST_AUDIO_FILE not set");
    let session = EditingSession::open(&path)
        .await
        .expect("Failed to open editing session");

    let config = IngestConfig::from_env();
    let coordinator = SubmissionCoordinator::from_env(&config)
        .await
        .expect("Failed to wire coordinator");

    let metadata = RingMetadata {
        media_title: "Integration Test".to_string(),
        ring_title: format!("Run {}", chrono::Utc::now().timestamp()),
        variant_label: None,
        contributors: vec!["integration".to_string()],
        moods: vec![],
    };
    let draft = session.draft(metadata).expect("Failed to build draft");

    let ring_id = coordinator
        .submit(&draft, &session.transcoder())
        .await
        .expect("Submission failed");
    println!("Created ring: {}", ring_id);
}
