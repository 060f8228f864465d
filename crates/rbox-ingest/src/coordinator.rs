//! Submission coordinator.
//!
//! Sequences the end-to-end commit: transcode both profiles, upload the
//! universal asset (required), upload the device asset (optional), persist
//! the catalog row, then fire best-effort side effects. The state machine
//! is linear with no backward transitions except a full restart; every
//! failure before persist maps to one user-visible message naming the
//! stage.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use rbox_catalog::{CatalogClient, CatalogResult};
use rbox_engine::{EngineResult, SourceAudio};
use rbox_models::{
    derive_slug, EncodedAsset, Region, RingId, RingMetadata, RingRecord, RingStatus,
    TranscodeProfile, DEVICE_PROFILE, UNIVERSAL_PROFILE,
};
use rbox_storage::{StorageClient, StorageResult};

use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult};
use crate::side_effects::{
    CacheInvalidator, HttpCacheInvalidator, InvalidationTrigger, Notifier, RingSummary,
    WebhookNotifier,
};

/// Stage labels used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Transcoding,
    UploadingUniversal,
    UploadingDevice,
    Persisting,
    NotifyingSideEffects,
}

impl SubmissionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStage::Transcoding => "transcoding",
            SubmissionStage::UploadingUniversal => "uploading_universal",
            SubmissionStage::UploadingDevice => "uploading_device",
            SubmissionStage::Persisting => "persisting",
            SubmissionStage::NotifyingSideEffects => "notifying_side_effects",
        }
    }

    /// Human wording for the single user-visible failure message.
    fn describe(&self) -> &'static str {
        match self {
            SubmissionStage::Transcoding => "converting the audio",
            SubmissionStage::UploadingUniversal | SubmissionStage::UploadingDevice => {
                "uploading the files"
            }
            SubmissionStage::Persisting => "saving the ring",
            SubmissionStage::NotifyingSideEffects => "finishing up",
        }
    }
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Observable state of the current submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    Idle,
    Transcoding,
    UploadingUniversal,
    UploadingDevice,
    Persisting,
    NotifyingSideEffects,
    Done { ring_id: RingId },
    Errored { stage: SubmissionStage, message: String },
}

impl SubmissionState {
    /// True while a submission is running; the UI disables the trigger.
    pub fn is_busy(&self) -> bool {
        !matches!(
            self,
            SubmissionState::Idle | SubmissionState::Done { .. } | SubmissionState::Errored { .. }
        )
    }
}

/// A validated draft ready for submission. Region and metadata survive a
/// failed attempt; only transcode/upload state is discarded on retry.
#[derive(Debug, Clone)]
pub struct SubmissionDraft {
    /// Unique per-submission id, embedded in storage keys
    pub submission_id: String,
    pub metadata: RingMetadata,
    pub slug: String,
    pub region: Region,
}

impl SubmissionDraft {
    pub fn new(metadata: RingMetadata, region: Region) -> IngestResult<Self> {
        metadata
            .validate()
            .map_err(|e| IngestError::invalid_metadata(e.to_string()))?;

        let (media, ring, variant) = metadata.slug_fields();
        let slug = derive_slug(media, ring, variant);
        if slug.is_empty() {
            return Err(IngestError::invalid_metadata(
                "titles produce an empty slug",
            ));
        }

        Ok(Self {
            submission_id: Uuid::new_v4().to_string(),
            metadata,
            slug,
            region,
        })
    }
}

/// Region-to-asset transcoding, one call per profile.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(
        &self,
        region: &Region,
        profile: &'static TranscodeProfile,
    ) -> EngineResult<EncodedAsset>;
}

/// Production transcoder bound to the session's staged source.
pub struct EngineTranscoder {
    source: Arc<SourceAudio>,
}

impl EngineTranscoder {
    pub fn new(source: Arc<SourceAudio>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Transcoder for EngineTranscoder {
    async fn transcode(
        &self,
        region: &Region,
        profile: &'static TranscodeProfile,
    ) -> EngineResult<EncodedAsset> {
        rbox_engine::transcode(&self.source, region, profile).await
    }
}

/// Object storage seam.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload_ring_asset(
        &self,
        slug: &str,
        submission_id: &str,
        asset: &EncodedAsset,
    ) -> StorageResult<String>;
}

#[async_trait]
impl ObjectStore for StorageClient {
    async fn upload_ring_asset(
        &self,
        slug: &str,
        submission_id: &str,
        asset: &EncodedAsset,
    ) -> StorageResult<String> {
        StorageClient::upload_ring_asset(self, slug, submission_id, asset).await
    }
}

/// Catalog persistence seam.
#[async_trait]
pub trait CatalogWriter: Send + Sync {
    async fn insert_ring(&self, record: &RingRecord) -> CatalogResult<RingId>;
}

#[async_trait]
impl CatalogWriter for CatalogClient {
    async fn insert_ring(&self, record: &RingRecord) -> CatalogResult<RingId> {
        CatalogClient::insert_ring(self, record).await
    }
}

/// Sequences one submission at a time through the commit pipeline.
pub struct SubmissionCoordinator {
    store: Arc<dyn ObjectStore>,
    catalog: Arc<dyn CatalogWriter>,
    notifier: Arc<dyn Notifier>,
    invalidator: Arc<dyn CacheInvalidator>,
    state: watch::Sender<SubmissionState>,
    /// Bumped when the editing session is cancelled or replaced; async
    /// results from older generations are discarded, not acted on.
    generation: AtomicU64,
    in_flight: AtomicBool,
}

impl SubmissionCoordinator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        catalog: Arc<dyn CatalogWriter>,
        notifier: Arc<dyn Notifier>,
        invalidator: Arc<dyn CacheInvalidator>,
    ) -> Self {
        let (state, _) = watch::channel(SubmissionState::Idle);
        Self {
            store,
            catalog,
            notifier,
            invalidator,
            state,
            generation: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Wire the production collaborators from the environment.
    pub async fn from_env(config: &IngestConfig) -> IngestResult<Self> {
        let http = reqwest::Client::new();
        Ok(Self::new(
            Arc::new(StorageClient::from_env().await?),
            Arc::new(CatalogClient::from_env()?),
            Arc::new(WebhookNotifier::new(http.clone(), config.webhook_url.clone())),
            Arc::new(HttpCacheInvalidator::new(http, config.revalidate_url.clone())),
        ))
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    /// Mark the current editing session as superseded (cancel, or a new
    /// file selected). In-flight engine work is not killed; its results
    /// are discarded at the next validity check.
    pub fn invalidate_session(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Run one submission end to end.
    ///
    /// Returns the new catalog row id on success. `SessionSuperseded` is
    /// returned when the session moved on mid-flight; the state resets to
    /// `Idle` without surfacing an error.
    pub async fn submit(
        &self,
        draft: &SubmissionDraft,
        transcoder: &dyn Transcoder,
    ) -> IngestResult<RingId> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(IngestError::SubmissionInFlight);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let result = self.run(generation, draft, transcoder).await;

        match &result {
            Ok(ring_id) => {
                self.state.send_replace(SubmissionState::Done {
                    ring_id: ring_id.clone(),
                });
            }
            Err(e) if e.is_session_superseded() => {
                info!(slug = %draft.slug, "Submission discarded; session superseded");
                self.state.send_replace(SubmissionState::Idle);
            }
            // `run` already published the Errored state with its stage.
            Err(_) => {}
        }

        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn run(
        &self,
        generation: u64,
        draft: &SubmissionDraft,
        transcoder: &dyn Transcoder,
    ) -> IngestResult<RingId> {
        info!(slug = %draft.slug, submission_id = %draft.submission_id, "Starting submission");

        // Stage 1: both transcodes complete before any upload begins.
        self.state.send_replace(SubmissionState::Transcoding);

        let universal = transcoder
            .transcode(&draft.region, &UNIVERSAL_PROFILE)
            .await
            .map_err(|e| self.fail(SubmissionStage::Transcoding, e.into()))?;
        self.check_session(generation)?;

        let device = match transcoder.transcode(&draft.region, &DEVICE_PROFILE).await {
            Ok(asset) => Some(asset),
            Err(e) => {
                // Most users never need the device output; its absence must
                // not block the primary submission.
                warn!(error = %e, "Device transcode failed; continuing without device output");
                None
            }
        };
        self.check_session(generation)?;

        // Stage 2: the universal upload is required.
        self.state.send_replace(SubmissionState::UploadingUniversal);
        let universal_url = self
            .store
            .upload_ring_asset(&draft.slug, &draft.submission_id, &universal)
            .await
            .map_err(|e| self.fail(SubmissionStage::UploadingUniversal, e.into()))?;
        self.check_session(generation)?;

        // Stage 3: the device upload is optional.
        let mut device_url = None;
        let mut device_size_bytes = None;
        if let Some(asset) = &device {
            self.state.send_replace(SubmissionState::UploadingDevice);
            match self
                .store
                .upload_ring_asset(&draft.slug, &draft.submission_id, asset)
                .await
            {
                Ok(url) => {
                    device_url = Some(url);
                    device_size_bytes = Some(asset.size_bytes);
                }
                Err(e) => {
                    warn!(error = %e, "Device upload failed; catalog row will omit it");
                }
            }
            self.check_session(generation)?;
        }

        // Stage 4: persist. Cancellation no longer applies past this point.
        self.state.send_replace(SubmissionState::Persisting);
        let record = RingRecord {
            id: RingId::new(),
            slug: draft.slug.clone(),
            metadata: draft.metadata.clone(),
            universal_url,
            device_url,
            duration_secs: draft.region.window_secs(),
            universal_size_bytes: universal.size_bytes,
            device_size_bytes,
            status: RingStatus::PendingReview,
            created_at: Utc::now(),
        };
        let ring_id = self
            .catalog
            .insert_ring(&record)
            .await
            .map_err(|e| self.fail(SubmissionStage::Persisting, e.into()))?;

        // Stage 5: best-effort side effects; failures are logged only.
        self.state.send_replace(SubmissionState::NotifyingSideEffects);
        let summary = RingSummary::from_record(ring_id.clone(), &record);
        if let Err(e) = self.notifier.notify(&summary).await {
            warn!(error = %e, "Submission notification failed");
        }
        for trigger in InvalidationTrigger::for_record(&record) {
            if let Err(e) = self.invalidator.invalidate(&trigger).await {
                warn!(tag = %trigger.tag(), error = %e, "Cache invalidation failed");
            }
        }

        info!(slug = %draft.slug, ring_id = %ring_id, "Submission complete");
        Ok(ring_id)
    }

    /// Discard completed async results when the session has moved on.
    fn check_session(&self, generation: u64) -> IngestResult<()> {
        if self.generation.load(Ordering::SeqCst) != generation {
            return Err(IngestError::SessionSuperseded);
        }
        Ok(())
    }

    /// Publish the errored state for a stage and hand the error back.
    fn fail(&self, stage: SubmissionStage, err: IngestError) -> IngestError {
        error!(stage = %stage, error = %err, "Submission failed");
        self.state.send_replace(SubmissionState::Errored {
            stage,
            message: format!("Something went wrong while {}. Please try again.", stage.describe()),
        });
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use rbox_catalog::CatalogError;
    use rbox_engine::EngineError;
    use rbox_models::ProfileKind;
    use std::time::Duration;

    mock! {
        Store {}

        #[async_trait]
        impl ObjectStore for Store {
            async fn upload_ring_asset(
                &self,
                slug: &str,
                submission_id: &str,
                asset: &EncodedAsset,
            ) -> StorageResult<String>;
        }
    }

    mock! {
        Writer {}

        #[async_trait]
        impl CatalogWriter for Writer {
            async fn insert_ring(&self, record: &RingRecord) -> CatalogResult<RingId>;
        }
    }

    mock! {
        Notify {}

        #[async_trait]
        impl Notifier for Notify {
            async fn notify(&self, summary: &RingSummary) -> anyhow::Result<()>;
        }
    }

    mock! {
        Invalidate {}

        #[async_trait]
        impl CacheInvalidator for Invalidate {
            async fn invalidate(&self, trigger: &InvalidationTrigger) -> anyhow::Result<()>;
        }
    }

    mock! {
        Trans {}

        #[async_trait]
        impl Transcoder for Trans {
            async fn transcode(
                &self,
                region: &Region,
                profile: &'static TranscodeProfile,
            ) -> EngineResult<EncodedAsset>;
        }
    }

    fn draft() -> SubmissionDraft {
        let metadata = RingMetadata {
            media_title: "Vaaranam Aayiram".to_string(),
            ring_title: "Ninaikatha".to_string(),
            variant_label: Some("BGM".to_string()),
            contributors: vec!["Harris Jayaraj".to_string()],
            moods: vec!["melancholy".to_string()],
        };
        SubmissionDraft::new(metadata, Region::centered(240.0)).unwrap()
    }

    fn asset(profile: ProfileKind) -> EncodedAsset {
        EncodedAsset::new(profile, vec![0u8; 64])
    }

    fn quiet_side_effects() -> (MockNotify, MockInvalidate) {
        let mut notifier = MockNotify::new();
        notifier.expect_notify().returning(|_| Ok(()));
        let mut invalidator = MockInvalidate::new();
        invalidator.expect_invalidate().returning(|_| Ok(()));
        (notifier, invalidator)
    }

    fn coordinator(
        store: MockStore,
        catalog: MockWriter,
        notifier: MockNotify,
        invalidator: MockInvalidate,
    ) -> SubmissionCoordinator {
        SubmissionCoordinator::new(
            Arc::new(store),
            Arc::new(catalog),
            Arc::new(notifier),
            Arc::new(invalidator),
        )
    }

    fn happy_transcoder() -> MockTrans {
        let mut transcoder = MockTrans::new();
        transcoder
            .expect_transcode()
            .returning(|_, profile| Ok(asset(profile.kind)));
        transcoder
    }

    #[tokio::test]
    async fn test_happy_path_reaches_done_with_both_urls() {
        let mut store = MockStore::new();
        store
            .expect_upload_ring_asset()
            .times(2)
            .returning(|slug, submission_id, asset| {
                let ext = asset.profile.profile().extension;
                Ok(format!("https://cdn.example/rings/{}/{}.{}", slug, submission_id, ext))
            });

        let mut catalog = MockWriter::new();
        catalog
            .expect_insert_ring()
            .withf(|record| {
                record.device_url.is_some()
                    && record.status == RingStatus::PendingReview
                    && record.universal_url.ends_with(".mp3")
            })
            .returning(|_| Ok(RingId::from_string("ring-1")));

        let (notifier, invalidator) = quiet_side_effects();
        let coordinator = coordinator(store, catalog, notifier, invalidator);

        let ring_id = coordinator.submit(&draft(), &happy_transcoder()).await.unwrap();
        assert_eq!(ring_id.as_str(), "ring-1");
        assert_eq!(
            coordinator.state(),
            SubmissionState::Done {
                ring_id: RingId::from_string("ring-1")
            }
        );
    }

    #[tokio::test]
    async fn test_device_transcode_failure_still_reaches_done() {
        let mut transcoder = MockTrans::new();
        transcoder.expect_transcode().returning(|_, profile| {
            if profile.kind == ProfileKind::Device {
                Err(EngineError::encode_failed(
                    ProfileKind::Device,
                    "device encode rejected",
                    None,
                    Some(1),
                ))
            } else {
                Ok(asset(profile.kind))
            }
        });

        let mut store = MockStore::new();
        // Only the universal asset is uploaded.
        store
            .expect_upload_ring_asset()
            .times(1)
            .withf(|_, _, asset| asset.profile == ProfileKind::Universal)
            .returning(|_, _, _| Ok("https://cdn.example/u.mp3".to_string()));

        let mut catalog = MockWriter::new();
        catalog
            .expect_insert_ring()
            .withf(|record| record.device_url.is_none() && record.device_size_bytes.is_none())
            .returning(|_| Ok(RingId::from_string("ring-2")));

        let (notifier, invalidator) = quiet_side_effects();
        let coordinator = coordinator(store, catalog, notifier, invalidator);

        let ring_id = coordinator.submit(&draft(), &transcoder).await.unwrap();
        assert_eq!(ring_id.as_str(), "ring-2");
    }

    #[tokio::test]
    async fn test_universal_transcode_failure_aborts_before_upload() {
        let mut transcoder = MockTrans::new();
        transcoder.expect_transcode().returning(|_, profile| {
            Err(EngineError::encode_failed(
                profile.kind,
                "engine rejected input",
                None,
                Some(1),
            ))
        });

        // No expectations: any upload or insert call panics the test.
        let store = MockStore::new();
        let catalog = MockWriter::new();
        let coordinator = coordinator(store, catalog, MockNotify::new(), MockInvalidate::new());

        let result = coordinator.submit(&draft(), &transcoder).await;
        assert!(matches!(result, Err(IngestError::Engine(_))));
        match coordinator.state() {
            SubmissionState::Errored { stage, message } => {
                assert_eq!(stage, SubmissionStage::Transcoding);
                assert!(message.contains("converting the audio"));
            }
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_universal_upload_failure_aborts() {
        let mut store = MockStore::new();
        store
            .expect_upload_ring_asset()
            .times(1)
            .returning(|_, _, _| Err(rbox_storage::StorageError::upload_failed("bucket down")));

        let catalog = MockWriter::new();
        let coordinator = coordinator(store, catalog, MockNotify::new(), MockInvalidate::new());

        let result = coordinator.submit(&draft(), &happy_transcoder()).await;
        assert!(matches!(result, Err(IngestError::Storage(_))));
        assert!(matches!(
            coordinator.state(),
            SubmissionState::Errored {
                stage: SubmissionStage::UploadingUniversal,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_device_upload_failure_is_skipped() {
        let mut store = MockStore::new();
        store
            .expect_upload_ring_asset()
            .times(2)
            .returning(|_, _, asset| match asset.profile {
                ProfileKind::Universal => Ok("https://cdn.example/u.mp3".to_string()),
                ProfileKind::Device => {
                    Err(rbox_storage::StorageError::upload_failed("device blob lost"))
                }
            });

        let mut catalog = MockWriter::new();
        catalog
            .expect_insert_ring()
            .withf(|record| record.device_url.is_none())
            .returning(|_| Ok(RingId::from_string("ring-3")));

        let (notifier, invalidator) = quiet_side_effects();
        let coordinator = coordinator(store, catalog, notifier, invalidator);

        assert!(coordinator.submit(&draft(), &happy_transcoder()).await.is_ok());
    }

    #[tokio::test]
    async fn test_persist_failure_errors_with_stage() {
        let mut store = MockStore::new();
        store
            .expect_upload_ring_asset()
            .returning(|_, _, _| Ok("https://cdn.example/u.mp3".to_string()));

        let mut catalog = MockWriter::new();
        catalog
            .expect_insert_ring()
            .returning(|_| Err(CatalogError::request_failed(500, "insert rejected")));

        let coordinator = coordinator(store, catalog, MockNotify::new(), MockInvalidate::new());

        let result = coordinator.submit(&draft(), &happy_transcoder()).await;
        assert!(matches!(result, Err(IngestError::Catalog(_))));
        assert!(matches!(
            coordinator.state(),
            SubmissionState::Errored {
                stage: SubmissionStage::Persisting,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_side_effect_failures_do_not_roll_back() {
        let mut store = MockStore::new();
        store
            .expect_upload_ring_asset()
            .returning(|_, _, _| Ok("https://cdn.example/u.mp3".to_string()));

        let mut catalog = MockWriter::new();
        catalog
            .expect_insert_ring()
            .returning(|_| Ok(RingId::from_string("ring-4")));

        let mut notifier = MockNotify::new();
        notifier
            .expect_notify()
            .returning(|_| Err(anyhow::anyhow!("webhook down")));
        let mut invalidator = MockInvalidate::new();
        invalidator
            .expect_invalidate()
            .returning(|_| Err(anyhow::anyhow!("revalidate down")));

        let coordinator = coordinator(store, catalog, notifier, invalidator);

        let ring_id = coordinator.submit(&draft(), &happy_transcoder()).await.unwrap();
        assert_eq!(ring_id.as_str(), "ring-4");
        assert!(matches!(coordinator.state(), SubmissionState::Done { .. }));
    }

    /// Transcoder stub that holds its await point open so a test can act
    /// while a submission is mid-flight.
    struct SlowTranscoder;

    #[async_trait]
    impl Transcoder for SlowTranscoder {
        async fn transcode(
            &self,
            _region: &Region,
            profile: &'static TranscodeProfile,
        ) -> EngineResult<EncodedAsset> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(asset(profile.kind))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_submission_rejected_while_in_flight() {
        let mut store = MockStore::new();
        store
            .expect_upload_ring_asset()
            .returning(|_, _, _| Ok("https://cdn.example/u.mp3".to_string()));
        let mut catalog = MockWriter::new();
        catalog
            .expect_insert_ring()
            .returning(|_| Ok(RingId::from_string("ring-5")));
        let (notifier, invalidator) = quiet_side_effects();

        let coordinator = Arc::new(coordinator(store, catalog, notifier, invalidator));

        let first = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.submit(&draft(), &SlowTranscoder).await })
        };
        tokio::task::yield_now().await;
        assert!(coordinator.state().is_busy());

        let second = coordinator.submit(&draft(), &SlowTranscoder).await;
        assert!(matches!(second, Err(IngestError::SubmissionInFlight)));

        assert!(first.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_session_discards_result() {
        // No upload/insert expectations: acting on the stale result panics.
        let store = MockStore::new();
        let catalog = MockWriter::new();
        let coordinator = Arc::new(coordinator(
            store,
            catalog,
            MockNotify::new(),
            MockInvalidate::new(),
        ));

        let submit = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.submit(&draft(), &SlowTranscoder).await })
        };
        tokio::task::yield_now().await;
        coordinator.invalidate_session();

        let result = submit.await.unwrap();
        assert!(matches!(result, Err(IngestError::SessionSuperseded)));
        assert_eq!(coordinator.state(), SubmissionState::Idle);
    }

    #[test]
    fn test_draft_rejects_empty_slug() {
        let metadata = RingMetadata {
            media_title: "??".to_string(),
            ring_title: "!!".to_string(),
            variant_label: None,
            contributors: vec![],
            moods: vec![],
        };
        assert!(matches!(
            SubmissionDraft::new(metadata, Region::centered(60.0)),
            Err(IngestError::InvalidMetadata(_))
        ));
    }
}
