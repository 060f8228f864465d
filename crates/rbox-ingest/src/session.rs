//! Editing session lifecycle.
//!
//! One session owns one decoded source and one region model. Selecting a
//! new file replaces the session wholesale: the old staged audio is freed
//! when the old session drops, and the caller invalidates the coordinator
//! so results from the superseded flow are discarded.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use rbox_engine::{load_source, SourceAudio};
use rbox_models::RingMetadata;

use crate::coordinator::{EngineTranscoder, SubmissionDraft};
use crate::error::IngestResult;
use crate::region::RegionModel;

/// One file's editing session: staged source plus its trim window.
pub struct EditingSession {
    source: Arc<SourceAudio>,
    region: RegionModel,
}

impl EditingSession {
    /// Load a user-selected file and auto-center the default window.
    pub async fn open(path: impl AsRef<Path>) -> IngestResult<Self> {
        let source = load_source(path.as_ref()).await?;
        let region = RegionModel::new(source.duration_secs);
        info!(
            duration_secs = source.duration_secs,
            peaks = source.peaks.len(),
            "Editing session opened"
        );
        Ok(Self {
            source: Arc::new(source),
            region,
        })
    }

    pub fn source(&self) -> &Arc<SourceAudio> {
        &self.source
    }

    pub fn region(&self) -> &RegionModel {
        &self.region
    }

    /// Transcoder bound to this session's staged source.
    pub fn transcoder(&self) -> EngineTranscoder {
        EngineTranscoder::new(Arc::clone(&self.source))
    }

    /// Build a validated draft from the current region and the given
    /// metadata. The draft survives a failed submission; a retry reuses it.
    pub fn draft(&self, metadata: RingMetadata) -> IngestResult<SubmissionDraft> {
        SubmissionDraft::new(metadata, self.region.current())
    }
}
