//! Client-side media ingestion pipeline.
//!
//! This crate sequences the RingBox upload flow: a decoded source feeds the
//! reactive region model, the region plus metadata feed the dual-profile
//! transcode, and the submission coordinator owns all I/O to the external
//! collaborators (object storage, catalog, webhook, cache revalidation)
//! with defined partial-failure semantics.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod region;
pub mod session;
pub mod side_effects;
pub mod slug_check;

pub use config::IngestConfig;
pub use coordinator::{
    CatalogWriter, EngineTranscoder, ObjectStore, SubmissionCoordinator, SubmissionDraft,
    SubmissionStage, SubmissionState, Transcoder,
};
pub use error::{IngestError, IngestResult};
pub use region::RegionModel;
pub use session::EditingSession;
pub use side_effects::{
    CacheInvalidator, HttpCacheInvalidator, InvalidationTrigger, Notifier, RingSummary,
    WebhookNotifier,
};
pub use slug_check::{CatalogLookup, SlugChecker, SlugStatus, DEFAULT_DEBOUNCE_MS};
