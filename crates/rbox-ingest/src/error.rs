//! Ingestion pipeline error types.

use thiserror::Error;

pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("The editing session was superseded")]
    SessionSuperseded,

    #[error("Engine error: {0}")]
    Engine(#[from] rbox_engine::EngineError),

    #[error("Storage error: {0}")]
    Storage(#[from] rbox_storage::StorageError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] rbox_catalog::CatalogError),
}

impl IngestError {
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    /// True when a stale session's result was discarded. Not a user-visible
    /// failure: the flow has simply moved on.
    pub fn is_session_superseded(&self) -> bool {
        matches!(self, IngestError::SessionSuperseded)
    }

    /// True for the terminal engine-load failure; the user must retry in a
    /// fresh session.
    pub fn is_engine_load_failure(&self) -> bool {
        matches!(self, IngestError::Engine(e) if e.is_load_failure())
    }
}
