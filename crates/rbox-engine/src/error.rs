//! Error types for engine operations.

use std::path::PathBuf;
use thiserror::Error;

use rbox_models::ProfileKind;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while loading or driving the audio engine.
///
/// Everything except `LoadFailed` is recoverable by resubmitting from the
/// transcode step; `LoadFailed` is terminal for the process lifetime.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine load failed: {0}")]
    LoadFailed(String),

    #[error("Encode failed for {profile} profile: {message}")]
    EncodeFailed {
        profile: ProfileKind,
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Failed to read input: {0}")]
    InputReadFailed(String),

    #[error("Probe failed: {message}")]
    ProbeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("No audio stream in {0}")]
    NoAudioStream(PathBuf),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Create an engine load failure.
    pub fn load_failed(message: impl Into<String>) -> Self {
        Self::LoadFailed(message.into())
    }

    /// Create an encode failure for a profile.
    pub fn encode_failed(
        profile: ProfileKind,
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::EncodeFailed {
            profile,
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an input read failure.
    pub fn input_read_failed(message: impl Into<String>) -> Self {
        Self::InputReadFailed(message.into())
    }

    /// Create a probe failure.
    pub fn probe_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ProbeFailed {
            message: message.into(),
            stderr,
        }
    }

    /// True for the terminal load failure state.
    pub fn is_load_failure(&self) -> bool {
        matches!(self, EngineError::LoadFailed(_))
    }

    /// Which profile an encode failure belongs to, if any.
    pub fn failed_profile(&self) -> Option<ProfileKind> {
        match self {
            EngineError::EncodeFailed { profile, .. } => Some(*profile),
            _ => None,
        }
    }
}
