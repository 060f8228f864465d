//! Ring catalog models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Unique identifier for a ring catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RingId(pub String);

impl RingId {
    /// Generate a new random ring ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RingId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Moderation status of a catalog row.
///
/// Rows created by the ingestion pipeline are always `PendingReview`;
/// the transitions to the other states belong to the moderation dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RingStatus {
    /// Awaiting moderator approval
    #[default]
    PendingReview,
    /// Approved and publicly listed
    Approved,
    /// Rejected by a moderator
    Rejected,
}

impl RingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RingStatus::PendingReview => "pending_review",
            RingStatus::Approved => "approved",
            RingStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User-entered metadata for a ring.
///
/// The three title fields feed slug derivation; contributors and moods feed
/// the browse listings and their cache invalidation triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct RingMetadata {
    /// Source media name (film, album, show)
    #[validate(length(min = 1, max = 200))]
    pub media_title: String,

    /// Name of the ring itself
    #[validate(length(min = 1, max = 200))]
    pub ring_title: String,

    /// Optional variant/segment label ("bgm", "flute", "part 2")
    #[validate(length(max = 100))]
    #[serde(default)]
    pub variant_label: Option<String>,

    /// Contributor names (composer, artist, uploader credits)
    #[validate(length(max = 10))]
    #[serde(default)]
    pub contributors: Vec<String>,

    /// Mood tags for browsing
    #[validate(length(max = 10))]
    #[serde(default)]
    pub moods: Vec<String>,
}

impl RingMetadata {
    /// The three slug input fields, whitespace-trimmed.
    pub fn slug_fields(&self) -> (&str, &str, &str) {
        (
            self.media_title.trim(),
            self.ring_title.trim(),
            self.variant_label.as_deref().unwrap_or("").trim(),
        )
    }
}

/// A persisted catalog row.
///
/// `device_url` is absent when the device-profile output was skipped; the
/// submission is still complete without it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RingRecord {
    /// Unique row ID
    pub id: RingId,

    /// Canonical slug, unique across the catalog
    pub slug: String,

    /// User-entered metadata
    #[serde(flatten)]
    pub metadata: RingMetadata,

    /// Public URL of the universal-profile file
    pub universal_url: String,

    /// Public URL of the device-profile file, when produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_url: Option<String>,

    /// Trimmed clip duration in seconds
    pub duration_secs: f64,

    /// Universal file size in bytes
    pub universal_size_bytes: u64,

    /// Device file size in bytes, when produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_size_bytes: Option<u64>,

    /// Moderation status (always `pending_review` at insert time)
    pub status: RingStatus,

    /// Row creation time
    pub created_at: DateTime<Utc>,
}
