//! Shared data models for the RingBox backend.
//!
//! This crate provides Serde-serializable types for:
//! - Ring catalog rows and user-entered metadata
//! - Transcode profiles (the two fixed output targets)
//! - The trim region value type and its clamping rules
//! - Canonical slug derivation

pub mod profile;
pub mod region;
pub mod ring;
pub mod slug;

// Re-export common types
pub use profile::{EncodedAsset, ProfileKind, TranscodeProfile, DEVICE_PROFILE, UNIVERSAL_PROFILE};
pub use region::{Region, DEFAULT_DURATION_SECS, FADE_SECS, MIN_DURATION_SECS};
pub use ring::{RingId, RingMetadata, RingRecord, RingStatus};
pub use slug::derive_slug;
