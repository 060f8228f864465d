//! Transcode profile definitions.
//!
//! Exactly two output targets exist and they are build-time constants,
//! never negotiated at runtime.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default audio bitrate for both profiles.
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";

/// Which of the two fixed output targets an asset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    /// General-purpose MP3, playable everywhere
    Universal,
    /// Device ringtone container (AAC in an `ipod` container renamed `.m4r`)
    Device,
}

impl ProfileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Universal => "universal",
            ProfileKind::Device => "device",
        }
    }

    /// The build-time profile constant for this kind.
    pub fn profile(&self) -> &'static TranscodeProfile {
        match self {
            ProfileKind::Universal => &UNIVERSAL_PROFILE,
            ProfileKind::Device => &DEVICE_PROFILE,
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fixed codec/container/bitrate target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeProfile {
    /// Which target this is
    pub kind: ProfileKind,
    /// Audio codec passed to the engine
    pub codec: &'static str,
    /// Container format passed to the engine
    pub container: &'static str,
    /// Audio bitrate
    pub bitrate: &'static str,
    /// Output file extension (without dot)
    pub extension: &'static str,
    /// Drop any video/embedded-art stream from the output
    pub strip_video: bool,
}

/// General-purpose MP3 output.
pub const UNIVERSAL_PROFILE: TranscodeProfile = TranscodeProfile {
    kind: ProfileKind::Universal,
    codec: "libmp3lame",
    container: "mp3",
    bitrate: DEFAULT_AUDIO_BITRATE,
    extension: "mp3",
    strip_video: false,
};

/// Device ringtone output.
///
/// The codec is plain AAC, shared with other outputs in the system; what
/// makes this a device ringtone is the `ipod` container and the `.m4r`
/// extension, plus stripping any video stream the source carried.
pub const DEVICE_PROFILE: TranscodeProfile = TranscodeProfile {
    kind: ProfileKind::Device,
    codec: "aac",
    container: "ipod",
    bitrate: DEFAULT_AUDIO_BITRATE,
    extension: "m4r",
    strip_video: true,
};

/// An encoded output blob, produced by the engine and consumed exactly once
/// by the upload step.
#[derive(Debug, Clone)]
pub struct EncodedAsset {
    /// Which profile produced it
    pub profile: ProfileKind,
    /// Encoded file contents
    pub bytes: Vec<u8>,
    /// Size of `bytes`, recorded separately for the catalog row
    pub size_bytes: u64,
}

impl EncodedAsset {
    pub fn new(profile: ProfileKind, bytes: Vec<u8>) -> Self {
        let size_bytes = bytes.len() as u64;
        Self {
            profile,
            bytes,
            size_bytes,
        }
    }
}
