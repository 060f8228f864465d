//! Audio transcoding engine binding.
//!
//! This crate provides:
//! - A lazily-initialized, process-wide engine singleton with a shared
//!   in-flight load and a sticky load failure
//! - Scratch-space (virtual filesystem) entries with per-call unique names
//!   and guaranteed release on every exit path
//! - Audio probing and waveform peak extraction for the trim UI
//! - Type-safe engine command building
//! - Per-profile transcoding producing in-memory encoded assets

pub mod command;
pub mod decode;
pub mod engine;
pub mod error;
pub mod filter;
pub mod probe;
pub mod scratch;
pub mod transcode;

pub use command::EngineCommand;
pub use decode::{load_source, SourceAudio, WAVEFORM_BUCKETS};
pub use engine::{acquire, Engine, EngineCell};
pub use error::{EngineError, EngineResult};
pub use filter::build_fade_filter;
pub use probe::{probe_audio, AudioInfo};
pub use scratch::{ScratchEntry, ScratchSpace};
pub use transcode::transcode;
