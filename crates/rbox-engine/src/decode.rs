//! Source audio loading and waveform peak extraction.
//!
//! Loading stages the user's file into the engine scratch space, probes it
//! for a sample-accurate duration, and decodes a downsampled mono stream
//! into peak buckets for the waveform display. The staged entry is owned by
//! the returned [`SourceAudio`] for the lifetime of the editing session and
//! freed when a new file is selected or the session ends.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::info;

use crate::engine::{acquire, Engine};
use crate::error::{EngineError, EngineResult};
use crate::probe::probe_audio;
use crate::scratch::ScratchEntry;

/// Number of peak buckets rendered by the waveform UI.
pub const WAVEFORM_BUCKETS: usize = 800;

/// Decode sample rate for peak extraction. Peaks only need envelope
/// resolution, not playback fidelity.
const PEAK_SAMPLE_RATE: u32 = 8_000;

/// A decoded source ready for region editing and transcoding.
#[derive(Debug)]
pub struct SourceAudio {
    entry: ScratchEntry,
    /// Sample-accurate duration in seconds
    pub duration_secs: f64,
    /// Source file size in bytes
    pub size_bytes: u64,
    /// Normalized waveform peaks in `[0, 1]`, one per bucket
    pub peaks: Vec<f32>,
}

impl SourceAudio {
    /// Path of the staged input inside the engine scratch space.
    pub fn path(&self) -> &Path {
        self.entry.path()
    }
}

/// Load a user-selected file into the engine and prepare it for editing.
pub async fn load_source(path: impl AsRef<Path>) -> EngineResult<SourceAudio> {
    let path = path.as_ref();
    let engine = acquire().await?;

    if !path.exists() {
        return Err(EngineError::FileNotFound(path.to_path_buf()));
    }

    let info = probe_audio(engine, path).await?;

    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "source".to_string());
    let entry = engine.scratch().claim(&label);

    tokio::fs::copy(path, entry.path()).await.map_err(|e| {
        EngineError::input_read_failed(format!("cannot stage {}: {}", path.display(), e))
    })?;

    let peaks = extract_peaks(engine, entry.path()).await?;

    info!(
        source = %path.display(),
        duration_secs = info.duration_secs,
        codec = %info.codec,
        "Source audio loaded"
    );

    Ok(SourceAudio {
        entry,
        duration_secs: info.duration_secs,
        size_bytes: info.size_bytes,
        peaks,
    })
}

/// Decode the staged file to mono PCM and bucket it into peaks.
async fn extract_peaks(engine: &Engine, staged: &Path) -> EngineResult<Vec<f32>> {
    let output = Command::new(&engine.ffmpeg)
        .args(["-hide_banner", "-loglevel", "error", "-i"])
        .arg(staged)
        .args(["-ac", "1", "-ar"])
        .arg(PEAK_SAMPLE_RATE.to_string())
        .args(["-f", "s16le", "pipe:1"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(EngineError::input_read_failed(format!(
            "waveform decode failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    Ok(bucket_peaks(&output.stdout, WAVEFORM_BUCKETS))
}

/// Fold little-endian s16 samples into `buckets` normalized peak values.
fn bucket_peaks(pcm: &[u8], buckets: usize) -> Vec<f32> {
    let sample_count = pcm.len() / 2;
    if sample_count == 0 || buckets == 0 {
        return Vec::new();
    }

    let per_bucket = (sample_count / buckets).max(1);
    let mut peaks = Vec::with_capacity(buckets.min(sample_count));

    let mut peak = 0i32;
    let mut in_bucket = 0usize;
    for pair in pcm.chunks_exact(2) {
        let sample = i16::from_le_bytes([pair[0], pair[1]]) as i32;
        peak = peak.max(sample.abs());
        in_bucket += 1;
        if in_bucket == per_bucket {
            peaks.push(peak as f32 / i16::MAX as f32);
            peak = 0;
            in_bucket = 0;
        }
    }
    if in_bucket > 0 {
        peaks.push(peak as f32 / i16::MAX as f32);
    }

    peaks
}
