//! Audio file probing.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};

/// Audio file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Duration in seconds
    pub duration_secs: f64,
    /// Audio codec name
    pub codec: String,
    /// File size in bytes
    pub size_bytes: u64,
    /// Sample rate in Hz
    pub sample_rate: Option<u32>,
    /// Channel count
    pub channels: Option<u32>,
}

/// Probe JSON output format.
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: String,
    codec_name: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
    duration: Option<String>,
}

/// Probe an audio file. Rejects files without an audio stream.
pub async fn probe_audio(engine: &Engine, path: impl AsRef<Path>) -> EngineResult<AudioInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(EngineError::FileNotFound(path.to_path_buf()));
    }

    let output = Command::new(&engine.ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(EngineError::probe_failed(
            "probe exited with an error",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    let probe: ProbeOutput = serde_json::from_slice(&output.stdout)?;

    let audio_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "audio")
        .ok_or_else(|| EngineError::NoAudioStream(path.to_path_buf()))?;

    // Container duration is authoritative; fall back to the stream's.
    let duration_secs = probe
        .format
        .duration
        .as_deref()
        .or(audio_stream.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| EngineError::probe_failed("no duration reported", None))?;

    let size_bytes = probe
        .format
        .size
        .as_deref()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    Ok(AudioInfo {
        duration_secs,
        codec: audio_stream.codec_name.clone().unwrap_or_default(),
        size_bytes,
        sample_rate: audio_stream
            .sample_rate
            .as_deref()
            .and_then(|s| s.parse().ok()),
        channels: audio_stream.channels,
    })
}
