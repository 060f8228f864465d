//! Engine command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use rbox_models::ProfileKind;

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};

/// Builder for engine invocations.
#[derive(Debug, Clone)]
pub struct EngineCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Seek offset in seconds (applied before the input for a fast seek)
    seek: Option<f64>,
    /// Output duration in seconds
    duration: Option<f64>,
    /// Audio codec
    audio_codec: Option<String>,
    /// Audio bitrate
    audio_bitrate: Option<String>,
    /// Audio filter chain
    audio_filter: Option<String>,
    /// Container format
    format: Option<String>,
    /// Drop any video/embedded-art stream
    strip_video: bool,
    /// Log level
    log_level: String,
}

impl EngineCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            seek: None,
            duration: None,
            audio_codec: None,
            audio_bitrate: None,
            audio_filter: None,
            format: None,
            strip_video: false,
            log_level: "error".to_string(),
        }
    }

    pub fn seek(mut self, secs: f64) -> Self {
        self.seek = Some(secs);
        self
    }

    pub fn duration(mut self, secs: f64) -> Self {
        self.duration = Some(secs);
        self
    }

    pub fn audio_codec(mut self, codec: &str) -> Self {
        self.audio_codec = Some(codec.to_string());
        self
    }

    pub fn audio_bitrate(mut self, bitrate: &str) -> Self {
        self.audio_bitrate = Some(bitrate.to_string());
        self
    }

    pub fn audio_filter(mut self, filter: impl Into<String>) -> Self {
        self.audio_filter = Some(filter.into());
        self
    }

    pub fn format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn strip_video(mut self) -> Self {
        self.strip_video = true;
        self
    }

    /// Build the argument list.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            self.log_level.clone(),
            "-y".to_string(),
        ];

        if let Some(seek) = self.seek {
            args.push("-ss".to_string());
            args.push(format!("{:.3}", seek));
        }

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        if let Some(duration) = self.duration {
            args.push("-t".to_string());
            args.push(format!("{:.3}", duration));
        }

        if self.strip_video {
            args.push("-vn".to_string());
        }

        if let Some(filter) = &self.audio_filter {
            args.push("-af".to_string());
            args.push(filter.clone());
        }

        if let Some(codec) = &self.audio_codec {
            args.push("-c:a".to_string());
            args.push(codec.clone());
        }

        if let Some(bitrate) = &self.audio_bitrate {
            args.push("-b:a".to_string());
            args.push(bitrate.clone());
        }

        if let Some(format) = &self.format {
            args.push("-f".to_string());
            args.push(format.clone());
        }

        args.push(self.output.to_string_lossy().to_string());
        args
    }
}

impl Engine {
    /// Run an encode command, mapping failure to the profile it was for.
    pub async fn run_encode(&self, cmd: &EngineCommand, profile: ProfileKind) -> EngineResult<()> {
        let args = cmd.build_args();
        debug!(profile = %profile, args = ?args, "Running engine encode");

        let output = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                EngineError::encode_failed(profile, format!("failed to spawn engine: {}", e), None, None)
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(EngineError::encode_failed(
                profile,
                "engine exited with an error",
                Some(stderr),
                output.status.code(),
            ));
        }

        Ok(())
    }
}
