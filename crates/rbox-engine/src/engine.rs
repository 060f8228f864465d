//! Lazily-initialized engine singleton.
//!
//! The engine is process-wide state: the first caller triggers the load,
//! concurrent callers await the same in-flight initialization, and a failed
//! load is sticky. Every later caller sees the same `LoadFailed` rather
//! than a fresh load attempt.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::scratch::ScratchSpace;

/// Environment variable overriding the scratch root directory.
const SCRATCH_DIR_ENV: &str = "RBOX_ENGINE_SCRATCH_DIR";

/// A loaded engine: resolved binaries plus the scratch root.
#[derive(Debug)]
pub struct Engine {
    pub(crate) ffmpeg: PathBuf,
    pub(crate) ffprobe: PathBuf,
    scratch_root: PathBuf,
}

impl Engine {
    /// Locate and verify the engine binaries, and create the scratch root.
    async fn load() -> EngineResult<Self> {
        let ffmpeg = which::which("ffmpeg")
            .map_err(|_| EngineError::load_failed("ffmpeg not found in PATH"))?;
        let ffprobe = which::which("ffprobe")
            .map_err(|_| EngineError::load_failed("ffprobe not found in PATH"))?;

        // A binary that exists but cannot execute is still a load failure.
        let output = Command::new(&ffmpeg)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| EngineError::load_failed(format!("ffmpeg -version failed: {}", e)))?;
        if !output.status.success() {
            return Err(EngineError::load_failed(format!(
                "ffmpeg -version exited with {:?}",
                output.status.code()
            )));
        }

        let scratch_root = std::env::var(SCRATCH_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("rbox-engine"));
        tokio::fs::create_dir_all(&scratch_root).await.map_err(|e| {
            EngineError::load_failed(format!(
                "cannot create scratch root {}: {}",
                scratch_root.display(),
                e
            ))
        })?;

        info!(
            ffmpeg = %ffmpeg.display(),
            scratch_root = %scratch_root.display(),
            "Audio engine loaded"
        );

        Ok(Self {
            ffmpeg,
            ffprobe,
            scratch_root,
        })
    }

    /// Scratch space rooted at this engine's workspace directory.
    pub fn scratch(&self) -> ScratchSpace {
        ScratchSpace::new(self.scratch_root.clone())
    }
}

/// Sticky, cloneable load failure stored in the cell.
#[derive(Debug, Clone)]
struct LoadError(String);

/// Shared single-load cell for an [`Engine`].
///
/// Kept separate from the static so the load-once behavior is testable with
/// a stub loader.
pub struct EngineCell {
    cell: OnceCell<Result<Engine, LoadError>>,
}

impl EngineCell {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    /// Get the engine, running `loader` at most once across all callers.
    pub async fn get_or_load<F, Fut>(&self, loader: F) -> EngineResult<&Engine>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = EngineResult<Engine>>,
    {
        let slot = self
            .cell
            .get_or_init(|| async {
                debug!("Initializing audio engine");
                loader().await.map_err(|e| LoadError(e.to_string()))
            })
            .await;

        match slot {
            Ok(engine) => Ok(engine),
            Err(e) => Err(EngineError::LoadFailed(e.0.clone())),
        }
    }
}

impl Default for EngineCell {
    fn default() -> Self {
        Self::new()
    }
}

static ENGINE: EngineCell = EngineCell::new();

/// Acquire the process-wide engine, loading it on first use.
pub async fn acquire() -> EngineResult<&'static Engine> {
    ENGINE.get_or_load(Engine::load).await
}
