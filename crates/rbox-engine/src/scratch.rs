//! Scratch-space entries in the engine workspace.
//!
//! Every file handed to or read back from the engine lives under the
//! engine's scratch root with a per-call unique name, so user retries and
//! back-to-back submissions never collide. Entries are removed on every
//! exit path: explicitly via [`ScratchEntry::release`], or on `Drop` when
//! an error or cancellation unwinds past the explicit call.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

/// Factory for uniquely-named entries under a scratch root.
#[derive(Debug, Clone)]
pub struct ScratchSpace {
    root: PathBuf,
}

impl ScratchSpace {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Claim a new uniquely-named entry. No file is created yet; the name
    /// is reserved by its uuid prefix.
    pub fn claim(&self, label: &str) -> ScratchEntry {
        let name = format!("{}-{}", Uuid::new_v4(), sanitize_label(label));
        ScratchEntry {
            path: self.root.join(name),
            released: false,
        }
    }
}

/// Keep labels filesystem-safe; the uuid prefix already guarantees
/// uniqueness.
fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "entry".to_string()
    } else {
        cleaned
    }
}

/// A uniquely-named file slot in the engine scratch space.
#[derive(Debug)]
pub struct ScratchEntry {
    path: PathBuf,
    released: bool,
}

impl ScratchEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the backing file. A missing file is fine (the engine may have
    /// failed before producing it).
    pub async fn release(mut self) {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "Released scratch entry"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to release scratch entry"),
        }
    }
}

impl Drop for ScratchEntry {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Released scratch entry on drop"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to release scratch entry on drop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_are_unique() {
        let space = ScratchSpace::new(std::env::temp_dir());
        let a = space.claim("in.mp3");
        let b = space.claim("in.mp3");
        assert_ne!(a.path(), b.path());
        assert!(a.path().to_string_lossy().ends_with("in.mp3"));
    }

    #[test]
    fn test_label_sanitized() {
        let space = ScratchSpace::new(std::env::temp_dir());
        let entry = space.claim("my song?.mp3");
        let name = entry.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("my_song_.mp3"), "got {}", name);
    }

    #[tokio::test]
    async fn test_release_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let space = ScratchSpace::new(dir.path().to_path_buf());
        let entry = space.claim("out.m4r");
        tokio::fs::write(entry.path(), b"data").await.unwrap();
        let path = entry.path().to_path_buf();

        entry.release().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let space = ScratchSpace::new(dir.path().to_path_buf());
        let path = {
            let entry = space.claim("out.mp3");
            std::fs::write(entry.path(), b"data").unwrap();
            entry.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_release_of_missing_file_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let space = ScratchSpace::new(dir.path().to_path_buf());
        // Never written; release must not error or panic.
        space.claim("ghost.mp3").release().await;
    }
}
