//! Scoped on-disk staging for audio assets.
//!
//! Transcription providers read from files, so each request writes its audio
//! to a staged path first. [`StagedAudio`] removes the file when dropped,
//! which covers every exit path of the owning operation: normal completion,
//! `?` propagation, early return, and panic unwinding.

use super::AudioAsset;
use crate::error::{FortellError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Factory for staged audio files under a configured directory.
#[derive(Debug, Clone)]
pub struct AudioStaging {
    dir: PathBuf,
}

impl AudioStaging {
    /// Create a staging area rooted at `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| FortellError::Staging(format!("cannot create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    /// Write the asset's bytes to a uniquely named file in the staging dir.
    ///
    /// Uniqueness is by construction: millisecond timestamp plus a random
    /// UUID suffix, so concurrent requests never collide without locking.
    pub async fn stage(&self, asset: &AudioAsset) -> Result<StagedAudio> {
        let name = format!(
            "{}-{}.{}",
            chrono::Utc::now().timestamp_millis(),
            uuid::Uuid::new_v4().simple(),
            asset.file_extension()
        );
        let path = self.dir.join(name);

        tokio::fs::write(&path, &asset.bytes)
            .await
            .map_err(|e| FortellError::Staging(format!("cannot write {}: {e}", path.display())))?;

        debug!("Staged {} bytes at {}", asset.byte_len, path.display());
        Ok(StagedAudio { path })
    }
}

/// Handle to one staged file. Removes the file on drop.
#[derive(Debug)]
pub struct StagedAudio {
    path: PathBuf,
}

impl StagedAudio {
    /// Path of the staged file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedAudio {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to release staged file {}: {e}", self.path.display());
            }
        }
    }
}
