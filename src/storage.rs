// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for recorded movies
//!
//! Recordings are written to a temporary file first. A usable recording is
//! exported into the video library; a discarded one is deleted.

use crate::constants::MOVIE_EXTENSION;
use crate::errors::{AppError, AppResult};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Library subdirectory name
const LIBRARY_DIR_NAME: &str = "flaneur";

/// Unique path for a new recording in the temporary directory
pub fn temporary_recording_path() -> PathBuf {
    std::env::temp_dir()
        .join(Uuid::new_v4().to_string())
        .with_extension(MOVIE_EXTENSION)
}

/// Default export directory (`~/Videos/flaneur`)
pub fn default_library_dir() -> Option<PathBuf> {
    dirs::video_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Videos")))
        .map(|dir| dir.join(LIBRARY_DIR_NAME))
}

/// Pick a name in `dir` that does not exist yet, based on the current time
fn export_target(dir: &Path, extension: &str) -> PathBuf {
    let stem = format!("video_{}", Local::now().format("%Y%m%d_%H%M%S"));
    let mut candidate = dir.join(&stem).with_extension(extension);
    let mut counter = 1;
    while candidate.exists() {
        candidate = dir
            .join(format!("{}_{}", stem, counter))
            .with_extension(extension);
        counter += 1;
    }
    candidate
}

/// Copy a finished recording into the library directory
///
/// The directory is created if needed. Returns the exported path.
pub async fn export_recording(source: &Path, library_dir: &Path) -> AppResult<PathBuf> {
    if !tokio::fs::try_exists(source).await? {
        return Err(AppError::Storage(format!(
            "recording {} does not exist",
            source.display()
        )));
    }
    tokio::fs::create_dir_all(library_dir).await?;

    let extension = source
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or(MOVIE_EXTENSION);
    let target = export_target(library_dir, extension);
    tokio::fs::copy(source, &target).await?;

    info!(
        source = %source.display(),
        target = %target.display(),
        "Exported recording"
    );
    Ok(target)
}

/// Delete a discarded temporary recording; a missing file is fine
pub async fn discard_recording(path: &Path) -> AppResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed discarded recording");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("flaneur-storage-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_temporary_paths_are_unique_movies() {
        let a = temporary_recording_path();
        let b = temporary_recording_path();
        assert_ne!(a, b);
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some(MOVIE_EXTENSION));
        assert!(a.starts_with(std::env::temp_dir()));
    }

    #[tokio::test]
    async fn test_export_copies_and_avoids_collisions() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let source = dir.join("clip.mov");
        std::fs::write(&source, b"movie").unwrap();
        let library = dir.join("library");

        let first = export_recording(&source, &library).await.unwrap();
        let second = export_recording(&source, &library).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(std::fs::read(&first).unwrap(), b"movie");
        assert!(source.exists());
        let name = first.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("video_") && name.ends_with(".mov"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_export_missing_source_fails() {
        let dir = scratch_dir();
        let result = export_recording(&dir.join("missing.mov"), &dir).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn test_discard_is_idempotent() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("short.mov");
        std::fs::write(&path, b"x").unwrap();

        discard_recording(&path).await.unwrap();
        assert!(!path.exists());
        discard_recording(&path).await.unwrap();

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
