//! File operation utilities
//!
//! Staging files, destination clearing and promotion. A staged file is held
//! through a [`StagingFile`] guard so that it disappears on every exit path.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::fs;
use tracing::debug;

use crate::downloader::core::{DownloadError, FileOperation, Result};

/// Uniquely named scratch file, deleted when dropped
#[derive(Debug)]
pub struct StagingFile {
    path: TempPath,
}

impl StagingFile {
    /// Allocate `<dir>/.<random>.tmp` and open it for async writing
    pub fn create_in(dir: &Path) -> Result<(Self, fs::File)> {
        let named = tempfile::Builder::new()
            .prefix(".")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| DownloadError::from_io(dir, FileOperation::Create, e))?;

        let (file, path) = named.into_parts();
        debug!("Allocated staging file {}", path.display());
        Ok((Self { path }, fs::File::from_std(file)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the staged content; fails when the file is gone
    pub async fn len(&self) -> Result<u64> {
        let metadata = fs::metadata(self.path())
            .await
            .map_err(|e| DownloadError::io(self.path(), FileOperation::Metadata, e))?;
        Ok(metadata.len())
    }

    /// Move the staged file onto `dest_path`, consuming the guard
    pub async fn promote(self, dest_path: &Path) -> Result<()> {
        match fs::rename(self.path(), dest_path).await {
            Ok(()) => {}
            Err(e) if is_cross_device(&e) => {
                // Scratch dir lives on another volume, so fall back to copy
                debug!("Staging dir on another volume, copying to {}", dest_path.display());
                fs::copy(self.path(), dest_path)
                    .await
                    .map_err(|e| DownloadError::io(dest_path, FileOperation::Move, e))?;
            }
            Err(e) => return Err(DownloadError::io(dest_path, FileOperation::Move, e)),
        }

        debug!("Promoted {} to {}", self.path().display(), dest_path.display());
        // After a rename the guard's path no longer exists and its cleanup is a no-op
        drop(self);
        Ok(())
    }
}

/// Delete whatever currently sits at `dest_path`
pub async fn remove_existing(dest_path: &Path) -> Result<bool> {
    match fs::remove_file(dest_path).await {
        Ok(()) => {
            debug!("Removed previous file at {}", dest_path.display());
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(DownloadError::io(dest_path, FileOperation::Delete, e)),
    }
}

/// Check that `path` is present after promotion
pub async fn ensure_exists(path: &Path) -> Result<()> {
    match fs::try_exists(path).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(DownloadError::io(
            path,
            FileOperation::Metadata,
            io::Error::new(io::ErrorKind::NotFound, "destination missing after promotion"),
        )),
        Err(e) => Err(DownloadError::io(path, FileOperation::Metadata, e)),
    }
}

/// Directory that should hold the staging file for `dest_path`
pub fn staging_dir_for(dest_path: &Path, configured: Option<&Path>) -> PathBuf {
    match configured {
        Some(dir) => dir.to_path_buf(),
        None => dest_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
    }
}

fn is_cross_device(error: &io::Error) -> bool {
    // EXDEV on unix, ERROR_NOT_SAME_DEVICE on windows
    if cfg!(windows) {
        error.raw_os_error() == Some(17)
    } else {
        error.raw_os_error() == Some(18)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn staging_file_is_removed_on_drop() {
        let dir = tempdir().unwrap();
        let (staging, mut file) = StagingFile::create_in(dir.path()).unwrap();
        file.write_all(b"partial").await.unwrap();
        drop(file);

        let path = staging.path().to_path_buf();
        assert!(path.exists());
        assert!(path.starts_with(dir.path()));

        drop(staging);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn promote_replaces_staged_path() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("mod.jar");
        let (staging, mut file) = StagingFile::create_in(dir.path()).unwrap();
        file.write_all(b"payload").await.unwrap();
        file.flush().await.unwrap();
        drop(file);

        let staged = staging.path().to_path_buf();
        assert_eq!(staging.len().await.unwrap(), 7);
        staging.promote(&dest).await.unwrap();

        assert!(!staged.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
        ensure_exists(&dest).await.unwrap();
    }

    #[tokio::test]
    async fn remove_existing_tolerates_absent_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("absent.jar");
        assert!(!remove_existing(&dest).await.unwrap());

        std::fs::write(&dest, b"old").unwrap();
        assert!(remove_existing(&dest).await.unwrap());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn ensure_exists_reports_missing_destination() {
        let dir = tempdir().unwrap();
        let err = ensure_exists(&dir.path().join("nope")).await.unwrap_err();
        assert_eq!(err.kind(), crate::downloader::core::ErrorKind::IoError);
    }

    #[test]
    fn staging_dir_defaults_to_destination_parent() {
        let dest = Path::new("/games/instance/mods/a.jar");
        assert_eq!(staging_dir_for(dest, None), PathBuf::from("/games/instance/mods"));
        assert_eq!(
            staging_dir_for(dest, Some(Path::new("/scratch"))),
            PathBuf::from("/scratch")
        );
        assert_eq!(staging_dir_for(Path::new("a.jar"), None), PathBuf::from("."));
    }
}
