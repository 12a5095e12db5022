//! Destination path validation
//!
//! Checks that an instance root exists, contains a mods folder, and that the
//! folder accepts new files, before any transfer is attempted.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ERROR_PATH_NOT_FOUND: &str = "The specified path does not exist.";
pub const ERROR_MODS_FOLDER_NOT_FOUND: &str =
    "The 'mods' folder could not be found. Check that this is a Minecraft instance folder.";
pub const ERROR_NO_WRITE_PERMISSION: &str =
    "Unable to write to this folder. Check the permissions.";

/// Outcome of validating an instance root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathValidation {
    pub is_valid: bool,
    pub error_message: Option<&'static str>,
}

impl PathValidation {
    fn valid() -> Self {
        Self { is_valid: true, error_message: None }
    }

    fn invalid(message: &'static str) -> Self {
        Self { is_valid: false, error_message: Some(message) }
    }
}

/// Validator for instance roots with a configurable mods sub-folder
#[derive(Debug, Clone)]
pub struct PathValidator {
    mods_folder: String,
}

impl Default for PathValidator {
    fn default() -> Self {
        Self::new("mods")
    }
}

impl PathValidator {
    pub fn new<S: Into<String>>(mods_folder: S) -> Self {
        Self { mods_folder: mods_folder.into() }
    }

    /// Check existence of the root and its mods folder, then probe for write access
    pub fn validate(&self, path: &str) -> PathValidation {
        if path.trim().is_empty() {
            return PathValidation::invalid(ERROR_PATH_NOT_FOUND);
        }

        let root = Path::new(path);
        if !root.is_dir() {
            return PathValidation::invalid(ERROR_PATH_NOT_FOUND);
        }

        let mods = self.mods_subpath(root);
        if !mods.is_dir() {
            return PathValidation::invalid(ERROR_MODS_FOLDER_NOT_FOUND);
        }

        if !can_write(&mods) {
            return PathValidation::invalid(ERROR_NO_WRITE_PERMISSION);
        }

        PathValidation::valid()
    }

    pub fn mods_subpath(&self, path: &Path) -> PathBuf {
        path.join(&self.mods_folder)
    }
}

fn can_write(dir: &Path) -> bool {
    let probe = dir.join(format!(".test_{}.tmp", uuid::Uuid::new_v4()));
    let result = fs::write(&probe, b"test").and_then(|()| fs::remove_file(&probe));
    if let Err(ref e) = result {
        debug!("Write probe in {} failed: {}", dir.display(), e);
    }
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn blank_and_missing_paths_are_rejected() {
        let validator = PathValidator::default();
        assert_eq!(validator.validate("   ").error_message, Some(ERROR_PATH_NOT_FOUND));
        assert_eq!(
            validator.validate("/definitely/not/here/instance").error_message,
            Some(ERROR_PATH_NOT_FOUND)
        );
    }

    #[test]
    fn instance_without_mods_folder_is_rejected() {
        let dir = tempdir().unwrap();
        let result = PathValidator::default().validate(dir.path().to_str().unwrap());
        assert!(!result.is_valid);
        assert_eq!(result.error_message, Some(ERROR_MODS_FOLDER_NOT_FOUND));
    }

    #[test]
    fn writable_instance_is_valid_and_probe_is_cleaned_up() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("mods")).unwrap();

        let result = PathValidator::default().validate(dir.path().to_str().unwrap());
        assert_eq!(result, PathValidation::valid());
        assert_eq!(std::fs::read_dir(dir.path().join("mods")).unwrap().count(), 0);
    }

    #[test]
    fn mods_subpath_joins_folder() {
        let validator = PathValidator::new("mods");
        assert_eq!(
            validator.mods_subpath(Path::new("/instances/pack")),
            PathBuf::from("/instances/pack/mods")
        );
    }
}
