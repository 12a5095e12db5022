//! Post-transfer verification
//!
//! Runs once, after the whole batch has returned. Every outcome reported as
//! a success is checked against the destination directory; files that are
//! gone are downgraded to failures with the missing-file sentinel.

use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use crate::downloader::batch::ItemOutcome;
use crate::downloader::core::ProgressHooks;

/// Corrected outcomes plus the names that went missing
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub outcomes: Vec<ItemOutcome>,
    pub missing: Vec<String>,
}

impl Verification {
    pub fn all_present(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Re-check successful outcomes against `destination_dir`
pub async fn verify(
    mut outcomes: Vec<ItemOutcome>,
    destination_dir: &Path,
    hooks: &ProgressHooks,
) -> Verification {
    let mut missing = Vec::new();

    for outcome in outcomes.iter_mut().filter(|o| o.succeeded) {
        let path = destination_dir.join(&outcome.item_name);
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {
                hooks.log(&format!(
                    "{} verified (size: {} KiB)",
                    outcome.item_name,
                    metadata.len() / 1024
                ));
            }
            _ => {
                warn!(
                    "{} reported as installed but is absent from {}",
                    outcome.item_name,
                    destination_dir.display()
                );
                hooks.log(&format!(
                    "ERROR: {} was reported as downloaded but is missing from the folder",
                    outcome.item_name
                ));
                outcome.mark_missing();
                missing.push(outcome.item_name.clone());
            }
        }
    }

    if missing.is_empty() {
        info!("All downloaded files are present");
        hooks.log("All downloaded files are present in the folder");
    } else {
        hooks.log(&format!("WARNING: {} missing file(s) detected", missing.len()));
    }

    Verification { outcomes, missing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::core::{DownloadError, ErrorKind};
    use tempfile::tempdir;

    #[tokio::test]
    async fn present_files_are_left_untouched() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.jar"), b"data").unwrap();

        let outcomes = vec![ItemOutcome::success("a.jar")];
        let verification = verify(outcomes.clone(), dir.path(), &ProgressHooks::new()).await;

        assert_eq!(verification.outcomes, outcomes);
        assert!(verification.all_present());
    }

    #[tokio::test]
    async fn missing_success_is_downgraded() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.jar"), b"data").unwrap();

        let outcomes = vec![ItemOutcome::success("a.jar"), ItemOutcome::success("b.jar")];
        let verification = verify(outcomes, dir.path(), &ProgressHooks::new()).await;

        assert_eq!(verification.missing, vec!["b.jar"]);
        assert!(verification.outcomes[0].succeeded);
        assert!(verification.outcomes[1].is_missing_after_download());
        assert_eq!(verification.outcomes[1].error_kind, Some(ErrorKind::VerificationMissing));
    }

    #[tokio::test]
    async fn existing_failures_are_not_rechecked() {
        let dir = tempdir().unwrap();
        let err = DownloadError::NotFound { url: "https://host/c.jar".into() };
        let outcomes = vec![ItemOutcome::failure("c.jar", &err)];

        let verification = verify(outcomes.clone(), dir.path(), &ProgressHooks::new()).await;

        assert_eq!(verification.outcomes, outcomes);
        assert!(verification.missing.is_empty());
    }

    #[tokio::test]
    async fn directory_in_place_of_file_counts_as_missing() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("a.jar")).unwrap();

        let verification =
            verify(vec![ItemOutcome::success("a.jar")], dir.path(), &ProgressHooks::new()).await;

        assert_eq!(verification.missing, vec!["a.jar"]);
    }
}
