//! Main entry point for the install pipeline
//!
//! The call chain flows as follows:
//!
//! User Code
//! ↓
//! Installer (this file)
//! ↓
//! manifest::fetch_manifest → batch::install_all → verify::verify → report::summarize
//! ↓
//! HttpClient::transfer (core/http.rs)
//! ↓
//! Core types (core/*)

use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::downloader::{
    batch::{self, BatchReport},
    config::DownloadConfig,
    core::{DownloadError, HttpClient, ProgressHooks, Result},
    manifest,
    report::{self, InstallSummary},
    verify,
};

/// Installer owning one shared HTTP client for the whole process
#[derive(Debug, Clone)]
pub struct Installer {
    client: HttpClient,
    config: DownloadConfig,
}

impl Installer {
    /// Create an installer with the given configuration
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let client = HttpClient::from_config(&config)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Directory items are written to for a given instance root
    pub fn mods_dir(&self, instance_root: &Path) -> PathBuf {
        instance_root.join(&self.config.mods_folder)
    }

    /// Transfer a single file, reporting [`TransferProgress`](crate::TransferProgress) ticks
    pub async fn transfer(
        &self,
        url: &str,
        dest_path: &Path,
        hooks: &ProgressHooks,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        self.client
            .transfer(url, dest_path, hooks.on_progress.clone(), hooks.on_log.as_ref(), cancel)
            .await
    }

    /// Fetch the list of item names from the configured manifest endpoint
    pub async fn fetch_manifest(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        manifest::fetch_manifest(
            &self.client,
            &self.config.manifest_url,
            self.config.manifest_timeout,
            cancel,
        )
        .await
    }

    /// Transfer `item_names` into `destination_dir`, one at a time
    pub async fn install_all(
        &self,
        item_names: &[String],
        destination_dir: &Path,
        hooks: &ProgressHooks,
        cancel: &CancellationToken,
    ) -> BatchReport {
        batch::install_all(&self.client, &self.config, item_names, destination_dir, hooks, cancel)
            .await
    }

    /// Run the whole pipeline against an already validated instance root.
    ///
    /// Manifest failures, an empty manifest and cancellation abort the run.
    /// Per-item failures end up in the returned summary.
    pub async fn run(
        &self,
        instance_root: &Path,
        hooks: &ProgressHooks,
        cancel: &CancellationToken,
    ) -> Result<InstallSummary> {
        hooks.log("Downloading the mod list...");
        let items = match self.fetch_manifest(cancel).await {
            Ok(items) => items,
            Err(e) => {
                hooks.log(&format!("Error while downloading the mod list: {}", e.user_message()));
                return Err(e);
            }
        };

        if items.is_empty() {
            hooks.log("Error: the mod list is empty");
            return Err(DownloadError::EmptyManifest);
        }

        hooks.log(&format!("Mod list downloaded ({} mod(s) found)", items.len()));
        hooks.log("Mods to download:");
        for item in &items {
            hooks.log(&format!("  - {item}"));
        }

        let mods_dir = self.mods_dir(instance_root);
        hooks.log(&format!("Downloading into: {}", mods_dir.display()));

        let report = self.install_all(&items, &mods_dir, hooks, cancel).await;
        if report.cancelled {
            hooks.log("Installation cancelled by the user");
            return Err(DownloadError::Cancelled);
        }

        info!(
            "Batch finished: {} succeeded, {} failed, {} bytes in {:?}",
            report.successful(),
            report.failed(),
            report.bytes_transferred,
            report.duration
        );
        hooks.log(&format!(
            "Downloads finished, checking results... ({} mod(s) processed)",
            report.outcomes.len()
        ));
        for outcome in &report.outcomes {
            if outcome.succeeded {
                hooks.log(&format!("✓ {} - downloaded", outcome.item_name));
            } else {
                hooks.log(&format!(
                    "✗ {} - failed: {}",
                    outcome.item_name,
                    outcome.error_message.as_deref().unwrap_or_default()
                ));
            }
        }

        hooks.log("Checking that the files are present in the folder...");
        let verification = verify::verify(report.outcomes, &mods_dir, hooks).await;
        let summary = report::summarize(&verification.outcomes);

        if summary.is_complete_success() {
            hooks.log(&format!(
                "Installation completed successfully! {} mod(s) installed",
                summary.succeeded.len()
            ));
        } else {
            hooks.log(&format!("Installation finished with {} error(s)", summary.failed()));
        }

        Ok(summary)
    }
}
