//! Sequential batch installation
//!
//! Items are transferred strictly one after another, in manifest order, with
//! a cancellable pause between them. Per-item failures become outcomes; only
//! cancellation stops the loop early.

use std::path::{Component, Path};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::downloader::config::DownloadConfig;
use crate::downloader::core::{
    BatchProgress, DownloadError, ErrorKind, HttpClient, ProgressCallback, ProgressHooks, Result,
    TransferProgress, MISSING_AFTER_DOWNLOAD,
};

/// Result of one manifest entry
#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    pub item_name: String,
    pub succeeded: bool,
    pub error_message: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

impl ItemOutcome {
    pub fn success<S: Into<String>>(item_name: S) -> Self {
        Self {
            item_name: item_name.into(),
            succeeded: true,
            error_message: None,
            error_kind: None,
        }
    }

    pub fn failure<S: Into<String>>(item_name: S, error: &DownloadError) -> Self {
        Self {
            item_name: item_name.into(),
            succeeded: false,
            error_message: Some(error.user_message()),
            error_kind: Some(error.kind()),
        }
    }

    /// Downgrade a reported success whose file is no longer on disk
    pub fn mark_missing(&mut self) {
        self.succeeded = false;
        self.error_message = Some(MISSING_AFTER_DOWNLOAD.to_string());
        self.error_kind = Some(ErrorKind::VerificationMissing);
    }

    pub fn is_missing_after_download(&self) -> bool {
        !self.succeeded && self.error_message.as_deref() == Some(MISSING_AFTER_DOWNLOAD)
    }
}

/// Result of a batch run
#[derive(Debug)]
pub struct BatchReport {
    /// One entry per attempted item, in manifest order
    pub outcomes: Vec<ItemOutcome>,
    /// Set when the run stopped on the cancellation token
    pub cancelled: bool,
    /// Bytes written across all successful items
    pub bytes_transferred: u64,
    /// Total time taken for the batch
    pub duration: Duration,
}

impl BatchReport {
    pub fn successful(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.successful()
    }
}

/// Install every item of `item_names` into `destination_dir`, in order.
///
/// Never fails as a whole; inspect [`BatchReport::cancelled`] for an early stop.
/// Items that were never started get no outcome.
pub async fn install_all(
    client: &HttpClient,
    config: &DownloadConfig,
    item_names: &[String],
    destination_dir: &Path,
    hooks: &ProgressHooks,
    cancel: &CancellationToken,
) -> BatchReport {
    let total = item_names.len();
    let start_time = Instant::now();
    let mut outcomes = Vec::with_capacity(total);
    let mut bytes_transferred = 0;

    let finish = |outcomes: Vec<ItemOutcome>, bytes_transferred: u64, cancelled: bool| BatchReport {
        outcomes,
        cancelled,
        bytes_transferred,
        duration: start_time.elapsed(),
    };

    info!("Installing {} item(s) into {}", total, destination_dir.display());

    for (index, name) in item_names.iter().enumerate() {
        if cancel.is_cancelled() {
            return finish(outcomes, bytes_transferred, true);
        }

        hooks.log(&format!("Downloading {name} ({}/{total})", index + 1));
        let on_progress = wrap_progress(hooks, index, total, name);

        match install_one(client, config, name, destination_dir, on_progress, hooks, cancel).await {
            Ok(size) => {
                debug!("Installed {} ({} bytes)", name, size);
                hooks.log(&format!("{name} downloaded ({size} bytes)"));
                bytes_transferred += size;
                outcomes.push(ItemOutcome::success(name.as_str()));
            }
            Err(DownloadError::Cancelled) => {
                hooks.log(&format!("{name} cancelled"));
                return finish(outcomes, bytes_transferred, true);
            }
            Err(e) => {
                warn!("Failed to install {} [{}]: {}", name, e.category(), e);
                let outcome = ItemOutcome::failure(name.as_str(), &e);
                hooks.log(&format!(
                    "{name} failed: {}",
                    outcome.error_message.as_deref().unwrap_or_default()
                ));
                outcomes.push(outcome);
            }
        }

        // Count the item as done even if its final byte tick never came
        if let Some(ref callback) = hooks.on_batch_progress {
            callback(BatchProgress {
                current_item_index: index + 1,
                total_items: total,
                current_item_name: name.clone(),
                current_item_progress: None,
            });
        }

        if index + 1 < total {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return finish(outcomes, bytes_transferred, true),
                _ = tokio::time::sleep(config.pacing_delay) => {}
            }
        }
    }

    finish(outcomes, bytes_transferred, false)
}

async fn install_one(
    client: &HttpClient,
    config: &DownloadConfig,
    name: &str,
    destination_dir: &Path,
    on_progress: Option<ProgressCallback>,
    hooks: &ProgressHooks,
    cancel: &CancellationToken,
) -> Result<u64> {
    validate_item_name(name)?;
    let url = item_url(&config.base_url, name)?;
    let dest_path = destination_dir.join(name);

    client
        .transfer(&url, &dest_path, on_progress, hooks.on_log.as_ref(), cancel)
        .await
}

/// Re-emit item ticks as batch ticks carrying the item's position
fn wrap_progress(
    hooks: &ProgressHooks,
    index: usize,
    total: usize,
    name: &str,
) -> Option<ProgressCallback> {
    let batch = hooks.on_batch_progress.clone()?;
    let name = name.to_string();
    Some(Arc::new(move |progress: TransferProgress| {
        batch(BatchProgress {
            current_item_index: index,
            total_items: total,
            current_item_name: name.clone(),
            current_item_progress: Some(progress),
        })
    }))
}

/// Full download URL of an item: the base URL with `name` appended as a path segment
pub fn item_url(base_url: &str, name: &str) -> Result<String> {
    let mut url = Url::parse(base_url)?;
    url.path_segments_mut()
        .map_err(|_| DownloadError::Unknown {
            message: format!("base URL '{base_url}' cannot take a path"),
        })?
        .pop_if_empty()
        .push(name);
    Ok(url.into())
}

/// Reject names that are empty or would resolve outside the destination directory
pub fn validate_item_name(name: &str) -> Result<()> {
    let invalid = || DownloadError::InvalidItemName { name: name.to_string() };

    if name.trim().is_empty() || name.contains(['/', '\\']) {
        return Err(invalid());
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid()),
    }
}
