//! Mod Installer Library
//!
//! This library installs a remotely hosted list of mod archives into a local
//! instance directory. It fetches a manifest, transfers each item in turn
//! through a staging file, verifies the results and summarizes them.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mod_installer::{BatchProgress, CancellationToken, DownloadConfig, Installer, ProgressHooks};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> mod_installer::Result<()> {
//! let installer = Installer::new(DownloadConfig::default())?;
//!
//! let hooks = ProgressHooks::new()
//!     .with_batch_progress(Arc::new(|p: BatchProgress| {
//!         println!("{}% - {}", p.overall_percent_complete(), p.current_item_name);
//!     }))
//!     .with_log(Arc::new(|line: &str| println!("{line}")));
//!
//! let cancel = CancellationToken::new();
//! let summary = installer.run(Path::new("/path/to/instance"), &hooks, &cancel).await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Staged writes**: bytes land in a uniquely named scratch file and are
//!   renamed into place only once the stream has ended
//! - **Sequential batches**: one item in flight at a time, paced by a short delay
//! - **Progress tracking**: throttled per-file ticks with speed, plus an
//!   aggregate percentage across the batch
//! - **Cooperative cancellation** through a shared `CancellationToken`
//! - **Post-transfer verification** that catches files gone missing after a
//!   reported success

pub mod downloader;
pub mod paths;
pub mod settings;

// Re-export commonly used types for convenience
pub use downloader::{
    BatchProgress, BatchReport, ConsoleProgressReporter, DownloadConfig, DownloadError,
    ErrorKind, InstallSummary, Installer, ItemOutcome, ProgressHooks, ProgressReporter, Result,
    TransferProgress,
};
pub use paths::{PathValidation, PathValidator};
pub use settings::{InstallationConfig, SettingsStore};
pub use tokio_util::sync::CancellationToken;
