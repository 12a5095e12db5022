//! Downloader module
//!
//! This module contains the download-and-verify pipeline: manifest fetching,
//! sequential batch transfers, post-transfer verification and reporting.

pub mod core;
pub mod config;
pub mod manifest;
pub mod batch;
pub mod verify;
pub mod report;
pub mod r#lib;

// Re-export main types for convenience
pub use r#lib::Installer;
pub use self::core::{
    BatchProgress, BatchProgressCallback, ConsoleProgressReporter, DownloadError, ErrorKind,
    FileOperation, HttpClient, LogCallback, ProgressCallback,
    ProgressHooks, ProgressReporter, Result, TransferProgress, MISSING_AFTER_DOWNLOAD,
};
pub use config::DownloadConfig;
pub use batch::{BatchReport, ItemOutcome};
pub use verify::Verification;
pub use report::{FailedItem, InstallSummary};
