//! Core types used throughout the install pipeline
//!
//! This module contains the fundamental types that all other modules depend on:
//! errors, progress snapshots, staging-file handling and the transfer engine.

pub mod error;
pub mod files;
pub mod http;
pub mod progress;

// Re-export main types for convenience
pub use error::{DownloadError, ErrorKind, FileOperation, Result, MISSING_AFTER_DOWNLOAD};
pub use files::StagingFile;
pub use http::HttpClient;
pub use progress::{
    format_speed, percent_of, BatchProgress, BatchProgressCallback, ConsoleProgressReporter,
    LogCallback, ProgressCallback, ProgressHooks, ProgressReporter, TransferProgress,
};
