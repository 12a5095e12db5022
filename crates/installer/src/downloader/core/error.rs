//! Error types for the install pipeline with context and user-facing messages

use std::error::Error;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Message recorded on an outcome whose file vanished after a reported success
pub const MISSING_AFTER_DOWNLOAD: &str = "file missing after download";

/// Errors raised by the transfer engine, the manifest fetcher and the pipeline
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The operation was cancelled through the shared token
    #[error("Operation cancelled")]
    Cancelled,

    /// Server answered 404 for the requested item
    #[error("'{url}' was not found on the server")]
    NotFound { url: String },

    /// Connection failure or a non-success status other than 404
    #[error("Could not reach '{url}'{}", status_suffix(.status))]
    NetworkUnavailable {
        url: String,
        status: Option<u16>,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Body stopped short: dropped connection, stalled read or truncated response
    #[error("Transfer from '{url}' stopped after {received} bytes{}", expected_suffix(.expected))]
    Interrupted {
        url: String,
        received: u64,
        expected: Option<u64>,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Disk-space related write failure
    #[error("Not enough disk space while {operation} '{path}'")]
    DiskFull {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: io::Error,
    },

    /// Permission denied on a local file
    #[error("Permission denied while {operation} '{path}'")]
    AccessDenied {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: io::Error,
    },

    /// Generic local file system failure
    #[error("File operation failed while {operation} '{path}'")]
    Io {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: io::Error,
    },

    /// The stream ended without writing a single byte
    #[error("Nothing was downloaded into '{path}'")]
    EmptyTransfer { path: PathBuf },

    /// Manifest endpoint unreachable or answered with a non-success status
    #[error("Failed to download manifest from '{url}'{}", status_suffix(.status))]
    ManifestDownload {
        url: String,
        status: Option<u16>,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Manifest body is not a JSON array of strings
    #[error("Manifest from '{url}' could not be decoded")]
    ManifestParse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Manifest decoded fine but listed nothing
    #[error("Manifest lists no items")]
    EmptyManifest,

    /// Manifest entry that would escape the destination directory
    #[error("Invalid item name '{name}'")]
    InvalidItemName { name: String },

    /// Anything else, wrapped with its diagnostic text
    #[error("{message}")]
    Unknown { message: String },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

fn expected_suffix(expected: &Option<u64>) -> String {
    expected.map(|e| format!(" of {e}")).unwrap_or_default()
}

/// Types of file operations for error context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Create,
    Write,
    Metadata,
    Delete,
    Move,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Create => write!(f, "creating"),
            FileOperation::Write => write!(f, "writing"),
            FileOperation::Metadata => write!(f, "reading metadata of"),
            FileOperation::Delete => write!(f, "deleting"),
            FileOperation::Move => write!(f, "moving"),
        }
    }
}

/// Failure categories, one fixed user message each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Cancelled,
    NotFound,
    NetworkUnavailable,
    DiskFull,
    AccessDenied,
    ManifestDownloadError,
    ManifestParseError,
    EmptyManifest,
    VerificationMissing,
    IoError,
    Unknown,
}

impl ErrorKind {
    /// Canonical message shown to the user for this category
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::Cancelled => "installation cancelled",
            ErrorKind::NotFound => "item not found on server",
            ErrorKind::NetworkUnavailable => {
                "unable to connect to the server, check your internet connection"
            }
            ErrorKind::DiskFull => "not enough disk space to install the item",
            ErrorKind::AccessDenied => {
                "access denied, try running the installer with elevated permissions"
            }
            ErrorKind::ManifestDownloadError => "unable to download the mod list",
            ErrorKind::ManifestParseError => "the mod list could not be read",
            ErrorKind::EmptyManifest => "the mod list is empty",
            ErrorKind::VerificationMissing => MISSING_AFTER_DOWNLOAD,
            ErrorKind::IoError => "a file operation failed while installing the item",
            ErrorKind::Unknown => "an unexpected error occurred",
        }
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;

impl DownloadError {
    /// Project this error onto its failure category
    pub fn kind(&self) -> ErrorKind {
        match self {
            DownloadError::Cancelled => ErrorKind::Cancelled,
            DownloadError::NotFound { .. } => ErrorKind::NotFound,
            DownloadError::NetworkUnavailable { .. } => ErrorKind::NetworkUnavailable,
            DownloadError::Interrupted { .. } => ErrorKind::NetworkUnavailable,
            DownloadError::DiskFull { .. } => ErrorKind::DiskFull,
            DownloadError::AccessDenied { .. } => ErrorKind::AccessDenied,
            DownloadError::Io { .. } => ErrorKind::IoError,
            DownloadError::EmptyTransfer { .. } => ErrorKind::IoError,
            DownloadError::ManifestDownload { .. } => ErrorKind::ManifestDownloadError,
            DownloadError::ManifestParse { .. } => ErrorKind::ManifestParseError,
            DownloadError::EmptyManifest => ErrorKind::EmptyManifest,
            DownloadError::InvalidItemName { .. } => ErrorKind::Unknown,
            DownloadError::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            DownloadError::Cancelled => "cancelled",
            DownloadError::NotFound { .. } => "not_found",
            DownloadError::NetworkUnavailable { .. } => "network_unavailable",
            DownloadError::Interrupted { .. } => "interrupted",
            DownloadError::DiskFull { .. } => "disk_full",
            DownloadError::AccessDenied { .. } => "access_denied",
            DownloadError::Io { .. } => "io",
            DownloadError::EmptyTransfer { .. } => "empty_transfer",
            DownloadError::ManifestDownload { .. } => "manifest_download",
            DownloadError::ManifestParse { .. } => "manifest_parse",
            DownloadError::EmptyManifest => "empty_manifest",
            DownloadError::InvalidItemName { .. } => "invalid_item_name",
            DownloadError::Unknown { .. } => "unknown",
        }
    }

    /// Message for the presentation layer.
    ///
    /// Known categories collapse to their fixed text. Unexpected errors keep
    /// their diagnostic so nothing is swallowed.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Unknown => {
                format!("{}\n\nDetails: {}", ErrorKind::Unknown.message(), self.root_cause())
            }
            kind => kind.message().to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DownloadError::Cancelled)
    }

    /// Classify a local I/O failure into DiskFull, AccessDenied or Io
    pub fn from_io(path: impl Into<PathBuf>, operation: FileOperation, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::StorageFull => {
                DownloadError::DiskFull { path, operation, source }
            }
            io::ErrorKind::PermissionDenied => {
                DownloadError::AccessDenied { path, operation, source }
            }
            _ => DownloadError::Io { path, operation, source },
        }
    }

    /// Plain I/O failure without classification
    pub fn io(path: impl Into<PathBuf>, operation: FileOperation, source: io::Error) -> Self {
        DownloadError::Io { path: path.into(), operation, source }
    }

    /// Network failure while talking to `url`
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        DownloadError::NetworkUnavailable {
            url: url.into(),
            status: source.status().map(|s| s.as_u16()),
            source: Some(source),
        }
    }

    /// Innermost error text, falling back to this error's own display
    fn root_cause(&self) -> String {
        let mut current: &dyn Error = self;
        while let Some(source) = current.source() {
            current = source;
        }
        current.to_string()
    }
}

impl From<url::ParseError> for DownloadError {
    fn from(error: url::ParseError) -> Self {
        DownloadError::Unknown {
            message: format!("invalid URL: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_classified_by_kind() {
        let full = DownloadError::from_io(
            "/tmp/x",
            FileOperation::Write,
            io::Error::from(io::ErrorKind::StorageFull),
        );
        assert_eq!(full.kind(), ErrorKind::DiskFull);

        let denied = DownloadError::from_io(
            "/tmp/x",
            FileOperation::Create,
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert_eq!(denied.kind(), ErrorKind::AccessDenied);

        let other = DownloadError::from_io(
            "/tmp/x",
            FileOperation::Write,
            io::Error::from(io::ErrorKind::BrokenPipe),
        );
        assert_eq!(other.kind(), ErrorKind::IoError);
    }

    #[test]
    fn known_kinds_use_fixed_messages() {
        let err = DownloadError::NotFound { url: "https://host/a.jar".into() };
        assert_eq!(err.user_message(), "item not found on server");

        let err = DownloadError::EmptyTransfer { path: "/tmp/a".into() };
        assert_eq!(err.user_message(), ErrorKind::IoError.message());
    }

    #[test]
    fn unknown_errors_keep_their_details() {
        let err = DownloadError::Unknown { message: "boom".into() };
        let message = err.user_message();
        assert!(message.starts_with(ErrorKind::Unknown.message()));
        assert!(message.ends_with("Details: boom"));
    }

    #[test]
    fn interrupted_transfer_reads_as_network_failure() {
        let err = DownloadError::Interrupted {
            url: "https://host/a.jar".into(),
            received: 500,
            expected: Some(1000),
            source: None,
        };
        assert_eq!(err.kind(), ErrorKind::NetworkUnavailable);
        assert_eq!(err.category(), "interrupted");
        assert_eq!(
            err.to_string(),
            "Transfer from 'https://host/a.jar' stopped after 500 bytes of 1000"
        );
    }

    #[test]
    fn verification_sentinel_is_shared() {
        assert_eq!(ErrorKind::VerificationMissing.message(), MISSING_AFTER_DOWNLOAD);
    }
}
