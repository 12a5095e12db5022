//! HTTP utilities
//!
//! Shared HTTP client with the streaming transfer engine. A transfer writes
//! into a staging file next to (or configured away from) the destination,
//! then promotes it with a rename once the stream has ended cleanly.

use futures::TryStreamExt;
use reqwest::{Client, StatusCode};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::files::{self, StagingFile};
use crate::downloader::config::DownloadConfig;
use crate::downloader::core::{
    DownloadError, FileOperation, LogCallback, ProgressCallback, Result, TransferProgress,
};

/// Added to elapsed seconds so the speed stays finite right after start
const SPEED_EPSILON_SECS: f64 = 0.001;

/// HTTP client with integrated streaming transfer
///
/// One instance is meant to live for the whole process; `reqwest::Client`
/// pools connections internally and is cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    chunk_size: usize,
    progress_interval: Duration,
    staging_dir: Option<PathBuf>,
}

impl HttpClient {
    /// Create a new HTTP client from download configuration
    pub fn from_config(config: &DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| DownloadError::Unknown {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            chunk_size: config.chunk_size.max(1),
            progress_interval: config.progress_interval,
            staging_dir: config.staging_dir.clone(),
        })
    }

    pub(crate) fn inner(&self) -> &Client {
        &self.client
    }

    /// Stream `url` into `dest_path`.
    ///
    /// Returns the number of bytes written. The staging file is removed on
    /// every exit path, including cancellation.
    pub async fn transfer(
        &self,
        url: &str,
        dest_path: &Path,
        on_progress: Option<ProgressCallback>,
        on_log: Option<&LogCallback>,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        if cancel.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }

        let staging_dir = files::staging_dir_for(dest_path, self.staging_dir.as_deref());
        let (staging, mut file) = StagingFile::create_in(&staging_dir)?;
        debug!("Stream downloading: {} to {}", url, dest_path.display());

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            response = self.client.get(url).send() => {
                response.map_err(|e| DownloadError::network(url, e))?
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DownloadError::NotFound { url: url.to_string() });
        }
        if !status.is_success() {
            return Err(DownloadError::NetworkUnavailable {
                url: url.to_string(),
                status: Some(status.as_u16()),
                source: None,
            });
        }

        let total_size = response.content_length();
        debug!("Content length: {:?} bytes", total_size);

        let stream = response.bytes_stream().map_err(io::Error::other);
        let reader = StreamReader::new(stream);
        tokio::pin!(reader);
        let mut buffer = vec![0u8; self.chunk_size];
        let mut transferred: u64 = 0;
        let start_time = Instant::now();
        let mut last_progress_time = start_time;

        let emit = |transferred: u64| {
            if let Some(ref callback) = on_progress {
                let elapsed = start_time.elapsed().as_secs_f64();
                let speed = transferred as f64 / (elapsed + SPEED_EPSILON_SECS);
                callback(TransferProgress::new(transferred, total_size, speed));
            }
        };

        loop {
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
                read = reader.read(&mut buffer) => read.map_err(|e| stream_error(url, transferred, total_size, e))?,
            };
            if read == 0 {
                break;
            }

            file.write_all(&buffer[..read])
                .await
                .map_err(|e| DownloadError::from_io(staging.path(), FileOperation::Write, e))?;
            transferred += read as u64;

            // Report progress at most every interval to avoid spam
            if last_progress_time.elapsed() >= self.progress_interval {
                emit(transferred);
                last_progress_time = Instant::now();
            }

            if cancel.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }
        }

        file.flush()
            .await
            .map_err(|e| DownloadError::from_io(staging.path(), FileOperation::Write, e))?;
        file.sync_all()
            .await
            .map_err(|e| DownloadError::from_io(staging.path(), FileOperation::Write, e))?;
        drop(file);

        // Final tick regardless of throttling
        emit(transferred);

        let staged_size = staging.len().await?;
        if staged_size == 0 {
            return Err(DownloadError::EmptyTransfer {
                path: staging.path().to_path_buf(),
            });
        }

        if let Some(expected) = total_size {
            if expected != staged_size {
                warn!(
                    "Size mismatch for {}: server declared {} bytes, received {}",
                    url, expected, staged_size
                );
                log_line(
                    on_log,
                    &format!(
                        "Warning: expected {expected} bytes but received {staged_size} for {}",
                        dest_path.display()
                    ),
                );
            }
        }

        if files::remove_existing(dest_path).await? {
            log_line(on_log, &format!("Replaced existing {}", dest_path.display()));
        }
        staging.promote(dest_path).await?;
        files::ensure_exists(dest_path).await?;

        debug!("Stream download completed: {} bytes", staged_size);
        Ok(staged_size)
    }
}

/// Map a failed body read back onto the network error it came from
fn stream_error(
    url: &str,
    received: u64,
    expected: Option<u64>,
    error: io::Error,
) -> DownloadError {
    let source = error
        .into_inner()
        .and_then(|inner| inner.downcast::<reqwest::Error>().ok())
        .map(|boxed| *boxed);
    warn!("Stream from {} broke off after {} bytes", url, received);

    DownloadError::Interrupted {
        url: url.to_string(),
        received,
        expected,
        source,
    }
}

pub(crate) fn log_line(on_log: Option<&LogCallback>, line: &str) {
    if let Some(callback) = on_log {
        callback(line);
    }
}
