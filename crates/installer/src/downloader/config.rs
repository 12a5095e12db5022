//! Configuration types for the install pipeline

use std::path::PathBuf;
use std::time::Duration;

/// Manifest endpoint used when nothing else is configured
pub const DEFAULT_MANIFEST_URL: &str = "https://triedge.ovh/mods.json";
/// Base URL item names are appended to
pub const DEFAULT_BASE_URL: &str = "https://triedge.ovh/";

/// Configuration for manifest fetching and item transfers
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub manifest_url: String,
    pub base_url: String,
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Longest silence tolerated between two reads of a response
    pub read_timeout: Duration,
    /// Whole-request timeout for the manifest; item transfers have none
    pub manifest_timeout: Duration,
    /// Read buffer size for streaming an item to disk
    pub chunk_size: usize,
    /// Minimum gap between two throttled progress ticks
    pub progress_interval: Duration,
    /// Pause inserted between consecutive items of a batch
    pub pacing_delay: Duration,
    /// Scratch directory for staging files.
    ///
    /// `None` stages next to the destination so promotion is a same-volume rename.
    pub staging_dir: Option<PathBuf>,
    /// Sub-directory of the instance root that receives the items
    pub mods_folder: String,
}

impl DownloadConfig {
    pub fn with_manifest_url<S: Into<String>>(mut self, url: S) -> Self {
        self.manifest_url = url.into();
        self
    }

    pub fn with_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_pacing_delay(mut self, delay: Duration) -> Self {
        self.pacing_delay = delay;
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_staging_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: concat!("mod-installer/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            manifest_timeout: Duration::from_secs(30),
            chunk_size: 8192,
            progress_interval: Duration::from_millis(100),
            pacing_delay: Duration::from_millis(500),
            staging_dir: None,
            mods_folder: "mods".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_pacing() {
        let config = DownloadConfig::default();
        assert_eq!(config.chunk_size, 8192);
        assert_eq!(config.progress_interval, Duration::from_millis(100));
        assert_eq!(config.pacing_delay, Duration::from_millis(500));
        assert_eq!(config.mods_folder, "mods");
        assert_eq!(config.read_timeout, Duration::from_secs(30));
        assert!(config.staging_dir.is_none());
    }

    #[test]
    fn chunk_size_never_drops_to_zero() {
        let config = DownloadConfig::default().with_chunk_size(0);
        assert_eq!(config.chunk_size, 1);
    }
}
