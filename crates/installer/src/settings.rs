//! Persisted installer settings
//!
//! A small JSON document remembering the last instance path. Loading and
//! saving never fail from the caller's point of view; problems are traced
//! and appended to a log file next to the settings.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const APP_DATA_FOLDER: &str = "MCModInstaller";
pub const CONFIG_FILE_NAME: &str = "mcmodinstaller.config.json";
pub const LOGS_FOLDER: &str = "logs";
pub const LOG_FILE_NAME: &str = "mcmodinstaller.log";

/// Settings document stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstallationConfig {
    pub version: String,
    pub last_instance_path: Option<String>,
    pub last_updated: DateTime<Local>,
}

impl Default for InstallationConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            last_instance_path: None,
            last_updated: Local::now(),
        }
    }
}

impl InstallationConfig {
    pub fn with_last_instance_path<S: Into<String>>(mut self, path: S) -> Self {
        self.last_instance_path = Some(path.into());
        self
    }
}

/// Loads and saves [`InstallationConfig`] under a settings directory
#[derive(Debug, Clone)]
pub struct SettingsStore {
    dir: PathBuf,
}

impl SettingsStore {
    /// Store under the platform config directory, falling back to the working directory
    pub fn new() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::at(base.join(APP_DATA_FOLDER))
    }

    pub fn at<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOGS_FOLDER).join(LOG_FILE_NAME)
    }

    /// Read the settings, or defaults if they are absent or unreadable
    pub fn load(&self) -> InstallationConfig {
        let path = self.config_path();
        if !path.exists() {
            return InstallationConfig::default();
        }

        let loaded = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| serde_json::from_str(&json).map_err(|e| e.to_string()));

        match loaded {
            Ok(config) => config,
            Err(message) => {
                self.log_error(&format!("Error loading config: {message}"));
                InstallationConfig::default()
            }
        }
    }

    /// Stamp and write the settings; failures are logged, not returned
    pub fn save(&self, config: &InstallationConfig) {
        let mut config = config.clone();
        config.last_updated = Local::now();

        let written = fs::create_dir_all(&self.dir)
            .map_err(|e| e.to_string())
            .and_then(|()| serde_json::to_string_pretty(&config).map_err(|e| e.to_string()))
            .and_then(|json| fs::write(self.config_path(), json).map_err(|e| e.to_string()));

        if let Err(message) = written {
            self.log_error(&format!("Error saving config: {message}"));
        }
    }

    /// Remember `instance_path` as the last successfully used destination
    pub fn remember_instance_path(&self, instance_path: &Path) {
        let config = self
            .load()
            .with_last_instance_path(instance_path.to_string_lossy().into_owned());
        self.save(&config);
    }

    fn log_error(&self, message: &str) {
        warn!("{}", message);

        let path = self.log_path();
        let line = format!("[{}] [ERROR] {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"), message);
        let appended = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| OpenOptions::new().create(true).append(true).open(&path))
            .and_then(|mut file| file.write_all(line.as_bytes()));

        // Logging failures must never surface
        let _ = appended;
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("settings"));

        let config = store.load();
        assert_eq!(config.version, "1.0");
        assert!(config.last_instance_path.is_none());
    }

    #[test]
    fn saved_path_is_loaded_back() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("settings"));

        store.remember_instance_path(Path::new("/instances/pack"));

        let config = store.load();
        assert_eq!(config.last_instance_path.as_deref(), Some("/instances/pack"));

        let raw = std::fs::read_to_string(store.config_path()).unwrap();
        assert!(raw.contains("\"lastInstancePath\""));
        assert!(raw.contains("\"lastUpdated\""));
    }

    #[test]
    fn corrupt_file_falls_back_and_logs() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::at(dir.path());
        std::fs::write(store.config_path(), "{ not json").unwrap();

        let config = store.load();
        assert!(config.last_instance_path.is_none());

        let log = std::fs::read_to_string(store.log_path()).unwrap();
        assert!(log.contains("[ERROR] Error loading config"));
    }

    #[test]
    fn partial_document_fills_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::at(dir.path());
        std::fs::write(store.config_path(), r#"{"lastInstancePath": "C:\\pack"}"#).unwrap();

        let config = store.load();
        assert_eq!(config.last_instance_path.as_deref(), Some("C:\\pack"));
        assert_eq!(config.version, "1.0");
    }

    #[test]
    fn save_into_unwritable_location_is_swallowed() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        // Settings dir path is a regular file, so every write fails
        let store = SettingsStore::at(&blocker);
        store.save(&InstallationConfig::default());
        assert_eq!(std::fs::read(&blocker).unwrap(), b"x");
    }
}
