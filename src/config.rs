//! Configuration Module
//!
//! Handles loading and validating undo buffer configuration from environment
//! variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::buffer::{
    DEFAULT_FILE_CAPACITY, DEFAULT_IMAGE_CAPACITY, DEFAULT_MESSAGE_CAPACITY,
    DEFAULT_RETENTION_MS,
};
use crate::error::{Result, UndoError};

/// Undo buffer configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of messages kept
    pub message_capacity: usize,
    /// Maximum number of files kept
    pub file_capacity: usize,
    /// Maximum number of images kept
    pub image_capacity: usize,
    /// Directory holding file blobs
    pub file_storage_dir: String,
    /// Directory holding image and thumbnail blobs
    pub image_storage_dir: String,
    /// Thumbnail target width in pixels
    pub thumbnail_width: u32,
    /// Thumbnail target height in pixels
    pub thumbnail_height: u32,
    /// Entries older than this many milliseconds are swept
    pub retention_period_ms: u64,
    /// Per-call blob I/O deadline in milliseconds, 0 = none
    pub blob_io_timeout_ms: u64,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults; call
    /// [`Config::validate`] to check ranges.
    ///
    /// # Environment Variables
    /// - `MESSAGE_CAPACITY` - Messages kept (default: 100)
    /// - `FILE_CAPACITY` - Files kept (default: 50)
    /// - `IMAGE_CAPACITY` - Images kept (default: 30)
    /// - `FILE_STORAGE_DIR` - File blob directory (default: ./undo-file-storage)
    /// - `IMAGE_STORAGE_DIR` - Image blob directory (default: ./undo-image-storage)
    /// - `THUMBNAIL_WIDTH` / `THUMBNAIL_HEIGHT` - Thumbnail box (default: 200x200)
    /// - `RETENTION_PERIOD_MS` - Retention in ms (default: 86400000)
    /// - `BLOB_IO_TIMEOUT_MS` - Blob call deadline in ms (default: 0, disabled)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            message_capacity: env_or("MESSAGE_CAPACITY", defaults.message_capacity),
            file_capacity: env_or("FILE_CAPACITY", defaults.file_capacity),
            image_capacity: env_or("IMAGE_CAPACITY", defaults.image_capacity),
            file_storage_dir: env_or("FILE_STORAGE_DIR", defaults.file_storage_dir),
            image_storage_dir: env_or("IMAGE_STORAGE_DIR", defaults.image_storage_dir),
            thumbnail_width: env_or("THUMBNAIL_WIDTH", defaults.thumbnail_width),
            thumbnail_height: env_or("THUMBNAIL_HEIGHT", defaults.thumbnail_height),
            retention_period_ms: env_or("RETENTION_PERIOD_MS", defaults.retention_period_ms),
            blob_io_timeout_ms: env_or("BLOB_IO_TIMEOUT_MS", defaults.blob_io_timeout_ms),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }

    /// Checks every field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("message_capacity", self.message_capacity as u64),
            ("file_capacity", self.file_capacity as u64),
            ("image_capacity", self.image_capacity as u64),
            ("thumbnail_width", self.thumbnail_width as u64),
            ("thumbnail_height", self.thumbnail_height as u64),
            ("retention_period_ms", self.retention_period_ms),
            ("cleanup_interval", self.cleanup_interval),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(UndoError::InvalidConfig(format!(
                    "{} must be at least 1",
                    field
                )));
            }
        }

        for (field, dir) in [
            ("file_storage_dir", &self.file_storage_dir),
            ("image_storage_dir", &self.image_storage_dir),
        ] {
            if dir.trim().is_empty() {
                return Err(UndoError::InvalidConfig(format!("{} must not be empty", field)));
            }
        }

        if self.file_storage_dir == self.image_storage_dir {
            return Err(UndoError::InvalidConfig(
                "file and image storage directories must differ".to_string(),
            ));
        }

        Ok(())
    }

    /// Blob call deadline, None when disabled.
    pub fn blob_io_timeout(&self) -> Option<Duration> {
        (self.blob_io_timeout_ms > 0).then(|| Duration::from_millis(self.blob_io_timeout_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            message_capacity: DEFAULT_MESSAGE_CAPACITY,
            file_capacity: DEFAULT_FILE_CAPACITY,
            image_capacity: DEFAULT_IMAGE_CAPACITY,
            file_storage_dir: "./undo-file-storage".to_string(),
            image_storage_dir: "./undo-image-storage".to_string(),
            thumbnail_width: 200,
            thumbnail_height: 200,
            retention_period_ms: DEFAULT_RETENTION_MS,
            blob_io_timeout_ms: 0,
            cleanup_interval: 60,
            server_port: 3000,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
