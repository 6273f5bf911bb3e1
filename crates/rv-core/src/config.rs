//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the server, storage, streaming, uploads, and external
//! tools. Every section defaults sensibly so a completely empty `{}` file is
//! valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::Error;

/// Default cap on the bytes served per range request: 5 MiB.
pub const DEFAULT_MAX_CHUNK_BYTES: u64 = 5 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub streaming: StreamingConfig,
    pub upload: UploadConfig,
    pub tools: ToolsConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.streaming.max_chunk_bytes == 0 {
            warnings.push(format!(
                "streaming.max_chunk_bytes is 0; falling back to {DEFAULT_MAX_CHUNK_BYTES}"
            ));
        } else if self.streaming.max_chunk_bytes < self.streaming.read_buffer_bytes as u64 {
            warnings.push(
                "streaming.max_chunk_bytes is smaller than streaming.read_buffer_bytes".into(),
            );
        }

        if self.upload.photo_quality == 0 || self.upload.photo_quality > 100 {
            warnings.push(format!(
                "upload.photo_quality {} is outside 1..=100; it will be clamped",
                self.upload.photo_quality
            ));
        }

        if self.server.max_upload_bytes == 0 {
            warnings.push("server.max_upload_bytes is 0; every upload will be rejected".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Ceiling on a single request's lifetime, sized for multi-gigabyte uploads.
    pub request_timeout_secs: u64,
    /// Largest request body accepted by `POST /media`.
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            db_path: PathBuf::from("./data/reelvault.db"),
            request_timeout_secs: 300,
            max_upload_bytes: 1024 * 1024 * 1024,
        }
    }
}

/// Where uploaded media lives on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory; one subdirectory per album lives beneath it.
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data/uploads"),
        }
    }
}

/// Range streaming tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Most bytes returned by one range response, whatever the client asked for.
    pub max_chunk_bytes: u64,
    /// Size of each read from disk while streaming a body.
    pub read_buffer_bytes: usize,
}

impl StreamingConfig {
    /// Effective chunk cap; a zero setting falls back to the default.
    pub fn chunk_cap(&self) -> u64 {
        if self.max_chunk_bytes == 0 {
            DEFAULT_MAX_CHUNK_BYTES
        } else {
            self.max_chunk_bytes
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            max_chunk_bytes: DEFAULT_MAX_CHUNK_BYTES,
            read_buffer_bytes: 64 * 1024,
        }
    }
}

/// Upload pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Lossy WebP quality for re-encoded photos (1..=100).
    pub photo_quality: u8,
    /// Transcode non-MP4 video containers to H.264/AAC MP4 when ffmpeg is available.
    pub transcode_video: bool,
    /// Capacity of the buffered writer used while piping video to disk.
    pub write_buffer_bytes: usize,
}

impl UploadConfig {
    /// Quality clamped into the range the encoder accepts.
    pub fn effective_photo_quality(&self) -> f32 {
        f32::from(self.photo_quality.clamp(1, 100))
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            photo_quality: 80,
            transcode_video: true,
            write_buffer_bytes: 256 * 1024,
        }
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
}
