//! Configuration types for csv-image-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Input table layout (column names, delimiter, fallback identifier)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputConfig {
    /// Column holding the row identifier (default: "id")
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Column holding the comma-separated image URLs (default: "image")
    #[serde(default = "default_image_column")]
    pub image_column: String,

    /// Identifier used when a row has no usable id (default: "unknown")
    #[serde(default = "default_placeholder_id")]
    pub placeholder_id: String,

    /// Field delimiter of the input table (default: ',')
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            id_column: default_id_column(),
            image_column: default_image_column(),
            placeholder_id: default_placeholder_id(),
            delimiter: default_delimiter(),
        }
    }
}

/// Download behavior configuration (output location, timeout, pacing)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Default output directory (default: "./downloaded_images")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Per-request timeout, serialized as whole seconds (default: 30)
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,

    /// Pause after every image that was actually downloaded, serialized as
    /// milliseconds (default: 500)
    #[serde(default = "default_request_delay", with = "duration_millis")]
    pub request_delay: Duration,

    /// User-Agent header sent with every request (default: "csv-image-dl/<version>")
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Capacity of the event broadcast channel (default: 1000)
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            timeout: default_timeout(),
            request_delay: default_request_delay(),
            user_agent: None,
            event_buffer: default_event_buffer(),
        }
    }
}

impl DownloadConfig {
    /// The User-Agent to send, falling back to the crate name and version
    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("csv-image-dl/{}", env!("CARGO_PKG_VERSION")))
    }
}

/// Compression method used for row archives
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Store entries without compression
    Stored,
    /// Deflate entries (default)
    #[default]
    Deflated,
}

impl From<Compression> for zip::CompressionMethod {
    fn from(compression: Compression) -> Self {
        match compression {
            Compression::Stored => zip::CompressionMethod::Stored,
            Compression::Deflated => zip::CompressionMethod::Deflated,
        }
    }
}

/// Archive settings (whether to zip row folders and what to do afterwards)
///
/// These are the defaults for [`RunOptions`](crate::types::RunOptions); a run
/// may override `compress` and `delete_after_compress`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Compress each row folder into `<id>.zip` (default: true)
    #[serde(default = "default_true")]
    pub compress: bool,

    /// Remove the row folder once its archive exists (default: true)
    #[serde(default = "default_true")]
    pub delete_after_compress: bool,

    /// Compression method for archive entries (default: deflated)
    #[serde(default)]
    pub compression: Compression,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            compress: true,
            delete_after_compress: true,
            compression: Compression::default(),
        }
    }
}

/// Main configuration for [`ImageDownloader`](crate::ImageDownloader)
///
/// Sub-configs are flattened for serialization, so a JSON config file is a
/// single flat object:
///
/// ```json
/// { "image_column": "photos", "timeout": 10, "request_delay": 250, "compress": false }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input table layout
    #[serde(flatten)]
    pub input: InputConfig,

    /// Download behavior
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// Archive defaults
    #[serde(flatten)]
    pub archive: ArchiveConfig,
}

impl Config {
    /// Load a configuration from a JSON file; missing keys take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read config file '{}': {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde cannot enforce
    pub fn validate(&self) -> Result<()> {
        if self.input.id_column.trim().is_empty() {
            return Err(Error::Config {
                message: "id column name must not be empty".to_string(),
                key: Some("id_column".to_string()),
            });
        }
        if self.input.image_column.trim().is_empty() {
            return Err(Error::Config {
                message: "image column name must not be empty".to_string(),
                key: Some("image_column".to_string()),
            });
        }
        if self.input.placeholder_id.trim().is_empty() {
            return Err(Error::Config {
                message: "placeholder id must not be empty".to_string(),
                key: Some("placeholder_id".to_string()),
            });
        }
        if !self.input.delimiter.is_ascii() {
            return Err(Error::Config {
                message: format!(
                    "delimiter must be a single ASCII character, got '{}'",
                    self.input.delimiter
                ),
                key: Some("delimiter".to_string()),
            });
        }
        if self.download.timeout.is_zero() {
            return Err(Error::Config {
                message: "timeout must be greater than zero".to_string(),
                key: Some("timeout".to_string()),
            });
        }
        if self.download.event_buffer == 0 {
            return Err(Error::Config {
                message: "event buffer must hold at least one event".to_string(),
                key: Some("event_buffer".to_string()),
            });
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_id_column() -> String {
    "id".to_string()
}

fn default_image_column() -> String {
    "image".to_string()
}

fn default_placeholder_id() -> String {
    "unknown".to_string()
}

fn default_delimiter() -> char {
    ','
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloaded_images")
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_request_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_event_buffer() -> usize {
    1000
}

// Duration serialization helper (whole seconds)
pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
pub(crate) mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
