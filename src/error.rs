//! Error types for csv-image-dl
//!
//! This module provides the error taxonomy for the download pipeline:
//! - Run-fatal errors (unreadable input table, unusable output directory, configuration)
//! - Row-local errors (network, archive, filesystem) that are recorded and logged
//!   but never abort the run
//! - Context information (URL, path, column name) attached to each variant

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for csv-image-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for csv-image-dl
///
/// This is the error returned by [`ImageDownloader::run`](crate::ImageDownloader::run).
/// Row-local failures (`Network`, `Archive`, most `Filesystem` cases) are normally
/// captured inside the pipeline and only surface here when an operation is
/// invoked directly.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "output_dir")
        key: Option<String>,
    },

    /// The input table could not be read or does not have the required shape
    #[error("input format error: {0}")]
    InputFormat(#[from] InputFormatError),

    /// A single URL could not be fetched
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// A directory could not be archived
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Directory creation, removal, or file write failed
    #[error("filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A run is already in progress on this downloader
    #[error("a download run is already in progress")]
    AlreadyRunning,

    /// Unanticipated failure that terminated the run
    #[error("run failed: {0}")]
    Run(String),
}

/// Errors raised while opening or parsing the input table
#[derive(Debug, Error)]
pub enum InputFormatError {
    /// The file could not be opened or decoded
    #[error("cannot read {path}: {reason}")]
    Unreadable {
        /// Path of the input table
        path: PathBuf,
        /// Underlying reason
        reason: String,
    },

    /// The header row lacks a required column
    #[error("missing required column '{column}' (found: {found})")]
    MissingColumn {
        /// Name of the required column
        column: String,
        /// Comma-joined list of the columns that were present
        found: String,
    },

    /// A record could not be parsed
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord {
        /// 1-based line number of the record, 0 if unknown
        line: u64,
        /// Underlying reason
        reason: String,
    },
}

/// Per-URL fetch failures
///
/// These are always local to one image: the pipeline records them as
/// [`DownloadOutcome::Failed`](crate::types::DownloadOutcome::Failed) and moves on.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The URL could not be parsed
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Parser message
        reason: String,
    },

    /// The request did not complete within the configured timeout
    #[error("timeout fetching '{url}' (exceeded {timeout_secs} seconds)")]
    Timeout {
        /// The URL being fetched
        url: String,
        /// Timeout that was exceeded, in seconds
        timeout_secs: u64,
    },

    /// The connection could not be established
    #[error("connection failed for '{url}': {reason}")]
    Connect {
        /// The URL being fetched
        url: String,
        /// Underlying reason
        reason: String,
    },

    /// The server answered with a non-success status code
    #[error("HTTP {status} for '{url}'")]
    Status {
        /// The URL being fetched
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The response body could not be read
    #[error("failed to read response body from '{url}': {reason}")]
    Body {
        /// The URL being fetched
        url: String,
        /// Underlying reason
        reason: String,
    },

    /// Any other request failure
    #[error("failed to fetch '{url}': {reason}")]
    Request {
        /// The URL being fetched
        url: String,
        /// Underlying reason
        reason: String,
    },
}

impl NetworkError {
    /// The URL this error refers to
    pub fn url(&self) -> &str {
        match self {
            NetworkError::InvalidUrl { url, .. }
            | NetworkError::Timeout { url, .. }
            | NetworkError::Connect { url, .. }
            | NetworkError::Status { url, .. }
            | NetworkError::Body { url, .. }
            | NetworkError::Request { url, .. } => url,
        }
    }
}

/// Archive creation failures
///
/// When any of these is returned the source directory is left untouched.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The source directory could not be traversed
    #[error("failed to walk {directory}: {reason}")]
    Walk {
        /// Directory being archived
        directory: PathBuf,
        /// Underlying reason
        reason: String,
    },

    /// Writing the archive failed
    #[error("failed to write {archive}: {reason}")]
    Write {
        /// Archive being written
        archive: PathBuf,
        /// Underlying reason
        reason: String,
    },

    /// The blocking archive task did not complete
    #[error("archive task for {directory} aborted: {reason}")]
    Aborted {
        /// Directory being archived
        directory: PathBuf,
        /// Join error message
        reason: String,
    },
}

/// Filesystem failures around row directories and image files
#[derive(Debug, Error)]
pub enum FilesystemError {
    /// Creating a directory failed
    #[error("failed to create directory {path}: {reason}")]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying reason
        reason: String,
    },

    /// Removing a directory failed (non-fatal after a successful archive)
    #[error("failed to remove directory {path}: {reason}")]
    RemoveDir {
        /// Directory that could not be removed
        path: PathBuf,
        /// Underlying reason
        reason: String,
    },

    /// Writing a downloaded file failed
    #[error("failed to write {path}: {reason}")]
    WriteFile {
        /// File that could not be written
        path: PathBuf,
        /// Underlying reason
        reason: String,
    },
}
