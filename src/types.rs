//! Core types for csv-image-dl

use crate::config::ArchiveConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One record of the input table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Row identifier, already sanitized into a single path component
    pub id: String,
    /// Raw, comma-joined image URL field
    pub raw_image_field: String,
}

impl Row {
    /// Create a new row
    pub fn new(id: impl Into<String>, raw_image_field: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw_image_field: raw_image_field.into(),
        }
    }

    /// Split the raw URL field into ordered image tasks
    ///
    /// Entries are split on commas and trimmed; empty entries are dropped.
    /// Sequence indices start at 1.
    pub fn image_tasks(&self) -> Vec<ImageTask> {
        self.raw_image_field
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .enumerate()
            .map(|(i, url)| ImageTask {
                row_id: self.id.clone(),
                url: url.to_string(),
                sequence_index: i + 1,
            })
            .collect()
    }
}

/// One URL within a row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageTask {
    /// Identifier of the owning row
    pub row_id: String,
    /// Trimmed absolute URL
    pub url: String,
    /// 1-based position within the row, used for fallback naming
    pub sequence_index: usize,
}

/// Result of one image task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DownloadOutcome {
    /// A file with the resolved name was already present; nothing was fetched
    AlreadyExists {
        /// Resolved filename
        filename: String,
    },
    /// The image was fetched and written
    Downloaded {
        /// Resolved filename
        filename: String,
        /// Number of bytes written
        bytes: u64,
    },
    /// The image could not be obtained
    Failed {
        /// URL of the task
        url: String,
        /// Error message
        error: String,
    },
}

impl DownloadOutcome {
    /// Whether the image is now present on disk
    pub fn is_success(&self) -> bool {
        !matches!(self, DownloadOutcome::Failed { .. })
    }

    /// Whether the pipeline pauses before the next fetch
    ///
    /// Only a fresh download triggers the courtesy delay; skips and failures
    /// move straight on.
    pub fn requires_pause(&self) -> bool {
        matches!(self, DownloadOutcome::Downloaded { .. })
    }
}

/// Per-row result
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductResult {
    /// Row identifier
    pub row_id: String,
    /// Number of image tasks that were resolved
    pub attempted: usize,
    /// Number of tasks that ended with the image on disk
    pub succeeded: usize,
    /// Whether the row folder was archived
    pub compressed: bool,
    /// Path of the archive, if one was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_path: Option<PathBuf>,
    /// Whether the row folder was removed after archiving
    pub folder_removed: bool,
    /// Whether cancellation stopped the row before all tasks resolved
    #[serde(default)]
    pub interrupted: bool,
    /// Outcome of every resolved task, in order
    pub outcomes: Vec<DownloadOutcome>,
}

impl ProductResult {
    /// Start an empty result for a row
    pub fn new(row_id: impl Into<String>) -> Self {
        Self {
            row_id: row_id.into(),
            ..Default::default()
        }
    }

    /// Fold one task outcome into the counts
    pub fn record(&mut self, outcome: DownloadOutcome) {
        self.attempted += 1;
        if outcome.is_success() {
            self.succeeded += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Number of tasks that failed
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

/// Run-wide counters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Rows in the input table
    pub total_rows: usize,
    /// Rows processed so far
    pub processed_rows: usize,
    /// Image tasks resolved so far
    pub total_images: usize,
    /// Images obtained (downloaded or already present)
    pub downloaded: usize,
    /// Images that could not be obtained
    pub failed: usize,
    /// Row folders archived
    pub compressed_folders: usize,
    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,
}

impl RunStats {
    /// Start counters for a run over `total_rows` rows
    pub fn new(total_rows: usize) -> Self {
        Self {
            total_rows,
            processed_rows: 0,
            total_images: 0,
            downloaded: 0,
            failed: 0,
            compressed_folders: 0,
            started_at: Utc::now(),
        }
    }

    /// Fold a finished row into the counters
    pub fn record(&mut self, result: &ProductResult) {
        self.total_images += result.attempted;
        self.downloaded += result.succeeded;
        self.failed += result.failed();
        if result.compressed {
            self.compressed_folders += 1;
        }
    }
}

/// Per-run options
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Compress each row folder that obtained at least one image
    pub compress: bool,
    /// Remove the row folder after its archive was written; ignored unless
    /// `compress` is set
    pub delete_after_compress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from(&ArchiveConfig::default())
    }
}

impl From<&ArchiveConfig> for RunOptions {
    fn from(config: &ArchiveConfig) -> Self {
        Self {
            compress: config.compress,
            delete_after_compress: config.delete_after_compress,
        }
    }
}

impl RunOptions {
    /// Whether row folders are removed after archiving
    pub fn deletes_folders(&self) -> bool {
        self.compress && self.delete_after_compress
    }
}

/// Event emitted by the pipeline
///
/// Consumers subscribe via [`ImageDownloader::subscribe`](crate::ImageDownloader::subscribe).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// One human-readable log line
    Log {
        /// The line
        line: String,
    },
    /// Replacement text for a status bar
    Status {
        /// The status text
        text: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_tasks_split_trim_and_drop_empties() {
        let row = Row::new("A", " http://x/a.jpg ,, http://x/b.jpg,  ,");
        let tasks = row.image_tasks();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].url, "http://x/a.jpg");
        assert_eq!(tasks[0].sequence_index, 1);
        assert_eq!(tasks[1].url, "http://x/b.jpg");
        assert_eq!(tasks[1].sequence_index, 2);
        assert!(tasks.iter().all(|t| t.row_id == "A"));
    }

    #[test]
    fn empty_field_yields_no_tasks() {
        assert!(Row::new("B", "").image_tasks().is_empty());
        assert!(Row::new("B", " , ,").image_tasks().is_empty());
    }

    #[test]
    fn only_fresh_downloads_require_pause() {
        let downloaded = DownloadOutcome::Downloaded {
            filename: "a.jpg".to_string(),
            bytes: 3,
        };
        let existing = DownloadOutcome::AlreadyExists {
            filename: "a.jpg".to_string(),
        };
        let failed = DownloadOutcome::Failed {
            url: "http://x/a.jpg".to_string(),
            error: "HTTP 500".to_string(),
        };
        assert!(downloaded.requires_pause());
        assert!(!existing.requires_pause());
        assert!(!failed.requires_pause());

        assert!(downloaded.is_success());
        assert!(existing.is_success());
        assert!(!failed.is_success());
    }

    #[test]
    fn run_stats_keep_downloaded_plus_failed_equal_total() {
        let mut stats = RunStats::new(2);
        let mut first = ProductResult::new("A");
        first.record(DownloadOutcome::Downloaded {
            filename: "a.jpg".to_string(),
            bytes: 10,
        });
        first.record(DownloadOutcome::Failed {
            url: "http://x/b.jpg".to_string(),
            error: "timeout".to_string(),
        });
        first.compressed = true;
        stats.record(&first);
        stats.record(&ProductResult::new("B"));

        assert_eq!(stats.total_images, 2);
        assert_eq!(stats.downloaded, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.compressed_folders, 1);
        assert_eq!(stats.downloaded + stats.failed, stats.total_images);
    }

    #[test]
    fn run_options_ignore_delete_without_compress() {
        let options = RunOptions {
            compress: false,
            delete_after_compress: true,
        };
        assert!(!options.deletes_folders());
        assert!(RunOptions::default().deletes_folders());
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(Event::Status {
            text: "Ready".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "status");
        assert_eq!(json["text"], "Ready");
    }
}
