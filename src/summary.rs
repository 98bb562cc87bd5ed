//! Final run report

use crate::config::duration_secs;
use crate::progress::format_duration;
use crate::types::{ProductResult, RunStats};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

const SEPARATOR_WIDTH: usize = 50;

/// Terminal, authoritative result of a run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    /// Aggregated counters
    pub stats: RunStats,
    /// Wall-clock duration, serialized as whole seconds
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    /// Whether archiving was enabled for this run
    pub compress_enabled: bool,
    /// Output root of the run
    pub output_dir: PathBuf,
    /// Whether the run stopped early on request
    pub cancelled: bool,
    /// Per-row results in input order
    pub products: Vec<ProductResult>,
}

impl RunSummary {
    /// Report lines as emitted to the run log
    ///
    /// The folders-compressed line only appears when archiving was enabled.
    pub fn report_lines(&self) -> Vec<String> {
        let separator = "=".repeat(SEPARATOR_WIDTH);
        let mut lines = vec![
            separator.clone(),
            "DOWNLOAD SUMMARY".to_string(),
            separator.clone(),
            format!("Total products processed: {}", self.stats.processed_rows),
            format!("Total images found: {}", self.stats.total_images),
            format!("Successfully downloaded: {}", self.stats.downloaded),
            format!("Failed: {}", self.stats.failed),
        ];
        if self.compress_enabled {
            lines.push(format!("Folders compressed: {}", self.stats.compressed_folders));
        }
        lines.push(format!("Total time: {}", format_duration(self.duration)));
        lines.push(format!("Images saved in: {}/", self.output_dir.display()));
        if self.cancelled {
            lines.push(format!(
                "Cancelled after {}/{} products",
                self.stats.processed_rows, self.stats.total_rows
            ));
        }
        lines.push(separator);
        lines
    }

    /// One-line status for the end of the run
    pub fn status_line(&self) -> String {
        if self.cancelled {
            format!(
                "Cancelled after {}/{} products",
                self.stats.processed_rows, self.stats.total_rows
            )
        } else {
            format!(
                "Completed! Downloaded: {}, Failed: {}",
                self.stats.downloaded, self.stats.failed
            )
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.report_lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(compress_enabled: bool) -> RunSummary {
        let mut stats = RunStats::new(2);
        stats.processed_rows = 2;
        stats.total_images = 3;
        stats.downloaded = 2;
        stats.failed = 1;
        stats.compressed_folders = 1;
        RunSummary {
            stats,
            duration: Duration::from_secs(75),
            compress_enabled,
            output_dir: PathBuf::from("out"),
            cancelled: false,
            products: Vec::new(),
        }
    }

    #[test]
    fn report_contains_totals_and_duration() {
        let lines = summary(true).report_lines();
        assert!(lines.contains(&"Total products processed: 2".to_string()));
        assert!(lines.contains(&"Total images found: 3".to_string()));
        assert!(lines.contains(&"Successfully downloaded: 2".to_string()));
        assert!(lines.contains(&"Failed: 1".to_string()));
        assert!(lines.contains(&"Folders compressed: 1".to_string()));
        assert!(lines.contains(&"Total time: 1m 15s".to_string()));
        assert!(lines.contains(&"Images saved in: out/".to_string()));
    }

    #[test]
    fn compressed_line_only_when_archiving_enabled() {
        let lines = summary(false).report_lines();
        assert!(!lines.iter().any(|l| l.starts_with("Folders compressed")));
    }

    #[test]
    fn status_line_reports_completion_or_cancellation() {
        let mut s = summary(true);
        assert_eq!(s.status_line(), "Completed! Downloaded: 2, Failed: 1");
        s.cancelled = true;
        s.stats.processed_rows = 1;
        assert_eq!(s.status_line(), "Cancelled after 1/2 products");
    }

    #[test]
    fn display_renders_every_report_line() {
        let s = summary(true);
        let rendered = s.to_string();
        assert_eq!(rendered.lines().count(), s.report_lines().len());
    }

    #[test]
    fn serializes_duration_as_seconds() {
        let json = serde_json::to_value(summary(true)).unwrap();
        assert_eq!(json["duration"], 75);
        assert_eq!(json["stats"]["downloaded"], 2);
    }
}
