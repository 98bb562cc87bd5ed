//! Whole-run orchestration: read rows, process each, archive, summarize

use super::ImageDownloader;
use super::product::ProductProcessor;
use crate::archive::Archiver;
use crate::error::{Error, FilesystemError, Result};
use crate::progress::ProgressTracker;
use crate::sink::ProgressSink;
use crate::source::read_rows;
use crate::summary::RunSummary;
use crate::types::{ProductResult, RunOptions, RunStats};
use std::collections::HashSet;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Reject empty paths before any work starts
pub(super) fn validate_paths(input: &Path, output_dir: &Path) -> Result<()> {
    if input.as_os_str().is_empty() {
        return Err(Error::Config {
            message: "input file path is empty".to_string(),
            key: Some("input".to_string()),
        });
    }
    if output_dir.as_os_str().is_empty() {
        return Err(Error::Config {
            message: "output directory is empty".to_string(),
            key: Some("output_dir".to_string()),
        });
    }
    Ok(())
}

impl ImageDownloader {
    /// Body of a run once the run slot is held
    pub(super) async fn execute(
        &self,
        input: &Path,
        output_dir: &Path,
        options: RunOptions,
        sink: &dyn ProgressSink,
        cancel_token: CancellationToken,
    ) -> Result<RunSummary> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| FilesystemError::CreateDir {
                path: output_dir.to_path_buf(),
                reason: e.to_string(),
            })?;

        sink.emit_log(&format!("Reading input file: {}", input.display()));
        sink.emit_status("Reading input file...");

        let rows = {
            let path = input.to_path_buf();
            let input_config = self.config.input.clone();
            tokio::task::spawn_blocking(move || read_rows(&path, &input_config))
                .await
                .map_err(|e| Error::Run(format!("input reader task failed: {}", e)))??
        };

        let total = rows.len();
        info!(?input, rows = total, fetcher = self.fetcher.name(), "input table loaded");
        sink.emit_log(&format!("Found {} products to process", total));

        let mut stats = RunStats::new(total);
        let mut tracker = ProgressTracker::new(total);
        let mut products: Vec<ProductResult> = Vec::with_capacity(total);
        let mut cancelled = false;
        let mut seen_ids: HashSet<&str> = HashSet::with_capacity(total);

        let processor = ProductProcessor::new(
            self.fetcher.as_ref(),
            sink,
            output_dir,
            self.config.download.request_delay,
            cancel_token.clone(),
        );
        let archiver = Archiver::new(self.config.archive.compression);

        for (index, row) in rows.iter().enumerate() {
            if cancel_token.is_cancelled() {
                cancelled = true;
                break;
            }

            let progress = tracker.advance();
            stats.processed_rows = tracker.processed_rows();
            sink.emit_status(&progress.status_line());

            let tasks = row.image_tasks();
            sink.emit_log("");
            sink.emit_log(&format!(
                "Processing product {}/{}: {} ({} images)",
                index + 1,
                total,
                row.id,
                tasks.len()
            ));

            if !seen_ids.insert(row.id.as_str()) {
                warn!(row_id = %row.id, "row id repeats, sharing folder and archive");
                sink.emit_log(&format!(
                    "  Warning: product id {} already used, images share its folder",
                    row.id
                ));
            }

            let mut result = processor.process_tasks(row, tasks).await;

            if result.interrupted {
                stats.record(&result);
                products.push(result);
                cancelled = true;
                break;
            }

            if options.compress && result.succeeded > 0 {
                let dir = processor.row_dir(row);
                sink.emit_log(&format!("Compressing folder: {}", row.id));
                sink.emit_status(&tracker.snapshot().compress_status_line(&row.id));

                match archiver.archive(&dir).await {
                    Ok(archive_path) => {
                        result.compressed = true;
                        result.archive_path = Some(archive_path);
                        sink.emit_log(&format!("  Created ZIP: {}.zip", row.id));

                        if options.deletes_folders() {
                            match Archiver::remove_source(&dir).await {
                                Ok(()) => {
                                    result.folder_removed = true;
                                    sink.emit_log(&format!(
                                        "  Deleted original folder: {}",
                                        row.id
                                    ));
                                }
                                Err(e) => {
                                    warn!(row_id = %row.id, error = %e, "folder kept after archiving");
                                    sink.emit_log(&format!("  Failed to delete folder: {}", e));
                                }
                            }
                        }
                    }
                    Err(e) => {
                        warn!(row_id = %row.id, error = %e, "archiving failed, folder kept");
                        sink.emit_log(&format!("  Failed to compress: {}", e));
                    }
                }
            }

            stats.record(&result);
            products.push(result);
        }

        if cancelled {
            info!(processed = stats.processed_rows, total, "run cancelled");
            sink.emit_log("");
            sink.emit_log("Cancellation requested, stopping");
        }

        let summary = RunSummary {
            stats,
            duration: tracker.elapsed(),
            compress_enabled: options.compress,
            output_dir: output_dir.to_path_buf(),
            cancelled,
            products,
        };

        info!(
            processed = summary.stats.processed_rows,
            images = summary.stats.total_images,
            downloaded = summary.stats.downloaded,
            failed = summary.stats.failed,
            compressed = summary.stats.compressed_folders,
            cancelled,
            "run finished"
        );

        sink.emit_log("");
        for line in summary.report_lines() {
            sink.emit_log(&line);
        }
        sink.emit_status(&summary.status_line());

        Ok(summary)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn empty_paths_are_config_errors() {
        let err = validate_paths(Path::new(""), Path::new("out")).unwrap_err();
        assert!(matches!(err, Error::Config { key: Some(ref k), .. } if k == "input"));

        let err = validate_paths(Path::new("in.csv"), &PathBuf::new()).unwrap_err();
        assert!(matches!(err, Error::Config { key: Some(ref k), .. } if k == "output_dir"));

        assert!(validate_paths(Path::new("in.csv"), Path::new("out")).is_ok());
    }
}
