//! Per-row processing: folder creation, skip-if-exists, fetch and write

use crate::archive::PARTIAL_SUFFIX;
use crate::error::FilesystemError;
use crate::fetcher::Fetcher;
use crate::resolver::resolve_filename;
use crate::sink::ProgressSink;
use crate::types::{DownloadOutcome, ImageTask, ProductResult, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Downloads every image of one row into `<output_dir>/<row id>/`
///
/// Never fails: every per-task problem becomes a
/// [`DownloadOutcome::Failed`] in the returned [`ProductResult`].
pub struct ProductProcessor<'a> {
    fetcher: &'a dyn Fetcher,
    sink: &'a dyn ProgressSink,
    output_dir: &'a Path,
    request_delay: Duration,
    cancel_token: CancellationToken,
}

impl<'a> ProductProcessor<'a> {
    /// Create a processor writing below `output_dir`
    pub fn new(
        fetcher: &'a dyn Fetcher,
        sink: &'a dyn ProgressSink,
        output_dir: &'a Path,
        request_delay: Duration,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            sink,
            output_dir,
            request_delay,
            cancel_token,
        }
    }

    /// Folder that holds the images of `row`
    pub fn row_dir(&self, row: &Row) -> PathBuf {
        self.output_dir.join(&row.id)
    }

    /// Process one row
    ///
    /// Rows without image URLs never create a folder. Tasks run strictly in
    /// order; after each image that was actually downloaded the processor
    /// waits `request_delay` before the next fetch. Cancellation is checked
    /// before every task.
    pub async fn process(&self, row: &Row) -> ProductResult {
        self.process_tasks(row, row.image_tasks()).await
    }

    /// Process one row whose tasks were already split from its image field
    pub async fn process_tasks(&self, row: &Row, tasks: Vec<ImageTask>) -> ProductResult {
        let mut result = ProductResult::new(&row.id);

        if tasks.is_empty() {
            debug!(row_id = %row.id, "row lists no images");
            self.sink.emit_log("  No images listed, skipping");
            return result;
        }

        let dir = self.row_dir(row);
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            let err = FilesystemError::CreateDir {
                path: dir.clone(),
                reason: e.to_string(),
            };
            warn!(row_id = %row.id, error = %err, "cannot create row folder");
            self.sink.emit_log(&format!("  Failed to create folder: {}", err));
            for task in tasks {
                result.record(DownloadOutcome::Failed {
                    url: task.url,
                    error: err.to_string(),
                });
            }
            return result;
        }

        for task in &tasks {
            if self.cancel_token.is_cancelled() {
                info!(row_id = %row.id, resolved = result.attempted, "row interrupted by cancellation");
                result.interrupted = true;
                break;
            }

            let outcome = self.process_task(&dir, task).await;
            let pause = outcome.requires_pause();
            result.record(outcome);

            if pause && !self.request_delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.request_delay) => {}
                    _ = self.cancel_token.cancelled() => {}
                }
            }
        }

        info!(
            row_id = %row.id,
            attempted = result.attempted,
            succeeded = result.succeeded,
            "row processed"
        );
        result
    }

    async fn process_task(&self, dir: &Path, task: &ImageTask) -> DownloadOutcome {
        let filename = resolve_filename(&task.url, task.sequence_index);
        let path = dir.join(&filename);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(row_id = %task.row_id, %filename, "already on disk, not fetching");
            self.sink.emit_log(&format!("  Already exists: {}", filename));
            return DownloadOutcome::AlreadyExists { filename };
        }

        self.sink.emit_log(&format!("  Downloading: {}", filename));
        let bytes = match self.fetcher.fetch(&task.url).await {
            Ok(bytes) => bytes,
            Err(e) => return self.failed(task, e.to_string()),
        };

        let partial = self.partial_path(&task.row_id, &filename);
        if let Err(e) = write_file(&partial, &path, &bytes).await {
            return self.failed(task, e.to_string());
        }

        debug!(row_id = %task.row_id, %filename, bytes = bytes.len(), "saved");
        self.sink.emit_log(&format!("  Saved: {}", filename));
        DownloadOutcome::Downloaded {
            filename,
            bytes: bytes.len() as u64,
        }
    }

    /// In-flight file for `filename`, kept in the output root so a row
    /// folder only ever holds finished images
    fn partial_path(&self, row_id: &str, filename: &str) -> PathBuf {
        self.output_dir
            .join(format!(".{}.{}{}", row_id, filename, PARTIAL_SUFFIX))
    }

    fn failed(&self, task: &ImageTask, error: String) -> DownloadOutcome {
        warn!(row_id = %task.row_id, url = %task.url, %error, "image failed");
        self.sink.emit_log(&format!("  Failed: {}", task.url));
        self.sink.emit_log(&format!("    Error: {}", error));
        DownloadOutcome::Failed {
            url: task.url.clone(),
            error,
        }
    }
}

/// Write `bytes` to `partial` and rename it to `path`, so a half-written
/// file is never mistaken for a finished image
async fn write_file(partial: &Path, path: &Path, bytes: &[u8]) -> Result<(), FilesystemError> {
    let result = match tokio::fs::write(partial, bytes).await {
        Ok(()) => tokio::fs::rename(partial, path).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tokio::fs::remove_file(partial).await.ok();
        return Err(FilesystemError::WriteFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        });
    }
    Ok(())
}
