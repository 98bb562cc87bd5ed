//! # csv-image-dl
//!
//! Bulk image downloader driven by a CSV product table.
//!
//! Every row of the table names a product and lists one or more image URLs.
//! Images land in one folder per product, files already on disk are never
//! fetched again, and each folder can be zipped (and removed) once its
//! images are in. A run reports progress as it goes and ends with a summary.
//!
//! ## Quick Start
//!
//! ```no_run
//! use csv_image_dl::{Config, Event, ImageDownloader, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = ImageDownloader::new(Config::default())?;
//!
//!     // Subscribe to log lines and status updates
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let Event::Log { line } = event {
//!                 println!("{}", line);
//!             }
//!         }
//!     });
//!
//!     let summary = downloader
//!         .run("products.csv", "downloaded_images", RunOptions::default())
//!         .await?;
//!     println!("{} images downloaded", summary.stats.downloaded);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Zip archiving of row folders
pub mod archive;
/// Configuration types
pub mod config;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Image fetching
pub mod fetcher;
/// Progress and ETA accounting
pub mod progress;
/// Filename resolution from image URLs
pub mod resolver;
/// Progress reporting seam
pub mod sink;
/// CSV row source
pub mod source;
/// Run summary
pub mod summary;
/// Core types
pub mod types;
/// Path helpers
pub mod utils;

// Re-export commonly used types
pub use archive::Archiver;
pub use config::{ArchiveConfig, Compression, Config, DownloadConfig, InputConfig};
pub use downloader::ImageDownloader;
pub use error::{Error, Result};
pub use fetcher::{Fetcher, HttpFetcher};
pub use sink::{NullSink, ProgressSink};
pub use summary::RunSummary;
pub use types::{DownloadOutcome, Event, ImageTask, ProductResult, Row, RunOptions, RunStats};

use std::path::PathBuf;

/// Run a download and cancel it on SIGTERM or SIGINT (Ctrl+C)
///
/// The signal does not abort the run outright: the image in flight is
/// finished and the returned summary is marked cancelled.
///
/// # Example
///
/// ```no_run
/// use csv_image_dl::{Config, ImageDownloader, RunOptions, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = ImageDownloader::new(Config::default())?;
///     let summary =
///         run_with_shutdown(&downloader, "products.csv", "out", RunOptions::default()).await?;
///     println!("{}", summary);
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(
    downloader: &ImageDownloader,
    input: impl Into<PathBuf>,
    output_dir: impl Into<PathBuf>,
    options: RunOptions,
) -> Result<RunSummary> {
    let run = downloader.run(input, output_dir, options);
    tokio::pin!(run);

    tokio::select! {
        result = &mut run => return result,
        _ = wait_for_signal() => {
            tracing::info!("cancelling run after signal");
            downloader.cancel();
        }
    }

    run.await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            ctrl_c_or_pending().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c_or_pending().await;
}

/// Wait for Ctrl+C; never resolves if the handler cannot be installed
async fn ctrl_c_or_pending() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    }
}
