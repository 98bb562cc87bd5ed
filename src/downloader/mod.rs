//! Core downloader implementation split into focused submodules.
//!
//! - [`product`] - Per-row download of every listed image
//! - [`pipeline`] - Whole-run orchestration (read, process, archive, summarize)

mod pipeline;
mod product;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use product::ProductProcessor;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::sink::ProgressSink;
use crate::summary::RunSummary;
use crate::types::{Event, RunOptions};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;

/// Run bookkeeping shared between clones of a downloader
#[derive(Clone, Default)]
pub(crate) struct RunState {
    /// Set while a run is in progress
    running: Arc<AtomicBool>,
    /// Token observed by the current (or next) run
    cancel_token: Arc<Mutex<CancellationToken>>,
}

impl RunState {
    fn token(&self) -> CancellationToken {
        self.cancel_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Claim the single run slot
    fn acquire(&self) -> Result<RunGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::AlreadyRunning)?;
        Ok(RunGuard {
            state: self.clone(),
        })
    }
}

/// Releases the run slot and re-arms cancellation when a run ends, even on panic
struct RunGuard {
    state: RunState,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut token = self
            .state
            .cancel_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if token.is_cancelled() {
            *token = CancellationToken::new();
        }
        drop(token);
        self.state.running.store(false, Ordering::Release);
    }
}

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct ImageDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Fetcher used for every image (trait object for pluggable implementations)
    pub(crate) fetcher: Arc<dyn Fetcher>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Single-run guard and cancellation
    pub(crate) run_state: RunState,
}

impl ImageDownloader {
    /// Create a downloader that fetches over HTTP(S)
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let fetcher = HttpFetcher::new(&config.download)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Create a downloader with a custom [`Fetcher`]
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let (event_tx, _rx) = broadcast::channel(config.download.event_buffer.max(1));
        Self {
            config: Arc::new(config),
            fetcher,
            event_tx,
            run_state: RunState::default(),
        }
    }

    /// Subscribe to log and status events
    ///
    /// Each receiver sees every event sent after it subscribed. A receiver
    /// that falls more than `event_buffer` events behind skips ahead.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The configuration this downloader was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether a run is currently in progress
    pub fn is_running(&self) -> bool {
        self.run_state.running.load(Ordering::Acquire)
    }

    /// Ask the current run to stop after the task in flight
    ///
    /// A request made while idle applies to the next run.
    pub fn cancel(&self) {
        self.run_state.token().cancel();
    }

    /// Download every image listed in `input` below `output_dir`
    ///
    /// Log lines and status text go to every [`subscribe`](Self::subscribe) receiver.
    /// Returns the run summary, or the error that aborted the run.
    pub async fn run(
        &self,
        input: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        options: RunOptions,
    ) -> Result<RunSummary> {
        self.run_with_sink(input, output_dir, options, &self.event_tx)
            .await
    }

    /// Like [`run`](Self::run), but report through a caller-supplied sink
    pub async fn run_with_sink(
        &self,
        input: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        options: RunOptions,
        sink: &dyn ProgressSink,
    ) -> Result<RunSummary> {
        let input = input.into();
        let output_dir = output_dir.into();
        pipeline::validate_paths(&input, &output_dir)?;

        let _guard = self.run_state.acquire()?;
        let token = self.run_state.token();

        let result = self
            .execute(&input, &output_dir, options, sink, token)
            .await;

        if let Err(e) = &result {
            error!(error = %e, ?input, "run aborted");
            sink.emit_log("");
            sink.emit_log(&format!("Error: {}", e));
            sink.emit_status("Error occurred during download");
        }
        result
    }

    /// Run on a separate task so the caller stays responsive
    ///
    /// A panic inside the pipeline is reported as [`Error::Run`] rather than
    /// propagated.
    pub fn spawn_run(
        &self,
        input: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        options: RunOptions,
    ) -> JoinHandle<Result<RunSummary>> {
        let input = input.into();
        let output_dir = output_dir.into();
        let this = self.clone();
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let inner = tokio::spawn(async move { this.run(input, output_dir, options).await });
            match inner.await {
                Ok(result) => result,
                Err(e) => {
                    error!(error = %e, "pipeline task failed");
                    event_tx.emit_log(&format!("Error: {}", e));
                    event_tx.emit_status("Error occurred during download");
                    Err(Error::Run(format!("pipeline task failed: {}", e)))
                }
            }
        })
    }
}
