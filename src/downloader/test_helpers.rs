//! Shared test helpers for creating ImageDownloader instances in tests.

use crate::config::Config;
use crate::downloader::ImageDownloader;
use crate::error::NetworkError;
use crate::fetcher::Fetcher;
use crate::sink::ProgressSink;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{TempDir, tempdir};

/// In-memory fetcher: URLs map to canned bodies, everything else is a 404
#[derive(Default)]
pub(crate) struct StubFetcher {
    bodies: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`
    pub(crate) fn with(mut self, url: &str, body: &[u8]) -> Self {
        self.bodies.insert(url.to_string(), body.to_vec());
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(url.to_string());
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| NetworkError::Status {
                url: url.to_string(),
                status: 404,
            })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Sink that records everything it is given
#[derive(Default)]
pub(crate) struct CapturingSink {
    logs: Mutex<Vec<String>>,
    statuses: Mutex<Vec<String>>,
}

impl CapturingSink {
    pub(crate) fn logs(&self) -> Vec<String> {
        self.logs.lock().unwrap().clone()
    }

    pub(crate) fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }
}

impl ProgressSink for CapturingSink {
    fn emit_log(&self, line: &str) {
        self.logs.lock().unwrap().push(line.to_string());
    }

    fn emit_status(&self, text: &str) {
        self.statuses.lock().unwrap().push(text.to_string());
    }
}

/// Helper to create a test ImageDownloader backed by `fetcher`, with no
/// request delay. Returns the downloader and the tempdir (which must be kept alive).
pub(crate) fn create_test_downloader(fetcher: Arc<StubFetcher>) -> (ImageDownloader, TempDir) {
    let temp_dir = tempdir().unwrap();
    let mut config = Config::default();
    config.download.output_dir = temp_dir.path().join("out");
    config.download.request_delay = Duration::ZERO;
    (ImageDownloader::with_fetcher(config, fetcher), temp_dir)
}

/// Write an input table with an `id,image` header
pub(crate) fn write_csv(dir: &Path, rows: &[(&str, &str)]) -> PathBuf {
    let path = dir.join("products.csv");
    let mut writer = csv::Writer::from_path(&path).unwrap();
    writer.write_record(["id", "image"]).unwrap();
    for (id, images) in rows {
        writer.write_record([*id, *images]).unwrap();
    }
    writer.flush().unwrap();
    path
}

/// Entry names of a zip archive, in archive order
pub(crate) fn zip_entries(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}
