//! Common test utilities for csv-image-dl end-to-end tests

#![allow(dead_code)]

use csv_image_dl::Config;
use std::path::{Path, PathBuf};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config suitable for tests: no pacing, short timeout
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.download.request_delay = Duration::ZERO;
    config.download.timeout = Duration::from_secs(5);
    config
}

/// Write `contents` as the input table and return its path
pub fn write_input(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("products.csv");
    std::fs::write(&path, contents).unwrap();
    path
}

/// Serve `body` for GET `route`, expecting exactly `calls` requests
pub async fn serve_image(server: &MockServer, route: &str, body: &[u8], calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .expect(calls)
        .mount(server)
        .await;
}

/// Sorted entry names of a zip archive
pub fn zip_entry_names(archive: &Path) -> Vec<String> {
    let file = std::fs::File::open(archive).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut names: Vec<String> = (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    names
}

/// Contents of one archive entry
pub fn zip_entry_bytes(archive: &Path, name: &str) -> Vec<u8> {
    use std::io::Read;
    let file = std::fs::File::open(archive).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).unwrap();
    bytes
}
