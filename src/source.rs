//! Input table reader
//!
//! [`RowSource`] turns a CSV table into an ordered stream of [`Row`]s. It only
//! looks at two columns (identifier and image URLs, names taken from
//! [`InputConfig`]); all other columns are ignored. The stream is lazy and
//! single-pass: re-reading requires opening the source again.

use crate::config::InputConfig;
use crate::error::{InputFormatError, Result};
use crate::types::Row;
use crate::utils::sanitize_component;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Lazy sequence of rows read from a CSV table
pub struct RowSource<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    id_index: usize,
    image_index: usize,
    placeholder_id: String,
}

impl RowSource<File> {
    /// Open a table on disk
    ///
    /// Fails with [`InputFormatError::Unreadable`] if the file cannot be
    /// opened and with [`InputFormatError::MissingColumn`] if the header lacks
    /// a required column.
    pub fn open(path: &Path, config: &InputConfig) -> Result<Self> {
        let file = File::open(path).map_err(|e| InputFormatError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(?path, "opened input table");
        Self::from_reader(file, config)
    }
}

impl<R: Read> RowSource<R> {
    /// Wrap any reader producing CSV text with a header row
    pub fn from_reader(reader: R, config: &InputConfig) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(config.delimiter as u8)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| InputFormatError::MalformedRecord {
                line: 1,
                reason: e.to_string(),
            })?
            .iter()
            .map(normalize_header)
            .collect();

        let id_index = find_column(&headers, &config.id_column)?;
        let image_index = find_column(&headers, &config.image_column)?;

        debug!(
            columns = headers.len(),
            id_index, image_index, "resolved input columns"
        );

        Ok(Self {
            records: reader.into_records(),
            id_index,
            image_index,
            placeholder_id: config.placeholder_id.clone(),
        })
    }

    fn to_row(&self, record: &csv::StringRecord) -> Row {
        let id = record.get(self.id_index).unwrap_or_default();
        let raw_image_field = record.get(self.image_index).unwrap_or_default();
        Row {
            id: sanitize_component(id, &self.placeholder_id),
            raw_image_field: raw_image_field.to_string(),
        }
    }
}

impl<R: Read> Iterator for RowSource<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(match record {
            Ok(record) => Ok(self.to_row(&record)),
            Err(e) => Err(InputFormatError::MalformedRecord {
                line: e.position().map(|p| p.line()).unwrap_or(0),
                reason: e.to_string(),
            }
            .into()),
        })
    }
}

/// Read every row of a table on disk
///
/// Any malformed record fails the whole read, so callers never start
/// processing a table they cannot finish parsing.
pub fn read_rows(path: &Path, config: &InputConfig) -> Result<Vec<Row>> {
    RowSource::open(path, config)?.collect()
}

fn normalize_header(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().to_string()
}

fn find_column(headers: &[String], column: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| {
            InputFormatError::MissingColumn {
                column: column.to_string(),
                found: headers.join(", "),
            }
            .into()
        })
}
