// crates/orderlens-core/src/loader.rs

use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;

use polars::prelude::*;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Where a table comes from: a file on disk, or bytes handed to us by
/// the caller (an uploaded stream). Both carry a human-readable label
/// so failures name the dataset, not just the path.
#[derive(Debug, Clone)]
pub enum TableSource {
    Path { label: String, path: PathBuf },
    Bytes {
        label: String,
        name: String,
        contents: Vec<u8>,
    },
}

impl TableSource {
    pub fn from_path(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Path {
            label: label.into(),
            path: path.into(),
        }
    }

    pub fn from_bytes(
        label: impl Into<String>,
        name: impl Into<String>,
        contents: Vec<u8>,
    ) -> Self {
        Self::Bytes {
            label: label.into(),
            name: name.into(),
            contents,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Path { label, .. } | Self::Bytes { label, .. } => label,
        }
    }

    /// Identifier the cache keys on. Distinct prefixes keep a path and
    /// an upload with the same name from colliding.
    pub fn cache_key(&self) -> String {
        match self {
            Self::Path { path, .. } => format!("path:{}", path.display()),
            Self::Bytes { name, .. } => format!("bytes:{}", name),
        }
    }
}

/// Reads a source into a DataFrame. The content is checked twice: a
/// structural pass with the csv crate (header row present, no ragged
/// rows, valid UTF-8) so malformed input surfaces as a parse failure
/// with a row position, then the typed polars read.
pub fn load_table(source: &TableSource) -> Result<DataFrame> {
    let owned;
    let (label, contents): (&str, &[u8]) = match source {
        TableSource::Path { label, path } => {
            owned = std::fs::read(path).map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    PipelineError::SourceNotFound {
                        label: label.clone(),
                        path: path.display().to_string(),
                    }
                } else {
                    PipelineError::Io(err)
                }
            })?;
            (label.as_str(), owned.as_slice())
        }
        TableSource::Bytes {
            label, contents, ..
        } => (label.as_str(), contents.as_slice()),
    };

    validate_delimited(label, contents)?;
    let df = read_dataframe(label, contents)?;
    debug!(
        label,
        rows = df.height(),
        columns = df.width(),
        "loaded table"
    );
    Ok(df)
}

fn validate_delimited(label: &str, contents: &[u8]) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(contents);

    let headers = reader
        .headers()
        .map_err(|err| parse_failure(label, err.to_string()))?;
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(parse_failure(label, "file is empty or has no header row"));
    }

    for (idx, record) in reader.records().enumerate() {
        record.map_err(|err| parse_failure(label, format!("data row {}: {}", idx + 1, err)))?;
    }

    Ok(())
}

fn read_dataframe(label: &str, contents: &[u8]) -> Result<DataFrame> {
    let cursor = Cursor::new(contents);
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(cursor)
        .finish()
        .map_err(|err| parse_failure(label, err.to_string()))
}

fn parse_failure(label: &str, message: impl Into<String>) -> PipelineError {
    PipelineError::Parse {
        label: label.to_string(),
        message: message.into(),
    }
}

/// Explicit table cache keyed by source identifier. Loaded frames are
/// reused across runs until the caller invalidates them; cloning a
/// DataFrame is cheap (columns are reference-counted).
#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<String, DataFrame>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached frame for this source, loading it on a miss.
    pub fn fetch(&mut self, source: &TableSource) -> Result<DataFrame> {
        let key = source.cache_key();
        if let Some(df) = self.entries.get(&key) {
            debug!(label = source.label(), "table cache hit");
            return Ok(df.clone());
        }
        let df = load_table(source)?;
        self.entries.insert(key, df.clone());
        Ok(df)
    }

    /// Drops the cached entry for this source. Returns whether one existed.
    pub fn invalidate(&mut self, source: &TableSource) -> bool {
        self.entries.remove(&source.cache_key()).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_source(name: &str, content: &str) -> TableSource {
        TableSource::from_bytes("Test Table", name, content.as_bytes().to_vec())
    }

    #[test]
    fn loads_well_formed_csv_from_bytes() {
        let source = bytes_source(
            "orders.csv",
            "order_id,price\no1,10.5\no2,20.0\n",
        );
        let df = load_table(&source).expect("load failed");
        assert_eq!(df.height(), 2);
        assert_eq!(df.get_column_names_str(), ["order_id", "price"]);
    }

    #[test]
    fn missing_file_is_source_not_found() {
        let source = TableSource::from_path("Order Items", "/definitely/not/here.csv");
        let err = load_table(&source).unwrap_err();
        assert!(matches!(err, PipelineError::SourceNotFound { .. }));
    }

    #[test]
    fn ragged_rows_are_a_parse_failure() {
        let source = bytes_source("bad.csv", "order_id,price\no1,10.5,extra\n");
        let err = load_table(&source).unwrap_err();
        match err {
            PipelineError::Parse { label, message } => {
                assert_eq!(label, "Test Table");
                assert!(message.contains("data row 1"), "message: {message}");
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn empty_content_is_a_parse_failure() {
        let source = bytes_source("empty.csv", "");
        let err = load_table(&source).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { .. }));
    }

    #[test]
    fn cache_reuses_and_invalidates() {
        let source = bytes_source("orders.csv", "order_id\no1\n");
        let mut cache = TableCache::new();
        cache.fetch(&source).expect("first load failed");
        cache.fetch(&source).expect("cached load failed");
        assert_eq!(cache.len(), 1);

        assert!(cache.invalidate(&source));
        assert!(cache.is_empty());
        assert!(!cache.invalidate(&source));
    }
}
