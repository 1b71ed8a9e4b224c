// crates/orderlens-core/src/error.rs

use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

/// Pipeline checkpoint at which a schema check runs. Used to make a
/// missing-column failure say *where* the columns were required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ItemsLoad,
    PaymentsLoad,
    Join,
    Normalize,
    Aggregate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ItemsLoad => "items load",
            Stage::PaymentsLoad => "payments load",
            Stage::Join => "join",
            Stage::Normalize => "timestamp normalization",
            Stage::Aggregate => "aggregation",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("source '{label}' not found at {path}")]
    SourceNotFound { label: String, path: String },

    #[error("source '{label}' could not be parsed as a table: {message}")]
    Parse { label: String, message: String },

    #[error("missing columns at {stage}: {}", columns.join(", "))]
    MissingColumns { stage: Stage, columns: Vec<String> },

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
