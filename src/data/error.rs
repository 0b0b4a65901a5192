use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal failure while loading the source table. No partial table is ever
/// produced alongside one of these.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("missing required column(s): {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("row {row}: amount {value:?} is not a finite number")]
    InvalidAmount { row: usize, value: String },

    #[error("malformed file: {0}")]
    Shape(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

/// A date cell that could not be parsed. The row is kept with a null date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParseWarning {
    /// Zero-based data row (header excluded).
    pub row: usize,
    pub column: &'static str,
    pub value: String,
}

impl fmt::Display for DateParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}: unparseable {} {:?}, treated as unknown",
            self.row, self.column, self.value
        )
    }
}
