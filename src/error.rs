use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by column resolution, classification, extraction,
/// aggregation and per-file I/O.
#[derive(Error, Debug)]
pub enum Error {
    /// The table does not have enough columns to hold a frequency and a magnitude.
    #[error("table has {found} column(s), at least 2 are required")]
    InsufficientColumns { found: usize },

    /// A positional fallback landed on a column already claimed by the other role.
    #[error("column {index} ('{header}') would be used for both frequency and magnitude")]
    ColumnCollision { index: usize, header: String },

    /// Base frequency must be strictly positive.
    #[error("base frequency must be positive, got {0}")]
    InvalidBase(i64),

    /// Frequency is NaN or infinite and cannot be classified.
    #[error("frequency {0} is not a finite number")]
    NotANumber(f64),

    /// Frequency is finite but its classified multiple does not fit in an `i64`.
    #[error("frequency {0} is too large to classify")]
    FrequencyOutOfRange(f64),

    /// No measurement row to extract from.
    #[error("dataset contains no usable measurement rows")]
    EmptyDataset,

    /// No classified row to aggregate.
    #[error("no classified rows to aggregate")]
    EmptyInput,

    /// A cell in the frequency or magnitude column is not numeric.
    #[error("row {row}, column '{column}': '{value}' is not a number")]
    InvalidCell {
        row: usize,
        column: String,
        value: String,
    },

    /// Unreadable, unparseable or unwritable file.
    #[error("I/O failure on {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
}

impl Error {
    /// Fold a loader/writer error chain into an [`Error::Io`] for `path`.
    pub fn io(path: &Path, err: &anyhow::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            message: format!("{err:#}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
