use chrono::NaiveDate;
use core_types::CoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UniverseError {
    #[error("No universe data is available for {0}")]
    Unavailable(NaiveDate),

    #[error("The universe for {0} contains no stocks")]
    Empty(NaiveDate),

    #[error("Failed to read universe file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Malformed universe row: {0}")]
    Csv(#[from] csv::Error),

    #[error("Universe row {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    #[error("Inconsistent universe data: {0}")]
    Inconsistent(#[from] CoreError),
}
