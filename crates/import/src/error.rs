use lexbridge_core::LookupError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Input file {} not found; export the balance history first or use SOURCE_METHOD=API", .0.display())]
    MissingInputFile(PathBuf),
    #[error("Malformed record on line {line}: {columns} columns, expected at least {}", crate::csv::MIN_COLUMNS)]
    MalformedRecord { line: u64, columns: usize },
    #[error("Could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("Listing balance transactions failed: {0}")]
    Api(#[from] LookupError),
}
