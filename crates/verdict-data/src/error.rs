//! Error types for data-model operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DataError>;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("missing required column '{column}' in {path}")]
    MissingColumn { column: String, path: String },

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
