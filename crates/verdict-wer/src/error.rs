//! Error types for WER computation

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WerError>;

#[derive(Error, Debug)]
pub enum WerError {
    #[error("no speech results provided for WER calculation")]
    NoResults,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
