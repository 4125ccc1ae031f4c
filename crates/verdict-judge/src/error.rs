//! Error types for oracle and judging orchestration

use std::path::PathBuf;

use thiserror::Error;

use crate::client::ClientError;

pub type Result<T> = std::result::Result<T, JudgeError>;

#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("failed to parse {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown model set: {0}")]
    UnknownModelSet(String),

    #[error("no usable oracle model configured")]
    NoModels,

    #[error("no service results to judge")]
    NoResults,

    #[error("model client error: {0}")]
    Client(#[from] ClientError),

    #[error("table error: {0}")]
    Table(#[from] verdict_data::DataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
