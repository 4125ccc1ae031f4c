//! Error types for registry and orchestration

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("failed to parse {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown service set: {0}")]
    UnknownServiceSet(String),

    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("no runner registered for key '{key}' (service '{service}')")]
    UnresolvedRunner { service: String, key: String },

    #[error("runner for service '{service}' failed: {reason}")]
    Runner { service: String, reason: anyhow::Error },

    #[error("table error: {0}")]
    Table(#[from] verdict_data::DataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
