//! verdict CLI library
//!
//! Re-exports the evaluation flows and built-in runners so integration
//! tests can drive them without the interactive menu.

use std::path::PathBuf;

pub mod runners;
pub mod speech;
pub mod translation;

/// Everything one menu selection needs, built once per evaluation run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory holding `services.toml` and `models.toml`.
    pub config_dir: PathBuf,
    /// Root of the per-task results tree.
    pub results_dir: PathBuf,
    /// Reuse existing result files instead of re-invoking services.
    pub use_existing: bool,
    /// Cap on samples per run.
    pub samples: usize,
    pub speech_manifest: PathBuf,
    pub translation_manifest: PathBuf,
}
