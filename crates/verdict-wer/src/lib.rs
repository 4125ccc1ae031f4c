//! Word-Error-Rate engine
//!
//! Tokenizes transcripts with English normalization rules, computes
//! word-level edit-distance error counts per sample, and aggregates them
//! into micro-averaged (pooled) corpus rates per service. Every sample is
//! scored against two independent references: the LLM oracle transcript and
//! the human ground truth.

pub mod counts;
pub mod error;
pub mod text;

pub use counts::{
    compute_wer_counts, compute_wer_summary, save_wer_counts, save_wer_summary, WerCountRecord,
    WerSummaryRecord,
};
pub use error::{Result, WerError};
pub use text::tokenize;
