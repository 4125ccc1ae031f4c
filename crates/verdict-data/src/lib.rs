//! Shared data model for the verdict benchmark harness
//!
//! Holds everything the evaluation crates agree on: the immutable sample
//! collection loaded from a dataset manifest, the canonical sample-id scheme
//! used as the join key between independently produced result sets, and the
//! CSV-backed tabular result model that services, oracles, and judges all
//! read and write.

pub mod error;
pub mod ids;
pub mod sample;
pub mod table;

pub use error::{DataError, Result};
pub use ids::{canonical_id, normalize_id};
pub use sample::{load_speech_manifest, load_translation_manifest, Sample, SamplePayload, Task};
pub use table::{
    format_score, OracleRow, OracleTable, ResultRow, ResultTable, ServiceResult, ServiceResults,
    JUDGE_SCORE_COLUMN,
};
