//! LLM oracle generation and judging orchestration
//!
//! Drives a judge-capable chat model two ways: as an *oracle* that produces
//! an independent reference transcript/translation per sample, and as a
//! *judge* that scores every service's output per sample on a 1.0–10.0
//! scale. Supports multi-model fan-out, positional-bias control through
//! multiple presentation orders, and defensive parsing of untrusted model
//! replies: a flaky judge response degrades one sample to sentinels, never
//! the batch.

pub mod client;
pub mod error;
pub mod judging;
pub mod models;
pub mod oracle;

pub use client::{
    build_client, AudioAttachment, ChatModel, ChatRequest, ClientConfig, ClientError, OpenAiClient,
};
pub use error::{JudgeError, Result};
pub use judging::{judge_services, JudgeReport, JudgeReportRow, PresentationOrders};
pub use models::{resolve_models, JudgeModel, JudgingConfig, ModelEntry, ModelsConfig};
pub use oracle::{generate_oracle, OracleOutput};
