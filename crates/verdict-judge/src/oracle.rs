//! Oracle reference generation.
//!
//! An oracle model produces an independent transcript/translation per
//! sample, used as a second ground truth alongside the human labels. One
//! malformed model reply degrades that sample to the `"n/a"` sentinel; it
//! must never lose the rest of an expensive batch.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use verdict_data::{OracleTable, Sample, Task};

use crate::client::{AudioAttachment, ChatRequest};
use crate::error::{JudgeError, Result};
use crate::models::JudgeModel;

/// Shape selected by the caller: the legacy single table, or one table per
/// configured model.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleOutput {
    Single(OracleTable),
    PerModel(Vec<(String, OracleTable)>),
}

impl OracleOutput {
    /// The table WER scoring should use as its oracle reference: the single
    /// table, or the first model's table under fan-out.
    pub fn primary(&self) -> Option<&OracleTable> {
        match self {
            OracleOutput::Single(table) => Some(table),
            OracleOutput::PerModel(tables) => tables.first().map(|(_, table)| table),
        }
    }
}

/// Strict JSON shape the oracle model is instructed to return.
#[derive(Debug, Deserialize)]
struct OracleReply {
    llm_oracle: Option<String>,
}

fn oracle_prompt(task: Task, sample: &Sample) -> String {
    match task {
        Task::Stt => "Please give me a transcript for the following audio file.\n\
             You MUST return ONLY valid JSON. Do not include markdown, code fences, or explanations.\n\
             JSON schema:\n\
             {\n  \"llm_oracle\": string|null\n}\n\
             If you do not receive the WAV file, enter llm_oracle as 'n/a'.\n\
             Do NOT mention that you need the WAV file, only give the JSON schema output.\n\
             If you violate this, the output will be discarded."
            .to_string(),
        Task::Translation => format!(
            "Please give me a French translation for the following English text.\n\
             You MUST return ONLY valid JSON. Do not include markdown, code fences, or explanations.\n\
             JSON schema:\n\
             {{\n  \"llm_oracle\": string|null\n}}\n\
             If you do not receive the English input, enter llm_oracle as 'n/a'.\n\
             Do NOT mention that you need the English input, only give the JSON schema output.\n\
             If you violate this, the output will be discarded.\n\
             English text: {}",
            sample.source_text().unwrap_or_default()
        ),
    }
}

fn parse_oracle_reply(content: &str) -> String {
    match serde_json::from_str::<OracleReply>(content) {
        Ok(OracleReply {
            llm_oracle: Some(text),
        }) => text,
        Ok(OracleReply { llm_oracle: None }) => "n/a".to_string(),
        Err(err) => {
            warn!("unparseable oracle reply ({err}), using sentinel");
            "n/a".to_string()
        }
    }
}

fn oracle_file_name(task: Task) -> &'static str {
    match task {
        Task::Stt => "speech_oracle",
        Task::Translation => "language_oracle",
    }
}

fn generate_for_model(
    samples: &[Sample],
    model: &JudgeModel,
    task: Task,
    path: &Path,
    use_existing: bool,
) -> Result<OracleTable> {
    if use_existing && path.exists() {
        info!("reusing existing oracle results: {}", path.display());
        return Ok(OracleTable::read_csv(path)?);
    }

    let mut table = OracleTable::new();
    for sample in samples {
        match &task {
            Task::Stt => info!(
                "LLM Oracle Transcript: {}",
                sample
                    .audio_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            ),
            Task::Translation => info!(
                "LLM Oracle Translation: ({}) {}",
                sample.key(),
                sample.source_text().unwrap_or_default()
            ),
        }

        let mut request = ChatRequest::text(&model.model_id, oracle_prompt(task, sample));
        if task == Task::Stt {
            if let Some(audio) = sample.audio_path() {
                request = request.with_audio(AudioAttachment::wav(audio));
            }
        }

        let content = model.client.complete(&request)?;
        table.push(sample.key(), parse_oracle_reply(&content));
    }

    table.write_csv(path)?;
    Ok(table)
}

/// Generate oracle references with every usable model.
///
/// `multi_model` selects the output shape: the legacy single table (first
/// usable model; an error if there is none) or a per-model mapping (empty
/// when no model is usable).
pub fn generate_oracle(
    samples: &[Sample],
    models: &[JudgeModel],
    task: Task,
    multi_model: bool,
    use_existing: bool,
    results_dir: &Path,
) -> Result<OracleOutput> {
    let base = oracle_file_name(task);

    if !multi_model {
        let model = models.first().ok_or(JudgeError::NoModels)?;
        let path = results_dir.join(format!("{base}.csv"));
        let table = generate_for_model(samples, model, task, &path, use_existing)?;
        return Ok(OracleOutput::Single(table));
    }

    let mut tables = Vec::new();
    for model in models {
        let path = results_dir.join(format!("{base}_{}.csv", model.name));
        let table = generate_for_model(samples, model, task, &path, use_existing)?;
        tables.push((model.name.clone(), table));
    }
    Ok(OracleOutput::PerModel(tables))
}
