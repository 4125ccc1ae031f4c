//! Built-in service runners.
//!
//! The commercial cloud providers (AWS, Google, Azure, ...) are invoked by
//! external runner crates; what ships here are the OpenAI-backed services
//! the harness can drive on its own: Whisper transcription and chat-based
//! translation. Both take the client configuration explicitly; runner
//! lifetime is one evaluation run, with no hidden shared state.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing::info;

use verdict_data::{ResultRow, ResultTable, Sample, JUDGE_SCORE_COLUMN};
use verdict_judge::{ChatModel, ChatRequest, ClientConfig, OpenAiClient};
use verdict_registry::{RunnerTable, ServiceRunner};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Speech-to-text through the OpenAI audio-transcriptions endpoint.
pub struct WhisperSttRunner {
    client: OpenAiClient,
    model_id: String,
}

impl WhisperSttRunner {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: OpenAiClient::new(config.clone()),
            model_id: "whisper-1".to_string(),
        }
    }
}

impl ServiceRunner for WhisperSttRunner {
    fn run(&self, samples: &[Sample]) -> anyhow::Result<ResultTable> {
        let mut table = ResultTable::new();
        for sample in samples {
            let audio = sample
                .audio_path()
                .context("speech sample has no audio file")?;
            info!("Whisper STT: {}", audio.display());

            let started = Instant::now();
            let transcript = self.client.transcribe(&self.model_id, audio)?;
            let latency_ms = round2(started.elapsed().as_secs_f64() * 1000.0);
            info!("{transcript}");

            table.push(
                ResultRow::new(format!("whisper_stt_{:04}", sample.id), transcript)
                    .with_extra("wav_file", audio.display().to_string())
                    .with_latency(latency_ms)
                    .with_score(JUDGE_SCORE_COLUMN, 0.0),
            );
        }
        Ok(table)
    }
}

/// English-to-French translation through a chat model.
pub struct LlmTranslationRunner {
    client: OpenAiClient,
    model_id: String,
}

impl LlmTranslationRunner {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: OpenAiClient::new(config.clone()),
            model_id: "gpt-4o-mini".to_string(),
        }
    }
}

impl ServiceRunner for LlmTranslationRunner {
    fn run(&self, samples: &[Sample]) -> anyhow::Result<ResultTable> {
        let mut table = ResultTable::new();
        for sample in samples {
            let english = sample
                .source_text()
                .context("translation sample has no source text")?;
            info!("LLM Translation: ({}) {}", sample.key(), english);

            let prompt = format!(
                "Translate the following English text to French. \
                 Return ONLY the French translation, with no quotes or explanations.\n\
                 English text: {english}"
            );
            let started = Instant::now();
            let french = self
                .client
                .complete(&ChatRequest::text(&self.model_id, prompt))?;
            let latency_ms = round2(started.elapsed().as_secs_f64() * 1000.0);
            info!("{french}");

            table.push(
                ResultRow::new(format!("llm_trans_{:04}", sample.id), french)
                    .with_extra("english_input", english.to_string())
                    .with_latency(latency_ms)
                    .with_score(JUDGE_SCORE_COLUMN, 0.0),
            );
        }
        Ok(table)
    }
}

/// The explicit registration table of built-in services. Configuration
/// refers to these by key; adding a provider means adding a runner here and
/// an entry in `services.toml`.
pub fn builtin_runners(config: &ClientConfig) -> RunnerTable {
    let mut table = RunnerTable::new();
    table.register("whisper_stt", Arc::new(WhisperSttRunner::new(config)));
    table.register(
        "llm_translation",
        Arc::new(LlmTranslationRunner::new(config)),
    );
    table
}
