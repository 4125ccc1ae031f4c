//! Blocking chat-model transport.
//!
//! Every model call in the harness is a blocking round trip (samples are
//! processed strictly sequentially), so the client is built on reqwest's
//! blocking API. Credentials live in an explicit [`ClientConfig`] built once
//! per run by the binary, never in global state.

use std::path::{Path, PathBuf};

use base64::Engine;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("OPENAI_API_KEY must be set in environment")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Connection settings for one evaluation run.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
}

impl ClientConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Read the API key from the environment. Called once by the binary at
    /// flow start so a missing key fails before any external call.
    pub fn from_env() -> Result<Self, ClientError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| ClientError::MissingApiKey)?;
        if api_key.is_empty() {
            return Err(ClientError::MissingApiKey);
        }
        Ok(Self::new(api_key))
    }
}

/// WAV payload attached to a chat request.
#[derive(Debug, Clone)]
pub struct AudioAttachment {
    pub path: PathBuf,
    pub format: String,
}

impl AudioAttachment {
    pub fn wav(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: "wav".to_string(),
        }
    }
}

/// One blocking chat completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub prompt: String,
    pub audio: Option<AudioAttachment>,
}

impl ChatRequest {
    pub fn text(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            audio: None,
        }
    }

    pub fn with_audio(mut self, audio: AudioAttachment) -> Self {
        self.audio = Some(audio);
        self
    }
}

/// Judge-capable model seam. Oracle and judging orchestration only see this
/// trait, so tests substitute scripted stubs.
pub trait ChatModel: Send + Sync {
    fn complete(&self, request: &ChatRequest) -> Result<String, ClientError>;
}

/// Blocking REST client for the OpenAI chat-completions and
/// audio-transcriptions endpoints.
pub struct OpenAiClient {
    http: reqwest::blocking::Client,
    config: ClientConfig,
}

impl OpenAiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            config,
        }
    }

    fn check_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    fn chat_completion(&self, request: &ChatRequest) -> Result<String, ClientError> {
        let mut content = vec![json!({ "type": "text", "text": request.prompt })];
        if let Some(audio) = &request.audio {
            let bytes = std::fs::read(&audio.path)?;
            let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
            content.push(json!({
                "type": "input_audio",
                "input_audio": { "data": encoded, "format": audio.format },
            }));
        }
        let body = json!({
            "model": request.model,
            "modalities": ["text"],
            "messages": [{ "role": "user", "content": content }],
        });

        debug!(model = %request.model, audio = request.audio.is_some(), "chat completion");
        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()?;
        let payload: serde_json::Value = Self::check_status(response)?.json()?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                ClientError::MalformedResponse("response has no message content".to_string())
            })
    }

    /// Transcribe a WAV file through the audio-transcriptions endpoint
    /// (multipart upload). Powers the built-in Whisper runner.
    pub fn transcribe(&self, model: &str, audio_path: &Path) -> Result<String, ClientError> {
        let form = reqwest::blocking::multipart::Form::new()
            .text("model", model.to_string())
            .file("file", audio_path)?;

        debug!(model, file = %audio_path.display(), "transcription request");
        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()?;
        let payload: serde_json::Value = Self::check_status(response)?.json()?;

        payload["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                ClientError::MalformedResponse("transcription has no text field".to_string())
            })
    }
}

impl ChatModel for OpenAiClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, ClientError> {
        self.chat_completion(request)
    }
}

/// Provider dispatch: `None` for providers the harness has no client for.
/// Callers warn and skip those so other models still run.
pub fn build_client(
    provider: &str,
    config: &ClientConfig,
) -> Option<std::sync::Arc<dyn ChatModel>> {
    match provider {
        "openai" => Some(std::sync::Arc::new(OpenAiClient::new(config.clone()))),
        _ => None,
    }
}
