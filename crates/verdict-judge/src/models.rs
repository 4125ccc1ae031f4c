//! Model-set configuration loaded from `models.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::client::{build_client, ChatModel, ClientConfig};
use crate::error::{JudgeError, Result};
use crate::judging::PresentationOrders;

fn default_true() -> bool {
    true
}

/// One configured oracle/judge model.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub provider: String,
    pub model_id: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Judging behavior knobs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JudgingConfig {
    /// Single pass in service-set order, or every permutation as a distinct
    /// pass for positional-bias detection.
    #[serde(default)]
    pub presentation_orders: PresentationOrders,
    /// Return per-model oracle tables instead of the legacy single table.
    #[serde(default)]
    pub multi_model: bool,
}

/// Root of `models.toml`: named model sets plus judging knobs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelsConfig {
    #[serde(default)]
    pub model_sets: BTreeMap<String, Vec<ModelEntry>>,
    #[serde(default)]
    pub judging: JudgingConfig,
}

impl ModelsConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(JudgeError::ConfigNotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|source| JudgeError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Return a named model set, failing fast on unknown names.
    pub fn model_set(&self, name: &str) -> Result<&[ModelEntry]> {
        self.model_sets
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| JudgeError::UnknownModelSet(name.to_string()))
    }

    /// Like [`model_set`](Self::model_set) but absent sets are simply empty,
    /// for flows that treat judging as optional.
    pub fn model_set_or_empty(&self, name: &str) -> &[ModelEntry] {
        self.model_sets.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A configured model resolved to a live client.
#[derive(Clone)]
pub struct JudgeModel {
    pub name: String,
    pub model_id: String,
    pub client: Arc<dyn ChatModel>,
}

impl std::fmt::Debug for JudgeModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgeModel")
            .field("name", &self.name)
            .field("model_id", &self.model_id)
            .finish_non_exhaustive()
    }
}

impl JudgeModel {
    /// Test seam: wrap an arbitrary [`ChatModel`] implementation.
    pub fn with_client(
        name: impl Into<String>,
        model_id: impl Into<String>,
        client: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            name: name.into(),
            model_id: model_id.into(),
            client,
        }
    }
}

/// Resolve configured model entries to live clients. Disabled entries are
/// skipped silently; unsupported providers are skipped with a warning so the
/// remaining models still produce output (partial-success policy).
pub fn resolve_models(entries: &[ModelEntry], config: &ClientConfig) -> Vec<JudgeModel> {
    let mut resolved = Vec::new();
    for entry in entries {
        if !entry.enabled {
            continue;
        }
        match build_client(&entry.provider, config) {
            Some(client) => resolved.push(JudgeModel {
                name: entry.name.clone(),
                model_id: entry.model_id.clone(),
                client,
            }),
            None => {
                warn!(
                    "unsupported provider '{}' for model '{}', skipping",
                    entry.provider, entry.name
                );
            }
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_models_config_parses() {
        let config: ModelsConfig = toml::from_str(
            r#"
            [judging]
            presentation_orders = "exhaustive"
            multi_model = true

            [[model_sets.speech_judge]]
            name = "gpt_audio"
            provider = "openai"
            model_id = "gpt-audio"

            [[model_sets.speech_judge]]
            name = "local"
            provider = "llamafile"
            model_id = "whatever"
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(
            config.judging.presentation_orders,
            PresentationOrders::Exhaustive
        );
        assert!(config.judging.multi_model);
        let set = config.model_set("speech_judge").unwrap();
        assert_eq!(set.len(), 2);
        assert!(!set[1].enabled);
        assert!(matches!(
            config.model_set("nope"),
            Err(JudgeError::UnknownModelSet(_))
        ));
        assert!(config.model_set_or_empty("nope").is_empty());
    }

    #[test]
    fn test_resolve_skips_disabled_and_unsupported() {
        let entries = vec![
            ModelEntry {
                name: "gpt_audio".into(),
                provider: "openai".into(),
                model_id: "gpt-audio".into(),
                enabled: true,
            },
            ModelEntry {
                name: "disabled".into(),
                provider: "openai".into(),
                model_id: "gpt-audio".into(),
                enabled: false,
            },
            ModelEntry {
                name: "exotic".into(),
                provider: "homegrown".into(),
                model_id: "x".into(),
                enabled: true,
            },
        ];
        let resolved = resolve_models(&entries, &ClientConfig::new("test-key"));
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "gpt_audio");
    }
}
