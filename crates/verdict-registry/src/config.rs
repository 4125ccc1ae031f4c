//! Service configuration loaded from `services.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use verdict_data::Task;

use crate::error::{RegistryError, Result};

fn default_true() -> bool {
    true
}

/// One `[service_registry.<name>]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryEntry {
    /// Key into the runner registration table.
    pub runner: String,
    /// Output file, relative to the task's results directory.
    pub results_file: String,
    pub task: Task,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// One entry of a named service set: a service name plus per-call overrides
/// merged over the registry defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSetEntry {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub results_file: Option<String>,
}

impl ServiceSetEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            results_file: None,
        }
    }

    pub fn disabled(name: impl Into<String>) -> Self {
        Self {
            enabled: false,
            ..Self::new(name)
        }
    }
}

/// Root of `services.toml`: the global registry plus named service sets.
#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    #[serde(default)]
    pub service_registry: BTreeMap<String, RegistryEntry>,
    #[serde(default)]
    pub service_sets: BTreeMap<String, Vec<ServiceSetEntry>>,
}

impl ServicesConfig {
    /// Load and validate the service configuration. Fails fast, before any
    /// external call, on a missing file, malformed TOML, or an incomplete
    /// registry entry.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RegistryError::ConfigNotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        let config: ServicesConfig =
            toml::from_str(&contents).map_err(|source| RegistryError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.service_registry.is_empty() {
            return Err(RegistryError::Config(
                "config has no [service_registry] section".to_string(),
            ));
        }
        for (name, entry) in &self.service_registry {
            if entry.runner.is_empty() {
                return Err(RegistryError::Config(format!(
                    "service_registry entry '{name}' missing runner"
                )));
            }
            if entry.results_file.is_empty() {
                return Err(RegistryError::Config(format!(
                    "service_registry entry '{name}' missing results_file"
                )));
            }
        }
        Ok(())
    }

    /// Return a named service set, failing fast on unknown names to catch
    /// typos before any runner executes.
    pub fn service_set(&self, name: &str) -> Result<&[ServiceSetEntry]> {
        self.service_sets
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| RegistryError::UnknownServiceSet(name.to_string()))
    }
}
