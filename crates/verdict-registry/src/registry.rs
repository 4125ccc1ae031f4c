//! Registry resolution and service-set normalization.

use std::collections::BTreeMap;
use std::sync::Arc;

use verdict_data::Task;

use crate::config::{ServiceSetEntry, ServicesConfig};
use crate::error::{RegistryError, Result};
use crate::runner::{RunnerTable, ServiceRunner};

/// A registry entry with its runner reference resolved.
#[derive(Clone)]
pub struct ServiceEntry {
    pub name: String,
    pub results_file: String,
    pub task: Task,
    pub enabled: bool,
    pub runner: Arc<dyn ServiceRunner>,
}

impl std::fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("name", &self.name)
            .field("results_file", &self.results_file)
            .field("task", &self.task)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// A service selected for one orchestrator run, with per-call overrides
/// already merged over the registry defaults.
#[derive(Clone)]
pub struct SelectedService {
    pub name: String,
    pub results_file: String,
    pub task: Task,
    pub runner: Arc<dyn ServiceRunner>,
}

/// Resolve every registry entry's runner key against the registration
/// table. Unresolvable keys are configuration errors raised here, at load
/// time, rather than mid-batch.
pub fn load_registry(
    config: &ServicesConfig,
    runners: &RunnerTable,
) -> Result<BTreeMap<String, ServiceEntry>> {
    let mut registry = BTreeMap::new();
    for (name, entry) in &config.service_registry {
        let runner =
            runners
                .get(&entry.runner)
                .ok_or_else(|| RegistryError::UnresolvedRunner {
                    service: name.clone(),
                    key: entry.runner.clone(),
                })?;
        registry.insert(
            name.clone(),
            ServiceEntry {
                name: name.clone(),
                results_file: entry.results_file.clone(),
                task: entry.task,
                enabled: entry.enabled,
                runner,
            },
        );
    }
    Ok(registry)
}

/// Normalize a caller-supplied service set against the registry: keep the
/// caller's order, drop disabled entries, reject unknown names, merge
/// per-call overrides, and keep only services matching the requested task.
pub fn normalize_service_set(
    set: &[ServiceSetEntry],
    registry: &BTreeMap<String, ServiceEntry>,
    task: Task,
) -> Result<Vec<SelectedService>> {
    let mut selected = Vec::new();
    for entry in set {
        if !entry.enabled {
            continue;
        }
        let registered = registry
            .get(&entry.name)
            .ok_or_else(|| RegistryError::UnknownService(entry.name.clone()))?;
        if registered.task != task {
            continue;
        }
        selected.push(SelectedService {
            name: registered.name.clone(),
            results_file: entry
                .results_file
                .clone()
                .unwrap_or_else(|| registered.results_file.clone()),
            task: registered.task,
            runner: Arc::clone(&registered.runner),
        });
    }
    Ok(selected)
}
