//! Runner dispatch table.
//!
//! Configuration names runners by a stable string key; the binary populates
//! this table at startup with its explicit list of built-in services. Keys
//! resolve to runner instances at registry load time so a typo surfaces
//! before any external call, not mid-batch.

use std::collections::BTreeMap;
use std::sync::Arc;

use verdict_data::{ResultTable, Sample};

/// External collaborator contract: turn the full sample collection into one
/// tabular result set. Implementations make the provider wire calls and are
/// free to fail; the orchestrator propagates errors without retrying.
pub trait ServiceRunner: Send + Sync {
    fn run(&self, samples: &[Sample]) -> anyhow::Result<ResultTable>;
}

/// Registration table mapping runner keys to implementations.
#[derive(Default, Clone)]
pub struct RunnerTable {
    runners: BTreeMap<String, Arc<dyn ServiceRunner>>,
}

impl RunnerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<String>, runner: Arc<dyn ServiceRunner>) {
        self.runners.insert(key.into(), runner);
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn ServiceRunner>> {
        self.runners.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.runners.contains_key(key)
    }
}

impl std::fmt::Debug for RunnerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerTable")
            .field("keys", &self.runners.keys().collect::<Vec<_>>())
            .finish()
    }
}
