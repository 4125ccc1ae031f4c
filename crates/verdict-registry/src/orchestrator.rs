//! Result orchestration with a file-existence cache.
//!
//! External calls are paid and slow, so a results file that already exists
//! is reused verbatim when `use_existing` is set. That cache is also the
//! recovery mechanism: a crashed run re-invokes only the services whose
//! output file is missing. Runner failures propagate; there is no retry
//! and completed files are never rolled back.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::info;

use verdict_data::{ResultTable, Sample, ServiceResults, Task};

use crate::config::ServiceSetEntry;
use crate::error::{RegistryError, Result};
use crate::registry::{normalize_service_set, ServiceEntry};

/// Run every service selected by `set`, in order, producing one result set
/// per service. Shape validation of runner output is deferred to downstream
/// consumers.
pub fn run_services(
    samples: &[Sample],
    set: &[ServiceSetEntry],
    registry: &BTreeMap<String, ServiceEntry>,
    task: Task,
    use_existing: bool,
    results_dir: &Path,
) -> Result<ServiceResults> {
    fs::create_dir_all(results_dir)?;
    let selected = normalize_service_set(set, registry, task)?;

    let mut results = ServiceResults::new();
    for service in selected {
        let path = results_dir.join(&service.results_file);
        info!("--- {} ---", service.name);

        if use_existing && path.exists() {
            info!("reusing existing results: {}", path.display());
            results.push(service.name, path.clone(), ResultTable::read_csv(&path)?);
            continue;
        }

        let table = service
            .runner
            .run(samples)
            .map_err(|reason| RegistryError::Runner {
                service: service.name.clone(),
                reason,
            })?;
        table.write_csv(&path)?;
        results.push(service.name, path, table);
    }

    Ok(results)
}
