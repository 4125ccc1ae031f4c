//! Service registry and result orchestration
//!
//! Decouples "which services ran" from "how to score them": a declarative
//! TOML registry maps service names to runner keys, output files, and task
//! categories; named service sets select ordered subsets per experiment; and
//! the orchestrator invokes each selected runner (or reuses its cached
//! results file) to produce one tabular result set per service.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod runner;

pub use config::{RegistryEntry, ServiceSetEntry, ServicesConfig};
pub use error::{RegistryError, Result};
pub use orchestrator::run_services;
pub use registry::{load_registry, normalize_service_set, SelectedService, ServiceEntry};
pub use runner::{RunnerTable, ServiceRunner};
