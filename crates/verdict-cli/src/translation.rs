//! Language-translation evaluation flow: services → judging.
//!
//! Translations are scored by the LLM judge only; WER is a speech metric
//! and is not computed here.

use anyhow::{Context, Result};
use tracing::info;

use verdict_data::{load_translation_manifest, Task};
use verdict_judge::{judge_services, resolve_models, ClientConfig, ModelsConfig};
use verdict_registry::{load_registry, run_services, ServicesConfig};

use crate::runners::builtin_runners;
use crate::RunOptions;

pub fn run(options: &RunOptions) -> Result<()> {
    let samples = load_translation_manifest(&options.translation_manifest, Some(options.samples))
        .context("failed to load translation manifest")?;
    info!("loaded {} translation samples", samples.len());

    let services_config = ServicesConfig::load(&options.config_dir.join("services.toml"))?;
    let models_config = ModelsConfig::load(&options.config_dir.join("models.toml"))?;

    let client_config = ClientConfig::from_env()?;
    let runner_table = builtin_runners(&client_config);
    let registry = load_registry(&services_config, &runner_table)?;
    let set = services_config.service_set("language_translation")?;

    let results_dir = options.results_dir.join("language_translation");
    let mut results = run_services(
        &samples,
        set,
        &registry,
        Task::Translation,
        options.use_existing,
        &results_dir,
    )?;

    if results.is_empty() {
        info!("--- Skipping LLM judging (no translation results) ---");
        return Ok(());
    }

    let judge_models = resolve_models(
        models_config.model_set_or_empty("language_judge"),
        &client_config,
    );
    if judge_models.is_empty() {
        info!("--- Skipping LLM judging (no judge models configured) ---");
        return Ok(());
    }

    info!("--- LLM Judging ---");
    judge_services(
        &mut results,
        &samples,
        &judge_models,
        Task::Translation,
        models_config.judging.presentation_orders,
        &results_dir,
    )?;

    Ok(())
}
