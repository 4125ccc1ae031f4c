//! Speech-recognition evaluation flow: services → oracle → WER → judging.

use anyhow::{Context, Result};
use tracing::{info, warn};

use verdict_data::{load_speech_manifest, Task};
use verdict_judge::{
    generate_oracle, judge_services, resolve_models, ClientConfig, ModelsConfig,
};
use verdict_registry::{load_registry, run_services, ServicesConfig};
use verdict_wer::{compute_wer_counts, compute_wer_summary, save_wer_counts, save_wer_summary};

use crate::runners::builtin_runners;
use crate::RunOptions;

fn display_rate(rate: Option<f64>) -> String {
    rate.map(|r| format!("{r:.4}")).unwrap_or_else(|| "n/a".to_string())
}

pub fn run(options: &RunOptions) -> Result<()> {
    let samples = load_speech_manifest(&options.speech_manifest, Some(options.samples))
        .context("failed to load speech manifest")?;
    info!("loaded {} speech samples", samples.len());

    let services_config = ServicesConfig::load(&options.config_dir.join("services.toml"))?;
    let models_config = ModelsConfig::load(&options.config_dir.join("models.toml"))?;

    // One client configuration per evaluation run; runners and judges all
    // borrow from it.
    let client_config = ClientConfig::from_env()?;
    let runner_table = builtin_runners(&client_config);
    let registry = load_registry(&services_config, &runner_table)?;
    let set = services_config.service_set("speech_transcription")?;

    let results_dir = options.results_dir.join("speech_recognition");
    let mut results = run_services(
        &samples,
        set,
        &registry,
        Task::Stt,
        options.use_existing,
        &results_dir,
    )?;

    if results.is_empty() {
        info!("--- Skipping scoring (no speech results) ---");
        return Ok(());
    }

    info!("--- LLMaaS ---");
    let oracle_models = resolve_models(
        models_config.model_set("speech_oracle")?,
        &client_config,
    );
    let oracle = generate_oracle(
        &samples,
        &oracle_models,
        Task::Stt,
        models_config.judging.multi_model,
        options.use_existing,
        &results_dir,
    )?;

    match oracle.primary() {
        Some(oracle_table) => {
            info!("--- WER ---");
            let counts = compute_wer_counts(&results, oracle_table, &samples)?;
            save_wer_counts(&results_dir.join("wer_counts.csv"), &counts)?;

            let service_names: Vec<String> =
                results.names().iter().map(|s| s.to_string()).collect();
            let summary = compute_wer_summary(&counts, &service_names);
            save_wer_summary(&results_dir.join("wer_summary.csv"), &summary)?;
            for record in &summary {
                info!(
                    "{}: oracle WER {} | human WER {}",
                    record.service,
                    display_rate(record.oracle_wer),
                    display_rate(record.human_wer),
                );
            }
        }
        None => warn!("no oracle output produced, skipping WER"),
    }

    let judge_models = resolve_models(
        models_config.model_set_or_empty("speech_judge"),
        &client_config,
    );
    if judge_models.is_empty() {
        info!("--- Skipping LLM judging (no judge models configured) ---");
        return Ok(());
    }
    judge_services(
        &mut results,
        &samples,
        &judge_models,
        Task::Stt,
        models_config.judging.presentation_orders,
        &results_dir,
    )?;

    Ok(())
}
