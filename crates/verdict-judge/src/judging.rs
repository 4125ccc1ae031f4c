//! Judging orchestration: multi-model, multi-order scoring of service
//! outputs against a judge model's own reference.
//!
//! A judge reply is untrusted input. It is validated against a fixed JSON
//! schema; anything else (transport error, malformed JSON, missing or
//! out-of-range score) degrades that sample to `-1.0` scores and an
//! `"n/a"` transcript while the batch continues.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use verdict_data::{format_score, Sample, ServiceResults, Task, JUDGE_SCORE_COLUMN};

use crate::client::{AudioAttachment, ChatRequest};
use crate::error::{JudgeError, Result};
use crate::models::JudgeModel;

/// Positional-bias policy: one pass in service-set order, or every
/// permutation of the service list as a distinct pass so favoritism toward
/// outputs appearing first/last shows up as score drift across orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationOrders {
    #[default]
    Single,
    Exhaustive,
}

/// All permutations of `0..n` in lexicographic order; the identity
/// permutation comes first, which makes pass 0 the canonical one.
fn permutations(n: usize) -> Vec<Vec<usize>> {
    fn permute(prefix: &mut Vec<usize>, remaining: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if remaining.is_empty() {
            out.push(prefix.clone());
            return;
        }
        for i in 0..remaining.len() {
            let item = remaining.remove(i);
            prefix.push(item);
            permute(prefix, remaining, out);
            prefix.pop();
            remaining.insert(i, item);
        }
    }

    let mut out = Vec::new();
    let mut remaining: Vec<usize> = (0..n).collect();
    permute(&mut Vec::new(), &mut remaining, &mut out);
    out
}

/// Strict JSON shape the judge is instructed to return.
#[derive(Debug, Deserialize)]
struct JudgeReply {
    llm_transcript: Option<String>,
    #[serde(default)]
    scores: BTreeMap<String, f64>,
}

/// Scores for one sample: service name to a value in `[1.0, 10.0]`, or the
/// `-1.0` sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeReportRow {
    pub id: String,
    pub llm_transcript: String,
    pub scores: BTreeMap<String, f64>,
}

/// One full judging pass: one model, one presentation order.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeReport {
    pub model: String,
    pub order_index: usize,
    /// Service names in the sequence they were shown to the judge.
    pub order: Vec<String>,
    /// Canonical service-set order, used for report columns.
    pub services: Vec<String>,
    pub rows: Vec<JudgeReportRow>,
}

fn judge_prompt(task: Task, sample: &Sample, listing: &str) -> String {
    match task {
        Task::Stt => format!(
            "You are acting as a judge for similar web services that are used for speech recognition.\n\
             Each service receives an input of a WAV file and will output a textual transcript of the audio file.\n\
             Your job is the following:\n\
             1. Listen to the audio file given.\n\
             2. Give your textual transcript of the given audio file that you will use to compare each service's output.\n\
             3. For each service, give a score (1.0-10.0, scoring in intervals of 0.1) on what you believe is the accuracy of each output.\n\
             You MUST return ONLY valid JSON. Do not include markdown, code fences, or explanations.\n\
             JSON schema:\n\
             {{\n  \"llm_transcript\": string|null,\n  \"scores\": {{\"<service name>\": number}}\n}}\n\
             Score every service listed below under its exact name.\n\
             If you do not receive the WAV file, enter llm_transcript as 'n/a' and the scores as -1.\n\
             Below are the services' transcript output:\n{listing}"
        ),
        Task::Translation => format!(
            "You are acting as a judge for similar web services that are used for language translation.\n\
             Each service receives an input of English text and will output a French translation.\n\
             Your job is the following:\n\
             1. Read in the English text.\n\
             2. Give your French translation of the given English text that you will use to compare each service's output.\n\
             3. For each service, give a score (1.0-10.0, scoring in intervals of 0.1) on what you believe is the accuracy of each output.\n\
             You MUST return ONLY valid JSON. Do not include markdown, code fences, or explanations.\n\
             JSON schema:\n\
             {{\n  \"llm_transcript\": string|null,\n  \"scores\": {{\"<service name>\": number}}\n}}\n\
             Score every service listed below under its exact name.\n\
             If you do not receive the English input, enter llm_transcript as 'n/a' and the scores as -1.\n\
             English input: {}\n\
             Below are the services' translation output:\n{listing}",
            sample.source_text().unwrap_or_default()
        ),
    }
}

fn sentinel_row(id: String, services: &[String]) -> JudgeReportRow {
    JudgeReportRow {
        id,
        llm_transcript: "n/a".to_string(),
        scores: services.iter().map(|s| (s.clone(), -1.0)).collect(),
    }
}

fn sanitize_score(value: Option<f64>) -> f64 {
    match value {
        Some(v) if (1.0..=10.0).contains(&v) => v,
        _ => -1.0,
    }
}

fn judge_sample(
    model: &JudgeModel,
    sample: &Sample,
    task: Task,
    ordered_names: &[String],
    services: &[String],
    outputs: &HashMap<String, HashMap<String, String>>,
) -> JudgeReportRow {
    let key = sample.key();
    let listing: String = ordered_names
        .iter()
        .map(|name| {
            let output = outputs
                .get(name)
                .and_then(|by_id| by_id.get(&key))
                .map(String::as_str)
                .unwrap_or("");
            format!("{name}: {output}\n")
        })
        .collect();

    let mut request = ChatRequest::text(&model.model_id, judge_prompt(task, sample, &listing));
    if task == Task::Stt {
        if let Some(audio) = sample.audio_path() {
            request = request.with_audio(AudioAttachment::wav(audio));
        }
    }

    let content = match model.client.complete(&request) {
        Ok(content) => content,
        Err(err) => {
            warn!("judge call failed for sample {key} ({err}), using sentinels");
            return sentinel_row(key, services);
        }
    };

    match serde_json::from_str::<JudgeReply>(&content) {
        Ok(reply) => JudgeReportRow {
            id: key,
            llm_transcript: reply.llm_transcript.unwrap_or_else(|| "n/a".to_string()),
            scores: services
                .iter()
                .map(|name| {
                    (
                        name.clone(),
                        sanitize_score(reply.scores.get(name).copied()),
                    )
                })
                .collect(),
        },
        Err(err) => {
            warn!("unparseable judge reply for sample {key} ({err}), using sentinels");
            sentinel_row(key, services)
        }
    }
}

fn report_file_name(task: Task, model: &str, order_index: usize) -> String {
    let base = match task {
        Task::Stt => "speech_judge",
        Task::Translation => "language_judge",
    };
    if order_index == 0 {
        format!("{base}_{model}.csv")
    } else {
        format!("{base}_{model}_order{order_index}.csv")
    }
}

fn write_report(report: &JudgeReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(verdict_data::DataError::from)?;

    let mut headers = vec!["id".to_string()];
    headers.extend(report.services.iter().map(|s| format!("{s}_score")));
    headers.push("llm_transcript".to_string());
    writer
        .write_record(&headers)
        .map_err(verdict_data::DataError::from)?;

    for row in &report.rows {
        let mut record = vec![row.id.clone()];
        record.extend(
            report
                .services
                .iter()
                .map(|s| format_score(row.scores.get(s).copied().unwrap_or(-1.0))),
        );
        record.push(row.llm_transcript.clone());
        writer
            .write_record(&record)
            .map_err(verdict_data::DataError::from)?;
    }
    writer.flush()?;
    Ok(())
}

/// Run every configured judge model over every presentation order, persist
/// one report per pass, and join the canonical pass's scores back onto each
/// service's result table (dropping and recreating the score column, then
/// re-persisting the table).
pub fn judge_services(
    results: &mut ServiceResults,
    samples: &[Sample],
    models: &[JudgeModel],
    task: Task,
    orders: PresentationOrders,
    results_dir: &Path,
) -> Result<Vec<JudgeReport>> {
    if results.is_empty() {
        return Err(JudgeError::NoResults);
    }

    let services: Vec<String> = results.names().iter().map(|s| s.to_string()).collect();
    let outputs: HashMap<String, HashMap<String, String>> = results
        .iter()
        .map(|entry| (entry.name.clone(), entry.table.outputs_by_id()))
        .collect();

    let order_list = match orders {
        PresentationOrders::Single => vec![(0..services.len()).collect::<Vec<_>>()],
        PresentationOrders::Exhaustive => permutations(services.len()),
    };

    let mut reports = Vec::new();
    for model in models {
        for (order_index, order) in order_list.iter().enumerate() {
            let ordered_names: Vec<String> =
                order.iter().map(|&i| services[i].clone()).collect();
            info!(
                "--- LLM Judging: model {} (order {}) ---",
                model.name, order_index
            );

            let rows: Vec<JudgeReportRow> = samples
                .iter()
                .map(|sample| {
                    info!("LLM Judging: ({})", sample.key());
                    judge_sample(model, sample, task, &ordered_names, &services, &outputs)
                })
                .collect();

            let report = JudgeReport {
                model: model.name.clone(),
                order_index,
                order: ordered_names,
                services: services.clone(),
                rows,
            };
            write_report(
                &report,
                &results_dir.join(report_file_name(task, &model.name, order_index)),
            )?;
            reports.push(report);
        }
    }

    // Join scores from each model's canonical pass back onto the service
    // tables. Fan-out runs get model-suffixed columns so results stay
    // comparable side-by-side.
    for report in reports.iter().filter(|r| r.order_index == 0) {
        let column = if models.len() == 1 {
            JUDGE_SCORE_COLUMN.to_string()
        } else {
            format!("{JUDGE_SCORE_COLUMN}_{}", report.model)
        };
        for entry in results.iter_mut() {
            let scores: HashMap<String, f64> = report
                .rows
                .iter()
                .filter_map(|row| {
                    row.scores
                        .get(&entry.name)
                        .map(|score| (row.id.clone(), *score))
                })
                .collect();
            entry.table.set_score_column(&column, &scores);
            entry.table.write_csv(&entry.path)?;
        }
    }

    Ok(reports)
}
