//! Per-sample error counts and pooled corpus summaries.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use verdict_data::{OracleTable, Sample, ServiceResults};

use crate::error::{Result, WerError};
use crate::text::tokenize;

/// Word-level edit distance numerator/denominator for one reference.
///
/// Returns `(errors, reference_word_count)`. Both empty: `(0, 0)`. Empty
/// reference with a non-empty hypothesis: every hypothesis token is an error
/// but the rate is undefined (denominator 0), so callers must not divide.
/// Empty hypothesis against a non-empty reference: 100% WER.
pub fn word_error_counts(reference: &str, hypothesis: &str) -> (usize, usize) {
    let ref_words = tokenize(reference);
    let hyp_words = tokenize(hypothesis);

    let n = ref_words.len();
    let m = hyp_words.len();

    if n == 0 && m == 0 {
        return (0, 0);
    }
    if n == 0 {
        return (m, 0);
    }
    if m == 0 {
        return (n, n);
    }

    // Word-level Levenshtein, unit cost for insert/delete/substitute.
    // Utterances are single sentences, so O(n*m) is fine.
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr: Vec<usize> = vec![0; m + 1];
    for i in 1..=n {
        curr[0] = i;
        for j in 1..=m {
            curr[j] = if ref_words[i - 1] == hyp_words[j - 1] {
                prev[j - 1]
            } else {
                1 + prev[j].min(curr[j - 1]).min(prev[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    (prev[m], n)
}

fn rate(errors: usize, ref_words: usize) -> Option<f64> {
    (ref_words > 0).then(|| errors as f64 / ref_words as f64)
}

/// Per-sample, per-service error counts against both references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WerCountRecord {
    pub id: String,
    pub service: String,
    pub oracle_errors: usize,
    pub oracle_ref_words: usize,
    /// Absent when the oracle reference is empty.
    pub oracle_wer: Option<f64>,
    pub human_errors: usize,
    pub human_ref_words: usize,
    /// Absent when the human reference is empty.
    pub human_wer: Option<f64>,
}

/// Pooled corpus rates for one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WerSummaryRecord {
    pub service: String,
    pub oracle_wer: Option<f64>,
    pub human_wer: Option<f64>,
}

/// Compute error counts for every sample and service against the oracle
/// transcripts and the human ground truth.
///
/// A sample a service produced no output for counts as an empty hypothesis.
pub fn compute_wer_counts(
    results: &ServiceResults,
    oracle: &OracleTable,
    samples: &[Sample],
) -> Result<Vec<WerCountRecord>> {
    if results.is_empty() {
        return Err(WerError::NoResults);
    }

    let transcripts_by_service: Vec<(&str, std::collections::HashMap<String, String>)> = results
        .iter()
        .map(|entry| (entry.name.as_str(), entry.table.outputs_by_id()))
        .collect();
    let oracle_transcripts = oracle.transcripts_by_id();

    let mut records = Vec::with_capacity(samples.len() * transcripts_by_service.len());
    for sample in samples {
        let key = sample.key();
        let human_ref = sample.reference_text.as_str();
        let oracle_ref = oracle_transcripts.get(&key).map(String::as_str).unwrap_or("");

        for (service, transcripts) in &transcripts_by_service {
            let hypothesis = transcripts.get(&key).map(String::as_str).unwrap_or("");
            let (oracle_errors, oracle_ref_words) = word_error_counts(oracle_ref, hypothesis);
            let (human_errors, human_ref_words) = word_error_counts(human_ref, hypothesis);
            debug!(
                service,
                id = %key,
                oracle_errors,
                human_errors,
                "scored sample"
            );
            records.push(WerCountRecord {
                id: key.clone(),
                service: service.to_string(),
                oracle_errors,
                oracle_ref_words,
                oracle_wer: rate(oracle_errors, oracle_ref_words),
                human_errors,
                human_ref_words,
                human_wer: rate(human_errors, human_ref_words),
            });
        }
    }

    Ok(records)
}

/// Micro-averaged corpus WER per service: summed errors over summed
/// reference words, pooled across samples. Never the mean of per-sample
/// rates, which would bias toward short utterances.
pub fn compute_wer_summary(
    counts: &[WerCountRecord],
    service_names: &[String],
) -> Vec<WerSummaryRecord> {
    service_names
        .iter()
        .map(|service| {
            let mut oracle_errors = 0usize;
            let mut oracle_ref_words = 0usize;
            let mut human_errors = 0usize;
            let mut human_ref_words = 0usize;
            for record in counts.iter().filter(|r| &r.service == service) {
                oracle_errors += record.oracle_errors;
                oracle_ref_words += record.oracle_ref_words;
                human_errors += record.human_errors;
                human_ref_words += record.human_ref_words;
            }
            WerSummaryRecord {
                service: service.clone(),
                oracle_wer: rate(oracle_errors, oracle_ref_words),
                human_wer: rate(human_errors, human_ref_words),
            }
        })
        .collect()
}

fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Persist per-sample counts as `wer_counts.csv`-style long-format rows.
pub fn save_wer_counts(path: &Path, counts: &[WerCountRecord]) -> Result<()> {
    write_records(path, counts)
}

/// Persist the pooled per-service summary.
pub fn save_wer_summary(path: &Path, summary: &[WerSummaryRecord]) -> Result<()> {
    write_records(path, summary)
}
