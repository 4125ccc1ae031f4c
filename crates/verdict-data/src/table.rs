//! CSV-backed tabular result sets.
//!
//! One [`ResultTable`] per service per run, keyed by sample id. The column
//! set is open-ended: `id` and `service_output` are required, `latency_ms`
//! is optional, judge-score columns (`llm_judge_score`, or model-suffixed
//! `llm_judge_score_<model>`) are dropped and recreated as a unit, and any
//! other column a runner wrote (`wav_file`, `english_input`, ...) is carried
//! through a read/modify/write cycle untouched.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DataError, Result};
use crate::ids::normalize_id;

pub const ID_COLUMN: &str = "id";
pub const OUTPUT_COLUMN: &str = "service_output";
pub const LATENCY_COLUMN: &str = "latency_ms";
/// Base name for judge-score columns; multi-model runs suffix the model name.
pub const JUDGE_SCORE_COLUMN: &str = "llm_judge_score";

/// Ordered column plan of a table.
#[derive(Debug, Clone, PartialEq)]
enum Column {
    Id,
    Output,
    Latency,
    Score(String),
    Extra(String),
}

impl Column {
    fn header(&self) -> &str {
        match self {
            Column::Id => ID_COLUMN,
            Column::Output => OUTPUT_COLUMN,
            Column::Latency => LATENCY_COLUMN,
            Column::Score(name) => name,
            Column::Extra(name) => name,
        }
    }
}

/// One row of a service's result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    pub id: String,
    pub service_output: String,
    pub latency_ms: Option<f64>,
    extras: BTreeMap<String, String>,
    scores: BTreeMap<String, f64>,
}

impl ResultRow {
    pub fn new(id: impl Into<String>, service_output: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            service_output: service_output.into(),
            ..Self::default()
        }
    }

    pub fn with_latency(mut self, latency_ms: f64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    pub fn with_extra(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(column.into(), value.into());
        self
    }

    pub fn with_score(mut self, column: impl Into<String>, score: f64) -> Self {
        self.scores.insert(column.into(), score);
        self
    }

    pub fn score(&self, column: &str) -> Option<f64> {
        self.scores.get(column).copied()
    }

    pub fn extra(&self, column: &str) -> Option<&str> {
        self.extras.get(column).map(String::as_str)
    }

    /// Canonical join key for this row.
    pub fn key(&self) -> String {
        normalize_id(&self.id)
    }
}

/// Tabular result set for one service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    columns: Vec<Column>,
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Append a row, folding any columns it introduces into the plan.
    ///
    /// New columns land in the conventional order: extras before
    /// `service_output`, then `latency_ms`, then score columns.
    pub fn push(&mut self, row: ResultRow) {
        if self.columns.is_empty() {
            self.columns.push(Column::Id);
        }
        for extra in row.extras.keys() {
            let column = Column::Extra(extra.clone());
            if !self.columns.contains(&column) {
                let at = self
                    .columns
                    .iter()
                    .position(|c| matches!(c, Column::Output))
                    .unwrap_or(self.columns.len());
                self.columns.insert(at, column);
            }
        }
        if !self.columns.contains(&Column::Output) {
            self.columns.push(Column::Output);
        }
        if row.latency_ms.is_some() && !self.columns.contains(&Column::Latency) {
            self.columns.push(Column::Latency);
        }
        for score in row.scores.keys() {
            let column = Column::Score(score.clone());
            if !self.columns.contains(&column) {
                self.columns.push(column);
            }
        }
        self.rows.push(row);
    }

    pub fn score_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| match c {
                Column::Score(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Service output per canonical sample key.
    pub fn outputs_by_id(&self) -> HashMap<String, String> {
        self.rows
            .iter()
            .map(|row| (row.key(), row.service_output.clone()))
            .collect()
    }

    /// Drop the named score column (if present) and recreate it from
    /// `scores`, joining on the canonical sample key. Rows absent from the
    /// map receive the `-1.0` sentinel. The recreated column always moves to
    /// the end of the plan, so re-runs never accumulate duplicates.
    pub fn set_score_column(&mut self, column: &str, scores: &HashMap<String, f64>) {
        self.columns
            .retain(|c| !matches!(c, Column::Score(name) if name == column));
        self.columns.push(Column::Score(column.to_string()));
        for row in &mut self.rows {
            let value = scores.get(&row.key()).copied().unwrap_or(-1.0);
            row.scores.insert(column.to_string(), value);
        }
    }

    /// Read a table from CSV. `id` and `service_output` are required;
    /// `latency_ms` and judge-score columns are recognized by name; every
    /// other column is preserved as-is.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();

        let missing = |column: &str| DataError::MissingColumn {
            column: column.to_string(),
            path: path.display().to_string(),
        };
        if !headers.iter().any(|h| h == ID_COLUMN) {
            return Err(missing(ID_COLUMN));
        }
        if !headers.iter().any(|h| h == OUTPUT_COLUMN) {
            return Err(missing(OUTPUT_COLUMN));
        }

        let columns: Vec<Column> = headers
            .iter()
            .map(|header| match header {
                ID_COLUMN => Column::Id,
                OUTPUT_COLUMN => Column::Output,
                LATENCY_COLUMN => Column::Latency,
                h if h == JUDGE_SCORE_COLUMN
                    || h.starts_with(&format!("{JUDGE_SCORE_COLUMN}_")) =>
                {
                    Column::Score(h.to_string())
                }
                h => Column::Extra(h.to_string()),
            })
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row = ResultRow::default();
            for (column, field) in columns.iter().zip(record.iter()) {
                match column {
                    Column::Id => row.id = field.to_string(),
                    Column::Output => row.service_output = field.to_string(),
                    Column::Latency => row.latency_ms = field.parse().ok(),
                    Column::Score(name) => {
                        // Unparseable score cells degrade to the sentinel.
                        let value = field.parse().unwrap_or(-1.0);
                        row.scores.insert(name.clone(), value);
                    }
                    Column::Extra(name) => {
                        row.extras.insert(name.clone(), field.to_string());
                    }
                }
            }
            rows.push(row);
        }

        debug!("loaded {} rows from {}", rows.len(), path.display());
        Ok(Self { columns, rows })
    }

    /// Persist the table, creating parent directories as needed.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(self.columns.iter().map(Column::header))?;
        for row in &self.rows {
            let record: Vec<String> = self
                .columns
                .iter()
                .map(|column| match column {
                    Column::Id => row.id.clone(),
                    Column::Output => row.service_output.clone(),
                    Column::Latency => row
                        .latency_ms
                        .map(|ms| format!("{ms:.2}"))
                        .unwrap_or_default(),
                    Column::Score(name) => row
                        .scores
                        .get(name)
                        .map(|score| format_score(*score))
                        .unwrap_or_default(),
                    Column::Extra(name) => {
                        row.extras.get(name).cloned().unwrap_or_default()
                    }
                })
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Render a judge score the way the result files spell them: integral
/// values keep one decimal place ("0.0", "-1.0"), everything else uses the
/// shortest round-trip form ("8.5").
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.1}")
    } else {
        score.to_string()
    }
}

/// One service's named result set plus the file it is persisted at.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResult {
    pub name: String,
    pub path: PathBuf,
    pub table: ResultTable,
}

/// Order-preserving collection of per-service result sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceResults {
    entries: Vec<ServiceResult>,
}

impl ServiceResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, path: PathBuf, table: ResultTable) {
        self.entries.push(ServiceResult {
            name: name.into(),
            path,
            table,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ServiceResult> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceResult> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ServiceResult> {
        self.entries.iter_mut()
    }
}

/// One oracle transcript/translation per sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleRow {
    pub id: String,
    pub llm_oracle: String,
}

/// Reference texts produced by one oracle model, independent of any service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleTable {
    rows: Vec<OracleRow>,
}

impl OracleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: impl Into<String>, llm_oracle: impl Into<String>) {
        self.rows.push(OracleRow {
            id: id.into(),
            llm_oracle: llm_oracle.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[OracleRow] {
        &self.rows
    }

    /// Oracle text per canonical sample key.
    pub fn transcripts_by_id(&self) -> HashMap<String, String> {
        self.rows
            .iter()
            .map(|row| (normalize_id(&row.id), row.llm_oracle.clone()))
            .collect()
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize::<OracleRow>() {
            rows.push(row?);
        }
        Ok(Self { rows })
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> ResultTable {
        let mut table = ResultTable::new();
        table.push(
            ResultRow::new("whisper_stt_0001", "hello there")
                .with_extra("wav_file", "wav/0001.wav")
                .with_latency(412.5)
                .with_score(JUDGE_SCORE_COLUMN, 0.0),
        );
        table.push(
            ResultRow::new("whisper_stt_0002", "second sample")
                .with_extra("wav_file", "wav/0002.wav")
                .with_latency(388.25)
                .with_score(JUDGE_SCORE_COLUMN, 0.0),
        );
        table
    }

    #[test]
    fn test_roundtrip_preserves_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("whisper_stt.csv");
        let table = sample_table();
        table.write_csv(&path).unwrap();

        let loaded = ResultTable::read_csv(&path).unwrap();
        assert_eq!(loaded, table);
        assert_eq!(loaded.rows()[0].extra("wav_file"), Some("wav/0001.wav"));
        assert_eq!(loaded.rows()[0].latency_ms, Some(412.5));
        assert_eq!(loaded.rows()[0].score(JUDGE_SCORE_COLUMN), Some(0.0));
    }

    #[test]
    fn test_missing_required_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::write(&path, "id,transcript\n0001,hello\n").unwrap();

        let err = ResultTable::read_csv(&path).unwrap_err();
        assert!(matches!(
            err,
            DataError::MissingColumn { ref column, .. } if column == OUTPUT_COLUMN
        ));
    }

    #[test]
    fn test_set_score_column_drops_and_recreates() {
        let mut table = sample_table();
        let mut scores = HashMap::new();
        scores.insert("0001".to_string(), 8.5);

        table.set_score_column(JUDGE_SCORE_COLUMN, &scores);
        assert_eq!(table.score_columns(), vec![JUDGE_SCORE_COLUMN]);
        assert_eq!(table.rows()[0].score(JUDGE_SCORE_COLUMN), Some(8.5));
        // Row with no score in the map gets the sentinel, not the old value.
        assert_eq!(table.rows()[1].score(JUDGE_SCORE_COLUMN), Some(-1.0));

        // A second pass must not duplicate the column.
        table.set_score_column(JUDGE_SCORE_COLUMN, &scores);
        assert_eq!(table.score_columns(), vec![JUDGE_SCORE_COLUMN]);
    }

    #[test]
    fn test_model_suffixed_score_columns() {
        let mut table = sample_table();
        let scores: HashMap<String, f64> =
            [("0001".to_string(), 7.0), ("0002".to_string(), 9.5)].into();
        table.set_score_column("llm_judge_score_gpt_audio", &scores);

        assert_eq!(
            table.score_columns(),
            vec![JUDGE_SCORE_COLUMN, "llm_judge_score_gpt_audio"]
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suffixed.csv");
        table.write_csv(&path).unwrap();
        let loaded = ResultTable::read_csv(&path).unwrap();
        assert_eq!(
            loaded.rows()[1].score("llm_judge_score_gpt_audio"),
            Some(9.5)
        );
    }

    #[test]
    fn test_oracle_table_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speech_oracle.csv");
        let mut oracle = OracleTable::new();
        oracle.push("0001", "hello there");
        oracle.push("0002", "n/a");
        oracle.write_csv(&path).unwrap();

        let loaded = OracleTable::read_csv(&path).unwrap();
        assert_eq!(loaded, oracle);
        let by_id = loaded.transcripts_by_id();
        assert_eq!(by_id.get("0001").unwrap(), "hello there");
    }
}
