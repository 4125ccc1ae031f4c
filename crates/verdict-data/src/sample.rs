//! Evaluation samples and dataset manifest loading.
//!
//! Dataset acquisition and audio materialization happen outside this
//! workspace; what arrives here is a flat manifest CSV written by the loader.
//! Speech manifests carry `id,text,audio` (plus speaker/accent metadata we
//! ignore), translation manifests carry `id,english,french`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{DataError, Result};
use crate::ids::canonical_id;

/// Task category a sample (or service) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Stt,
    Translation,
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Task::Stt => write!(f, "stt"),
            Task::Translation => write!(f, "translation"),
        }
    }
}

/// Task-specific input for one sample.
#[derive(Debug, Clone)]
pub enum SamplePayload {
    /// Path to a locally materialized WAV file.
    Audio(PathBuf),
    /// Source-language text to be translated.
    SourceText(String),
}

/// One evaluation unit, immutable once loaded.
#[derive(Debug, Clone)]
pub struct Sample {
    /// 1-based, contiguous within a run.
    pub id: u32,
    /// Human ground truth; may be empty.
    pub reference_text: String,
    pub payload: SamplePayload,
}

impl Sample {
    /// Canonical join key for this sample.
    pub fn key(&self) -> String {
        canonical_id(self.id)
    }

    pub fn audio_path(&self) -> Option<&Path> {
        match &self.payload {
            SamplePayload::Audio(path) => Some(path),
            SamplePayload::SourceText(_) => None,
        }
    }

    pub fn source_text(&self) -> Option<&str> {
        match &self.payload {
            SamplePayload::SourceText(text) => Some(text),
            SamplePayload::Audio(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SpeechManifestRow {
    id: u32,
    #[serde(default)]
    text: String,
    audio: PathBuf,
}

#[derive(Debug, Deserialize)]
struct TranslationManifestRow {
    id: u32,
    english: String,
    #[serde(default)]
    french: String,
}

fn open_manifest(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    if !path.exists() {
        return Err(DataError::Manifest(format!(
            "manifest not found: {}",
            path.display()
        )));
    }
    Ok(csv::Reader::from_path(path)?)
}

/// Load speech samples from a manifest CSV, capped at `limit` rows.
pub fn load_speech_manifest(path: &Path, limit: Option<usize>) -> Result<Vec<Sample>> {
    let mut reader = open_manifest(path)?;
    let mut samples = Vec::new();
    for row in reader.deserialize::<SpeechManifestRow>() {
        if limit.is_some_and(|cap| samples.len() >= cap) {
            break;
        }
        let row = row?;
        samples.push(Sample {
            id: row.id,
            reference_text: row.text,
            payload: SamplePayload::Audio(row.audio),
        });
    }
    debug!("loaded {} speech samples from {}", samples.len(), path.display());
    Ok(samples)
}

/// Load translation samples from a manifest CSV, capped at `limit` rows.
///
/// The English column is the service input; the French column is the human
/// reference.
pub fn load_translation_manifest(path: &Path, limit: Option<usize>) -> Result<Vec<Sample>> {
    let mut reader = open_manifest(path)?;
    let mut samples = Vec::new();
    for row in reader.deserialize::<TranslationManifestRow>() {
        if limit.is_some_and(|cap| samples.len() >= cap) {
            break;
        }
        let row = row?;
        samples.push(Sample {
            id: row.id,
            reference_text: row.french,
            payload: SamplePayload::SourceText(row.english),
        });
    }
    debug!("loaded {} translation samples from {}", samples.len(), path.display());
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_speech_manifest_loads_and_caps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edacc_metadata.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "id,speaker,text,accent,audio").unwrap();
        writeln!(file, "1,EDACC-C06,hello there,scottish,wav/0001.wav").unwrap();
        writeln!(file, "2,EDACC-C07,second sample,indian,wav/0002.wav").unwrap();
        writeln!(file, "3,EDACC-C08,third sample,ghanaian,wav/0003.wav").unwrap();

        let samples = load_speech_manifest(&path, Some(2)).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].id, 1);
        assert_eq!(samples[0].key(), "0001");
        assert_eq!(samples[0].reference_text, "hello there");
        assert_eq!(
            samples[0].audio_path().unwrap(),
            Path::new("wav/0001.wav")
        );
    }

    #[test]
    fn test_translation_manifest_maps_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("europarl_metadata.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "id,english,french").unwrap();
        writeln!(file, "1,resumption of the session,reprise de la session").unwrap();

        let samples = load_translation_manifest(&path, None).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].source_text().unwrap(), "resumption of the session");
        assert_eq!(samples[0].reference_text, "reprise de la session");
        assert!(samples[0].audio_path().is_none());
    }

    #[test]
    fn test_missing_manifest_is_an_error() {
        let err = load_speech_manifest(Path::new("/nonexistent/manifest.csv"), None)
            .unwrap_err();
        assert!(matches!(err, DataError::Manifest(_)));
    }
}
