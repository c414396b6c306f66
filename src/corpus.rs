//! Corpus file I/O.
//!
//! Two file shapes: the raw corpus (passages + metadata, no vectors)
//! consumed by the offline `embed-corpus` command, and the prebuilt
//! corpus (passages + vectors + the model id that produced them) the
//! engine loads at startup. Writes go through a temp file + rename so a
//! crashed write never leaves a truncated file behind.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::semantic::{CorpusDoc, DocumentIndex, IndexError, Passage};

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed corpus file: {0}")]
    Malformed(String),

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// On-disk shape of a vectorized corpus.
#[derive(Serialize, Deserialize)]
struct PrebuiltFile {
    model_id: String,
    passages: Vec<Passage>,
}

/// Read a raw corpus: a JSON array of `{text, metadata}` records.
pub fn load_corpus(path: &Path) -> Result<Vec<CorpusDoc>, CorpusError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| CorpusError::Malformed(e.to_string()))
}

/// Load a prebuilt corpus into an index.
///
/// Rejects a file vectorized with a different model than the configured
/// provider — stale vectors after a model upgrade must never be ranked.
pub fn load_prebuilt(path: &Path, expected_model: &str) -> Result<DocumentIndex, CorpusError> {
    let raw = std::fs::read_to_string(path)?;
    let file: PrebuiltFile =
        serde_json::from_str(&raw).map_err(|e| CorpusError::Malformed(e.to_string()))?;

    let index = DocumentIndex::from_parts(file.model_id, file.passages)?;
    index.ensure_model(expected_model)?;
    Ok(index)
}

/// Write an index back out as a prebuilt corpus file.
pub fn save_prebuilt(index: &DocumentIndex, path: &Path) -> Result<(), CorpusError> {
    let file = PrebuiltFile {
        model_id: index.model_id().to_string(),
        passages: index.passages().to_vec(),
    };
    let raw = serde_json::to_string_pretty(&file)
        .map_err(|e| CorpusError::Malformed(e.to_string()))?;
    write_atomic(path, raw.as_bytes())?;
    Ok(())
}

/// Write via a sibling temp file and rename into place.
pub fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("corpus");
    let tmp = path.with_file_name(format!("{}-{}.tmp", std::process::id(), file_name));

    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)
}
