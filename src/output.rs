//! Result types returned by the two pipelines.

use crate::error::{JournalError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of [`crate::extract::extract`].
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutput {
    /// Extracted text, pages separated by a blank line.
    pub text: String,
    /// Where the text was written.
    pub output_path: PathBuf,
    /// Name of the source blob in the bucket.
    pub blob_name: String,
    /// Whether the scan was uploaded in this run (false when reused).
    pub uploaded: bool,
    /// Whether the source blob was deleted at the end.
    pub deleted_source: bool,
    /// Pages with recognised text.
    pub pages: usize,
    /// OCR result files read.
    pub result_files: usize,
    pub duration_ms: u64,
}

/// One cleaned entry, in document order.
#[derive(Debug, Clone, Serialize)]
pub struct CleanedEntry {
    /// 1-indexed entry number.
    pub index: usize,
    /// Words in the raw entry.
    pub input_words: usize,
    /// Corrected text, verbatim from the model.
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}

/// Aggregate statistics for a cleanup run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupStats {
    pub entries: usize,
    pub total_input_words: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Outcome of [`crate::cleanup::cleanup`].
#[derive(Debug, Clone, Serialize)]
pub struct CleanupOutput {
    /// Cleaned entries joined with a blank line.
    pub text: String,
    /// Where the text was written.
    pub output_path: PathBuf,
    pub entries: Vec<CleanedEntry>,
    pub stats: CleanupStats,
}

/// Write `contents` to `path` atomically (temp file + rename), creating
/// parent directories as needed.
pub(crate) async fn write_text_atomic(path: &Path, contents: &str) -> Result<()> {
    let write_err = |e| JournalError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}
