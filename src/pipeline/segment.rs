//! Entry segmentation: split a continuous OCR text blob into journal entries.
//!
//! Scanned journals have no reliable structure once OCR flattens them, but
//! every entry starts with a date, and every date carries the same year. The
//! year is therefore used as a *marker*: the text is cut at each occurrence,
//! and consecutive fragments are merged greedily until each entry holds at
//! least `min_words` whitespace-separated words. Short fragments (a date line
//! on its own, a one-sentence entry) end up glued to their successors, which
//! keeps every completion request large enough to give the model context.
//!
//! The marker is re-prepended to each fragment, so entries still begin with
//! their date and the original text can be recovered by concatenation.

use crate::error::{JournalError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One logical journal record, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// 1-indexed position in the segment set.
    pub index: usize,
    /// Trimmed entry text, starting with the marker (except a leading preamble).
    pub text: String,
}

impl Entry {
    /// Number of whitespace-separated words in the entry.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// File name used when the entry is staged on disk.
    pub fn file_name(&self) -> String {
        format!("entry_{}.txt", self.index)
    }
}

/// Split `text` into entries on every occurrence of `marker`.
///
/// Fragments are accumulated until the running word count reaches
/// `min_words`; the remainder is emitted as a final, possibly short, entry.
/// With `min_words == 0` every fragment becomes its own entry.
///
/// Text before the first marker is kept as-is (no marker is invented for it).
/// If the marker never occurs, or is empty, the whole trimmed text is a single
/// entry. Empty or whitespace-only input yields no entries.
pub fn split_entries(text: &str, marker: &str, min_words: usize) -> Vec<Entry> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    if marker.is_empty() {
        return vec![Entry {
            index: 1,
            text: text.trim().to_string(),
        }];
    }

    let mut entries = Vec::new();
    let mut current = String::new();

    for (i, piece) in text.split(marker).enumerate() {
        if i > 0 {
            current.push_str(marker);
        }
        current.push_str(piece);

        if current.split_whitespace().count() >= min_words {
            push_entry(&mut entries, &current);
            current.clear();
        }
    }
    push_entry(&mut entries, &current);

    debug!(
        "Segmented {} bytes into {} entries (marker {:?}, min {} words)",
        text.len(),
        entries.len(),
        marker,
        min_words
    );
    entries
}

fn push_entry(entries: &mut Vec<Entry>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        entries.push(Entry {
            index: entries.len() + 1,
            text: trimmed.to_string(),
        });
    }
}

/// Read `path` as UTF-8 and segment it with [`split_entries`].
pub async fn split_file(path: &Path, marker: &str, min_words: usize) -> Result<Vec<Entry>> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            JournalError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            JournalError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    Ok(split_entries(&content, marker, min_words))
}

/// Stage each entry as `<dir>/entry_<n>.txt`, creating `dir` if needed.
///
/// Returns the written paths in entry order.
pub async fn write_entry_files(entries: &[Entry], dir: &Path) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| JournalError::EntryFile {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let mut paths = Vec::with_capacity(entries.len());
    for entry in entries {
        let path = dir.join(entry.file_name());
        tokio::fs::write(&path, &entry.text)
            .await
            .map_err(|e| JournalError::EntryFile {
                path: path.clone(),
                source: e,
            })?;
        paths.push(path);
    }
    Ok(paths)
}
