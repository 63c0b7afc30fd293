//! Cleanup pipeline: raw OCR text → entry-by-entry LLM repair → cleaned text.
//!
//! ```text
//! scan.txt ─▶ segment ─▶ tmp/entry_1.txt … entry_n.txt ─▶ complete ×n ─▶ scan_cleaned_up.txt
//! ```
//!
//! Entries are sent one at a time, in document order, and the replies are
//! joined with a blank line in that same order.
//!
//! ## Failure semantics
//!
//! The run is atomic: if any completion fails, no output file is written and
//! the error names the failing entry and how many were already cleaned. The
//! staged entry files stay in the temp directory so the failing entry can be
//! inspected; they are only removed after a successful write.

use crate::config::CleanupConfig;
use crate::error::{JournalError, Result};
use crate::output::{write_text_atomic, CleanedEntry, CleanupOutput, CleanupStats};
use crate::pipeline::llm;
use crate::pipeline::segment::{self, Entry};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use crate::services::completion::resolve_completion;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Separator between cleaned entries in the output.
pub const ENTRY_SEPARATOR: &str = "\n\n";

/// Default output path: `<name>_cleaned_up<.ext>` in the working directory.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "journal".to_string());
    match input.extension() {
        Some(ext) => PathBuf::from(format!("{stem}_cleaned_up.{}", ext.to_string_lossy())),
        None => PathBuf::from(format!("{stem}_cleaned_up")),
    }
}

/// Run the cleanup pipeline on one extracted text file.
///
/// `output` overrides [`default_output_path`].
///
/// # Errors
/// - [`JournalError::MissingCredential`] when no completion service can be
///   resolved (checked before the input is read)
/// - [`JournalError::FileNotFound`] / [`JournalError::ReadFailed`] for the input
/// - [`JournalError::EntryFile`] when staging entries fails
/// - [`JournalError::Completion`] naming the first entry whose request failed
/// - [`JournalError::OutputWriteFailed`]
pub async fn cleanup(
    input: &Path,
    output: Option<&Path>,
    config: &CleanupConfig,
) -> Result<CleanupOutput> {
    let total_start = Instant::now();
    let service = resolve_completion(config)?;

    // ── Step 1: Segment ──────────────────────────────────────────────────
    info!("Splitting {} by marker {:?}", input.display(), config.marker);
    let entries = segment::split_file(input, &config.marker, config.min_words).await?;
    let total = entries.len();
    info!("Found {} entries", total);

    // ── Step 2: Stage entry files ────────────────────────────────────────
    let entry_files = segment::write_entry_files(&entries, &config.temp_dir).await?;

    let progress = progress_callback(config);
    progress.on_cleanup_start(total);

    // ── Step 3: Clean each entry, in order ───────────────────────────────
    let llm_start = Instant::now();
    let mut cleaned: Vec<CleanedEntry> = Vec::with_capacity(total);

    for (index, file) in (1..=total).zip(&entry_files) {
        let entry = read_entry(index, file).await?;
        let words = entry.word_count();
        info!("Cleaning entry: {}", file.display());
        progress.on_entry_start(index, total, words);

        let entry_start = Instant::now();
        let completion = match llm::clean_entry(service.as_ref(), &entry, config).await {
            Ok(c) => c,
            Err(e) => {
                let detail = e.to_string();
                progress.on_entry_error(index, total, &detail);
                warn!(
                    "Entry {} failed; entry files kept in {}",
                    index,
                    config.temp_dir.display()
                );
                return Err(JournalError::Completion {
                    entry: index,
                    total,
                    completed: cleaned.len(),
                    detail,
                });
            }
        };

        progress.on_entry_complete(index, total, completion.text.len());
        cleaned.push(CleanedEntry {
            index,
            input_words: words,
            text: completion.text,
            input_tokens: completion.input_tokens,
            output_tokens: completion.output_tokens,
            duration_ms: entry_start.elapsed().as_millis() as u64,
        });
    }
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    // ── Step 4: Combine and write ────────────────────────────────────────
    info!("Combining cleaned entries...");
    let text = cleaned
        .iter()
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR);

    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input));
    write_text_atomic(&output_path, &text).await?;

    // ── Step 5: Remove staged entries ────────────────────────────────────
    remove_entry_files(&entry_files, &config.temp_dir).await?;

    progress.on_cleanup_complete(total);

    let stats = CleanupStats {
        entries: total,
        total_input_words: cleaned.iter().map(|e| e.input_words).sum(),
        total_input_tokens: cleaned.iter().map(|e| e.input_tokens as u64).sum(),
        total_output_tokens: cleaned.iter().map(|e| e.output_tokens as u64).sum(),
        llm_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Cleanup complete. Output saved to {} ({} entries, {}ms)",
        output_path.display(),
        total,
        stats.total_duration_ms
    );

    Ok(CleanupOutput {
        text,
        output_path,
        entries: cleaned,
        stats,
    })
}

/// The configured callback, or [`NoopProgressCallback`] when none is set.
fn progress_callback(config: &CleanupConfig) -> ProgressCallback {
    config
        .progress_callback
        .clone()
        .unwrap_or_else(|| Arc::new(NoopProgressCallback) as ProgressCallback)
}

async fn read_entry(index: usize, path: &Path) -> Result<Entry> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| JournalError::EntryFile {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(Entry { index, text })
}

/// Delete staged entry files, then the directory if nothing else is in it.
async fn remove_entry_files(files: &[PathBuf], dir: &Path) -> Result<()> {
    for file in files {
        tokio::fs::remove_file(file)
            .await
            .map_err(|e| JournalError::EntryFile {
                path: file.clone(),
                source: e,
            })?;
    }
    if let Err(e) = tokio::fs::remove_dir(dir).await {
        debug!("Keeping {}: {}", dir.display(), e);
    }
    Ok(())
}
