//! Error types for the journal-ocr library.
//!
//! Every pipeline step is fatal on failure: there is no per-page or per-entry
//! tolerance, so a single [`JournalError`] enum covers the whole crate. The
//! variants are grouped by the kind of failure a caller may want to react to:
//!
//! * **Configuration** — missing credentials, unsupported document types.
//!   Nothing remote has been touched yet.
//! * **I/O** — local files that cannot be read or written.
//! * **Remote service** — Cloud Storage, Vision, or the completion provider
//!   returned an error. Never retried.
//! * **Timeout** — the OCR operation outlived its hard deadline.
//! * **Cancelled** — the user chose to quit at a confirmation prompt. The
//!   binaries treat this as a clean exit (status 0).

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the journal-ocr library.
#[derive(Debug, Error)]
pub enum JournalError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required credential or setting was not provided.
    #[error("Missing {name}.\n{hint}")]
    MissingCredential { name: String, hint: String },

    /// The document extension is not one the OCR service accepts.
    #[error("Unsupported document '{path}': expected .pdf, .tif, .tiff or .gif")]
    UnsupportedDocument { path: PathBuf },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The input file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write, read, or remove a transient per-entry file.
    #[error("Entry file '{path}': {source}")]
    EntryFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Remote service errors ─────────────────────────────────────────────
    /// Cloud Storage request failed.
    #[error("Storage error on '{object}': {detail}")]
    Storage { object: String, detail: String },

    /// Vision request failed, or the operation finished with an error.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// A result file written by the OCR service could not be parsed.
    #[error("Malformed OCR result '{object}': {detail}")]
    MalformedResult { object: String, detail: String },

    /// The completion provider could not be constructed.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The completion API returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The completion call for one entry failed. Entries are processed in
    /// order, so `completed` entries before it had already been cleaned.
    #[error("Cleanup of entry {entry}/{total} failed ({completed} already cleaned): {detail}")]
    Completion {
        entry: usize,
        total: usize,
        completed: usize,
        detail: String,
    },

    // ── Timeout ───────────────────────────────────────────────────────────
    /// The OCR operation did not finish before the deadline.
    #[error("OCR operation '{operation}' did not complete within {secs}s")]
    OcrTimeout { operation: String, secs: u64 },

    // ── User abort ────────────────────────────────────────────────────────
    /// The user chose to quit at a confirmation prompt.
    #[error("Operation cancelled by user")]
    Cancelled,

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl JournalError {
    /// True when the error represents an explicit user cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, JournalError::Cancelled)
    }

    pub(crate) fn storage(object: impl Into<String>, detail: impl ToString) -> Self {
        JournalError::Storage {
            object: object.into(),
            detail: detail.to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, JournalError>;
