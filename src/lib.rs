//! # journal-ocr
//!
//! Digitise handwritten or scanned journals in two passes.
//!
//! ## Why two pipelines?
//!
//! OCR is slow and billed per page, while the LLM cleanup is the part you
//! iterate on (different model, different marker, different minimum entry
//! size). Keeping the raw OCR text on disk between the two lets the cleanup
//! be re-run as often as needed without paying for OCR again.
//!
//! ## Pipeline Overview
//!
//! ```text
//! extraction (journal-extract)
//!  ├─ 1. Input    validate the scan, derive blob name + MIME type
//!  ├─ 2. Stage    upload to Cloud Storage (or reuse an existing upload)
//!  ├─ 3. OCR      Vision asyncBatchAnnotate, polled under a hard deadline
//!  └─ 4. Collect  result JSON → page text → <name>.txt
//!
//! cleanup (journal-cleanup)
//!  ├─ 1. Segment  split on the year marker, merge to ≥ min_words
//!  ├─ 2. Rewrite  one completion per entry, in order
//!  └─ 3. Output   entries joined by a blank line → <name>_cleaned_up.txt
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use journal_ocr::{cleanup, CleanupConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CleanupConfig::builder()
//!         .marker("2024")
//!         .api_key(std::env::var("GROQ_API_KEY")?)
//!         .model("llama-3.3-70b-versatile")
//!         .build()?;
//!     let output = cleanup(Path::new("journal.txt"), None, &config).await?;
//!     eprintln!("{} entries → {}", output.stats.entries, output.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `journal-extract` and `journal-cleanup` binaries |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cleanup;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod services;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cleanup::cleanup;
pub use config::{CleanupConfig, CleanupConfigBuilder, ExtractionConfig, ExtractionConfigBuilder};
pub use error::JournalError;
pub use extract::{extract, google_services, ExistingBlobAction, ExtractionDecisions, FixedDecisions};
pub use output::{CleanedEntry, CleanupOutput, CleanupStats, ExtractionOutput};
pub use pipeline::segment::{split_entries, Entry};
pub use progress::{CleanupProgressCallback, NoopProgressCallback, ProgressCallback};
pub use services::{
    BlobStore, Completion, CompletionService, Message, OcrOperation, OcrRequest, OcrService,
};
