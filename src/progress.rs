//! Progress-callback trait for per-entry cleanup events.
//!
//! Inject an [`Arc<dyn CleanupProgressCallback>`] via
//! [`crate::config::CleanupConfigBuilder::progress_callback`] to receive
//! events as the cleanup pipeline works through the segmented entries. The
//! `journal-cleanup` binary uses it to drive a terminal progress bar; the
//! library knows nothing about how events are displayed.
//!
//! # Example
//!
//! ```rust
//! use journal_ocr::{CleanupConfig, CleanupProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     cleaned: AtomicUsize,
//! }
//!
//! impl CleanupProgressCallback for CountingCallback {
//!     fn on_entry_complete(&self, entry: usize, total: usize, text_len: usize) {
//!         self.cleaned.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Entry {}/{} done ({} bytes)", entry, total, text_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { cleaned: AtomicUsize::new(0) });
//!
//! let config = CleanupConfig::builder()
//!     .progress_callback(counter as Arc<dyn CleanupProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the cleanup pipeline as it processes each entry.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Entries are processed one at a time, in order.
pub trait CleanupProgressCallback: Send + Sync {
    /// Called once after segmentation, before the first completion request.
    fn on_cleanup_start(&self, total_entries: usize) {
        let _ = total_entries;
    }

    /// Called just before the completion request for an entry.
    ///
    /// # Arguments
    /// * `entry`  — 1-indexed entry number
    /// * `total`  — number of entries
    /// * `words`  — word count of the raw entry
    fn on_entry_start(&self, entry: usize, total: usize, words: usize) {
        let _ = (entry, total, words);
    }

    /// Called when an entry has been cleaned.
    fn on_entry_complete(&self, entry: usize, total: usize, text_len: usize) {
        let _ = (entry, total, text_len);
    }

    /// Called when the completion request for an entry fails. The pipeline
    /// aborts right after this call.
    fn on_entry_error(&self, entry: usize, total: usize, error: &str) {
        let _ = (entry, total, error);
    }

    /// Called once after every entry was cleaned and the output was written.
    fn on_cleanup_complete(&self, total_entries: usize) {
        let _ = total_entries;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl CleanupProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::CleanupConfig`].
pub type ProgressCallback = Arc<dyn CleanupProgressCallback>;
