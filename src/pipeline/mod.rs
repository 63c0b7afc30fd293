//! Pipeline stages for journal extraction and cleanup.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable without the network. The orchestration lives in
//! [`crate::extract`] and [`crate::cleanup`].
//!
//! ## Data Flow
//!
//! ```text
//! extraction:  input ──▶ (upload · OCR) ──▶ annotate
//!              (scan)                       (JSON → text)
//!
//! cleanup:     segment ──▶ llm
//!              (entries)   (per-entry rewrite)
//! ```
//!
//! 1. [`input`]    — validate the local scan, derive blob name and MIME type
//! 2. [`annotate`] — order OCR result files and concatenate page text
//! 3. [`segment`]  — split text into entries on the year marker
//! 4. [`llm`]      — one completion call per entry

pub mod annotate;
pub mod input;
pub mod llm;
pub mod segment;
