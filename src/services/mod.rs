//! External service seams: blob storage, OCR and chat completion.
//!
//! The pipelines never talk to Google Cloud or an LLM vendor directly; they
//! receive trait objects. Production code wires in [`storage::GcsBlobStore`],
//! [`vision::VisionOcr`] and [`completion::LlmCompletion`]; tests pass
//! in-memory doubles that record every call.
//!
//! ```text
//! BlobStore          exists · upload · delete · list · download_text
//! OcrService         submit · wait
//! CompletionService  complete
//! ```

pub mod completion;
pub mod credentials;
pub mod storage;
pub mod vision;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Remote object storage used to stage OCR input and collect its output.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Whether an object with exactly this name exists.
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Create or overwrite `name` with `bytes`.
    async fn upload(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// Delete `name`. Deleting a missing object is an error.
    async fn delete(&self, name: &str) -> Result<()>;

    /// Names of every object whose name starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Download `name` and decode it as UTF-8.
    async fn download_text(&self, name: &str) -> Result<String>;

    /// `gs://`-style URI the OCR service uses to address `name`.
    fn uri(&self, name: &str) -> String;
}

/// A document-OCR request scoped to one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrRequest {
    /// URI of the source document in the blob store.
    pub source_uri: String,
    /// MIME type of the source document.
    pub mime_type: String,
    /// Language hints; the pipelines always send exactly one.
    pub language_hints: Vec<String>,
    /// URI prefix the service writes its JSON results under.
    pub output_uri: String,
    /// Pages per output JSON file.
    pub batch_size: u32,
}

/// Handle to a submitted, long-running OCR operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrOperation {
    /// Server-assigned operation name (e.g. `projects/p/operations/123`).
    pub name: String,
}

/// Asynchronous document OCR.
#[async_trait]
pub trait OcrService: Send + Sync {
    /// Submit the request and return immediately with an operation handle.
    async fn submit(&self, request: &OcrRequest) -> Result<OcrOperation>;

    /// Block until the operation completes. Exceeding `timeout` is an
    /// [`crate::JournalError::OcrTimeout`]; an operation that finishes with
    /// an error is [`crate::JournalError::Ocr`].
    async fn wait(&self, operation: &OcrOperation, timeout: Duration) -> Result<()>;
}

/// Provider-neutral chat message. The cleanup pass only ever sends user
/// turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// One completion response; only the first choice is ever consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Text-in, text-out chat completion.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, messages: &[Message], max_tokens: usize) -> Result<Completion>;
}
