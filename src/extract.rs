//! Extraction pipeline: scanned document → plain text via cloud OCR.
//!
//! ```text
//! scan.pdf ─▶ exists? ─▶ upload ─▶ OCR submit ─▶ wait ─▶ list results ─▶ scan.txt
//!              │ (ask)                                                    │
//!              └ reupload / reuse / abort                     delete source? (ask)
//! ```
//!
//! Every step is fatal on failure and nothing is retried. The two
//! interactive questions are delegated to an [`ExtractionDecisions`]
//! implementation, so the pipeline runs unchanged under a terminal, a script,
//! or a test.

use crate::config::ExtractionConfig;
use crate::error::{JournalError, Result};
use crate::output::{write_text_atomic, ExtractionOutput};
use crate::pipeline::{annotate, input};
use crate::services::credentials::GoogleCredentials;
use crate::services::storage::GcsBlobStore;
use crate::services::vision::VisionOcr;
use crate::services::{BlobStore, OcrRequest, OcrService};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What to do when the scan is already present in the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingBlobAction {
    /// Delete the remote copy and upload the local file again.
    Reupload,
    /// Skip the upload and OCR the remote copy.
    Reuse,
    /// Stop without touching anything; surfaces as [`JournalError::Cancelled`].
    Abort,
}

/// Answers to the questions the extraction pipeline asks along the way.
pub trait ExtractionDecisions: Send + Sync {
    /// Called when a blob with the scan's name already exists.
    fn on_existing_blob(&self, blob_name: &str) -> ExistingBlobAction;

    /// Called after the text file is written: delete the uploaded scan?
    fn delete_source(&self, blob_name: &str) -> bool;
}

/// Non-interactive answers fixed up front.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecisions {
    pub on_existing: ExistingBlobAction,
    pub delete_source: bool,
}

impl Default for FixedDecisions {
    /// Reuse an existing upload and keep it afterwards.
    fn default() -> Self {
        Self {
            on_existing: ExistingBlobAction::Reuse,
            delete_source: false,
        }
    }
}

impl ExtractionDecisions for FixedDecisions {
    fn on_existing_blob(&self, _blob_name: &str) -> ExistingBlobAction {
        self.on_existing
    }

    fn delete_source(&self, _blob_name: &str) -> bool {
        self.delete_source
    }
}

/// Build the Cloud Storage and Vision clients for `config`.
pub fn google_services(
    config: &ExtractionConfig,
    access_token: &str,
) -> Result<(GcsBlobStore, VisionOcr)> {
    if access_token.is_empty() {
        return Err(JournalError::MissingCredential {
            name: "Google access token".into(),
            hint: "Set GOOGLE_OAUTH_ACCESS_TOKEN (e.g. from `gcloud auth print-access-token`).".into(),
        });
    }
    let credentials = match config.credentials_path {
        Some(ref path) => GoogleCredentials::from_service_account_file(path, access_token)?,
        None => GoogleCredentials::new(access_token, None),
    };
    let store = GcsBlobStore::new(config.bucket.clone(), credentials.clone())?;
    let ocr = VisionOcr::new(credentials, config.poll_interval)?;
    Ok((store, ocr))
}

/// Run the extraction pipeline on one local scan.
///
/// # Errors
/// - [`JournalError::FileNotFound`] / [`JournalError::UnsupportedDocument`]
///   before anything remote happens
/// - [`JournalError::Storage`], [`JournalError::Ocr`],
///   [`JournalError::MalformedResult`] from the services
/// - [`JournalError::OcrTimeout`] when the operation outlives `config.ocr_timeout`
/// - [`JournalError::Cancelled`] when the decision hook answers
///   [`ExistingBlobAction::Abort`]
pub async fn extract(
    path: &Path,
    config: &ExtractionConfig,
    store: &dyn BlobStore,
    ocr: &dyn OcrService,
    decisions: &dyn ExtractionDecisions,
) -> Result<ExtractionOutput> {
    let start = Instant::now();

    // ── Step 1: Resolve the local document ───────────────────────────────
    let doc = input::resolve_document(path, config.mime_type)?;
    info!("Processing file: {}", doc.path.display());
    info!("Using language hint: {}", config.language_hint);

    // ── Step 2: Existing upload? ─────────────────────────────────────────
    let upload = if store.exists(&doc.blob_name).await? {
        warn!("File {} already exists in the bucket", doc.blob_name);
        match decisions.on_existing_blob(&doc.blob_name) {
            ExistingBlobAction::Abort => {
                info!("Operation cancelled by user");
                return Err(JournalError::Cancelled);
            }
            ExistingBlobAction::Reuse => {
                info!("Skipping upload, using existing file {}", doc.blob_name);
                false
            }
            ExistingBlobAction::Reupload => {
                info!("Deleting existing file {} from the bucket", doc.blob_name);
                store.delete(&doc.blob_name).await?;
                true
            }
        }
    } else {
        true
    };

    // ── Step 3: Upload ───────────────────────────────────────────────────
    if upload {
        let bytes = doc.read_bytes().await?;
        info!("Uploading {} ({} bytes)", doc.blob_name, bytes.len());
        store.upload(&doc.blob_name, bytes, doc.mime_type).await?;
    }

    // ── Step 4: Output directory placeholder ─────────────────────────────
    let prefix = doc.output_prefix();
    debug!("Creating output directory: {}", prefix);
    store.upload(&prefix, Vec::new(), "text/plain").await?;

    // ── Step 5: Submit OCR and wait ──────────────────────────────────────
    let request = OcrRequest {
        source_uri: store.uri(&doc.blob_name),
        mime_type: doc.mime_type.to_string(),
        language_hints: vec![config.language_hint.clone()],
        output_uri: store.uri(&prefix),
        batch_size: config.batch_size,
    };
    info!("Starting text extraction for {}", doc.blob_name);
    let operation = ocr.submit(&request).await?;

    info!(
        "Waiting for text extraction to complete (timeout {}s)",
        config.ocr_timeout.as_secs()
    );
    ocr.wait(&operation, config.ocr_timeout).await?;
    info!("Text extraction completed");

    // ── Step 6: Collect results ──────────────────────────────────────────
    let result_files = annotate::order_result_files(store.list(&prefix).await?);
    let mut pages = Vec::new();
    for name in &result_files {
        debug!("Processing output file: {}", name);
        let json = store.download_text(name).await?;
        pages.extend(annotate::page_texts(name, &json)?);
    }
    let text = annotate::assemble_pages(&pages);

    // ── Step 7: Write text ───────────────────────────────────────────────
    let output_path = config
        .output_path
        .clone()
        .unwrap_or_else(|| doc.default_output_path());
    write_text_atomic(&output_path, &text).await?;
    info!(
        "Extracted text ({} pages from {} files) written to {}",
        pages.len(),
        result_files.len(),
        output_path.display()
    );

    // ── Step 8: Delete the uploaded scan? ────────────────────────────────
    let deleted_source = if decisions.delete_source(&doc.blob_name) {
        info!("Deleting file {} from the bucket", doc.blob_name);
        store.delete(&doc.blob_name).await?;
        true
    } else {
        info!("File {} remains in the bucket", doc.blob_name);
        false
    };

    Ok(ExtractionOutput {
        text,
        output_path,
        blob_name: doc.blob_name,
        uploaded: upload,
        deleted_source,
        pages: pages.len(),
        result_files: result_files.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_decisions_default_reuses_and_keeps() {
        let d = FixedDecisions::default();
        assert_eq!(d.on_existing_blob("x.pdf"), ExistingBlobAction::Reuse);
        assert!(!d.delete_source("x.pdf"));
    }

    #[test]
    fn google_services_require_token() {
        let config = ExtractionConfig::builder().bucket("b").build().unwrap();
        let err = google_services(&config, "").err().unwrap();
        assert!(matches!(err, JournalError::MissingCredential { .. }));
    }

    #[test]
    fn google_services_build_with_token() {
        let config = ExtractionConfig::builder().bucket("journals").build().unwrap();
        let (store, _ocr) = google_services(&config, "ya29.token").unwrap();
        assert_eq!(store.bucket(), "journals");
        assert_eq!(store.uri("scan.pdf"), "gs://journals/scan.pdf");
    }
}
