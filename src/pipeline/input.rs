//! Input resolution: validate the local scan and work out how to name it remotely.
//!
//! Vision's asynchronous file annotation only accepts PDF, TIFF and GIF
//! sources, and it reads them from Cloud Storage rather than from the request
//! body. The blob name, MIME type and result prefix of the local file are
//! resolved here, before any network call is made.

use crate::error::{JournalError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A local scan ready to be staged in the blob store.
#[derive(Debug, Clone)]
pub struct Document {
    /// Local path as supplied by the caller.
    pub path: PathBuf,
    /// Blob name: the file name without any directory component.
    pub blob_name: String,
    /// File name without extension; names the OCR output prefix and the text file.
    pub stem: String,
    /// MIME type passed to the OCR service.
    pub mime_type: &'static str,
}

impl Document {
    /// Prefix under which the OCR service writes its JSON results (`<stem>/`).
    pub fn output_prefix(&self) -> String {
        format!("{}/", self.stem)
    }

    /// Default local text output: `<stem>.txt` in the working directory.
    pub fn default_output_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.txt", self.stem))
    }

    /// Read the whole document into memory for upload.
    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| JournalError::ReadFailed {
                path: self.path.clone(),
                source: e,
            })
    }
}

/// Map a file extension to a MIME type Vision accepts for file annotation.
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "tif" | "tiff" => Some("image/tiff"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Resolve a local scan, validating that it exists and has a supported type.
///
/// `mime_override` bypasses extension sniffing for files with unusual names.
pub fn resolve_document(path: &Path, mime_override: Option<&'static str>) -> Result<Document> {
    if !path.is_file() {
        return Err(JournalError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mime_type = match mime_override.or_else(|| mime_type_for(path)) {
        Some(m) => m,
        None => {
            return Err(JournalError::UnsupportedDocument {
                path: path.to_path_buf(),
            })
        }
    };

    let blob_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| JournalError::UnsupportedDocument {
            path: path.to_path_buf(),
        })?
        .to_string();

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(&blob_name)
        .to_string();

    debug!(
        "Resolved document {} → blob '{}' ({})",
        path.display(),
        blob_name,
        mime_type
    );

    Ok(Document {
        path: path.to_path_buf(),
        blob_name,
        stem,
        mime_type,
    })
}
