//! Cloud Vision asynchronous file annotation (`files:asyncBatchAnnotate`).
//!
//! PDFs and multi-page TIFFs cannot be annotated synchronously. The request
//! names a source object and an output prefix in Cloud Storage, and returns a
//! long-running operation. Vision then writes one JSON file per `batch_size`
//! pages under the prefix; [`crate::pipeline::annotate`] reads them back.
//!
//! `wait` polls the operation at a fixed interval under a hard deadline. The
//! deadline is not a retry budget: the first poll error aborts the wait.

use super::credentials::GoogleCredentials;
use super::{OcrOperation, OcrRequest, OcrService};
use crate::error::{JournalError, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/";

/// Feature type for dense text (handwriting, book pages).
const DOCUMENT_TEXT_DETECTION: &str = "DOCUMENT_TEXT_DETECTION";

/// Vision client bound to one set of credentials.
#[derive(Debug, Clone)]
pub struct VisionOcr {
    client: Client,
    endpoint: Url,
    credentials: GoogleCredentials,
    poll_interval: Duration,
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct AsyncBatchAnnotateFilesRequest<'a> {
    requests: Vec<AsyncAnnotateFileRequest<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AsyncAnnotateFileRequest<'a> {
    input_config: InputConfig<'a>,
    features: Vec<Feature>,
    image_context: ImageContext<'a>,
    output_config: OutputConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InputConfig<'a> {
    gcs_source: GcsLocation<'a>,
    mime_type: &'a str,
}

#[derive(Serialize)]
struct GcsLocation<'a> {
    uri: &'a str,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext<'a> {
    language_hints: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputConfig<'a> {
    gcs_destination: GcsLocation<'a>,
    batch_size: u32,
}

/// `google.longrunning.Operation`, reduced to what we inspect.
#[derive(Debug, Deserialize)]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

impl<'a> AsyncBatchAnnotateFilesRequest<'a> {
    fn from_request(req: &'a OcrRequest) -> Self {
        Self {
            requests: vec![AsyncAnnotateFileRequest {
                input_config: InputConfig {
                    gcs_source: GcsLocation {
                        uri: &req.source_uri,
                    },
                    mime_type: &req.mime_type,
                },
                features: vec![Feature {
                    kind: DOCUMENT_TEXT_DETECTION,
                }],
                image_context: ImageContext {
                    language_hints: &req.language_hints,
                },
                output_config: OutputConfig {
                    gcs_destination: GcsLocation {
                        uri: &req.output_uri,
                    },
                    batch_size: req.batch_size,
                },
            }],
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────────

impl VisionOcr {
    pub fn new(credentials: GoogleCredentials, poll_interval: Duration) -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT, credentials, poll_interval)
    }

    pub fn with_endpoint(
        endpoint: &str,
        credentials: GoogleCredentials,
        poll_interval: Duration,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| JournalError::InvalidConfig(format!("vision endpoint: {e}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| JournalError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            credentials,
            poll_interval,
        })
    }

    /// Resolve `path` relative to the endpoint. The `./` prefix stops
    /// `files:asyncBatchAnnotate` from parsing as a URL scheme.
    fn url(&self, path: &str) -> Result<Url> {
        self.endpoint
            .join(&format!("./{}", path.trim_start_matches('/')))
            .map_err(|e| JournalError::Ocr(format!("bad URL '{path}': {e}")))
    }

    async fn fetch_operation(&self, name: &str) -> Result<Operation> {
        let req = self.credentials.authorize(self.client.get(self.url(name)?));
        let resp = req
            .send()
            .await
            .map_err(|e| JournalError::Ocr(format!("polling {name}: {e}")))?;
        parse_operation(resp).await
    }

    async fn poll_until_done(&self, name: &str) -> Result<()> {
        loop {
            let op = self.fetch_operation(name).await?;
            if op.done {
                return match op.error {
                    Some(err) => Err(JournalError::Ocr(format!(
                        "operation {} failed (code {}): {}",
                        op.name, err.code, err.message
                    ))),
                    None => Ok(()),
                };
            }
            debug!("OCR operation {} still running", name);
            sleep(self.poll_interval).await;
        }
    }
}

async fn parse_operation(resp: reqwest::Response) -> Result<Operation> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| JournalError::Ocr(format!("reading response: {e}")))?;
    if !status.is_success() {
        return Err(JournalError::Ocr(format!("HTTP {status}: {body}")));
    }
    serde_json::from_str(&body)
        .map_err(|e| JournalError::Ocr(format!("unexpected operation payload: {e}")))
}

#[async_trait]
impl OcrService for VisionOcr {
    async fn submit(&self, request: &OcrRequest) -> Result<OcrOperation> {
        let body = AsyncBatchAnnotateFilesRequest::from_request(request);
        let req = self
            .credentials
            .authorize(self.client.post(self.url("files:asyncBatchAnnotate")?))
            .json(&body);
        let resp = req
            .send()
            .await
            .map_err(|e| JournalError::Ocr(format!("submitting request: {e}")))?;
        let op = parse_operation(resp).await?;
        info!("Submitted OCR operation {}", op.name);
        Ok(OcrOperation { name: op.name })
    }

    async fn wait(&self, operation: &OcrOperation, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.poll_until_done(&operation.name))
            .await
            .map_err(|_| JournalError::OcrTimeout {
                operation: operation.name.clone(),
                secs: timeout.as_secs(),
            })?
    }
}
