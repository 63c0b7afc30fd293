//! Integration tests for the extraction pipeline.
//!
//! Cloud Storage and Vision are replaced by in-memory doubles: the store keeps
//! objects in a map and logs every mutating call, and the OCR double writes
//! canned result JSON under the requested output prefix when it completes.

use async_trait::async_trait;
use journal_ocr::error::Result;
use journal_ocr::{
    extract, BlobStore, ExistingBlobAction, ExtractionConfig, FixedDecisions, JournalError,
    OcrOperation, OcrRequest, OcrService,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Test doubles ─────────────────────────────────────────────────────────────

const BUCKET_URI: &str = "mem://journals/";

#[derive(Default)]
struct MemoryStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryStore {
    fn with_object(name: &str, bytes: &[u8]) -> Arc<Self> {
        let store = Self::default();
        store
            .objects
            .lock()
            .unwrap()
            .insert(name.to_string(), bytes.to_vec());
        Arc::new(store)
    }

    fn put(&self, name: &str, contents: &str) {
        self.objects
            .lock()
            .unwrap()
            .insert(name.to_string(), contents.as_bytes().to_vec());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn contains(&self, name: &str) -> bool {
        self.objects.lock().unwrap().contains_key(name)
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.contains(name))
    }

    async fn upload(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("upload {name} {content_type}"));
        self.objects.lock().unwrap().insert(name.to_string(), bytes);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("delete {name}"));
        match self.objects.lock().unwrap().remove(name) {
            Some(_) => Ok(()),
            None => Err(JournalError::Storage {
                object: name.to_string(),
                detail: "404 Not Found".into(),
            }),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn download_text(&self, name: &str) -> Result<String> {
        let objects = self.objects.lock().unwrap();
        let bytes = objects.get(name).ok_or_else(|| JournalError::Storage {
            object: name.to_string(),
            detail: "404 Not Found".into(),
        })?;
        String::from_utf8(bytes.clone()).map_err(|e| JournalError::Storage {
            object: name.to_string(),
            detail: e.to_string(),
        })
    }

    fn uri(&self, name: &str) -> String {
        format!("{BUCKET_URI}{name}")
    }
}

/// Writes `results` (file name → JSON) under the request's output prefix.
struct FakeOcr {
    store: Arc<MemoryStore>,
    results: Vec<(&'static str, String)>,
    time_out: bool,
    requests: Mutex<Vec<OcrRequest>>,
}

impl FakeOcr {
    fn new(store: Arc<MemoryStore>, results: Vec<(&'static str, String)>) -> Self {
        Self {
            store,
            results,
            time_out: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<OcrRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl OcrService for FakeOcr {
    async fn submit(&self, request: &OcrRequest) -> Result<OcrOperation> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(OcrOperation {
            name: "operations/42".into(),
        })
    }

    async fn wait(&self, operation: &OcrOperation, timeout: Duration) -> Result<()> {
        if self.time_out {
            return Err(JournalError::OcrTimeout {
                operation: operation.name.clone(),
                secs: timeout.as_secs(),
            });
        }
        let request = self.requests.lock().unwrap().last().cloned();
        let prefix = request
            .map(|r| r.output_uri.trim_start_matches(BUCKET_URI).to_string())
            .unwrap_or_default();
        for (file, json) in &self.results {
            self.store.put(&format!("{prefix}{file}"), json);
        }
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn result_json(pages: &[&str]) -> String {
    let responses: Vec<serde_json::Value> = pages
        .iter()
        .map(|t| serde_json::json!({ "fullTextAnnotation": { "text": t } }))
        .collect();
    serde_json::json!({ "responses": responses }).to_string()
}

fn two_batches() -> Vec<(&'static str, String)> {
    // Listed out of page order.
    vec![
        ("output-3-to-4.json", result_json(&["page three", "page four"])),
        ("output-1-to-2.json", result_json(&["page one", "page two"])),
    ]
}

struct Fixture {
    _dir: tempfile::TempDir,
    scan: PathBuf,
    output: PathBuf,
    config: ExtractionConfig,
}

fn fixture(scan_name: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let scan = dir.path().join(scan_name);
    std::fs::write(&scan, b"%PDF-1.4 fake scan").unwrap();
    let output = dir.path().join("out").join("scan.txt");
    let config = ExtractionConfig::builder()
        .bucket("journals")
        .language_hint("fr")
        .output_path(&output)
        .ocr_timeout(Duration::from_secs(30))
        .build()
        .unwrap();
    Fixture {
        _dir: dir,
        scan,
        output,
        config,
    }
}

fn decisions(on_existing: ExistingBlobAction, delete_source: bool) -> FixedDecisions {
    FixedDecisions {
        on_existing,
        delete_source,
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_upload_produces_ordered_text() {
    let fx = fixture("scan.pdf");
    let store = Arc::new(MemoryStore::default());
    let ocr = FakeOcr::new(Arc::clone(&store), two_batches());

    let out = extract(
        &fx.scan,
        &fx.config,
        store.as_ref(),
        &ocr,
        &FixedDecisions::default(),
    )
    .await
    .unwrap();

    assert!(out.uploaded);
    assert_eq!(out.pages, 4);
    assert_eq!(out.result_files, 2);
    assert_eq!(
        read(&fx.output),
        "page one\n\npage two\n\npage three\n\npage four"
    );
    assert_eq!(out.text, read(&fx.output));
    assert_eq!(
        store.calls(),
        vec![
            "upload scan.pdf application/pdf".to_string(),
            "upload scan/ text/plain".to_string(),
        ]
    );
}

#[tokio::test]
async fn ocr_request_carries_uris_hint_and_batch_size() {
    let fx = fixture("scan.pdf");
    let store = Arc::new(MemoryStore::default());
    let ocr = FakeOcr::new(Arc::clone(&store), two_batches());

    extract(
        &fx.scan,
        &fx.config,
        store.as_ref(),
        &ocr,
        &FixedDecisions::default(),
    )
    .await
    .unwrap();

    let requests = ocr.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.source_uri, "mem://journals/scan.pdf");
    assert_eq!(req.output_uri, "mem://journals/scan/");
    assert_eq!(req.mime_type, "application/pdf");
    assert_eq!(req.language_hints, vec!["fr".to_string()]);
    assert_eq!(req.batch_size, 2);
}

#[tokio::test]
async fn reuse_skips_upload_but_still_writes_output() {
    let fx = fixture("scan.pdf");
    let store = MemoryStore::with_object("scan.pdf", b"remote copy");
    let ocr = FakeOcr::new(Arc::clone(&store), two_batches());

    let out = extract(
        &fx.scan,
        &fx.config,
        store.as_ref(),
        &ocr,
        &decisions(ExistingBlobAction::Reuse, false),
    )
    .await
    .unwrap();

    assert!(!out.uploaded);
    assert!(fx.output.exists());
    let calls = store.calls();
    assert!(!calls.iter().any(|c| c.starts_with("upload scan.pdf")));
    assert!(!calls.iter().any(|c| c.starts_with("delete")));
}

#[tokio::test]
async fn reupload_deletes_before_uploading() {
    let fx = fixture("scan.pdf");
    let store = MemoryStore::with_object("scan.pdf", b"stale copy");
    let ocr = FakeOcr::new(Arc::clone(&store), two_batches());

    extract(
        &fx.scan,
        &fx.config,
        store.as_ref(),
        &ocr,
        &decisions(ExistingBlobAction::Reupload, false),
    )
    .await
    .unwrap();

    let calls = store.calls();
    assert_eq!(calls[0], "delete scan.pdf");
    assert_eq!(calls[1], "upload scan.pdf application/pdf");
}

#[tokio::test]
async fn abort_is_cancelled_and_touches_nothing() {
    let fx = fixture("scan.pdf");
    let store = MemoryStore::with_object("scan.pdf", b"remote copy");
    let ocr = FakeOcr::new(Arc::clone(&store), two_batches());

    let err = extract(
        &fx.scan,
        &fx.config,
        store.as_ref(),
        &ocr,
        &decisions(ExistingBlobAction::Abort, true),
    )
    .await
    .unwrap_err();

    assert!(err.is_cancelled());
    assert!(store.calls().is_empty());
    assert!(ocr.requests().is_empty());
    assert!(!fx.output.exists());
}

#[tokio::test]
async fn delete_source_removes_uploaded_scan() {
    let fx = fixture("scan.pdf");
    let store = Arc::new(MemoryStore::default());
    let ocr = FakeOcr::new(Arc::clone(&store), two_batches());

    let out = extract(
        &fx.scan,
        &fx.config,
        store.as_ref(),
        &ocr,
        &decisions(ExistingBlobAction::Reuse, true),
    )
    .await
    .unwrap();

    assert!(out.deleted_source);
    assert!(!store.contains("scan.pdf"));
    assert_eq!(store.calls().last().unwrap(), "delete scan.pdf");
}

#[tokio::test]
async fn keeping_source_leaves_scan_in_bucket() {
    let fx = fixture("scan.pdf");
    let store = Arc::new(MemoryStore::default());
    let ocr = FakeOcr::new(Arc::clone(&store), two_batches());

    let out = extract(
        &fx.scan,
        &fx.config,
        store.as_ref(),
        &ocr,
        &FixedDecisions::default(),
    )
    .await
    .unwrap();

    assert!(!out.deleted_source);
    assert!(store.contains("scan.pdf"));
}

#[tokio::test]
async fn ocr_timeout_aborts_extraction_without_output() {
    let fx = fixture("scan.pdf");
    let store = Arc::new(MemoryStore::default());
    let mut ocr = FakeOcr::new(Arc::clone(&store), two_batches());
    ocr.time_out = true;

    let err = extract(
        &fx.scan,
        &fx.config,
        store.as_ref(),
        &ocr,
        &FixedDecisions::default(),
    )
    .await
    .unwrap_err();

    match err {
        JournalError::OcrTimeout { operation, secs } => {
            assert_eq!(operation, "operations/42");
            assert_eq!(secs, 30);
        }
        other => panic!("expected OcrTimeout, got {other:?}"),
    }
    assert!(!fx.output.exists());
}

#[tokio::test]
async fn non_json_results_are_ignored() {
    let fx = fixture("scan.pdf");
    let store = Arc::new(MemoryStore::default());
    let mut results = two_batches();
    results.push(("debug.log", "not json at all".to_string()));
    let ocr = FakeOcr::new(Arc::clone(&store), results);

    let out = extract(
        &fx.scan,
        &fx.config,
        store.as_ref(),
        &ocr,
        &FixedDecisions::default(),
    )
    .await
    .unwrap();

    assert_eq!(out.result_files, 2);
}

#[tokio::test]
async fn malformed_result_fails_the_run() {
    let fx = fixture("scan.pdf");
    let store = Arc::new(MemoryStore::default());
    let ocr = FakeOcr::new(
        Arc::clone(&store),
        vec![("output-1-to-2.json", "{ truncated".to_string())],
    );

    let err = extract(
        &fx.scan,
        &fx.config,
        store.as_ref(),
        &ocr,
        &FixedDecisions::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, JournalError::MalformedResult { .. }));
    assert!(!fx.output.exists());
}

#[tokio::test]
async fn tiff_scan_uses_tiff_mime_type() {
    let fx = fixture("carnet.tif");
    let store = Arc::new(MemoryStore::default());
    let ocr = FakeOcr::new(Arc::clone(&store), two_batches());

    extract(
        &fx.scan,
        &fx.config,
        store.as_ref(),
        &ocr,
        &FixedDecisions::default(),
    )
    .await
    .unwrap();

    assert_eq!(ocr.requests()[0].mime_type, "image/tiff");
    assert!(store.contains("carnet/"));
}

#[tokio::test]
async fn missing_scan_fails_before_any_remote_call() {
    let fx = fixture("scan.pdf");
    let store = Arc::new(MemoryStore::default());
    let ocr = FakeOcr::new(Arc::clone(&store), two_batches());
    let missing = fx.scan.with_file_name("nope.pdf");

    let err = extract(
        &missing,
        &fx.config,
        store.as_ref(),
        &ocr,
        &FixedDecisions::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, JournalError::FileNotFound { .. }));
    assert!(store.calls().is_empty());
}
