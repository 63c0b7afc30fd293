//! Configuration types for the extraction and cleanup pipelines.
//!
//! Each pipeline takes one explicit config struct, built via its builder. The
//! binaries fill the builders from CLI flags and environment variables; the
//! library itself never reads the environment, so two runs with different
//! settings can coexist in one process and tests need no global state.

use crate::error::JournalError;
use crate::progress::ProgressCallback;
use crate::services::CompletionService;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

// ── Extraction ───────────────────────────────────────────────────────────

/// Configuration for [`crate::extract::extract`].
///
/// # Example
/// ```rust
/// use journal_ocr::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .bucket("my-journals")
///     .language_hint("fr")
///     .build()
///     .unwrap();
/// assert_eq!(config.ocr_timeout.as_secs(), 420);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Cloud Storage bucket used as the OCR staging area.
    pub bucket: String,

    /// Service-account key file; its `project_id` becomes the quota project.
    pub credentials_path: Option<PathBuf>,

    /// Language hint passed to OCR. Default: `"en"`.
    pub language_hint: String,

    /// Where to write the extracted text. Default: `<stem>.txt` in the working directory.
    pub output_path: Option<PathBuf>,

    /// Hard deadline for the OCR operation. Default: 420 s.
    ///
    /// A handwritten 100-page notebook takes Vision two to four minutes; the
    /// deadline leaves headroom without letting a stuck operation hang forever.
    pub ocr_timeout: Duration,

    /// Interval between operation polls. Default: 5 s.
    pub poll_interval: Duration,

    /// Pages per OCR output JSON file (1–100). Default: 2.
    pub batch_size: u32,

    /// MIME type override; `None` derives it from the file extension.
    pub mime_type: Option<&'static str>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            credentials_path: None,
            language_hint: "en".to_string(),
            output_path: None,
            ocr_timeout: Duration::from_secs(420),
            poll_interval: Duration::from_secs(5),
            batch_size: 2,
            mime_type: None,
        }
    }
}

impl ExtractionConfig {
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.bucket = bucket.into();
        self
    }

    pub fn credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.credentials_path = Some(path.into());
        self
    }

    pub fn language_hint(mut self, hint: impl Into<String>) -> Self {
        self.config.language_hint = hint.into();
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = Some(path.into());
        self
    }

    pub fn ocr_timeout(mut self, timeout: Duration) -> Self {
        self.config.ocr_timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn batch_size(mut self, n: u32) -> Self {
        self.config.batch_size = n;
        self
    }

    pub fn mime_type(mut self, mime: &'static str) -> Self {
        self.config.mime_type = Some(mime);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, JournalError> {
        let c = &self.config;
        if c.bucket.trim().is_empty() {
            return Err(JournalError::MissingCredential {
                name: "bucket name".into(),
                hint: "Set BUCKET_NAME to the Cloud Storage bucket used for staging.".into(),
            });
        }
        if c.language_hint.trim().is_empty() {
            return Err(JournalError::InvalidConfig(
                "language hint must not be empty".into(),
            ));
        }
        if c.ocr_timeout < Duration::from_secs(1) {
            return Err(JournalError::InvalidConfig(
                "OCR timeout must be at least 1s".into(),
            ));
        }
        if !(1..=100).contains(&c.batch_size) {
            return Err(JournalError::InvalidConfig(format!(
                "batch size must be 1–100, got {}",
                c.batch_size
            )));
        }
        Ok(self.config)
    }
}

// ── Cleanup ──────────────────────────────────────────────────────────────

/// Proper nouns the model is told to keep verbatim.
pub const DEFAULT_PROPER_NOUNS: &[&str] = &["Théa", "Hallat", "Triominos", "Souad"];

/// Configuration for [`crate::cleanup::cleanup`].
///
/// # Example
/// ```rust
/// use journal_ocr::CleanupConfig;
///
/// let config = CleanupConfig::builder()
///     .marker("2023")
///     .min_words(150)
///     .model("llama-3.3-70b-versatile")
///     .build()
///     .unwrap();
/// assert_eq!(config.language_hint, "fr");
/// ```
#[derive(Clone)]
pub struct CleanupConfig {
    /// Directory for transient `entry_<n>.txt` files. Default: `tmp`.
    pub temp_dir: PathBuf,

    /// Entry boundary marker, typically the journal's year. Default: `"2024"`.
    pub marker: String,

    /// Language hint inserted into the cleanup prompt. Default: `"fr"`.
    pub language_hint: String,

    /// Minimum words per entry before a boundary is accepted. Default: 200.
    ///
    /// Dates often appear mid-entry ("back on 2024-03-02 we…"); merging short
    /// fragments keeps such false boundaries from producing tiny requests.
    pub min_words: usize,

    /// Max completion tokens per entry. Default: 8000.
    pub max_tokens: usize,

    /// Sampling temperature. Default: 0.2.
    pub temperature: f32,

    /// Names the model must not "correct".
    pub proper_nouns: Vec<String>,

    /// Completion provider name for `edgequake-llm`. Default: `"groq"`.
    pub provider_name: String,

    /// Completion model id (`GROQ_MODEL`).
    pub model: Option<String>,

    /// Completion API key (`GROQ_API_KEY`); required unless `completion` is set.
    pub api_key: Option<String>,

    /// Pre-constructed completion service. Takes precedence over provider settings.
    pub completion: Option<Arc<dyn CompletionService>>,

    /// Optional per-entry progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from("tmp"),
            marker: "2024".to_string(),
            language_hint: "fr".to_string(),
            min_words: 200,
            max_tokens: 8000,
            temperature: 0.2,
            proper_nouns: DEFAULT_PROPER_NOUNS.iter().map(|s| s.to_string()).collect(),
            provider_name: "groq".to_string(),
            model: None,
            api_key: None,
            completion: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for CleanupConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupConfig")
            .field("temp_dir", &self.temp_dir)
            .field("marker", &self.marker)
            .field("language_hint", &self.language_hint)
            .field("min_words", &self.min_words)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("proper_nouns", &self.proper_nouns)
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "completion",
                &self.completion.as_ref().map(|_| "<dyn CompletionService>"),
            )
            .finish()
    }
}

impl CleanupConfig {
    pub fn builder() -> CleanupConfigBuilder {
        CleanupConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`CleanupConfig`].
#[derive(Debug)]
pub struct CleanupConfigBuilder {
    config: CleanupConfig,
}

impl CleanupConfigBuilder {
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = dir.into();
        self
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.config.marker = marker.into();
        self
    }

    pub fn language_hint(mut self, hint: impl Into<String>) -> Self {
        self.config.language_hint = hint.into();
        self
    }

    pub fn min_words(mut self, n: usize) -> Self {
        self.config.min_words = n;
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn proper_nouns<I, S>(mut self, nouns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.proper_nouns = nouns.into_iter().map(Into::into).collect();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn completion(mut self, service: Arc<dyn CompletionService>) -> Self {
        self.config.completion = Some(service);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Credentials are checked later, when the completion service is
    /// resolved, so a config can be built before the key is known.
    pub fn build(self) -> Result<CleanupConfig, JournalError> {
        let c = &self.config;
        if c.marker.is_empty() {
            return Err(JournalError::InvalidConfig(
                "entry marker must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(JournalError::InvalidConfig("max tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}
