//! Integration tests for the cleanup pipeline, driven by a scripted
//! completion service so no provider is contacted.

use async_trait::async_trait;
use journal_ocr::error::Result;
use journal_ocr::{
    cleanup, split_entries, CleanupConfig, CleanupProgressCallback, Completion,
    CompletionService, JournalError, Message,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test doubles ─────────────────────────────────────────────────────────────

/// Replies `cleaned <n>` to the n-th call; fails on `fail_on` if set.
#[derive(Default)]
struct ScriptedCompletion {
    calls: AtomicUsize,
    fail_on: Option<usize>,
    prompts: Mutex<Vec<String>>,
    max_tokens_seen: Mutex<Vec<usize>>,
}

impl ScriptedCompletion {
    fn failing_on(n: usize) -> Self {
        Self {
            fail_on: Some(n),
            ..Default::default()
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, messages: &[Message], max_tokens: usize) -> Result<Completion> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        assert_eq!(messages.len(), 1, "exactly one message per entry");
        self.prompts.lock().unwrap().push(messages[0].content.clone());
        self.max_tokens_seen.lock().unwrap().push(max_tokens);

        if self.fail_on == Some(n) {
            return Err(JournalError::LlmApiError {
                message: "503 Service Unavailable".into(),
            });
        }
        Ok(Completion {
            text: format!("cleaned {n}"),
            input_tokens: 100,
            output_tokens: 10,
        })
    }
}

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl CleanupProgressCallback for RecordingProgress {
    fn on_cleanup_start(&self, total_entries: usize) {
        self.events.lock().unwrap().push(format!("start {total_entries}"));
    }
    fn on_entry_start(&self, entry: usize, total: usize, _words: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("entry {entry}/{total}"));
    }
    fn on_entry_complete(&self, entry: usize, _total: usize, _text_len: usize) {
        self.events.lock().unwrap().push(format!("done {entry}"));
    }
    fn on_entry_error(&self, entry: usize, _total: usize, _error: &str) {
        self.events.lock().unwrap().push(format!("error {entry}"));
    }
    fn on_cleanup_complete(&self, total_entries: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("complete {total_entries}"));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

const THREE_ENTRIES: &str =
    "2024 lundi matin il pleut 2024 mardi soleil sur la plage 2024 mercredi retour maison calme";

struct Fixture {
    _dir: tempfile::TempDir,
    input: PathBuf,
    output: PathBuf,
    temp_dir: PathBuf,
}

fn fixture(text: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("journal.txt");
    std::fs::write(&input, text).unwrap();
    Fixture {
        input,
        output: dir.path().join("journal_cleaned_up.txt"),
        temp_dir: dir.path().join("tmp"),
        _dir: dir,
    }
}

fn config(fx: &Fixture, service: Arc<dyn CompletionService>) -> CleanupConfig {
    CleanupConfig::builder()
        .temp_dir(&fx.temp_dir)
        .marker("2024")
        .min_words(3)
        .max_tokens(512)
        .completion(service)
        .build()
        .unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn entries_are_cleaned_in_order_and_joined_by_blank_line() {
    let fx = fixture(THREE_ENTRIES);
    let service = Arc::new(ScriptedCompletion::default());
    let cfg = config(&fx, service.clone());

    let out = cleanup(&fx.input, Some(&fx.output), &cfg).await.unwrap();

    let written = std::fs::read_to_string(&fx.output).unwrap();
    assert_eq!(written, "cleaned 1\n\ncleaned 2\n\ncleaned 3");
    assert_eq!(out.text, written);
    assert_eq!(out.output_path, fx.output);
    assert_eq!(out.stats.entries, 3);
    assert_eq!(out.stats.total_input_tokens, 300);
    assert_eq!(out.stats.total_output_tokens, 30);

    let prompts = service.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].contains("2024 lundi matin il pleut"));
    assert!(prompts[1].contains("2024 mardi soleil sur la plage"));
    assert!(prompts[2].contains("2024 mercredi retour maison calme"));
    assert!(service
        .max_tokens_seen
        .lock()
        .unwrap()
        .iter()
        .all(|&t| t == 512));
}

#[tokio::test]
async fn staged_entry_files_are_removed_after_success() {
    let fx = fixture(THREE_ENTRIES);
    let cfg = config(&fx, Arc::new(ScriptedCompletion::default()));

    cleanup(&fx.input, Some(&fx.output), &cfg).await.unwrap();

    assert!(!fx.temp_dir.exists());
}

#[tokio::test]
async fn failing_entry_aborts_without_output_and_keeps_entries() {
    let fx = fixture(THREE_ENTRIES);
    let service = Arc::new(ScriptedCompletion::failing_on(2));
    let cfg = config(&fx, service.clone());

    let err = cleanup(&fx.input, Some(&fx.output), &cfg).await.unwrap_err();

    match err {
        JournalError::Completion {
            entry,
            total,
            completed,
            detail,
        } => {
            assert_eq!((entry, total, completed), (2, 3, 1));
            assert!(detail.contains("503"));
        }
        other => panic!("expected Completion error, got {other:?}"),
    }
    assert!(!fx.output.exists());
    for n in 1..=3 {
        assert!(fx.temp_dir.join(format!("entry_{n}.txt")).exists());
    }
    // Entry 3 was never sent.
    assert_eq!(service.prompts().len(), 2);
}

#[tokio::test]
async fn progress_callbacks_fire_in_order() {
    let fx = fixture(THREE_ENTRIES);
    let progress = Arc::new(RecordingProgress::default());
    let cfg = CleanupConfig::builder()
        .temp_dir(&fx.temp_dir)
        .min_words(3)
        .completion(Arc::new(ScriptedCompletion::default()))
        .progress_callback(progress.clone())
        .build()
        .unwrap();

    cleanup(&fx.input, Some(&fx.output), &cfg).await.unwrap();

    let events = progress.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start 3", "entry 1/3", "done 1", "entry 2/3", "done 2", "entry 3/3", "done 3",
            "complete 3",
        ]
    );
}

#[tokio::test]
async fn progress_reports_the_failing_entry() {
    let fx = fixture(THREE_ENTRIES);
    let progress = Arc::new(RecordingProgress::default());
    let cfg = CleanupConfig::builder()
        .temp_dir(&fx.temp_dir)
        .min_words(3)
        .completion(Arc::new(ScriptedCompletion::failing_on(1)))
        .progress_callback(progress.clone())
        .build()
        .unwrap();

    cleanup(&fx.input, Some(&fx.output), &cfg).await.unwrap_err();

    let events = progress.events.lock().unwrap().clone();
    assert_eq!(events, vec!["start 3", "entry 1/3", "error 1"]);
}

#[tokio::test]
async fn short_fragments_merge_up_to_min_words() {
    let fx = fixture(THREE_ENTRIES);
    let service = Arc::new(ScriptedCompletion::default());
    let cfg = CleanupConfig::builder()
        .temp_dir(&fx.temp_dir)
        .min_words(10)
        .completion(service.clone())
        .build()
        .unwrap();

    let out = cleanup(&fx.input, Some(&fx.output), &cfg).await.unwrap();

    assert_eq!(out.stats.entries, 2);
    let prompts = service.prompts();
    assert!(prompts[0].contains("2024 lundi matin il pleut 2024 mardi soleil sur la plage"));
    assert!(prompts[1].contains("2024 mercredi retour maison calme"));
}

#[tokio::test]
async fn text_without_marker_is_one_entry() {
    let fx = fixture("just a few words with no year at all");
    let cfg = config(&fx, Arc::new(ScriptedCompletion::default()));

    let out = cleanup(&fx.input, Some(&fx.output), &cfg).await.unwrap();

    assert_eq!(out.stats.entries, 1);
    assert_eq!(std::fs::read_to_string(&fx.output).unwrap(), "cleaned 1");
}

#[tokio::test]
async fn missing_api_key_is_reported_before_reading_input() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = CleanupConfig::builder()
        .temp_dir(dir.path().join("tmp"))
        .model("llama-3.3-70b-versatile")
        .build()
        .unwrap();

    let err = cleanup(&dir.path().join("absent.txt"), None, &cfg)
        .await
        .unwrap_err();

    assert!(matches!(err, JournalError::MissingCredential { .. }));
    assert!(!dir.path().join("tmp").exists());
}

#[tokio::test]
async fn missing_input_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = CleanupConfig::builder()
        .temp_dir(dir.path().join("tmp"))
        .completion(Arc::new(ScriptedCompletion::default()))
        .build()
        .unwrap();

    let err = cleanup(&dir.path().join("absent.txt"), None, &cfg)
        .await
        .unwrap_err();

    assert!(matches!(err, JournalError::FileNotFound { .. }));
}

#[test]
fn segmentation_preserves_every_word_in_order() {
    let text = "intro line 2024 one two 2024 three 2024 four five six 2024 seven";
    for min_words in [0, 1, 3, 5, 100] {
        let entries = split_entries(text, "2024", min_words);
        let rejoined: Vec<&str> = entries
            .iter()
            .flat_map(|e| e.text.split_whitespace())
            .collect();
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(rejoined, original, "min_words = {min_words}");
        for (i, e) in entries.iter().enumerate() {
            assert_eq!(e.index, i + 1);
        }
    }
}

#[test]
fn segmentation_only_last_entry_may_be_short() {
    let text = "2024 a b 2024 c d e f 2024 g 2024 h i j k l 2024 m";
    let entries = split_entries(text, "2024", 4);
    let (last, rest) = entries.split_last().unwrap();
    assert!(rest.iter().all(|e| e.word_count() >= 4));
    assert_eq!(last.text, "2024 m");
}
