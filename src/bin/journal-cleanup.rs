//! CLI binary for the cleanup pipeline.
//!
//! Maps flags and environment variables to `CleanupConfig`, shows a progress
//! bar while entries are rewritten, and prints the summary once at the end.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use journal_ocr::{cleanup, CleanupConfig, CleanupProgressCallback, ProgressCallback};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::error;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the run, one log line per entry.
struct CliProgressCallback {
    bar: ProgressBar,
    entry_start: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} entries  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Cleaning");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            entry_start: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.entry_start
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl CleanupProgressCallback for CliProgressCallback {
    fn on_cleanup_start(&self, total_entries: usize) {
        self.bar.set_length(total_entries as u64);
        self.bar.reset_eta();
    }

    fn on_entry_start(&self, entry: usize, _total: usize, words: usize) {
        if let Ok(mut s) = self.entry_start.lock() {
            *s = Some(Instant::now());
        }
        self.bar.set_message(format!("entry {entry} ({words} words)"));
    }

    fn on_entry_complete(&self, entry: usize, total: usize, text_len: usize) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} Entry {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            entry,
            total,
            dim(&format!("{text_len:>5} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_entry_error(&self, entry: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs();
        let msg: String = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Entry {:>3}/{:<3}  {}  {}",
            red("✗"),
            entry,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.abandon();
    }

    fn on_cleanup_complete(&self, _total_entries: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Clean an extracted journal (writes journal_2024_cleaned_up.txt)
  journal-cleanup journal_2024.txt

  # Different year marker, explicit output file
  YEAR_PATTERN=2023 journal-cleanup carnet.txt --output carnet_propre.txt

ENVIRONMENT VARIABLES:
  TMP_DIR               Directory for transient entry files (default: tmp)
  YEAR_PATTERN          Entry marker (default: 2024)
  LANGUAGE_HINT         Language hint for the model (default: fr)
  GROQ_API_KEY          Groq API key (required for the groq provider)
  GROQ_MODEL            Completion model id (required)
  JOURNAL_LLM_PROVIDER  edgequake-llm provider name (default: groq)
"#;

/// Clean OCR-extracted journal text entry by entry with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "journal-cleanup",
    version,
    about = "Clean OCR-extracted journal text entry by entry with an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Text file produced by journal-extract.
    input_file: PathBuf,

    /// Output path. Default: <name>_cleaned_up<.ext>.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for transient per-entry files.
    #[arg(long, env = "TMP_DIR", default_value = "tmp")]
    tmp_dir: PathBuf,

    /// Entry boundary marker (usually the year).
    #[arg(long, env = "YEAR_PATTERN", default_value = "2024")]
    year_pattern: String,

    /// Language hint for the model.
    #[arg(long, env = "LANGUAGE_HINT", default_value = "fr")]
    language_hint: String,

    /// Groq API key. Other providers read their own key variable.
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Completion model id.
    #[arg(long, env = "GROQ_MODEL")]
    model: Option<String>,

    /// edgequake-llm provider name.
    #[arg(long, env = "JOURNAL_LLM_PROVIDER", default_value = "groq")]
    provider: String,

    /// Minimum words per entry.
    #[arg(long, default_value_t = 200)]
    min_words: usize,

    /// Max completion tokens per entry.
    #[arg(long, default_value_t = 8000)]
    max_tokens: usize,

    /// Disable progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO logs would interleave with the bar; it already shows per-entry state.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = CleanupConfig::builder()
        .temp_dir(cli.tmp_dir.clone())
        .marker(cli.year_pattern.clone())
        .language_hint(cli.language_hint.clone())
        .provider_name(cli.provider.clone())
        .min_words(cli.min_words)
        .max_tokens(cli.max_tokens);
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run cleanup ──────────────────────────────────────────────────────
    let output = match cleanup(&cli.input_file, cli.output.as_deref(), &config).await {
        Ok(output) => output,
        Err(e) => {
            error!("{e}");
            return Err(e).context("Cleanup failed");
        }
    };

    if !cli.quiet {
        eprintln!(
            "{}  {} entries  {}ms  →  {}",
            green("✔"),
            output.stats.entries,
            output.stats.total_duration_ms,
            bold(&output.output_path.display().to_string()),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&output.stats.total_input_tokens.to_string()),
            dim(&output.stats.total_output_tokens.to_string()),
        );
    }

    Ok(())
}
