//! CLI binary for the extraction pipeline.
//!
//! A thin shim over the library: maps flags and environment variables to
//! `ExtractionConfig`, answers the pipeline's questions on the terminal (or
//! from flags), and reports where the text went.

use anyhow::{Context, Result};
use clap::Parser;
use journal_ocr::{
    extract, google_services, ExistingBlobAction, ExtractionConfig, ExtractionDecisions,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract with the default language hint
  journal-extract scans/journal_2024.pdf

  # French handwriting, re-use an existing upload, delete it afterwards
  journal-extract --on-existing reuse --delete-source yes scans/carnet.pdf fr

ENVIRONMENT VARIABLES:
  SERVICE_ACCOUNT_FILE        Service-account JSON key (project id for billing)
  BUCKET_NAME                 Cloud Storage bucket used for staging
  LANGUAGE_HINT               Default OCR language hint (default: en)
  GOOGLE_OAUTH_ACCESS_TOKEN   OAuth access token, e.g. `gcloud auth print-access-token`
"#;

/// Extract text from a scanned journal with Cloud Vision OCR.
#[derive(Parser, Debug)]
#[command(
    name = "journal-extract",
    version,
    about = "Extract text from a scanned journal with Cloud Vision OCR",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local scan (.pdf, .tif, .tiff, .gif).
    local_file_path: PathBuf,

    /// OCR language hint, e.g. en, fr.
    #[arg(env = "LANGUAGE_HINT", default_value = "en")]
    language_hint: String,

    /// Service-account JSON key file.
    #[arg(long, env = "SERVICE_ACCOUNT_FILE")]
    service_account_file: Option<PathBuf>,

    /// Cloud Storage bucket used for staging.
    #[arg(long, env = "BUCKET_NAME")]
    bucket: Option<String>,

    /// OAuth access token for Cloud Storage and Vision.
    #[arg(long, env = "GOOGLE_OAUTH_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Write the text here instead of <name>.txt.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// What to do if the scan is already in the bucket.
    #[arg(long, value_enum, default_value = "ask")]
    on_existing: OnExistingArg,

    /// Delete the uploaded scan from the bucket when done.
    #[arg(long, value_enum, default_value = "ask")]
    delete_source: DeleteArg,

    /// OCR deadline in seconds.
    #[arg(long, default_value_t = 420)]
    timeout: u64,

    /// Seconds between OCR status polls.
    #[arg(long, default_value_t = 5)]
    poll_interval: u64,

    /// Pages per OCR result file.
    #[arg(long, default_value_t = 2)]
    batch_size: u32,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OnExistingArg {
    Ask,
    Upload,
    Reuse,
    Quit,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum DeleteArg {
    Ask,
    Yes,
    No,
}

/// Answers from flags, falling back to a terminal prompt for `ask`.
struct TerminalDecisions {
    on_existing: OnExistingArg,
    delete_source: DeleteArg,
}

impl TerminalDecisions {
    /// Read one trimmed, lower-cased line. `None` on EOF or read error.
    fn prompt(question: &str) -> Option<String> {
        tokio::task::block_in_place(|| {
            eprint!("{question}");
            io::stderr().flush().ok();
            let mut line = String::new();
            match io::stdin().lock().read_line(&mut line) {
                Ok(0) | Err(_) => None,
                Ok(_) => Some(line.trim().to_lowercase()),
            }
        })
    }
}

impl ExtractionDecisions for TerminalDecisions {
    fn on_existing_blob(&self, blob_name: &str) -> ExistingBlobAction {
        match self.on_existing {
            OnExistingArg::Upload => return ExistingBlobAction::Reupload,
            OnExistingArg::Reuse => return ExistingBlobAction::Reuse,
            OnExistingArg::Quit => return ExistingBlobAction::Abort,
            OnExistingArg::Ask => {}
        }
        let question = format!(
            "File {blob_name} already exists in the bucket. Do you want to (u)pload again, \
             (c)ontinue processing, or (q)uit? (u/c/q): "
        );
        loop {
            match Self::prompt(&question).as_deref() {
                Some("u") => return ExistingBlobAction::Reupload,
                Some("c") => return ExistingBlobAction::Reuse,
                Some("q") | None => return ExistingBlobAction::Abort,
                Some(other) => eprintln!("Invalid option '{other}'."),
            }
        }
    }

    fn delete_source(&self, blob_name: &str) -> bool {
        match self.delete_source {
            DeleteArg::Yes => true,
            DeleteArg::No => false,
            DeleteArg::Ask => matches!(
                Self::prompt(&format!(
                    "Do you want to delete the uploaded file {blob_name} from the bucket? (y/N): "
                ))
                .as_deref(),
                Some("y")
            ),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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

    // ── Build config and services ────────────────────────────────────────
    let mut builder = ExtractionConfig::builder()
        .bucket(cli.bucket.clone().unwrap_or_default())
        .language_hint(cli.language_hint.clone())
        .ocr_timeout(Duration::from_secs(cli.timeout))
        .poll_interval(Duration::from_secs(cli.poll_interval))
        .batch_size(cli.batch_size);
    if let Some(ref path) = cli.service_account_file {
        builder = builder.credentials_path(path);
    }
    if let Some(ref path) = cli.output {
        builder = builder.output_path(path);
    }
    let config = builder.build().context("Invalid configuration")?;

    let (store, ocr) = google_services(&config, cli.access_token.as_deref().unwrap_or(""))
        .context("Failed to initialise Google Cloud clients")?;

    let decisions = TerminalDecisions {
        on_existing: cli.on_existing,
        delete_source: cli.delete_source,
    };

    // ── Run extraction ───────────────────────────────────────────────────
    match extract(&cli.local_file_path, &config, &store, &ocr, &decisions).await {
        Ok(output) => {
            info!(
                "{} pages → {} ({}ms)",
                output.pages,
                output.output_path.display(),
                output.duration_ms
            );
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            info!("Operation cancelled.");
            Ok(())
        }
        Err(e) => {
            error!("{e}");
            Err(e).context("Extraction failed")
        }
    }
}
