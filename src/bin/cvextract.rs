//! CLI binary for cv-extract.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints per-document results.

use anyhow::{Context, Result};
use clap::Parser;
use cv_extract::config::{
    DEFAULT_GEMINI_BASE_URL, DEFAULT_INPUT_DIR, DEFAULT_MODEL, DEFAULT_OUTPUT_DIR,
    DEFAULT_PROMPT_FILE,
};
use cv_extract::{
    extract, process_all, BatchProgressCallback, BatchReport, ExtractionConfig, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ── Plain console reporter ───────────────────────────────────────────────────

/// One uncoloured line per event, for logs, pipes and cron jobs.
struct PlainReporter<W> {
    out: Mutex<W>,
}

impl PlainReporter<io::Stdout> {
    fn stdout() -> Self {
        Self {
            out: Mutex::new(io::stdout()),
        }
    }
}

impl<W: Write> PlainReporter<W> {
    fn line(&self, text: std::fmt::Arguments<'_>) {
        if let Ok(mut out) = self.out.lock() {
            // A closed pipe must not abort the batch.
            let _ = writeln!(out, "{text}");
            let _ = out.flush();
        }
    }
}

impl<W: Write + Send> BatchProgressCallback for PlainReporter<W> {
    fn on_batch_start(&self, input_dir: &Path, total_files: usize) {
        if total_files == 0 {
            self.line(format_args!("No files found in {} folder", input_dir.display()));
        } else {
            self.line(format_args!("Found {total_files} file(s) to process...\n"));
        }
    }

    fn on_document_start(&self, _index: usize, _total: usize, source: &Path) {
        self.line(format_args!("Processing: {}", file_name(source)));
    }

    fn on_document_complete(&self, _index: usize, _total: usize, output_path: &Path) {
        self.line(format_args!("✓ Saved to: {}\n", output_path.display()));
    }

    fn on_document_error(&self, _index: usize, _total: usize, error: &str) {
        self.line(format_args!("✗ Error: {error}\n"));
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live progress bar plus one ✓/✗ line per
/// document, printed above the bar.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the document currently in flight.
    started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose bar length is set by `on_batch_start`.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning input folder…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, input_dir: &Path, total_files: usize) {
        if total_files == 0 {
            self.bar.finish_and_clear();
            eprintln!(
                "{} No files found in {} folder",
                cyan("◆"),
                bold(&input_dir.display().to_string())
            );
            return;
        }
        self.activate_bar(total_files);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total_files} file(s) to process…"))
        ));
    }

    fn on_document_start(&self, _index: usize, _total: usize, source: &Path) {
        *self.started.lock().unwrap() = Some(Instant::now());
        self.bar.set_message(file_name(source));
    }

    fn on_document_complete(&self, index: usize, total: usize, output_path: &Path) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index,
            total,
            output_path.display(),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs();
        self.errors.fetch_add(1, Ordering::SeqCst);

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            red(error),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, succeeded: usize) {
        if total_files == 0 {
            return;
        }
        let failed = total_files.saturating_sub(succeeded);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} documents extracted successfully",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents extracted  ({} failed)",
                if failed == total_files {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&succeeded.to_string()),
                total_files,
                red(&self.errors.load(Ordering::SeqCst).to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract every CV in ./cv_inp into ./cv_out using ./prompt.txt
  cvextract

  # Custom folders and prompt
  cvextract -i resumes/ -o records/ -p prompts/cv_fields.txt

  # A single document, record printed to stdout
  cvextract --file resumes/jane_doe.pdf

  # Machine-readable batch summary
  cvextract --json > report.json

  # Another model or provider
  cvextract --model gemini-2.5-pro
  cvextract --provider openai --model gpt-4.1-mini

OUTPUT:
  For every regular file in the input folder, <stem>_extracted.json is written
  to the output folder (2-space indent, UTF-8). Existing files are overwritten.
  A document that fails is reported and skipped; the batch always finishes.

ENVIRONMENT VARIABLES (also read from ./.env):
  GEMINI_API_KEY          Gemini API key
  CV_INPUT_DIR            Input folder (default: cv_inp)
  CV_OUTPUT_DIR           Output folder (default: cv_out)
  CV_PROMPT_FILE          Prompt file (default: prompt.txt)
  CV_EXTRACT_MODEL        Model ID (default: gemini-2.0-flash)
  CV_EXTRACT_PROVIDER     Non-Gemini provider (openai, anthropic, ollama, …)
  GEMINI_API_BASE_URL     Gemini endpoint root, e.g. for a proxy
  OPENAI_API_KEY, ANTHROPIC_API_KEY, …  Keys for non-Gemini providers
"#;

/// Extract structured JSON from CV/resume PDFs and images with a multimodal LLM.
#[derive(Parser, Debug)]
#[command(
    name = "cvextract",
    version,
    about = "Extract structured JSON from CV/resume PDFs and images with a multimodal LLM",
    long_about = "Sends every document in the input folder, together with the instruction text \
in the prompt file, to a multimodal model and writes the JSON it answers with to \
<stem>_extracted.json in the output folder.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Folder holding the documents to process (created if absent).
    #[arg(short, long, env = "CV_INPUT_DIR", default_value = DEFAULT_INPUT_DIR)]
    input_dir: PathBuf,

    /// Folder receiving <stem>_extracted.json files (created if absent).
    #[arg(short, long, env = "CV_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Text file with the extraction instruction sent to the model.
    #[arg(short, long, env = "CV_PROMPT_FILE", default_value = DEFAULT_PROMPT_FILE)]
    prompt_file: PathBuf,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model ID.
    #[arg(short, long, env = "CV_EXTRACT_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Route requests through another provider: openai, anthropic, ollama, …
    #[arg(long, env = "CV_EXTRACT_PROVIDER")]
    provider: Option<String>,

    /// Gemini endpoint root.
    #[arg(long, env = "GEMINI_API_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    api_base_url: String,

    /// Per-request timeout in seconds (default: wait indefinitely).
    #[arg(long, env = "CV_EXTRACT_TIMEOUT",
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Extract a single document and print its record to stdout.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Print the batch report as JSON instead of per-file lines.
    #[arg(long)]
    json: bool,

    /// Print plain per-file lines instead of a progress bar
    /// (automatic when stderr is not a terminal).
    #[arg(long, env = "CV_EXTRACT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

/// How per-document progress reaches the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProgressDisplay {
    /// No per-document lines (`--quiet`, `--json`, `--file`).
    Silent,
    /// Live indicatif bar on an interactive stderr.
    Bar,
    /// Plain stdout lines.
    Plain,
}

/// Pick the display. The bar only draws on a terminal, so anything else
/// (pipes, redirects, cron) gets plain lines.
fn display_mode(cli: &Cli, stderr_is_terminal: bool) -> ProgressDisplay {
    if cli.quiet || cli.json || cli.file.is_some() {
        ProgressDisplay::Silent
    } else if cli.no_progress || !stderr_is_terminal {
        ProgressDisplay::Plain
    } else {
        ProgressDisplay::Bar
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal; real env vars always win.
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let display = display_mode(&cli, io::stderr().is_terminal());

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || cli.json || display == ProgressDisplay::Bar {
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
    let reporter: Option<ProgressCallback> = match display {
        ProgressDisplay::Silent => None,
        ProgressDisplay::Bar => {
            Some(CliProgressCallback::new_dynamic() as Arc<dyn BatchProgressCallback>)
        }
        ProgressDisplay::Plain => Some(Arc::new(PlainReporter::stdout())),
    };

    let config = build_config(&cli, reporter)?;

    // ── Single-document mode ─────────────────────────────────────────────
    if let Some(ref path) = cli.file {
        let output = extract(path, &config)
            .await
            .with_context(|| format!("Extraction failed for {}", path.display()))?;
        println!(
            "{}",
            serde_json::to_string_pretty(&output.record).context("Failed to serialise record")?
        );
        return Ok(());
    }

    // ── Batch mode ───────────────────────────────────────────────────────
    let report = process_all(&config).await.context("Batch failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if display == ProgressDisplay::Plain {
        print_summary(&report);
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .input_dir(&cli.input_dir)
        .output_dir(&cli.output_dir)
        .prompt_file(&cli.prompt_file)
        .model(&cli.model)
        .api_base_url(&cli.api_base_url);

    if let Some(ref key) = cli.api_key {
        if !key.trim().is_empty() {
            builder = builder.api_key(key);
        }
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Closing line for plain mode (the progress bar prints its own).
fn print_summary(report: &BatchReport) {
    if report.is_empty() {
        return;
    }
    println!(
        "Extracted {}/{} documents in {}ms",
        report.stats.succeeded, report.stats.total_files, report.stats.total_duration_ms
    );
    if report.stats.failed > 0 {
        println!("  {} documents failed", report.stats.failed);
    }
}
