//! CLI binary for mdslice.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ClientConfig` / `SliceConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use mdslice::input::document_stem;
use mdslice::section::{LabelMap, PageSplitter, DEFAULT_PAGE_MARKER};
use mdslice::{
    slice_batch, slice_file_with_labels, write_pages, BatchSummary, ClientConfig, ProgressCallback,
    RequestClient, SliceConfig, SliceProgressCallback, WrittenFiles,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch, one log line per
/// section written, missing or failed.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        bar.set_style(style);
        bar.set_prefix("Slicing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl SliceProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
    }

    fn on_document_start(&self, doc_num: usize, total_documents: usize) {
        self.bar
            .set_message(format!("classifying {doc_num}/{total_documents}"));
    }

    fn on_section_written(&self, _doc_num: usize, label: &str, bytes: usize) {
        self.bar.println(format!(
            "  {} {:<14} {}",
            green("✓"),
            label,
            dim(&format!("{bytes:>6} bytes"))
        ));
    }

    fn on_section_missing(&self, _doc_num: usize, label: &str, title: &str) {
        self.bar.println(format!(
            "  {} {:<14} {}",
            yellow("?"),
            label,
            dim(&format!("no heading matches '{title}'"))
        ));
    }

    fn on_section_failed(&self, _doc_num: usize, label: &str, error: &str) {
        self.bar.println(format!("  {} {:<14} {}", red("✗"), label, red(error)));
    }

    fn on_document_complete(&self, _doc_num: usize, _total: usize, _sections: usize) {
        self.bar.inc(1);
    }

    fn on_document_error(&self, doc_num: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg = match error.char_indices().nth(100) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };
        self.bar.println(format!(
            "  {} Document {}/{}  {}",
            red("✗"),
            doc_num,
            total,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _total: usize, _success_count: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r##"EXAMPLES:
  # Classify and slice papers into sections/
  mdslice split paper1.md paper2.md -o sections --config config.json

  # Slice with known headings, no model call
  mdslice extract paper.md -l "Methods=3 Proposed Approach" -l "Experiments=Evaluation"

  # Split a page-by-page conversion on its "# 页 N" markers
  mdslice pages deck.md -o pages

  # Send a prompt with inline images, print the answer
  mdslice ask prompt.md --config config.json

CONFIG FILE (config.json):
  { "api_key": "sk-...", "model": "gpt-4o", "base_url": "https://api.openai.com/v1" }

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY     API key (overrides the config file)
  MDSLICE_MODEL      Model ID
  MDSLICE_BASE_URL   OpenAI-compatible endpoint root
  RUST_LOG           Log filter, e.g. mdslice=debug
"##;

/// Slice Markdown papers into labelled sections.
#[derive(Parser, Debug)]
#[command(
    name = "mdslice",
    version,
    about = "Slice heading-structured Markdown into labelled sections",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MDSLICE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MDSLICE_QUIET")]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "MDSLICE_NO_PROGRESS")]
    no_progress: bool,

    /// Print a JSON report on stdout.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify each document's headings with the model, then write one file
    /// per labelled section.
    Split {
        /// Markdown documents.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory.
        #[arg(short, long, env = "MDSLICE_OUTPUT_DIR", default_value = "sections")]
        output_dir: PathBuf,

        /// Text file with a custom classification prompt.
        #[arg(long, env = "MDSLICE_PROMPT")]
        prompt: Option<PathBuf>,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Write labelled sections using headings given on the command line.
    Extract {
        /// Markdown document.
        input: PathBuf,

        /// `Label=Heading title`; repeatable.
        #[arg(short, long = "label", value_name = "LABEL=TITLE")]
        labels: Vec<String>,

        /// File of `Label: Heading title` lines.
        #[arg(long)]
        labels_file: Option<PathBuf>,

        /// Output directory.
        #[arg(short, long, env = "MDSLICE_OUTPUT_DIR", default_value = "sections")]
        output_dir: PathBuf,
    },

    /// Split documents on page-marker lines.
    Pages {
        /// Markdown documents.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Marker prefix; the page number follows it.
        #[arg(long, default_value = DEFAULT_PAGE_MARKER)]
        marker: String,

        /// Output directory.
        #[arg(short, long, env = "MDSLICE_OUTPUT_DIR", default_value = "pages")]
        output_dir: PathBuf,
    },

    /// Send a text file (with `![](path)` images inlined) and print the answer.
    Ask {
        /// Prompt file.
        input: PathBuf,

        /// Directory relative image paths resolve against.
        /// Default: the prompt file's directory.
        #[arg(long)]
        base_dir: Option<PathBuf>,

        #[command(flatten)]
        client: ClientArgs,
    },
}

#[derive(Args, Debug)]
struct ClientArgs {
    /// JSON config file with api_key, model and base_url.
    #[arg(long, env = "MDSLICE_CONFIG")]
    config: Option<PathBuf>,

    /// Model ID.
    #[arg(long, env = "MDSLICE_MODEL")]
    model: Option<String>,

    /// API key.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OpenAI-compatible endpoint root.
    #[arg(long, env = "MDSLICE_BASE_URL")]
    base_url: Option<String>,

    /// Total attempts per request.
    #[arg(long, env = "MDSLICE_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Base backoff in seconds; the wait after attempt n is n × this.
    #[arg(long, env = "MDSLICE_RETRY_BACKOFF", default_value_t = 5.0)]
    retry_backoff: f64,

    /// Max random jitter added to each backoff, in seconds.
    #[arg(long, env = "MDSLICE_MAX_JITTER", default_value_t = 0.0)]
    max_jitter: f64,

    /// Max output tokens.
    #[arg(long, env = "MDSLICE_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: u32,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "MDSLICE_TEMPERATURE", default_value_t = 1.0)]
    temperature: f32,

    /// Per-attempt timeout in seconds.
    #[arg(long, env = "MDSLICE_API_TIMEOUT", default_value_t = 1200)]
    api_timeout: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Suppress INFO-level library logs when the progress bar is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    match run(&cli, show_progress).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", red("error:"), e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the command ran but something failed.
async fn run(cli: &Cli, show_progress: bool) -> Result<bool> {
    match &cli.command {
        Command::Split {
            inputs,
            output_dir,
            prompt,
            client,
        } => {
            let client = build_client(client)?;
            let mut builder = SliceConfig::builder().output_dir(output_dir);
            if let Some(path) = prompt {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read prompt from {:?}", path))?;
                builder = builder.classify_prompt(text);
            }
            let config = builder.build().context("Invalid configuration")?;

            let progress: Option<ProgressCallback> = if show_progress {
                Some(CliProgressCallback::new() as Arc<dyn SliceProgressCallback>)
            } else {
                None
            };
            let summary = slice_batch(inputs.as_slice(), &client, &config, progress).await;
            print_summary(cli, &summary)?;
            Ok(summary.is_success())
        }

        Command::Extract {
            input,
            labels,
            labels_file,
            output_dir,
        } => {
            let labels = collect_labels(labels, labels_file.as_deref()).await?;
            let config = SliceConfig::builder()
                .output_dir(output_dir)
                .build()
                .context("Invalid configuration")?;

            let report = slice_file_with_labels(input, &labels, &config)
                .await
                .with_context(|| format!("Failed to slice {:?}", input))?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to serialise report")?
                );
            } else if !cli.quiet {
                for file in &report.files {
                    eprintln!("{} {:<14} → {}", green("✓"), file.label, file.path.display());
                }
                for missing in &report.missing {
                    eprintln!("{} {}", yellow("?"), missing);
                }
                for failure in &report.write_failures {
                    eprintln!("{} {:<14} {}", red("✗"), failure.label, failure.error);
                }
            }
            Ok(report.is_complete())
        }

        Command::Pages {
            inputs,
            marker,
            output_dir,
        } => {
            let splitter = PageSplitter::new(marker);
            let config = SliceConfig::builder()
                .output_dir(output_dir)
                .build()
                .context("Invalid configuration")?;

            let mut ok = true;
            for input in inputs {
                match split_one(input, &splitter, &config).await {
                    Ok(written) => {
                        for failure in &written.failed {
                            eprintln!(
                                "{} {}  {}",
                                red("✗"),
                                failure.path.display(),
                                failure.error
                            );
                        }
                        ok &= written.is_complete();
                        if !cli.quiet {
                            eprintln!(
                                "{} {}  {} page(s)",
                                green("✓"),
                                input.display(),
                                written.files.len()
                            );
                        }
                    }
                    Err(e) => {
                        ok = false;
                        eprintln!("{} {}  {:#}", red("✗"), input.display(), e);
                    }
                }
            }
            Ok(ok)
        }

        Command::Ask {
            input,
            base_dir,
            client,
        } => {
            let client = build_client(client)?;
            let document = mdslice::input::read_document(input).await?;
            let base = base_dir.as_deref().or_else(|| document.base_dir());

            let answer = client
                .send_text_with_images(&document.text, base)
                .await
                .context("Request failed")?;

            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(answer.as_bytes())
                .context("Failed to write to stdout")?;
            if !answer.ends_with('\n') {
                handle
                    .write_all(b"\n")
                    .context("Failed to write to stdout")?;
            }
            Ok(true)
        }
    }
}

/// Map CLI args to a `RequestClient`: config file first, flags override.
fn build_client(args: &ClientArgs) -> Result<RequestClient> {
    let mut builder = match args.config {
        Some(ref path) => ClientConfig::from_file(path)?,
        None => ClientConfig::builder(),
    };
    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref key) = args.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref url) = args.base_url {
        builder = builder.base_url(url);
    }

    let config = builder
        .max_retries(args.max_retries)
        .retry_backoff(seconds(args.retry_backoff, "--retry-backoff")?)
        .max_jitter(seconds(args.max_jitter, "--max-jitter")?)
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .api_timeout_secs(args.api_timeout)
        .build()
        .context("Invalid configuration")?;

    RequestClient::new(config).context("Failed to create request client")
}

fn seconds(value: f64, flag: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("Invalid {flag} value {value}"))
}

/// Merge `--labels-file` and `--label` pairs; command-line pairs win.
async fn collect_labels(pairs: &[String], file: Option<&Path>) -> Result<LabelMap> {
    let mut labels = match file {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read labels from {:?}", path))?;
            LabelMap::parse(&text)
        }
        None => LabelMap::new(),
    };

    for pair in pairs {
        let (label, title) = pair
            .split_once('=')
            .with_context(|| format!("Expected LABEL=TITLE, got '{pair}'"))?;
        let label = label.trim();
        if label.is_empty() {
            anyhow::bail!("Empty label in '{pair}'");
        }
        labels.insert(label, title.trim());
    }

    if labels.is_empty() {
        anyhow::bail!("No labels given; use --label or --labels-file");
    }
    Ok(labels)
}

async fn split_one(
    input: &Path,
    splitter: &PageSplitter,
    config: &SliceConfig,
) -> Result<WrittenFiles> {
    let document = mdslice::input::read_document(input).await?;
    let pages = splitter.split(&document.text);
    Ok(write_pages(&pages, &document_stem(input), splitter, config).await?)
}

fn print_summary(cli: &Cli, summary: &BatchSummary) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(summary).context("Failed to serialise summary")?
        );
        return Ok(());
    }
    if cli.quiet {
        return Ok(());
    }

    for failure in &summary.failures {
        eprintln!("{} {}  {}", red("✗"), failure.input.display(), failure.error);
    }
    for failure in summary.reports.iter().flat_map(|r| &r.write_failures) {
        eprintln!("{} {}  {}", red("✗"), failure.path.display(), failure.error);
    }
    eprintln!(
        "{}  {}/{} documents  {} section file(s)  {} missing  {} unwritten",
        if summary.is_success() {
            green("✔")
        } else {
            yellow("⚠")
        },
        summary.reports.len(),
        summary.documents(),
        bold(&summary.files_written().to_string()),
        summary.missing_sections(),
        summary.write_failures(),
    );
    Ok(())
}
