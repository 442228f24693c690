//! CLI binary for edgequake-pdf-extract.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, runs one extraction and prints JSON.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf_extract::pipeline::input::{resolve_input, DocumentInput};
use edgequake_pdf_extract::{
    write_json, CancellationToken, DocumentMetadata, ExtractionConfig, ExtractionOutput,
    ExtractionProgressCallback, Extractor, OcrMode, PageErrorPolicy, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar; pages inside a chunk finish out of order, so the
/// per-page lines are printed as they arrive.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} pages  {msg}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_length(total_pages as u64);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }

    fn on_chunk_start(&self, first_page: usize, last_page: usize) {
        self.bar
            .set_message(dim(&format!("pages {first_page}-{last_page}")));
    }

    fn on_page_complete(&self, page_number: usize, total_pages: usize, text_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_number,
            total_pages,
            dim(&format!("{text_len:>6} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_number: usize, total_pages: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_number,
            total_pages,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, total_pages: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!("{} {} pages extracted", green("✔"), bold(&success_count.to_string()));
        } else {
            eprintln!(
                "{} {}/{} pages extracted  ({} failed)",
                red("⚠"),
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Text of every page as JSON
  pdfx report.pdf

  # Scanned Persian document, OCR blank pages, Latin digits
  pdfx scan.pdf --ocr fallback --language fas --english-numbering

  # Embedded images, written to a file
  pdfx brochure.pdf --images -o images.json

  # Document from a URL, plain text only
  pdfx https://example.com/paper.pdf --text

  # Base64 payload from stdin
  base64 doc.pdf | pdfx - --base64

  # Metadata only
  pdfx report.pdf --inspect-only

ENVIRONMENT:
  PDFIUM_LIB_PATH    Explicit path to the pdfium shared library
  TESSERACT_CMD      tesseract executable (default: tesseract on PATH)
  RUST_LOG           Overrides the log filter
"#;

#[derive(Parser, Debug)]
#[command(
    name = "pdfx",
    version,
    about = "Extract text, images and metadata from PDF documents, page by page in parallel",
    after_help = AFTER_HELP
)]
struct Cli {
    /// PDF file path or HTTP(S) URL. With --base64: a file holding the
    /// payload, or `-` for stdin.
    input: String,

    /// Extract embedded images instead of text.
    #[arg(long, conflicts_with = "inspect_only")]
    images: bool,

    /// Print document metadata only.
    #[arg(long)]
    inspect_only: bool,

    /// Pages processed concurrently (chunk size).
    #[arg(short, long, env = "PDFX_WORKERS", default_value_t = 32,
          value_parser = clap::value_parser!(u64).range(1..))]
    workers: u64,

    /// Convert Arabic-Indic and Persian digits to 0-9.
    #[arg(long, env = "PDFX_ENGLISH_NUMBERING")]
    english_numbering: bool,

    /// OCR mode: disabled, fallback (blank pages only), forced.
    #[arg(long, env = "PDFX_OCR", default_value = "disabled")]
    ocr: OcrMode,

    /// OCR language: eng, spa, ara, fra, deu, fas (or the English name).
    #[arg(long, env = "PDFX_LANGUAGE", default_value = "fas")]
    language: String,

    /// OCR rendering DPI (72–600).
    #[arg(long, env = "PDFX_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Treat INPUT as base64-encoded PDF content.
    #[arg(long)]
    base64: bool,

    /// Abort on the first failed page instead of recording it.
    #[arg(long, env = "PDFX_FAIL_FAST")]
    fail_fast: bool,

    /// Overall deadline in seconds.
    #[arg(long, env = "PDFX_TIMEOUT")]
    timeout: Option<u64>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFX_DOWNLOAD_TIMEOUT", default_value_t = 30)]
    download_timeout: u64,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFX_PASSWORD")]
    password: Option<String>,

    /// Write output to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Plain text (pages separated by form feeds) instead of JSON.
    #[arg(long, conflicts_with = "images")]
    text: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFX_QUIET")]
    quiet: bool,

    /// Disable the progress bar.
    #[arg(long, env = "PDFX_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless -v is given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.inspect_only;
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
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress)?;

    // ── Resolve input ────────────────────────────────────────────────────
    let input = read_input(&cli)?;
    let resolved = resolve_input(&input, config.download_timeout_secs)
        .await
        .context("Failed to open input")?;
    let extractor = Extractor::pdfium(&config);

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = extractor
            .metadata(resolved.path())
            .await
            .context("Failed to inspect PDF")?;
        let rendered = if cli.text {
            metadata_table(&meta)
        } else {
            serde_json::to_string_pretty(&meta).context("Failed to serialise metadata")?
        };
        return emit(&cli, &rendered).await;
    }

    // ── Run extraction ───────────────────────────────────────────────────
    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let mut output = if cli.images {
        extractor
            .extract_images_with_cancel(resolved.path(), &config, &cancel)
            .await
    } else {
        extractor
            .extract_text_with_cancel(resolved.path(), &config, &cancel)
            .await
    }
    .context("Extraction failed")?;
    output.source = input.source_label().to_string();

    if cli.text {
        emit(&cli, &output.text()).await?;
    } else if let Some(ref path) = cli.output {
        write_json(&output, path).await?;
    } else {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        emit(&cli, &json).await?;
    }

    if !cli.quiet && !show_progress {
        print_summary(&output);
    }
    if let (Some(path), false) = (&cli.output, cli.quiet) {
        eprintln!("   →  {}", bold(&path.display().to_string()));
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .max_workers(cli.workers as usize)
        .english_numbering(cli.english_numbering)
        .ocr_mode(cli.ocr)
        .ocr_language(cli.language.as_str())
        .ocr_dpi(cli.dpi)
        .on_page_error(if cli.fail_fast {
            PageErrorPolicy::Abort
        } else {
            PageErrorPolicy::Record
        })
        .download_timeout_secs(cli.download_timeout);

    if let Some(secs) = cli.timeout {
        builder = builder.timeout_secs(secs);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.as_str());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Map the positional argument to a `DocumentInput`.
fn read_input(cli: &Cli) -> Result<DocumentInput> {
    if !cli.base64 {
        return Ok(DocumentInput::from(cli.input.as_str()));
    }
    let payload = if cli.input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read base64 from stdin")?;
        buf
    } else {
        std::fs::read_to_string(&cli.input)
            .with_context(|| format!("Failed to read base64 payload from '{}'", cli.input))?
    };
    Ok(DocumentInput::Base64(payload))
}

/// Write to `--output` if given, otherwise stdout.
async fn emit(cli: &Cli, content: &str) -> Result<()> {
    if let Some(ref path) = cli.output {
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        return Ok(());
    }
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    if !content.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

fn metadata_table(meta: &DocumentMetadata) -> String {
    let width = meta.iter().map(|(k, _)| k.len()).max().unwrap_or(0) + 1;
    meta.iter()
        .map(|(k, v)| format!("{:<width$} {}", format!("{k}:"), v, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_summary(output: &ExtractionOutput) {
    let stats = &output.stats;
    eprintln!(
        "Extracted {}/{} pages in {}ms",
        stats.extracted_pages, stats.total_pages, stats.duration_ms
    );
    if stats.ocr_pages > 0 {
        eprintln!("  {} pages via OCR", stats.ocr_pages);
    }
    if stats.image_count > 0 {
        eprintln!("  {} images", stats.image_count);
    }
    if stats.failed_pages > 0 {
        eprintln!("  {} pages failed", stats.failed_pages);
    }
}
