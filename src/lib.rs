//! # edgequake-pdf-extract
//!
//! Page-parallel text and image extraction from PDF documents, with OCR for
//! scanned pages and digit-order repair for right-to-left text.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     path, URL, bytes or base64 → local file (%PDF checked)
//!  ├─ 2. Open      page count via pdfium (spawn_blocking)
//!  ├─ 3. Metadata  document info dictionary, best effort
//!  ├─ 4. Pages     chunks of `max_workers` blocking tasks, one per page
//!  │               text layer │ embedded images │ render + OCR
//!  ├─ 5. Normalise reverse Arabic-Indic/Persian digit runs, optional Latin digits
//!  └─ 6. Output    pages sorted by number + stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf_extract::{extract_text, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder().max_workers(8).build()?;
//!     let output = extract_text("document.pdf", &config).await?;
//!     for page in &output.pages {
//!         println!("--- page {} ---", page.page_number);
//!         println!("{}", page.text.as_deref().unwrap_or(""));
//!     }
//!     eprintln!("{} pages, {} failed", output.stats.total_pages, output.stats.failed_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfx` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf-extract = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime Requirements
//!
//! - the pdfium shared library (`PDFIUM_LIB_PATH`, the working directory,
//!   or the system library path)
//! - `tesseract` with the needed language packs, only when OCR is enabled

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod worker;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{PdfBackend, PdfiumBackend};
pub use config::{
    ExtractionConfig, ExtractionConfigBuilder, OcrLanguage, OcrMode, PageErrorPolicy,
};
pub use engine::ExtractionEngine;
pub use error::{ExtractError, PageError};
pub use extract::{
    extract_images, extract_text, extract_text_sync, inspect, write_json, Extractor,
};
pub use output::{
    BoundingBox, DocumentMetadata, ExtractionOutput, ExtractionStats, ImageRecord, PageResult,
    TextSource,
};
pub use pipeline::input::DocumentInput;
pub use pipeline::normalize::normalize;
pub use pipeline::ocr::{OcrEngine, OcrError, TesseractOcr};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use tokio_util::sync::CancellationToken;
pub use worker::{ImageWorker, OcrWorker, PageWorker, TextLayerWorker};
