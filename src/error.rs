//! Error types for the edgequake-pdf-extract library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`]: **Fatal**: the extraction cannot proceed at all
//!   (bad input file, wrong password, unsupported OCR language, cancelled).
//!   Returned as `Err(ExtractError)` from the top-level `extract*` functions.
//!
//! * [`PageError`]: **Non-fatal**: a single page failed (unreadable content
//!   stream, render glitch, OCR crash) but all other pages are fine. Stored
//!   inside [`crate::output::PageResult`] so callers can inspect partial
//!   success rather than losing the whole document to one bad page.
//!
//! Whether a [`PageError`] stays non-fatal is decided by
//! [`crate::config::PageErrorPolicy`]: `Record` keeps it on the page,
//! `Abort` wraps it in [`ExtractError::Page`] and stops the extraction.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf-extract library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageResult`] rather than propagated here, unless the
/// caller asked for [`crate::config::PageErrorPolicy::Abort`].
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// An inline payload could not be decoded as base64.
    #[error("Invalid base64 payload: {reason}")]
    InvalidBase64 { reason: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but do not start with the `%PDF` header.
    #[error("Input is not a valid PDF ({origin})\nFirst bytes: {magic:?}")]
    NotAPdf { origin: String, magic: Vec<u8> },

    // ── Document errors ───────────────────────────────────────────────────
    /// The document could not be opened or parsed.
    #[error("Could not open PDF '{path}': {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    DocumentOpen { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// A page failed while [`crate::config::PageErrorPolicy::Abort`] was active.
    #[error("Extraction aborted: {0}")]
    Page(#[source] PageError),

    // ── Request validation ────────────────────────────────────────────────
    /// OCR language is not one of the supported Tesseract language packs.
    #[error("Unsupported OCR language '{language}'. Supported: {supported}")]
    UnsupportedLanguage { language: String, supported: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Lifecycle ─────────────────────────────────────────────────────────
    /// The caller cancelled the extraction.
    #[error("Extraction cancelled after {completed}/{total} pages")]
    Cancelled { completed: usize, total: usize },

    /// The configured deadline elapsed before all pages finished.
    #[error("Extraction exceeded its {secs}s deadline after {completed}/{total} pages")]
    DeadlineExceeded {
        secs: u64,
        completed: usize,
        total: usize,
    },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Place libpdfium next to the executable or in the working directory.\n\
  • Install pdfium system-wide so the dynamic loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Stored on [`crate::output::PageResult`] when a page fails under the
/// default `Record` policy. Image decode failures never show up here: a bad
/// embedded image is dropped from the page's image list instead.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageError {
    /// The page content (text layer or object list) could not be read.
    #[error("Page {page}: could not read page content: {detail}")]
    PageDecode { page: usize, detail: String },

    /// Rasterising the page for OCR failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    Render { page: usize, detail: String },

    /// The OCR engine failed on this page.
    #[error("Page {page}: OCR failed: {detail}")]
    Ocr { page: usize, detail: String },

    /// The worker thread panicked while processing this page.
    #[error("Page {page}: worker panicked: {detail}")]
    WorkerPanicked { page: usize, detail: String },
}

impl PageError {
    /// The 1-based page number this error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::PageDecode { page, .. }
            | PageError::Render { page, .. }
            | PageError::Ocr { page, .. }
            | PageError::WorkerPanicked { page, .. } => *page,
        }
    }
}
