//! Page workers: the per-page units of work the engine schedules.
//!
//! A [`PageWorker`] extracts exactly one page and returns a self-contained
//! [`PageResult`]. Workers run on tokio's blocking pool, one page per task,
//! and share nothing mutable: each call goes through the [`PdfBackend`],
//! which opens its own document handle for the duration of the call.

use crate::backend::PdfBackend;
use crate::config::{ExtractionConfig, OcrLanguage, OcrMode};
use crate::error::PageError;
use crate::output::{PageResult, TextSource};
use crate::pipeline::normalize::normalize;
use crate::pipeline::ocr::OcrEngine;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Extracts one page of a document.
pub trait PageWorker: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Extract the page at 0-based `index`.
    fn extract_page(&self, path: &Path, index: usize) -> Result<PageResult, PageError>;
}

// ── Text layer ──────────────────────────────────────────────────────────────

/// Reads the embedded text layer and normalises digit runs.
pub struct TextLayerWorker {
    backend: Arc<dyn PdfBackend>,
    english_numbering: bool,
}

impl TextLayerWorker {
    pub fn new(backend: Arc<dyn PdfBackend>, english_numbering: bool) -> Self {
        Self {
            backend,
            english_numbering,
        }
    }
}

impl PageWorker for TextLayerWorker {
    fn name(&self) -> &'static str {
        "text-layer"
    }

    fn extract_page(&self, path: &Path, index: usize) -> Result<PageResult, PageError> {
        let raw = self.backend.page_text(path, index)?;
        let text = normalize(&raw, self.english_numbering);
        Ok(PageResult::text(index, text, TextSource::TextLayer))
    }
}

// ── Images ──────────────────────────────────────────────────────────────────

/// Collects every decodable embedded image on the page.
pub struct ImageWorker {
    backend: Arc<dyn PdfBackend>,
}

impl ImageWorker {
    pub fn new(backend: Arc<dyn PdfBackend>) -> Self {
        Self { backend }
    }
}

impl PageWorker for ImageWorker {
    fn name(&self) -> &'static str {
        "images"
    }

    fn extract_page(&self, path: &Path, index: usize) -> Result<PageResult, PageError> {
        let images = self.backend.page_images(path, index)?;
        Ok(PageResult::images(index, images))
    }
}

// ── OCR ─────────────────────────────────────────────────────────────────────

/// Text extraction that falls back to (or always uses) OCR.
///
/// | mode       | text layer | OCR                           |
/// |------------|------------|-------------------------------|
/// | `disabled` | yes        | never                         |
/// | `fallback` | yes        | when the layer is blank       |
/// | `forced`   | no         | always                        |
pub struct OcrWorker {
    backend: Arc<dyn PdfBackend>,
    ocr: Arc<dyn OcrEngine>,
    mode: OcrMode,
    language: OcrLanguage,
    english_numbering: bool,
    dpi: u32,
    max_pixels: u32,
}

impl OcrWorker {
    pub fn new(backend: Arc<dyn PdfBackend>, ocr: Arc<dyn OcrEngine>, config: &ExtractionConfig) -> Self {
        Self {
            backend,
            ocr,
            mode: config.ocr_mode,
            language: config.ocr_language,
            english_numbering: config.english_numbering,
            dpi: config.ocr_dpi,
            max_pixels: config.max_rendered_pixels,
        }
    }

    fn recognise(&self, path: &Path, index: usize) -> Result<PageResult, PageError> {
        let image = self
            .backend
            .render_page(path, index, self.dpi, self.max_pixels)?;
        let raw = self
            .ocr
            .recognize(&image, self.language)
            .map_err(|e| PageError::Ocr {
                page: index + 1,
                detail: e.to_string(),
            })?;
        let text = normalize(&raw, self.english_numbering);
        Ok(PageResult::text(index, text, TextSource::Ocr))
    }
}

impl PageWorker for OcrWorker {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn extract_page(&self, path: &Path, index: usize) -> Result<PageResult, PageError> {
        match self.mode {
            OcrMode::Forced => self.recognise(path, index),
            OcrMode::Disabled | OcrMode::Fallback => {
                let raw = self.backend.page_text(path, index)?;
                if self.mode == OcrMode::Fallback && raw.trim().is_empty() {
                    debug!("Page {}: empty text layer, running OCR", index + 1);
                    return self.recognise(path, index);
                }
                let text = normalize(&raw, self.english_numbering);
                Ok(PageResult::text(index, text, TextSource::TextLayer))
            }
        }
    }
}

/// Pick the worker for a text extraction under `config`.
pub fn text_worker(
    backend: Arc<dyn PdfBackend>,
    ocr: Arc<dyn OcrEngine>,
    config: &ExtractionConfig,
) -> Arc<dyn PageWorker> {
    match config.ocr_mode {
        OcrMode::Disabled => Arc::new(TextLayerWorker::new(backend, config.english_numbering)),
        OcrMode::Fallback | OcrMode::Forced => Arc::new(OcrWorker::new(backend, ocr, config)),
    }
}
