//! Extraction entry points.
//!
//! [`Extractor`] binds a [`PdfBackend`] and an [`OcrEngine`] and runs the
//! engine over an already-local document; the free functions
//! ([`extract_text`], [`extract_images`], [`inspect`]) additionally resolve
//! a [`DocumentInput`] (path, URL, bytes or base64) and use pdfium plus
//! the `tesseract` CLI.

use crate::backend::{PdfBackend, PdfiumBackend};
use crate::config::ExtractionConfig;
use crate::engine::ExtractionEngine;
use crate::error::ExtractError;
use crate::output::{DocumentMetadata, ExtractionOutput, ExtractionStats};
use crate::pipeline::input::{self, DocumentInput};
use crate::pipeline::ocr::{OcrEngine, TesseractOcr};
use crate::worker::{self, ImageWorker, PageWorker};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runs extractions against one backend/OCR pair.
#[derive(Clone)]
pub struct Extractor {
    backend: Arc<dyn PdfBackend>,
    ocr: Arc<dyn OcrEngine>,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor").finish_non_exhaustive()
    }
}

impl Extractor {
    pub fn new(backend: Arc<dyn PdfBackend>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { backend, ocr }
    }

    /// pdfium for documents, `tesseract` for OCR; uses `config.password`.
    pub fn pdfium(config: &ExtractionConfig) -> Self {
        Self::new(
            Arc::new(PdfiumBackend::new(config.password.clone())),
            Arc::new(TesseractOcr::default()),
        )
    }

    /// Text of every page, via the text layer and/or OCR per `config.ocr_mode`.
    pub async fn extract_text(
        &self,
        path: &Path,
        config: &ExtractionConfig,
    ) -> Result<ExtractionOutput, ExtractError> {
        self.extract_text_with_cancel(path, config, &CancellationToken::new())
            .await
    }

    pub async fn extract_text_with_cancel(
        &self,
        path: &Path,
        config: &ExtractionConfig,
        cancel: &CancellationToken,
    ) -> Result<ExtractionOutput, ExtractError> {
        let worker = worker::text_worker(Arc::clone(&self.backend), Arc::clone(&self.ocr), config);
        self.run(path, worker, config, cancel).await
    }

    /// Embedded images of every page.
    pub async fn extract_images(
        &self,
        path: &Path,
        config: &ExtractionConfig,
    ) -> Result<ExtractionOutput, ExtractError> {
        self.extract_images_with_cancel(path, config, &CancellationToken::new())
            .await
    }

    pub async fn extract_images_with_cancel(
        &self,
        path: &Path,
        config: &ExtractionConfig,
        cancel: &CancellationToken,
    ) -> Result<ExtractionOutput, ExtractError> {
        let worker: Arc<dyn PageWorker> = Arc::new(ImageWorker::new(Arc::clone(&self.backend)));
        self.run(path, worker, config, cancel).await
    }

    /// Document metadata, read independently of any page work.
    pub async fn metadata(&self, path: &Path) -> Result<DocumentMetadata, ExtractError> {
        let backend = Arc::clone(&self.backend);
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || backend.metadata(&path))
            .await
            .map_err(|e| ExtractError::Internal(format!("metadata task failed: {}", e)))?
    }

    async fn run(
        &self,
        path: &Path,
        worker: Arc<dyn PageWorker>,
        config: &ExtractionConfig,
        cancel: &CancellationToken,
    ) -> Result<ExtractionOutput, ExtractError> {
        let start = Instant::now();

        // ── Step 1: Open document ────────────────────────────────────────
        let engine = ExtractionEngine::open(path, Arc::clone(&self.backend)).await?;

        // ── Step 2: Metadata (best effort) ───────────────────────────────
        let metadata = match self.metadata(path).await {
            Ok(m) => m,
            Err(e) => {
                warn!("Metadata unavailable for {}: {}", path.display(), e);
                DocumentMetadata::new()
            }
        };

        // ── Step 3: Pages ────────────────────────────────────────────────
        let pages = engine.run(worker, config, cancel).await?;

        // ── Step 4: Stats ────────────────────────────────────────────────
        let stats = ExtractionStats::from_pages(&pages, start.elapsed().as_millis() as u64);
        info!(
            "Done: {}/{} pages in {}ms ({} via OCR, {} images)",
            stats.extracted_pages,
            stats.total_pages,
            stats.duration_ms,
            stats.ocr_pages,
            stats.image_count
        );

        Ok(ExtractionOutput {
            source: "file".to_string(),
            metadata,
            pages,
            stats,
        })
    }
}

/// Extract the text of a PDF given as a path, URL, bytes or base64.
///
/// ```rust,no_run
/// use edgequake_pdf_extract::{extract_text, ExtractionConfig, OcrMode};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractionConfig::builder()
///     .ocr_mode(OcrMode::Fallback)
///     .ocr_language("fas")
///     .english_numbering(true)
///     .build()?;
/// let output = extract_text("scan.pdf", &config).await?;
/// println!("{}", output.text());
/// # Ok(())
/// # }
/// ```
pub async fn extract_text(
    input: impl Into<DocumentInput>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let input = input.into();
    let resolved = input::resolve_input(&input, config.download_timeout_secs).await?;
    let mut output = Extractor::pdfium(config)
        .extract_text(resolved.path(), config)
        .await?;
    output.source = input.source_label().to_string();
    Ok(output)
}

/// Extract every embedded image of a PDF given as a path, URL, bytes or base64.
pub async fn extract_images(
    input: impl Into<DocumentInput>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let input = input.into();
    let resolved = input::resolve_input(&input, config.download_timeout_secs).await?;
    let mut output = Extractor::pdfium(config)
        .extract_images(resolved.path(), config)
        .await?;
    output.source = input.source_label().to_string();
    Ok(output)
}

/// Read document metadata without touching page content.
pub async fn inspect(input: impl Into<DocumentInput>) -> Result<DocumentMetadata, ExtractError> {
    let config = ExtractionConfig::default();
    let resolved = input::resolve_input(&input.into(), config.download_timeout_secs).await?;
    Extractor::pdfium(&config).metadata(resolved.path()).await
}

/// Synchronous wrapper around [`extract_text`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_text_sync(
    input: impl Into<DocumentInput>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_text(input, config))
}

/// Write `output` as pretty JSON, atomically (temp file, then rename).
pub async fn write_json(output: &ExtractionOutput, path: &Path) -> Result<(), ExtractError> {
    let write_err = |source: std::io::Error| ExtractError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_vec_pretty(output)
        .map_err(|e| ExtractError::Internal(format!("JSON serialisation failed: {}", e)))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &json).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}
