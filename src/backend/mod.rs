//! Document-access capability used by the page workers.
//!
//! [`PdfBackend`] is the seam between the extraction engine and the PDF
//! library. Every method takes the document *path* rather than a handle:
//! each call opens its own handle, does its work and drops the handle before
//! returning, so no handle ever crosses a task boundary. Independent
//! read-only opens of the same file are safe, which is what lets one page
//! per worker run in parallel without coordination.
//!
//! The production implementation is [`pdfium::PdfiumBackend`]; tests plug in
//! in-memory fakes.

pub mod pdfium;

use crate::error::{ExtractError, PageError};
use crate::output::{DocumentMetadata, ImageRecord};
use image::DynamicImage;
use std::path::Path;
use tracing::warn;

pub use pdfium::PdfiumBackend;

/// Read-only access to a PDF document, one short-lived handle per call.
///
/// Page indices are 0-based; errors carry 1-based page numbers.
pub trait PdfBackend: Send + Sync {
    /// Open the document and return its page count.
    ///
    /// Must fail with [`ExtractError::DocumentOpen`] (or a password error)
    /// when the path is not a readable, well-formed document.
    fn page_count(&self, path: &Path) -> Result<usize, ExtractError>;

    /// The page's embedded text layer, verbatim. An empty string is a valid
    /// result (scanned pages have no text layer).
    fn page_text(&self, path: &Path, index: usize) -> Result<String, PageError>;

    /// Every decodable raster object on the page.
    ///
    /// A single image that fails to decode is skipped; only a failure to
    /// read the page itself is an error.
    fn page_images(&self, path: &Path, index: usize) -> Result<Vec<ImageRecord>, PageError>;

    /// Rasterise exactly one page at `dpi`, capping either edge at `max_pixels`.
    fn render_page(
        &self,
        path: &Path,
        index: usize,
        dpi: u32,
        max_pixels: u32,
    ) -> Result<DynamicImage, PageError>;

    /// Document-level metadata, unmodified.
    fn metadata(&self, path: &Path) -> Result<DocumentMetadata, ExtractError>;
}

/// Keep the images that decoded, naming them `p{page}-img{n}` in object
/// order; each failure is logged and skipped.
pub(crate) fn collect_decodable(
    page_number: usize,
    attempts: impl IntoIterator<Item = Result<ImageRecord, String>>,
) -> Vec<ImageRecord> {
    let mut records = Vec::new();
    for attempt in attempts {
        match attempt {
            Ok(mut record) => {
                record.name = format!("p{}-img{}", page_number, records.len() + 1);
                records.push(record);
            }
            Err(detail) => {
                warn!("Page {}: skipping undecodable image: {}", page_number, detail);
            }
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::BoundingBox;

    fn record(width: u32) -> ImageRecord {
        ImageRecord {
            name: String::new(),
            width,
            height: 1,
            ext: "png".into(),
            size_bytes: 0,
            bits_per_component: 8,
            compression: "FlateDecode".into(),
            color_space: "DeviceRGB".into(),
            bbox: BoundingBox::default(),
            content: String::new(),
        }
    }

    #[test]
    fn undecodable_images_are_skipped() {
        let attempts = vec![
            Ok(record(10)),
            Err("JBIG2 globals missing".to_string()),
            Ok(record(30)),
        ];
        let images = collect_decodable(4, attempts);
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].name, "p4-img1");
        assert_eq!(images[1].name, "p4-img2");
        assert_eq!(images[1].width, 30);
    }

    #[test]
    fn all_failures_yield_empty_list() {
        let images = collect_decodable(1, vec![Err("bad".to_string()), Err("worse".to_string())]);
        assert!(images.is_empty());
    }
}
