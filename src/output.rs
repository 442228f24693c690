//! Result types returned by the extraction entry points.
//!
//! Everything here is plain serialisable data: a [`PageResult`] is created by
//! one page worker and never mutated afterwards, and an
//! [`ExtractionOutput`] is what the `pdfx` CLI prints as JSON.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which path produced a page's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    TextLayer,
    Ocr,
}

/// The result for a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_number: usize,
    /// Normalised page text; absent for image extraction and failed pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Embedded images in object order; absent for text extraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_source: Option<TextSource>,
    /// Set when the page failed and the engine recorded the failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PageError>,
}

impl PageResult {
    /// A text page for the 0-based `index`.
    pub fn text(index: usize, text: String, source: TextSource) -> Self {
        Self {
            page_number: index + 1,
            text: Some(text),
            images: None,
            text_source: Some(source),
            error: None,
        }
    }

    /// An image page for the 0-based `index`.
    pub fn images(index: usize, images: Vec<ImageRecord>) -> Self {
        Self {
            page_number: index + 1,
            text: None,
            images: Some(images),
            text_source: None,
            error: None,
        }
    }

    /// A failed page for the 0-based `index`.
    pub fn failed(index: usize, error: PageError) -> Self {
        Self {
            page_number: index + 1,
            text: None,
            images: None,
            text_source: None,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Bounding box of an image on its page, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// One embedded raster object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Stable per-document name, e.g. `p3-img1`.
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// File extension of `content`: `jpg`/`jp2` for passed-through JPEG streams, else `png`.
    pub ext: String,
    /// Length of the decoded `content` bytes.
    pub size_bytes: usize,
    pub bits_per_component: u8,
    /// PDF stream filters applied to the source object, e.g. `DCTDecode`.
    pub compression: String,
    pub color_space: String,
    pub bbox: BoundingBox,
    /// Base64 (standard alphabet) encoded image bytes.
    pub content: String,
}

/// Document-level metadata, copied verbatim from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentMetadata(pub BTreeMap<String, String>);

impl DocumentMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `page_count` entry, when the backend provided one.
    pub fn page_count(&self) -> Option<usize> {
        self.get("page_count").and_then(|v| v.parse().ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

/// Aggregate numbers for one extraction call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub total_pages: usize,
    pub extracted_pages: usize,
    pub failed_pages: usize,
    /// Pages whose text came from OCR.
    pub ocr_pages: usize,
    pub image_count: usize,
    pub duration_ms: u64,
}

impl ExtractionStats {
    pub(crate) fn from_pages(pages: &[PageResult], duration_ms: u64) -> Self {
        Self {
            total_pages: pages.len(),
            extracted_pages: pages.iter().filter(|p| p.is_ok()).count(),
            failed_pages: pages.iter().filter(|p| !p.is_ok()).count(),
            ocr_pages: pages
                .iter()
                .filter(|p| p.text_source == Some(TextSource::Ocr))
                .count(),
            image_count: pages
                .iter()
                .filter_map(|p| p.images.as_ref())
                .map(Vec::len)
                .sum(),
            duration_ms,
        }
    }
}

/// Full output of an extraction call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// How the document reached us: `file`, `url`, `bytes` or `base64 input`.
    pub source: String,
    pub metadata: DocumentMetadata,
    /// One entry per page, sorted by `page_number`.
    pub pages: Vec<PageResult>,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// Page texts joined with form feeds, in page order.
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n\u{000C}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_omitted() {
        let page = PageResult::text(0, "hello".into(), TextSource::TextLayer);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["page_number"], 1);
        assert_eq!(json["text"], "hello");
        assert!(json.get("images").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn empty_image_list_is_serialised() {
        let page = PageResult::images(4, vec![]);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["page_number"], 5);
        assert_eq!(json["images"], serde_json::json!([]));
        assert!(json.get("text").is_none());
    }

    #[test]
    fn metadata_is_a_flat_map() {
        let mut meta = DocumentMetadata::new();
        meta.insert("title", "Report");
        meta.insert("page_count", "12");
        assert_eq!(meta.page_count(), Some(12));
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["title"], "Report");
    }

    #[test]
    fn stats_count_failures_and_ocr() {
        let pages = vec![
            PageResult::text(0, "a".into(), TextSource::TextLayer),
            PageResult::text(1, "b".into(), TextSource::Ocr),
            PageResult::failed(
                2,
                PageError::PageDecode {
                    page: 3,
                    detail: "x".into(),
                },
            ),
        ];
        let stats = ExtractionStats::from_pages(&pages, 5);
        assert_eq!(stats.total_pages, 3);
        assert_eq!(stats.extracted_pages, 2);
        assert_eq!(stats.failed_pages, 1);
        assert_eq!(stats.ocr_pages, 1);
    }
}
