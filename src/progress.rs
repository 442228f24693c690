//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the engine works through each chunk of pages.
//!
//! Events are fired from the engine's coordinating task, never from inside a
//! page worker, but pages within a chunk complete in arbitrary order, so
//! `on_page_complete` calls are not sorted by page number.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf_extract::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_number: usize, total_pages: usize, text_len: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{done}: page {page_number}/{total_pages} ({text_len} chars)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the extraction engine as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once after the page count is known, before any worker starts.
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before a chunk of pages is dispatched.
    ///
    /// # Arguments
    /// * `first_page` / `last_page`: 1-indexed, inclusive
    fn on_chunk_start(&self, first_page: usize, last_page: usize) {
        let _ = (first_page, last_page);
    }

    /// Called when a page finished without error.
    ///
    /// # Arguments
    /// * `page_number`: 1-indexed page number
    /// * `total_pages`: total pages in the document
    /// * `text_len`   : byte length of the page text (0 for image extraction)
    fn on_page_complete(&self, page_number: usize, total_pages: usize, text_len: usize) {
        let _ = (page_number, total_pages, text_len);
    }

    /// Called when a page failed.
    fn on_page_error(&self, page_number: usize, total_pages: usize, error: &str) {
        let _ = (page_number, total_pages, error);
    }

    /// Called once after every page has been attempted.
    fn on_extraction_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
