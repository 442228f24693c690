//! End-to-end integration tests for edgequake-pdf-extract.
//!
//! These tests use real PDF files in `./test_cases/`, the pdfium shared
//! library and (for the OCR tests) a local `tesseract`. They are gated
//! behind the `E2E_ENABLED` environment variable so they do not run in CI
//! unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=./libpdfium.so cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_inspect -- --nocapture

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_pdf_extract::{
    extract_images, extract_text, inspect, DocumentInput, ExtractError, ExtractionConfig,
    OcrMode, TesseractOcr, TextSource,
};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

// ── Inspect ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_inspect_sample() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));

    let meta = inspect(path.as_path()).await.expect("inspect should succeed");
    println!("{}", serde_json::to_string_pretty(&meta).unwrap());

    assert!(meta.page_count().unwrap_or(0) > 0, "page_count must be positive");
    assert!(meta.get("format").is_some(), "format must be present");
}

#[tokio::test]
async fn test_inspect_nonexistent() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let err = inspect("/no/such/file.pdf").await.unwrap_err();
    assert!(matches!(err, ExtractError::FileNotFound { .. }), "got {err:?}");
}

// ── Text ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_extract_text_sample() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));

    let config = ExtractionConfig::builder().max_workers(4).build().unwrap();
    let output = extract_text(path.as_path(), &config)
        .await
        .expect("extraction should succeed");

    let total = output.metadata.page_count().expect("page_count in metadata");
    assert_eq!(output.pages.len(), total);
    assert_eq!(output.source, "file");
    assert!(output.pages.iter().all(|p| p.is_ok()));
    assert!(
        output.pages.iter().any(|p| !p.text.as_deref().unwrap_or("").trim().is_empty()),
        "at least one page must carry text"
    );
    println!("{}", output.text());
}

#[tokio::test]
async fn test_worker_count_does_not_change_text() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));

    let mut texts = Vec::new();
    for workers in [1, 3, 64] {
        let config = ExtractionConfig::builder().max_workers(workers).build().unwrap();
        let output = extract_text(path.as_path(), &config).await.unwrap();
        texts.push(serde_json::to_string(&output.pages).unwrap());
    }
    assert_eq!(texts[0], texts[1]);
    assert_eq!(texts[1], texts[2]);
}

#[tokio::test]
async fn test_extract_text_from_base64() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));

    let encoded = STANDARD.encode(std::fs::read(&path).unwrap());
    let output = extract_text(DocumentInput::Base64(encoded), &ExtractionConfig::default())
        .await
        .expect("base64 extraction should succeed");
    assert_eq!(output.source, "base64 input");
    assert!(!output.pages.is_empty());
}

#[tokio::test]
async fn test_persian_digits_english_numbering() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("persian.pdf"));

    let config = ExtractionConfig::builder()
        .english_numbering(true)
        .build()
        .unwrap();
    let output = extract_text(path.as_path(), &config).await.unwrap();
    let text = output.text();
    assert!(
        !text.chars().any(|c| matches!(c, '\u{0660}'..='\u{0669}' | '\u{06F0}'..='\u{06F9}')),
        "no Arabic-Indic or Persian digits may survive english_numbering"
    );
}

// ── OCR ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ocr_fallback_on_scanned_pdf() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("scanned.pdf"));
    if !TesseractOcr::default().is_available() {
        println!("SKIP — tesseract not installed");
        return;
    }

    let config = ExtractionConfig::builder()
        .ocr_mode(OcrMode::Fallback)
        .ocr_language("eng")
        .max_workers(2)
        .build()
        .unwrap();
    let output = extract_text(path.as_path(), &config).await.unwrap();

    assert!(output.stats.ocr_pages > 0, "scanned pages must go through OCR");
    assert!(output
        .pages
        .iter()
        .filter(|p| p.text_source == Some(TextSource::Ocr))
        .all(|p| p.text.is_some()));
}

// ── Images ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_extract_images_sample() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));

    let output = extract_images(path.as_path(), &ExtractionConfig::default())
        .await
        .expect("image extraction should succeed");

    for page in &output.pages {
        let images = page.images.as_ref().expect("image pages carry a list");
        for img in images {
            let bytes = STANDARD.decode(&img.content).expect("valid base64");
            match img.ext.as_str() {
                "png" => assert!(bytes.starts_with(b"\x89PNG")),
                "jpg" => assert!(bytes.starts_with(b"\xFF\xD8")),
                "jp2" => assert_eq!(img.compression, "JPXDecode"),
                other => panic!("unexpected image extension {other}"),
            }
            assert!(img.bits_per_component > 0, "{} has no bit depth", img.name);
            assert_eq!(bytes.len(), img.size_bytes);
            assert!(img.width > 0 && img.height > 0);
        }
    }
    println!("{} images", output.stats.image_count);
}

// ── Input validation ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_not_a_pdf_is_rejected() {
    let err = extract_text(b"GIF89a....".to_vec(), &ExtractionConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::NotAPdf { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_invalid_base64_is_rejected() {
    let err = extract_text(
        DocumentInput::Base64("@@not-base64@@".into()),
        &ExtractionConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ExtractError::InvalidBase64 { .. }), "got {err:?}");
}
