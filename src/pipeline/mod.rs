//! Per-page processing stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ (backend: text │ images │ render) ──▶ ocr ──▶ normalize
//!                                     └─ encode (PNG/base64)
//! ```
//!
//! 1. [`input`]    : canonicalise a path, URL, byte buffer or base64 payload
//!    to a local, magic-checked PDF file
//! 2. [`encode`]   : PNG-encode decoded images; base64 for JSON output
//! 3. [`ocr`]      : recognise one rendered page (`tesseract` CLI)
//! 4. [`normalize`]: repair digit-run order in right-to-left text

pub mod encode;
pub mod input;
pub mod normalize;
pub mod ocr;
