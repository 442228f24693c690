//! Configuration types for PDF extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. One struct per request keeps the
//! request immutable for the duration of an extraction call and trivial to
//! share with every page worker.
//!
//! Request validation (worker count, DPI range, OCR language) happens in
//! [`ExtractionConfigBuilder::build`], so an invalid request is rejected
//! before the document is opened or any worker is scheduled.

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Configuration for one extraction request.
///
/// # Example
/// ```rust
/// use edgequake_pdf_extract::{ExtractionConfig, OcrMode};
///
/// let config = ExtractionConfig::builder()
///     .max_workers(8)
///     .english_numbering(true)
///     .ocr_mode(OcrMode::Fallback)
///     .ocr_language("ara")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_workers, 8);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Upper bound on pages processed at once. Default: 32.
    ///
    /// Every in-flight page holds its own open document handle (and, for OCR,
    /// a rendered bitmap plus a recogniser process), so this is the knob for
    /// peak memory and file-descriptor usage.
    pub max_workers: usize,

    /// Transliterate Arabic-Indic and Persian digits to Latin digits. Default: false.
    pub english_numbering: bool,

    /// When to run OCR instead of (or after) reading the text layer. Default: disabled.
    pub ocr_mode: OcrMode,

    /// Recognition language for OCR. Default: Farsi.
    pub ocr_language: OcrLanguage,

    /// Rendering DPI for pages sent to OCR. Range: 72–600. Default: 200.
    pub ocr_dpi: u32,

    /// Cap on either edge of a rendered page, in pixels. Default: 4000.
    ///
    /// A large-format page at 200 DPI can exceed 10 000 px per side; this
    /// keeps the per-worker bitmap bounded regardless of page size.
    pub max_rendered_pixels: u32,

    /// What to do when a single page fails. Default: record and continue.
    pub on_page_error: PageErrorPolicy,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 30.
    pub download_timeout_secs: u64,

    /// Overall deadline for page extraction in seconds. Default: none.
    pub timeout_secs: Option<u64>,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_workers: 32,
            english_numbering: false,
            ocr_mode: OcrMode::default(),
            ocr_language: OcrLanguage::default(),
            ocr_dpi: 200,
            max_rendered_pixels: 4000,
            on_page_error: PageErrorPolicy::default(),
            password: None,
            download_timeout_secs: 30,
            timeout_secs: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("max_workers", &self.max_workers)
            .field("english_numbering", &self.english_numbering)
            .field("ocr_mode", &self.ocr_mode)
            .field("ocr_language", &self.ocr_language)
            .field("ocr_dpi", &self.ocr_dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("on_page_error", &self.on_page_error)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("timeout_secs", &self.timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
            language: None,
        }
    }
}

/// Builder for [`ExtractionConfig`].
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
    /// Raw language string, parsed in `build()` so an unsupported value
    /// surfaces as a validation error.
    language: Option<String>,
}

impl fmt::Debug for ExtractionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfigBuilder")
            .field("config", &self.config)
            .field("language", &self.language)
            .finish()
    }
}

impl ExtractionConfigBuilder {
    /// Set the worker bound. Zero is rejected by `build()`.
    pub fn max_workers(mut self, n: usize) -> Self {
        self.config.max_workers = n;
        self
    }

    pub fn english_numbering(mut self, v: bool) -> Self {
        self.config.english_numbering = v;
        self
    }

    pub fn ocr_mode(mut self, mode: OcrMode) -> Self {
        self.config.ocr_mode = mode;
        self
    }

    /// Language code (`fas`) or English name (`Farsi`); validated in `build()`.
    pub fn ocr_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn ocr_dpi(mut self, dpi: u32) -> Self {
        self.config.ocr_dpi = dpi;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn on_page_error(mut self, policy: PageErrorPolicy) -> Self {
        self.config.on_page_error = policy;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = Some(secs);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ExtractionConfig, ExtractError> {
        if let Some(ref raw) = self.language {
            self.config.ocr_language = raw.parse()?;
        }
        let c = &self.config;
        if c.max_workers == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_workers must be ≥ 1".into(),
            ));
        }
        if c.ocr_dpi < 72 || c.ocr_dpi > 600 {
            return Err(ExtractError::InvalidConfig(format!(
                "OCR DPI must be 72–600, got {}",
                c.ocr_dpi
            )));
        }
        if c.timeout_secs == Some(0) {
            return Err(ExtractError::InvalidConfig(
                "timeout must be at least one second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// When the OCR backend recognises a rendered page instead of trusting the
/// embedded text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrMode {
    /// Text layer only; OCR never runs. (default)
    #[default]
    Disabled,
    /// OCR only pages whose text layer is empty (typical for scans).
    Fallback,
    /// OCR every page, ignoring the text layer.
    Forced,
}

impl FromStr for OcrMode {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "off" | "none" => Ok(OcrMode::Disabled),
            "fallback" | "auto" => Ok(OcrMode::Fallback),
            "forced" | "force" | "always" => Ok(OcrMode::Forced),
            other => Err(ExtractError::InvalidConfig(format!(
                "unknown OCR mode '{other}' (expected disabled, fallback or forced)"
            ))),
        }
    }
}

/// OCR recognition languages with an installed Tesseract language pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OcrLanguage {
    #[serde(rename = "eng")]
    English,
    #[serde(rename = "spa")]
    Spanish,
    #[serde(rename = "ara")]
    Arabic,
    #[serde(rename = "fra")]
    French,
    #[serde(rename = "deu")]
    German,
    #[default]
    #[serde(rename = "fas")]
    Farsi,
}

impl OcrLanguage {
    pub const ALL: [OcrLanguage; 6] = [
        OcrLanguage::English,
        OcrLanguage::Spanish,
        OcrLanguage::Arabic,
        OcrLanguage::French,
        OcrLanguage::German,
        OcrLanguage::Farsi,
    ];

    /// Tesseract language code, e.g. `fas`.
    pub fn code(self) -> &'static str {
        match self {
            OcrLanguage::English => "eng",
            OcrLanguage::Spanish => "spa",
            OcrLanguage::Arabic => "ara",
            OcrLanguage::French => "fra",
            OcrLanguage::German => "deu",
            OcrLanguage::Farsi => "fas",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OcrLanguage::English => "English",
            OcrLanguage::Spanish => "Spanish",
            OcrLanguage::Arabic => "Arabic",
            OcrLanguage::French => "French",
            OcrLanguage::German => "German",
            OcrLanguage::Farsi => "Farsi",
        }
    }
}

impl fmt::Display for OcrLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for OcrLanguage {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OcrLanguage::ALL
            .into_iter()
            .find(|lang| {
                lang.code().eq_ignore_ascii_case(wanted) || lang.name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ExtractError::UnsupportedLanguage {
                language: wanted.to_string(),
                supported: OcrLanguage::ALL
                    .iter()
                    .map(|l| l.code())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// How the engine reacts when one page fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageErrorPolicy {
    /// Keep the failure on that page's result and continue. (default)
    #[default]
    Record,
    /// Abort the whole extraction on the first failed page; no partial output.
    Abort,
}
