//! Optical character recognition for rendered pages.
//!
//! [`OcrEngine`] is the seam the OCR worker calls with one rasterised page
//! at a time. The production engine, [`TesseractOcr`], shells out to the
//! `tesseract` CLI: the page is written as a PNG into a scratch file and
//! the recognised text is read back from stdout. Each call owns its scratch
//! file, so concurrent workers never share state.

use crate::config::OcrLanguage;
use crate::pipeline::encode;
use image::DynamicImage;
use std::io::Write;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// Failure to recognise one page.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("could not prepare page image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("scratch file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not run '{command}': {reason}\nIs tesseract installed and on PATH?")]
    Spawn { command: String, reason: String },

    #[error("'{command}' exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Recognises the text of a single rendered page.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &DynamicImage, language: OcrLanguage) -> Result<String, OcrError>;
}

/// `tesseract` command-line engine.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    command: String,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self {
            command: std::env::var("TESSERACT_CMD").unwrap_or_else(|_| "tesseract".to_string()),
        }
    }
}

impl TesseractOcr {
    /// Use an explicit executable instead of `tesseract` on `PATH`.
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Whether the executable can be launched at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &DynamicImage, language: OcrLanguage) -> Result<String, OcrError> {
        let png = encode::encode_png(image)?;
        let mut scratch = tempfile::Builder::new()
            .prefix("pdfx-ocr-")
            .suffix(".png")
            .tempfile()?;
        scratch.write_all(&png)?;
        scratch.flush()?;

        let output = Command::new(&self.command)
            .arg(scratch.path())
            .arg("stdout")
            .arg("-l")
            .arg(language.code())
            .stdin(Stdio::null())
            .output()
            .map_err(|e| OcrError::Spawn {
                command: self.command.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(OcrError::Failed {
                command: self.command.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            "OCR ({}) recognised {} chars from {}x{} image",
            language.code(),
            text.len(),
            image.width(),
            image.height()
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let ocr = TesseractOcr::with_command("/nonexistent/tesseract-binary");
        assert!(!ocr.is_available());
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([255])));
        let err = ocr.recognize(&img, OcrLanguage::English).unwrap_err();
        assert!(matches!(err, OcrError::Spawn { .. }), "got {err:?}");
    }

    #[test]
    fn failed_error_mentions_command() {
        let err = OcrError::Failed {
            command: "tesseract".into(),
            status: "exit status: 1".into(),
            stderr: "Failed loading language 'fas'".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("tesseract"));
        assert!(msg.contains("fas"));
    }
}
