//! Input resolution: turn a path, URL, byte buffer or base64 payload into a
//! local PDF file.
//!
//! pdfium opens documents by path and every page worker opens its own
//! handle, so in-memory inputs are materialised once into a `TempDir` that
//! lives as long as the [`ResolvedInput`]. The `%PDF` magic bytes are
//! checked here, before any worker is scheduled, so callers get
//! [`ExtractError::NotAPdf`] rather than a backend failure per page.

use crate::error::ExtractError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A document as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentInput {
    /// A local file.
    Path(PathBuf),
    /// An `http://` or `https://` URL, fetched with the download timeout.
    Url(String),
    /// Raw document bytes, e.g. an uploaded file.
    Bytes(Vec<u8>),
    /// Standard-alphabet base64 of the document bytes.
    Base64(String),
}

impl DocumentInput {
    /// Label reported as `ExtractionOutput::source`.
    pub fn source_label(&self) -> &'static str {
        match self {
            DocumentInput::Path(_) => "file",
            DocumentInput::Url(_) => "url",
            DocumentInput::Bytes(_) => "bytes",
            DocumentInput::Base64(_) => "base64 input",
        }
    }
}

impl From<&str> for DocumentInput {
    fn from(s: &str) -> Self {
        if is_url(s) {
            DocumentInput::Url(s.to_string())
        } else {
            DocumentInput::Path(PathBuf::from(s))
        }
    }
}

impl From<String> for DocumentInput {
    fn from(s: String) -> Self {
        DocumentInput::from(s.as_str())
    }
}

impl From<&Path> for DocumentInput {
    fn from(p: &Path) -> Self {
        DocumentInput::Path(p.to_path_buf())
    }
}

impl From<PathBuf> for DocumentInput {
    fn from(p: PathBuf) -> Self {
        DocumentInput::Path(p)
    }
}

impl From<Vec<u8>> for DocumentInput {
    fn from(bytes: Vec<u8>) -> Self {
        DocumentInput::Bytes(bytes)
    }
}

/// The resolved input: a local path, or a temp file kept alive until drop.
#[derive(Debug)]
pub enum ResolvedInput {
    Local(PathBuf),
    Materialised { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Materialised { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// True for `scheme://...` strings, which are never meant as file paths.
fn has_scheme(input: &str) -> bool {
    match input.find("://") {
        Some(pos) if pos > 0 => input[..pos]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
        _ => false,
    }
}

/// Resolve any [`DocumentInput`] to a local, magic-checked PDF path.
pub async fn resolve_input(
    input: &DocumentInput,
    download_timeout_secs: u64,
) -> Result<ResolvedInput, ExtractError> {
    match input {
        DocumentInput::Path(path) if has_scheme(&path.to_string_lossy()) => {
            Err(ExtractError::InvalidInput {
                input: path.display().to_string(),
            })
        }
        DocumentInput::Path(path) => resolve_local(path),
        DocumentInput::Url(url) if !is_url(url) => Err(ExtractError::InvalidInput {
            input: url.clone(),
        }),
        DocumentInput::Url(url) => download_url(url, download_timeout_secs).await,
        DocumentInput::Bytes(bytes) => materialise(bytes, "uploaded file").await,
        DocumentInput::Base64(payload) => {
            let bytes = decode_base64(payload)?;
            materialise(&bytes, "base64 input").await
        }
    }
}

/// Decode a base64 payload, tolerating surrounding whitespace and an
/// optional `data:...;base64,` prefix.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, ExtractError> {
    let trimmed = payload.trim();
    let body = match trimmed.find(";base64,") {
        Some(pos) if trimmed.starts_with("data:") => &trimmed[pos + ";base64,".len()..],
        _ => trimmed,
    };
    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(ExtractError::InvalidBase64 {
            reason: "payload is empty".to_string(),
        });
    }
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ExtractError::InvalidBase64 {
            reason: e.to_string(),
        })
}

fn check_magic(bytes: &[u8], origin: &str) -> Result<(), ExtractError> {
    if bytes.len() < PDF_MAGIC.len() || &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        return Err(ExtractError::NotAPdf {
            origin: origin.to_string(),
            magic: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
        });
    }
    Ok(())
}

/// Validate a local file: exists, readable, starts with `%PDF`.
fn resolve_local(path: &Path) -> Result<ResolvedInput, ExtractError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(ExtractError::FileNotFound { path });
    }

    let magic = match read_magic(&path) {
        Ok(magic) => magic,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied { path });
        }
        Err(_) => return Err(ExtractError::FileNotFound { path }),
    };
    check_magic(&magic, &path.display().to_string())?;

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Leading bytes of a file, at most `PDF_MAGIC.len()` of them.
fn read_magic(path: &Path) -> std::io::Result<Vec<u8>> {
    use std::io::Read;
    let mut magic = Vec::with_capacity(PDF_MAGIC.len());
    std::fs::File::open(path)?
        .take(PDF_MAGIC.len() as u64)
        .read_to_end(&mut magic)?;
    Ok(magic)
}

/// Write in-memory bytes to a temp file after the magic check.
async fn materialise(bytes: &[u8], origin: &str) -> Result<ResolvedInput, ExtractError> {
    check_magic(bytes, origin)?;

    let temp_dir = TempDir::new().map_err(|e| ExtractError::Internal(e.to_string()))?;
    let path = temp_dir.path().join("input.pdf");
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| ExtractError::Internal(format!("Failed to write temp file: {}", e)))?;

    debug!("Materialised {} ({} bytes) at {}", origin, bytes.len(), path.display());
    Ok(ResolvedInput::Materialised {
        path,
        _temp_dir: temp_dir,
    })
}

/// Download a URL and materialise the body.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ExtractError> {
    info!("Downloading PDF from: {}", url);

    let timeout_err = || ExtractError::DownloadTimeout {
        url: url.to_string(),
        secs: timeout_secs,
    };
    let failed = |reason: String| ExtractError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            timeout_err()
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            timeout_err()
        } else {
            failed(e.to_string())
        }
    })?;

    info!("Downloaded {} bytes from {}", bytes.len(), url);
    materialise(&bytes, url).await
}
