//! [`PdfBackend`] implementation over pdfium.
//!
//! ## Binding vs. documents
//!
//! The pdfium shared library is bound once per process and kept in a
//! `OnceLock`; binding is expensive and pdfium's library init/teardown is
//! global. Documents are the per-worker resource: every method below opens
//! its own `PdfDocument` from the path and drops it on return, so concurrent
//! workers never share a handle.
//!
//! Library resolution order:
//! 1. `PDFIUM_LIB_PATH` (explicit file path)
//! 2. a platform library in the working directory
//! 3. the system library search path

use super::PdfBackend;
use crate::error::{ExtractError, PageError};
use crate::output::{BoundingBox, DocumentMetadata, ImageRecord};
use crate::pipeline::encode;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

static PDFIUM: OnceLock<Result<Pdfium, String>> = OnceLock::new();

/// The process-wide pdfium binding.
pub fn pdfium() -> Result<&'static Pdfium, ExtractError> {
    PDFIUM
        .get_or_init(bind_pdfium)
        .as_ref()
        .map_err(|e| ExtractError::PdfiumBindingFailed(e.clone()))
}

fn bind_pdfium() -> Result<Pdfium, String> {
    if let Ok(lib_path) = std::env::var("PDFIUM_LIB_PATH") {
        match Pdfium::bind_to_library(&lib_path) {
            Ok(bindings) => {
                info!("Bound pdfium from PDFIUM_LIB_PATH={}", lib_path);
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => warn!("PDFIUM_LIB_PATH '{}' unusable: {:?}", lib_path, e),
        }
    }

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| format!("{:?}", e))
}

/// pdfium-backed document access.
#[derive(Clone, Default)]
pub struct PdfiumBackend {
    password: Option<String>,
}

impl std::fmt::Debug for PdfiumBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfiumBackend")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl PdfiumBackend {
    pub fn new(password: Option<String>) -> Self {
        Self { password }
    }

    fn open(&self, path: &Path) -> Result<PdfDocument<'_>, ExtractError> {
        let pdfium = pdfium()?;
        let password = self.password.as_deref();
        pdfium.load_pdf_from_file(path, password).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    ExtractError::WrongPassword {
                        path: path.to_path_buf(),
                    }
                } else {
                    ExtractError::PasswordRequired {
                        path: path.to_path_buf(),
                    }
                }
            } else {
                ExtractError::DocumentOpen {
                    path: path.to_path_buf(),
                    detail: err_str,
                }
            }
        })
    }

    /// Open the document for a page-level call; the document opened fine
    /// when the page count was read, so any failure now is a page failure.
    fn open_for_page(&self, path: &Path, index: usize) -> Result<PdfDocument<'_>, PageError> {
        self.open(path).map_err(|e| PageError::PageDecode {
            page: index + 1,
            detail: e.to_string(),
        })
    }
}

fn decode_error(index: usize) -> impl Fn(PdfiumError) -> PageError {
    move |e| PageError::PageDecode {
        page: index + 1,
        detail: format!("{:?}", e),
    }
}

impl PdfBackend for PdfiumBackend {
    fn page_count(&self, path: &Path) -> Result<usize, ExtractError> {
        let document = self.open(path)?;
        let count = document.pages().len() as usize;
        debug!("{}: {} pages", path.display(), count);
        Ok(count)
    }

    fn page_text(&self, path: &Path, index: usize) -> Result<String, PageError> {
        let document = self.open_for_page(path, index)?;
        let page = document.pages().get(index as u16).map_err(decode_error(index))?;
        let text = page.text().map_err(decode_error(index))?;
        Ok(text.all())
    }

    fn page_images(&self, path: &Path, index: usize) -> Result<Vec<ImageRecord>, PageError> {
        let document = self.open_for_page(path, index)?;
        let page = document.pages().get(index as u16).map_err(decode_error(index))?;
        let page_number = index + 1;

        let attempts = page
            .objects()
            .iter()
            .filter_map(|object| {
                let image_object = object.as_image_object()?;
                Some(image_record(&object, image_object))
            })
            .collect::<Vec<_>>();
        let records = super::collect_decodable(page_number, attempts);

        debug!("Page {}: {} images", page_number, records.len());
        Ok(records)
    }

    fn render_page(
        &self,
        path: &Path,
        index: usize,
        dpi: u32,
        max_pixels: u32,
    ) -> Result<DynamicImage, PageError> {
        let document = self.open_for_page(path, index)?;
        let page = document.pages().get(index as u16).map_err(decode_error(index))?;

        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(dpi as f32 / 72.0)
            .set_maximum_width(max_pixels as i32)
            .set_maximum_height(max_pixels as i32);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| PageError::Render {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );
        Ok(image)
    }

    fn metadata(&self, path: &Path) -> Result<DocumentMetadata, ExtractError> {
        let document = self.open(path)?;
        let mut out = DocumentMetadata::new();

        out.insert("format", format!("{:?}", document.version()));
        let tags = [
            ("title", PdfDocumentMetadataTagType::Title),
            ("author", PdfDocumentMetadataTagType::Author),
            ("subject", PdfDocumentMetadataTagType::Subject),
            ("keywords", PdfDocumentMetadataTagType::Keywords),
            ("creator", PdfDocumentMetadataTagType::Creator),
            ("producer", PdfDocumentMetadataTagType::Producer),
            ("creationDate", PdfDocumentMetadataTagType::CreationDate),
            ("modDate", PdfDocumentMetadataTagType::ModificationDate),
        ];
        let metadata = document.metadata();
        for (key, tag) in tags {
            if let Some(value) = metadata.get(tag) {
                out.insert(key, value.value());
            }
        }
        out.insert("page_count", document.pages().len().to_string());

        Ok(out)
    }
}

/// Decode one image object into a record; any failure skips just this image.
///
/// Dimensions come from the decoded raster. Colour space and bit depth come
/// from the embedded object itself, since pdfium always decodes to 8-bit
/// gray or RGBA.
fn image_record(
    object: &PdfPageObject<'_>,
    image_object: &PdfPageImageObject<'_>,
) -> Result<ImageRecord, String> {
    let raw = image_object
        .get_raw_image()
        .map_err(|e| format!("decode failed: {:?}", e))?;

    let bounds = object
        .bounds()
        .map_err(|e| format!("bounds unavailable: {:?}", e))?;

    let filters: Vec<String> = image_object
        .filters()
        .iter()
        .map(|f| f.name().to_string())
        .collect();

    let stored = match passthrough_ext(&filters) {
        Some(ext) => image_object
            .get_raw_image_data()
            .ok()
            .filter(|data| !data.is_empty())
            .map(|data| (data, ext)),
        None => None,
    };
    let (content, ext) = match stored {
        Some(stored) => stored,
        None => (
            encode::encode_png(&raw).map_err(|e| format!("PNG encode failed: {}", e))?,
            "png",
        ),
    };

    let color_space = image_object.color_space().unwrap_or(PdfColorSpace::Unknown);
    let bits_per_pixel = image_object.bits_per_pixel().ok();

    Ok(ImageRecord {
        name: String::new(),
        width: raw.width(),
        height: raw.height(),
        ext: ext.to_string(),
        size_bytes: content.len(),
        bits_per_component: bits_per_component(bits_per_pixel, color_space),
        compression: compression_label(&filters),
        color_space: color_space_name(color_space).to_string(),
        bbox: bounding_box(&bounds),
        content: encode::to_base64(&content),
    })
}

/// Page-space extent of an object: `(x0, y0)` is the lower-left corner.
fn bounding_box(bounds: &PdfQuadPoints) -> BoundingBox {
    BoundingBox {
        x0: bounds.left().value,
        y0: bounds.bottom().value,
        x1: bounds.right().value,
        y1: bounds.top().value,
    }
}

/// File extension for streams whose stored bytes are already a complete
/// image file: a lone `DCTDecode` is a JPEG, a lone `JPXDecode` is JPEG 2000.
fn passthrough_ext(filters: &[String]) -> Option<&'static str> {
    match filters {
        [only] if only == "DCTDecode" => Some("jpg"),
        [only] if only == "JPXDecode" => Some("jp2"),
        _ => None,
    }
}

fn compression_label(filters: &[String]) -> String {
    if filters.is_empty() {
        "None".to_string()
    } else {
        filters.join(",")
    }
}

/// PDF name of a colour space, as written in the `/ColorSpace` entry.
fn color_space_name(color_space: PdfColorSpace) -> &'static str {
    match color_space {
        PdfColorSpace::Unknown => "Unknown",
        PdfColorSpace::DeviceGray => "DeviceGray",
        PdfColorSpace::DeviceRGB => "DeviceRGB",
        PdfColorSpace::DeviceCMYK => "DeviceCMYK",
        PdfColorSpace::CalibratedCIEGray => "CalGray",
        PdfColorSpace::CalibratedCIERGB => "CalRGB",
        PdfColorSpace::CalibratedCIELab => "Lab",
        PdfColorSpace::CalibratedICCProfile => "ICCBased",
        PdfColorSpace::Separation => "Separation",
        PdfColorSpace::DeviceN => "DeviceN",
        PdfColorSpace::Indexed => "Indexed",
        PdfColorSpace::Pattern => "Pattern",
    }
}

/// Components per pixel, where the colour space fixes it.
fn component_count(color_space: PdfColorSpace) -> Option<u8> {
    match color_space {
        PdfColorSpace::DeviceGray
        | PdfColorSpace::CalibratedCIEGray
        | PdfColorSpace::Separation
        | PdfColorSpace::Indexed => Some(1),
        PdfColorSpace::DeviceRGB
        | PdfColorSpace::CalibratedCIERGB
        | PdfColorSpace::CalibratedCIELab => Some(3),
        PdfColorSpace::DeviceCMYK => Some(4),
        _ => None,
    }
}

/// `/BitsPerComponent` from pdfium's bits-per-pixel. ICC and DeviceN spaces
/// do not fix the channel count; multi-byte pixels there are taken as 8 bpc.
fn bits_per_component(bits_per_pixel: Option<u8>, color_space: PdfColorSpace) -> u8 {
    let Some(bpp) = bits_per_pixel.filter(|&b| b > 0) else {
        return 0;
    };
    match component_count(color_space) {
        Some(n) if bpp % n == 0 => bpp / n,
        _ if bpp >= 8 => 8,
        _ => bpp,
    }
}
