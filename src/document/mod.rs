//! Document loading: uploaded bytes to RGB page images.
//!
//! PNG and JPEG uploads decode to a single page. PDFs go through a
//! [`Rasterizer`], one image per page, the first page being the reference for
//! box scaling.

pub mod pdf;

pub use pdf::{LazyPdfRasterizer, PdfError, PdfProcessor, PdfRenderSettings, Rasterizer, is_pdf_bytes};

use image::{ImageFormat, RgbImage};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors raised while turning an upload into page images.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document '{filename}' is empty")]
    Empty { filename: String },

    #[error("unsupported document format for '{filename}': expected PNG, JPEG or PDF")]
    UnsupportedFormat { filename: String },

    #[error("failed to decode image: {0}")]
    ImageDecode(#[source] image::ImageError),

    #[error(transparent)]
    Pdf(#[from] PdfError),
}

/// Kind of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
}

impl DocumentKind {
    /// Detects the kind from the file extension, then from the content.
    pub fn detect(bytes: &[u8], filename: &str) -> Result<Self, DocumentError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("pdf") => return Ok(Self::Pdf),
            Some("png" | "jpg" | "jpeg") => return Ok(Self::Image),
            _ => {}
        }

        if is_pdf_bytes(bytes) {
            return Ok(Self::Pdf);
        }

        match image::guess_format(bytes) {
            Ok(ImageFormat::Png | ImageFormat::Jpeg) => Ok(Self::Image),
            _ => Err(DocumentError::UnsupportedFormat {
                filename: filename.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
        }
    }
}

/// Loads the pages of an uploaded document.
///
/// Images yield one page. PDFs are rendered with `rasterizer`; a PDF without
/// pages fails with [`PdfError::EmptyPdf`].
pub fn load_pages<R>(bytes: &[u8], filename: &str, rasterizer: &R) -> Result<Vec<RgbImage>, DocumentError>
where
    R: Rasterizer + ?Sized,
{
    if bytes.is_empty() {
        return Err(DocumentError::Empty {
            filename: filename.to_string(),
        });
    }

    let kind = DocumentKind::detect(bytes, filename)?;
    info!(filename, kind = kind.as_str(), bytes = bytes.len(), "Loading document pages");

    let pages = match kind {
        DocumentKind::Image => vec![decode_image(bytes)?],
        DocumentKind::Pdf => rasterizer.rasterize(bytes)?,
    };

    if pages.is_empty() {
        return Err(PdfError::EmptyPdf.into());
    }

    info!(filename, pages = pages.len(), "Document pages loaded");
    Ok(pages)
}

/// Decodes image bytes into RGB8.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, DocumentError> {
    let image = image::load_from_memory(bytes).map_err(DocumentError::ImageDecode)?;
    Ok(image.to_rgb8())
}
