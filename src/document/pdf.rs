//! PDF rasterization: PDF pages to RGB images through PDFium.

use image::RgbImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to initialize PDFium: {0}")]
    InitError(String),

    #[error("Failed to load PDF: {0}")]
    LoadError(String),

    #[error("Failed to render page {page}: {message}")]
    RenderError { page: usize, message: String },

    #[error("PDF has no pages")]
    EmptyPdf,
}

/// Configuration for PDF rendering
#[derive(Debug, Clone)]
pub struct PdfRenderSettings {
    /// DPI for rendering (default: 200)
    pub dpi: f32,
    /// Maximum dimension for rendered images (default: 4000)
    pub max_dimension: u32,
    /// Directory holding the PDFium shared library, tried before the standard locations
    pub library_dir: Option<PathBuf>,
}

impl Default for PdfRenderSettings {
    fn default() -> Self {
        Self {
            dpi: 200.0,
            max_dimension: 4000,
            library_dir: None,
        }
    }
}

impl PdfRenderSettings {
    /// Target pixel size for a page of the given size in points.
    ///
    /// Points convert at `dpi / 72`; the longer side is then capped at
    /// `max_dimension` keeping the aspect ratio.
    pub fn target_size(&self, width_points: f32, height_points: f32) -> (u32, u32) {
        let scale = self.dpi / 72.0;
        let mut width_px = (width_points * scale) as u32;
        let mut height_px = (height_points * scale) as u32;

        if width_px > self.max_dimension || height_px > self.max_dimension {
            let ratio = if width_px > height_px {
                self.max_dimension as f32 / width_px as f32
            } else {
                self.max_dimension as f32 / height_px as f32
            };
            width_px = (width_px as f32 * ratio) as u32;
            height_px = (height_px as f32 * ratio) as u32;
        }

        (width_px.max(1), height_px.max(1))
    }
}

/// Turns PDF bytes into one RGB image per page, in page order.
///
/// Implementations fail with [`PdfError::EmptyPdf`] for documents without pages.
pub trait Rasterizer {
    fn rasterize(&self, bytes: &[u8]) -> Result<Vec<RgbImage>, PdfError>;
}

/// PDF processor for converting PDF pages to images
pub struct PdfProcessor {
    pdfium: Pdfium,
    config: PdfRenderSettings,
}

impl PdfProcessor {
    /// Create a new PDF processor
    pub fn new(config: PdfRenderSettings) -> Result<Self, PdfError> {
        let configured = config
            .library_dir
            .as_deref()
            .map(|dir| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)));

        let bindings = match configured {
            Some(Ok(bindings)) => Ok(bindings),
            _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/lib")))
                .or_else(|_| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/local/lib")))
                .or_else(|_| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/opt/homebrew/lib")))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| PdfError::InitError(format!("Could not find PDFium library: {}", e)))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            config,
        })
    }

    /// Load a PDF from bytes and render all pages to images
    pub fn render_pdf_bytes(&self, bytes: &[u8]) -> Result<Vec<RgbImage>, PdfError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| PdfError::LoadError(e.to_string()))?;

        self.render_document(&document)
    }

    fn render_document(&self, document: &PdfDocument) -> Result<Vec<RgbImage>, PdfError> {
        let page_count = document.pages().len();

        if page_count == 0 {
            return Err(PdfError::EmptyPdf);
        }

        let mut images = Vec::with_capacity(page_count as usize);

        for (index, page) in document.pages().iter().enumerate() {
            let image = self
                .render_page(&page)
                .map_err(|message| PdfError::RenderError {
                    page: index + 1,
                    message,
                })?;
            debug!(page = index + 1, width = image.width(), height = image.height(), "Rendered PDF page");
            images.push(image);
        }

        Ok(images)
    }

    fn render_page(&self, page: &PdfPage) -> Result<RgbImage, String> {
        let (width_px, height_px) = self
            .config
            .target_size(page.width().value, page.height().value);

        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px as i32)
            .set_target_height(height_px as i32)
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| e.to_string())?;

        Ok(bitmap.as_image().to_rgb8())
    }
}

impl Rasterizer for PdfProcessor {
    fn rasterize(&self, bytes: &[u8]) -> Result<Vec<RgbImage>, PdfError> {
        self.render_pdf_bytes(bytes)
    }
}

/// Rasterizer that binds PDFium only when a PDF actually needs rendering.
///
/// Image uploads never touch PDFium, so hosts without the library can still
/// analyze PNG and JPEG documents.
#[derive(Debug, Clone, Default)]
pub struct LazyPdfRasterizer {
    settings: PdfRenderSettings,
}

impl LazyPdfRasterizer {
    pub fn new(settings: PdfRenderSettings) -> Self {
        Self { settings }
    }
}

impl Rasterizer for LazyPdfRasterizer {
    fn rasterize(&self, bytes: &[u8]) -> Result<Vec<RgbImage>, PdfError> {
        PdfProcessor::new(self.settings.clone())?.render_pdf_bytes(bytes)
    }
}

/// Check if bytes represent a PDF file (magic bytes: %PDF)
pub fn is_pdf_bytes(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && &bytes[0..4] == b"%PDF"
}
