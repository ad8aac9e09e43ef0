//! JSON response types shared between CLI and server modes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use findoc::analyzer::{DocumentAnalysis, PageAnalysis};
use findoc::core::errors::FindocError;
use findoc::domain::Rectangle;
use findoc::utils::encode_png;
use serde::Serialize;

/// Analysis of a single page
#[derive(Debug, Serialize)]
pub struct PageResponse {
    /// One-based page number
    pub page: usize,
    pub image_width: u32,
    pub image_height: u32,
    pub boxes: Vec<Rectangle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    /// Base64 PNG of the annotated page, or of the plain page when it has no boxes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_png: Option<String>,
}

/// Response from document analysis
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub page_count: usize,
    pub pages: Vec<PageResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,
}

impl AnalysisResponse {
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            page_count: 0,
            pages: Vec::new(),
            markdown: None,
            error: Some(message),
            processing_time_ms: None,
        }
    }

    /// Builds the response; page images are embedded only when `with_images`.
    pub fn from_analysis(
        analysis: &DocumentAnalysis,
        with_images: bool,
        processing_time_ms: f64,
    ) -> Result<Self, FindocError> {
        let pages = analysis
            .pages
            .iter()
            .map(|page| PageResponse::from_page(page, with_images))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            success: true,
            page_count: analysis.page_count(),
            pages,
            markdown: analysis.markdown.clone(),
            error: None,
            processing_time_ms: Some(processing_time_ms),
        })
    }
}

impl PageResponse {
    fn from_page(page: &PageAnalysis, with_images: bool) -> Result<Self, FindocError> {
        let annotated_png = if with_images {
            let png = encode_png(page.display_image()).map_err(FindocError::ImageEncode)?;
            Some(STANDARD.encode(png))
        } else {
            None
        };

        Ok(Self {
            page: page.page_number(),
            image_width: page.image.width(),
            image_height: page.image.height(),
            boxes: page.rectangles.clone(),
            markdown: page.markdown.clone(),
            annotated_png,
        })
    }
}
