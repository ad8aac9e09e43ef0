//! Result types for the analysis pipeline.

use crate::domain::Rectangle;
use crate::processors::ScalingReference;
use image::RgbImage;
use std::fmt;

/// Analysis of a single page.
#[derive(Debug, Clone)]
pub struct PageAnalysis {
    /// Zero-based page index.
    pub page_index: usize,
    /// The page as rendered, without overlays.
    pub image: RgbImage,
    /// The page with its rectangles drawn on it. `None` when the page has no
    /// rectangles.
    pub annotated: Option<RgbImage>,
    /// Rectangles located on this page, in chunk order.
    pub rectangles: Vec<Rectangle>,
    /// Markdown of the chunks attributed to this page.
    pub markdown: Option<String>,
}

impl PageAnalysis {
    /// One-based page number, as shown to users.
    pub fn page_number(&self) -> usize {
        self.page_index + 1
    }

    /// Annotated image if there is one, the original page otherwise.
    pub fn display_image(&self) -> &RgbImage {
        self.annotated.as_ref().unwrap_or(&self.image)
    }

    pub fn has_boxes(&self) -> bool {
        !self.rectangles.is_empty()
    }
}

/// Analysis of a whole document.
#[derive(Debug, Clone)]
pub struct DocumentAnalysis {
    /// One entry per rendered page, in page order.
    pub pages: Vec<PageAnalysis>,
    /// Whole-document markdown as returned by the service.
    pub markdown: Option<String>,
    /// Rectangles across all pages, including any pointing past the
    /// rendered pages.
    pub rectangle_count: usize,
    /// Page size used to scale boxes.
    pub scaling: ScalingReference,
}

impl DocumentAnalysis {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Rectangles across all pages, in page order.
    pub fn rectangles(&self) -> impl Iterator<Item = &Rectangle> {
        self.pages.iter().flat_map(|page| page.rectangles.iter())
    }
}

impl fmt::Display for DocumentAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Pages: {}, boxes: {}",
            self.page_count(),
            self.rectangle_count
        )?;

        for page in &self.pages {
            writeln!(f)?;
            writeln!(
                f,
                "Page {} ({}x{}): {} boxes",
                page.page_number(),
                page.image.width(),
                page.image.height(),
                page.rectangles.len()
            )?;

            for rect in &page.rectangles {
                writeln!(
                    f,
                    "  [{}] ({:.0}, {:.0}) - ({:.0}, {:.0})",
                    rect.label, rect.x1, rect.y1, rect.x2, rect.y2
                )?;
            }

            if let Some(markdown) = &page.markdown {
                writeln!(f, "  markdown: {} chars", markdown.chars().count())?;
            }
        }

        Ok(())
    }
}
