//! Page-tagged pixel-space rectangles.

use crate::domain::NormalizedBox;
use serde::{Deserialize, Serialize};

/// Label that gets the "text" outline color.
pub const TEXT_LABEL: &str = "text";

/// One detected region on one page.
///
/// Coordinates are always pixels relative to the image of `page_index`; the
/// record never carries normalized values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    /// Zero-based page index.
    pub page_index: usize,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    /// Short category string, governs the render color.
    pub label: String,
    /// Text associated with the region, possibly empty.
    pub text: String,
}

impl Rectangle {
    /// Scales a normalized region by the given page size.
    pub fn from_normalized(
        page_index: usize,
        region: &NormalizedBox,
        (width, height): (u32, u32),
        label: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let (x1, y1, x2, y2) = region.to_pixels(width, height);
        Self {
            page_index,
            x1,
            y1,
            x2,
            y2,
            label: label.into(),
            text: text.into(),
        }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// True for rectangles labelled [`TEXT_LABEL`].
    pub fn is_text(&self) -> bool {
        self.label == TEXT_LABEL
    }

    /// Returns true if this rectangle belongs to the given page.
    pub fn is_on_page(&self, page_index: usize) -> bool {
        self.page_index == page_index
    }
}
