//! Bounding box overlay rendering.
//!
//! [`BoxRenderer`] draws [`Rectangle`]s onto a copy of a page image: a
//! two-pixel outline per rectangle, colored by label, and a filled label tag
//! sitting on top of the box's upper edge.
//!
//! # Examples
//!
//! ```rust
//! use findoc::prelude::*;
//! use image::{Rgb, RgbImage};
//!
//! let page = RgbImage::from_pixel(200, 200, Rgb([255, 255, 255]));
//! let boxes = vec![Rectangle::from_normalized(
//!     0,
//!     &NormalizedBox::new(0.25, 0.5, 0.75, 0.9),
//!     (200, 200),
//!     "text",
//!     "Total due",
//! )];
//!
//! let renderer = BoxRenderer::new(LabelFont::builtin());
//! let annotated = renderer.render(&page, &boxes);
//! assert_eq!(annotated.dimensions(), page.dimensions());
//! ```

use crate::domain::{Rectangle, TEXT_LABEL};
use crate::utils::font::LabelFont;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use std::path::Path;

/// Outline color of rectangles labelled `"text"`.
pub const TEXT_BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Outline color of every other rectangle.
pub const OTHER_BOX_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Color of the label text.
pub const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

pub const DEFAULT_STROKE_WIDTH: u32 = 2;

pub const DEFAULT_LABEL_PADDING: u32 = 10;

/// Draws rectangles and their labels onto page images.
#[derive(Debug)]
pub struct BoxRenderer {
    font: LabelFont,
    stroke_width: u32,
    label_padding: u32,
}

impl Default for BoxRenderer {
    fn default() -> Self {
        Self::with_system_font(None)
    }
}

impl BoxRenderer {
    pub fn new(font: LabelFont) -> Self {
        Self {
            font,
            stroke_width: DEFAULT_STROKE_WIDTH,
            label_padding: DEFAULT_LABEL_PADDING,
        }
    }

    /// Renderer with the resolved label font, see [`LabelFont::resolve`].
    pub fn with_system_font(preferred: Option<&Path>) -> Self {
        Self::new(LabelFont::resolve(preferred))
    }

    pub fn font(&self) -> &LabelFont {
        &self.font
    }

    /// Outline color for a label.
    pub fn outline_color(label: &str) -> Rgb<u8> {
        if label == TEXT_LABEL {
            TEXT_BOX_COLOR
        } else {
            OTHER_BOX_COLOR
        }
    }

    /// Returns a new image with every rectangle drawn in iteration order.
    ///
    /// The rectangles are drawn as given; filtering by page is up to the caller.
    /// The input image is left untouched.
    pub fn render<'a, I>(&self, image: &RgbImage, rectangles: I) -> RgbImage
    where
        I: IntoIterator<Item = &'a Rectangle>,
    {
        let mut canvas = image.clone();
        for rectangle in rectangles {
            self.draw_rectangle(&mut canvas, rectangle);
        }
        canvas
    }

    fn draw_rectangle(&self, canvas: &mut RgbImage, rectangle: &Rectangle) {
        let color = Self::outline_color(&rectangle.label);
        let bounds = PixelBounds::new(rectangle, canvas, self.stroke_width);

        // PIL-style stroke: each extra pixel of width goes inward
        for inset in 0..i64::from(self.stroke_width) {
            let (left, top) = (bounds.left + inset, bounds.top + inset);
            let (right, bottom) = (bounds.right - inset, bounds.bottom - inset);
            if right < left || bottom < top {
                break;
            }
            draw_hollow_rect_mut(canvas, span_rect(left, top, right, bottom), color);
        }

        if !rectangle.label.is_empty() {
            self.draw_label(canvas, &rectangle.label, &bounds, color);
        }
    }

    fn draw_label(&self, canvas: &mut RgbImage, label: &str, bounds: &PixelBounds, color: Rgb<u8>) {
        let (text_width, text_height) = self.font.text_size(label);
        let padding = i64::from(self.label_padding);

        let left = bounds.left;
        let top = (bounds.top - i64::from(text_height) - 2 * padding).max(0);
        let right = left + i64::from(text_width) + 2 * padding;
        let bottom = bounds.top;

        // a box starting above the canvas leaves no room for the tag background
        if bottom >= top {
            draw_filled_rect_mut(canvas, span_rect(left, top, right, bottom), color);
        }

        self.font.draw(
            canvas,
            LABEL_TEXT_COLOR,
            (left + padding) as i32,
            (top + padding) as i32,
            label,
        );
    }
}

/// Inclusive integer pixel bounds of a rectangle.
///
/// Coordinates far outside the canvas are pulled in to just past the edge,
/// which keeps every stroke pixel that was off-canvas off-canvas.
struct PixelBounds {
    left: i64,
    top: i64,
    right: i64,
    bottom: i64,
}

impl PixelBounds {
    fn new(rectangle: &Rectangle, canvas: &RgbImage, stroke_width: u32) -> Self {
        let margin = i64::from(stroke_width) + 1;
        let clamp_x = |value: f32| (value.floor() as i64).clamp(-margin, i64::from(canvas.width()) + margin);
        let clamp_y = |value: f32| (value.floor() as i64).clamp(-margin, i64::from(canvas.height()) + margin);

        Self {
            left: clamp_x(rectangle.x1),
            top: clamp_y(rectangle.y1),
            right: clamp_x(rectangle.x2),
            bottom: clamp_y(rectangle.y2),
        }
    }
}

/// Rect covering `left..=right` by `top..=bottom`, at least one pixel each way.
fn span_rect(left: i64, top: i64, right: i64, bottom: i64) -> Rect {
    let width = (right - left + 1).max(1) as u32;
    let height = (bottom - top + 1).max(1) as u32;
    Rect::at(left as i32, top as i32).of_size(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NormalizedBox;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn page() -> RgbImage {
        RgbImage::from_pixel(200, 200, WHITE)
    }

    fn rect(label: &str, x1: f32, y1: f32, x2: f32, y2: f32) -> Rectangle {
        Rectangle {
            page_index: 0,
            x1,
            y1,
            x2,
            y2,
            label: label.to_string(),
            text: String::new(),
        }
    }

    fn renderer() -> BoxRenderer {
        BoxRenderer::new(LabelFont::builtin())
    }

    #[test]
    fn test_render_does_not_touch_input() {
        let base = page();
        let before = base.clone();

        let annotated = renderer().render(&base, &[rect("text", 50.0, 100.0, 150.0, 180.0)]);

        assert_eq!(base, before);
        assert_ne!(annotated, base);
    }

    #[test]
    fn test_render_is_idempotent_on_fresh_copies() {
        let boxes = vec![
            rect("text", 50.0, 100.0, 150.0, 180.0),
            rect("table", 10.5, 20.25, 90.75, 60.0),
        ];
        let renderer = renderer();

        let first = renderer.render(&page(), &boxes);
        let second = renderer.render(&page(), &boxes);
        assert_eq!(first, second);
    }

    #[test]
    fn test_outline_color_by_label() {
        assert_eq!(BoxRenderer::outline_color("text"), TEXT_BOX_COLOR);
        assert_eq!(BoxRenderer::outline_color("table"), OTHER_BOX_COLOR);
        assert_eq!(BoxRenderer::outline_color(""), OTHER_BOX_COLOR);

        let text = renderer().render(&page(), &[rect("text", 50.0, 100.0, 150.0, 180.0)]);
        assert_eq!(text.get_pixel(100, 180), &TEXT_BOX_COLOR);
        assert_eq!(text.get_pixel(150, 140), &TEXT_BOX_COLOR);

        let figure = renderer().render(&page(), &[rect("figure", 50.0, 100.0, 150.0, 180.0)]);
        assert_eq!(figure.get_pixel(100, 180), &OTHER_BOX_COLOR);
        assert_eq!(figure.get_pixel(50, 140), &OTHER_BOX_COLOR);
    }

    #[test]
    fn test_stroke_is_two_pixels_inward() {
        let annotated = renderer().render(&page(), &[rect("", 50.0, 100.0, 150.0, 180.0)]);

        assert_eq!(annotated.get_pixel(100, 180), &OTHER_BOX_COLOR);
        assert_eq!(annotated.get_pixel(100, 179), &OTHER_BOX_COLOR);
        assert_eq!(annotated.get_pixel(100, 178), &WHITE);
        assert_eq!(annotated.get_pixel(100, 181), &WHITE);
        assert_eq!(annotated.get_pixel(100, 140), &WHITE);
    }

    #[test]
    fn test_label_tag_sits_above_box() {
        let renderer = renderer();
        let annotated = renderer.render(&page(), &[rect("text", 50.0, 100.0, 150.0, 180.0)]);

        let (text_width, text_height) = renderer.font().text_size("text");
        let tag_top = 100 - text_height - 2 * DEFAULT_LABEL_PADDING;

        // padding area of the tag is filled with the outline color
        assert_eq!(annotated.get_pixel(52, tag_top + 2), &TEXT_BOX_COLOR);
        assert_eq!(
            annotated.get_pixel(50 + text_width + 2 * DEFAULT_LABEL_PADDING, 99),
            &TEXT_BOX_COLOR
        );
        // just right of the tag stays untouched
        assert_eq!(
            annotated.get_pixel(50 + text_width + 2 * DEFAULT_LABEL_PADDING + 1, 99),
            &WHITE
        );
        // first glyph row of "T" is white
        assert_eq!(
            annotated.get_pixel(50 + DEFAULT_LABEL_PADDING, tag_top + DEFAULT_LABEL_PADDING),
            &LABEL_TEXT_COLOR
        );
    }

    #[test]
    fn test_label_tag_clamped_at_top() {
        let annotated = renderer().render(&page(), &[rect("table", 20.0, 5.0, 120.0, 90.0)]);
        assert_eq!(annotated.get_pixel(22, 0), &OTHER_BOX_COLOR);
    }

    #[test]
    fn test_empty_label_draws_no_tag() {
        let annotated = renderer().render(&page(), &[rect("", 50.0, 100.0, 150.0, 180.0)]);
        assert_eq!(annotated.get_pixel(52, 90), &WHITE);
    }

    #[test]
    fn test_out_of_bounds_and_degenerate_boxes() {
        let boxes = vec![
            rect("text", -50.0, -50.0, 5000.0, 5000.0),
            rect("figure", 30.0, 30.0, 30.0, 30.0),
            rect("figure", 80.0, 60.0, 40.0, 20.0),
            rect("text", f32::MAX, f32::MIN, f32::INFINITY, f32::NAN),
        ];
        let annotated = renderer().render(&page(), &boxes);
        assert_eq!(annotated.dimensions(), (200, 200));
        // the huge box has all its edges off canvas
        assert_eq!(annotated.get_pixel(0, 199), &WHITE);
        assert_eq!(annotated.get_pixel(30, 30), &OTHER_BOX_COLOR);
    }

    #[test]
    fn test_render_from_normalized_rectangles() {
        let rects = vec![Rectangle::from_normalized(
            0,
            &NormalizedBox::new(0.25, 0.5, 0.75, 0.9),
            (200, 200),
            "marginalia",
            "",
        )];
        let annotated = renderer().render(&page(), &rects);
        assert_eq!(annotated.get_pixel(50, 150), &OTHER_BOX_COLOR);
        assert_eq!(annotated.get_pixel(150, 150), &OTHER_BOX_COLOR);
    }
}
