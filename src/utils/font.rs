//! Label fonts for the box overlay.
//!
//! A label font is either a TrueType/OpenType font loaded with `ab_glyph`, or
//! the built-in 5x7 bitmap font used when no usable font file is found.
//! Resolution through [`LabelFont::resolve`] never fails.

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Pixel size for vector label fonts.
pub const DEFAULT_FONT_SIZE: f32 = 20.0;

/// Bold fonts tried first, then regular ones, in this order.
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Errors from loading a font file.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font file {}", path.display())]
    Parse { path: PathBuf },
}

/// Font used to measure and draw box labels.
pub enum LabelFont {
    /// A font file parsed by `ab_glyph`.
    Vector {
        font: FontVec,
        scale: PxScale,
        source: PathBuf,
    },
    /// The built-in bitmap font.
    Builtin(BitmapFont),
}

impl fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vector { scale, source, .. } => f
                .debug_struct("Vector")
                .field("scale", &scale.y)
                .field("source", source)
                .finish(),
            Self::Builtin(bitmap) => f.debug_tuple("Builtin").field(bitmap).finish(),
        }
    }
}

impl LabelFont {
    /// The built-in bitmap font at its default size.
    pub fn builtin() -> Self {
        Self::Builtin(BitmapFont::default())
    }

    /// Loads a font file at the given pixel size.
    pub fn from_path(path: &Path, size: f32) -> Result<Self, FontError> {
        let data = std::fs::read(path).map_err(|source| FontError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let font = FontVec::try_from_vec(data).map_err(|_| FontError::Parse {
            path: path.to_path_buf(),
        })?;

        Ok(Self::Vector {
            font,
            scale: PxScale::from(size),
            source: path.to_path_buf(),
        })
    }

    /// Resolves the label font: the preferred path if given and loadable, then
    /// the system bold fonts, then the built-in bitmap font.
    pub fn resolve(preferred: Option<&Path>) -> Self {
        if let Some(path) = preferred {
            match Self::from_path(path, DEFAULT_FONT_SIZE) {
                Ok(font) => {
                    info!("Using label font: {}", path.display());
                    return font;
                }
                Err(e) => debug!("{e}, falling back to system fonts"),
            }
        }

        for path in SYSTEM_FONT_PATHS {
            if let Ok(font) = Self::from_path(Path::new(path), DEFAULT_FONT_SIZE) {
                info!("Loaded system font: {}", path);
                return font;
            }
        }

        debug!("No system font found, using built-in bitmap font");
        Self::builtin()
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin(_))
    }

    /// Rendered `(width, height)` of `text` in pixels.
    pub fn text_size(&self, text: &str) -> (u32, u32) {
        match self {
            Self::Vector { font, scale, .. } => text_size(*scale, font, text),
            Self::Builtin(bitmap) => bitmap.text_size(text),
        }
    }

    /// Draws `text` with its top-left corner at `(x, y)`.
    pub fn draw(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, text: &str) {
        match self {
            Self::Vector { font, scale, .. } => {
                draw_text_mut(canvas, color, x, y, *scale, font, text)
            }
            Self::Builtin(bitmap) => bitmap.draw(canvas, color, x, y, text),
        }
    }
}

impl Default for LabelFont {
    fn default() -> Self {
        Self::resolve(None)
    }
}

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

/// Fixed-cell 5x7 bitmap font, scaled by an integer factor.
///
/// Letters render in upper case. Characters outside the table render as a
/// hollow box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapFont {
    scale: u32,
}

impl Default for BitmapFont {
    fn default() -> Self {
        Self { scale: 2 }
    }
}

impl BitmapFont {
    /// Creates a bitmap font; `scale` is clamped to at least 1.
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.max(1),
        }
    }

    pub fn text_size(&self, text: &str) -> (u32, u32) {
        let count = text.chars().count() as u32;
        if count == 0 {
            return (0, 0);
        }
        (
            (count * GLYPH_ADVANCE - 1) * self.scale,
            GLYPH_HEIGHT * self.scale,
        )
    }

    pub fn draw(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, text: &str) {
        let step = (GLYPH_ADVANCE * self.scale) as i32;
        let scale = self.scale as i32;

        for (index, ch) in text.chars().enumerate() {
            let origin_x = x + index as i32 * step;
            for (row, bits) in glyph(ch).iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (0b10000 >> col) == 0 {
                        continue;
                    }
                    let cell = Rect::at(origin_x + col as i32 * scale, y + row as i32 * scale)
                        .of_size(self.scale, self.scale);
                    draw_filled_rect_mut(canvas, cell, color);
                }
            }
        }
    }
}

#[rustfmt::skip]
fn glyph(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '_' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        '/' => [0b00001, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b10000],
        ' ' => [0; 7],
        _ => [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_text_size() {
        let font = BitmapFont::new(2);
        assert_eq!(font.text_size(""), (0, 0));
        assert_eq!(font.text_size("a"), (10, 14));
        assert_eq!(font.text_size("text"), ((4 * 6 - 1) * 2, 14));
    }

    #[test]
    fn test_bitmap_scale_is_at_least_one() {
        assert_eq!(BitmapFont::new(0).text_size("ab"), (11, 7));
    }

    #[test]
    fn test_bitmap_draws_glyph_pixels() {
        let mut canvas = RgbImage::from_pixel(20, 20, Rgb([0, 0, 0]));
        BitmapFont::new(1).draw(&mut canvas, Rgb([255, 255, 255]), 2, 3, "T");

        // top bar of the T
        for x in 2..7 {
            assert_eq!(canvas.get_pixel(x, 3), &Rgb([255, 255, 255]));
        }
        // stem
        assert_eq!(canvas.get_pixel(4, 9), &Rgb([255, 255, 255]));
        assert_eq!(canvas.get_pixel(2, 9), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_bitmap_draw_clips_at_canvas_edges() {
        let mut canvas = RgbImage::new(4, 4);
        BitmapFont::default().draw(&mut canvas, Rgb([255, 0, 0]), -3, -3, "scan_code");
        BitmapFont::default().draw(&mut canvas, Rgb([255, 0, 0]), 3, 3, "?");
    }

    #[test]
    fn test_missing_font_file_is_an_error() {
        let err = LabelFont::from_path(Path::new("/nonexistent/font.ttf"), DEFAULT_FONT_SIZE)
            .unwrap_err();
        assert!(matches!(err, FontError::Read { .. }));
    }

    #[test]
    fn test_unparseable_font_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();

        let err = LabelFont::from_path(&path, DEFAULT_FONT_SIZE).unwrap_err();
        assert!(matches!(err, FontError::Parse { .. }));
    }

    #[test]
    fn test_resolve_never_fails() {
        let font = LabelFont::resolve(Some(Path::new("/nonexistent/font.ttf")));
        let (width, height) = font.text_size("table");
        assert!(width > 0);
        assert!(height > 0);
    }
}
