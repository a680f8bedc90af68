//! Font faces and text drawing.
//!
//! Faces are loaded from the configured font directory. A face whose file
//! cannot be read falls back to the embedded DejaVu Sans Mono, so the error
//! placeholder always carries visible text.

use std::path::Path;

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use tracing::warn;

use radar_common::FontConfig;

/// Embedded font data - DejaVu Sans Mono, used when a configured font is unusable
const FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

/// The embedded fallback font.
pub fn embedded_font() -> Option<Font<'static>> {
    Font::try_from_bytes(FONT_DATA)
}

/// A font at a fixed pixel size.
#[derive(Clone)]
pub struct Face {
    font: Option<Font<'static>>,
    size: f32,
}

impl std::fmt::Debug for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Face")
            .field("loaded", &self.font.is_some())
            .field("size", &self.size)
            .finish()
    }
}

impl Face {
    /// Load a face from a TrueType/OpenType file, falling back to the
    /// embedded font when the file is missing or unparsable.
    pub fn load(path: &Path, size: f32) -> Self {
        let font = match std::fs::read(path) {
            Ok(data) => Font::try_from_vec(data),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read font file");
                None
            }
        };
        match font {
            Some(font) => Self::from_font(font, size),
            None => {
                warn!(path = %path.display(), "Font unavailable, using embedded font");
                Self::embedded(size)
            }
        }
    }

    /// The embedded font at `size`.
    pub fn embedded(size: f32) -> Self {
        Self {
            font: embedded_font(),
            size,
        }
    }

    pub fn from_font(font: Font<'static>, size: f32) -> Self {
        Self {
            font: Some(font),
            size,
        }
    }

    /// A face that measures as empty and draws nothing.
    pub fn missing(size: f32) -> Self {
        Self { font: None, size }
    }

    pub fn is_loaded(&self) -> bool {
        self.font.is_some()
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    fn scale(&self) -> Scale {
        Scale::uniform(self.size)
    }

    /// Vertical advance between two lines.
    pub fn line_height(&self) -> i32 {
        match &self.font {
            Some(font) => {
                let v = font.v_metrics(self.scale());
                (v.ascent - v.descent + v.line_gap).ceil() as i32
            }
            None => self.size.ceil() as i32,
        }
    }

    /// Pixel extent of a single line of text.
    pub fn text_size(&self, text: &str) -> (i32, i32) {
        match &self.font {
            Some(font) => text_size(self.scale(), font, text),
            None => (0, 0),
        }
    }
}

/// The faces used on the rain cloud panel.
#[derive(Debug, Clone)]
pub struct FaceMap {
    pub title: Face,
    pub legend: Face,
    pub legend_unit: Face,
    pub error_title: Face,
    pub error_body: Face,
}

impl FaceMap {
    pub fn load(config: &FontConfig) -> Self {
        Self {
            title: Face::load(&config.jp_medium(), 50.0),
            legend: Face::load(&config.en_medium(), 30.0),
            legend_unit: Face::load(&config.en_medium(), 18.0),
            error_title: Face::load(&config.en_bold(), 100.0),
            error_body: Face::load(&config.en_medium(), 30.0),
        }
    }

    /// Every role drawn with the same font, scaled per role.
    pub fn uniform(font: Font<'static>) -> Self {
        Self {
            title: Face::from_font(font.clone(), 50.0),
            legend: Face::from_font(font.clone(), 30.0),
            legend_unit: Face::from_font(font.clone(), 18.0),
            error_title: Face::from_font(font.clone(), 100.0),
            error_body: Face::from_font(font, 30.0),
        }
    }

    /// Faces that draw nothing.
    pub fn missing() -> Self {
        Self {
            title: Face::missing(50.0),
            legend: Face::missing(30.0),
            legend_unit: Face::missing(18.0),
            error_title: Face::missing(100.0),
            error_body: Face::missing(30.0),
        }
    }
}

/// Horizontal anchor of drawn text relative to its x position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Parse a `#rgb` or `#rrggbb` color.
pub fn parse_color(hex: &str) -> Option<Rgba<u8>> {
    let hex = hex.trim_start_matches('#');
    let expand = |c: u8| c * 16 + c;
    match hex.len() {
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok();
            Some(Rgba([expand(digit(0)?), expand(digit(1)?), expand(digit(2)?), 255]))
        }
        6 => {
            let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(Rgba([byte(0)?, byte(2)?, byte(4)?, 255]))
        }
        _ => None,
    }
}

/// Draw possibly multi-line text with its top edge at `y`.
///
/// Returns the y coordinate just below the last line.
pub fn draw_text(
    img: &mut RgbaImage,
    text: &str,
    pos: (i32, i32),
    face: &Face,
    align: Align,
    color: Rgba<u8>,
) -> i32 {
    let (x, mut y) = pos;
    let line_height = face.line_height();

    for line in text.lines() {
        if let Some(font) = &face.font {
            let (width, _) = face.text_size(line);
            let left = match align {
                Align::Left => x,
                Align::Center => x - width / 2,
                Align::Right => x - width,
            };
            draw_text_mut(img, color, left, y, face.scale(), font, line);
        }
        y += line_height;
    }

    y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#666"), Some(Rgba([0x66, 0x66, 0x66, 255])));
        assert_eq!(parse_color("#000000"), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(parse_color("12ab34"), Some(Rgba([0x12, 0xab, 0x34, 255])));
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
    }

    #[test]
    fn test_missing_face_draws_nothing() {
        let mut img = RgbaImage::from_pixel(50, 50, Rgba([255, 255, 255, 255]));
        let face = Face::missing(20.0);
        let next = draw_text(&mut img, "a\nb", (0, 0), &face, Align::Left, Rgba([0, 0, 0, 255]));
        assert_eq!(next, 40);
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255, 255]));
        assert_eq!(face.text_size("hello"), (0, 0));
    }

    #[test]
    fn test_embedded_font_parses() {
        assert!(embedded_font().is_some());
        assert!(Face::embedded(20.0).text_size("ERROR").0 > 0);
    }

    #[test]
    fn test_unreadable_font_file_falls_back_to_embedded() {
        let face = Face::load(Path::new("/nonexistent/font.ttf"), 12.0);
        assert!(face.is_loaded());
        assert_eq!(face.size(), 12.0);
    }

    #[test]
    fn test_unparsable_font_file_falls_back_to_embedded() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();

        let face = Face::load(&path, 12.0);
        assert!(face.is_loaded());
    }
}
