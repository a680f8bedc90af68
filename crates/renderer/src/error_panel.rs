//! Placeholder panel shown when every attempt failed.

use image::{Rgba, RgbaImage};

use crate::text::{draw_text, parse_color, Align, FaceMap};

/// Marker drawn at the top of the placeholder.
pub const ERROR_MARKER: &str = "ERROR";

/// Column at which diagnostic text is wrapped.
pub const WRAP_COLUMNS: usize = 90;

/// Render a white panel with the error marker and wrapped diagnostic text.
pub fn error_image(width: u32, height: u32, error_text: &str, faces: &FaceMap) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    let gray = parse_color("#666").unwrap_or(Rgba([102, 102, 102, 255]));

    draw_text(&mut img, ERROR_MARKER, (10, 10), &faces.error_title, Align::Left, gray);
    draw_text(
        &mut img,
        &wrap_text(error_text, WRAP_COLUMNS).join("\n"),
        (20, 100),
        &faces.error_body,
        Align::Left,
        gray,
    );

    img
}

/// Greedy word wrap. Existing line breaks are kept and words longer than
/// `columns` are split.
pub fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > columns {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                lines.push(word.drain(..columns).collect());
            }
            let word: String = word.into_iter().collect();
            if word.is_empty() {
                continue;
            }
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > columns {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_respects_columns() {
        let text = "the quick brown fox jumps over the lazy dog";
        let lines = wrap_text(text, 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10), "{:?}", lines);
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap_text("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_keeps_line_breaks() {
        let lines = wrap_text("Traceback:\n  0: boom", 90);
        assert_eq!(lines, vec!["Traceback:", "0: boom"]);
    }

    fn ink_pixels(img: &RgbaImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> usize {
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .filter(|&(x, y)| img.get_pixel(x, y).0 != [255, 255, 255, 255])
            .count()
    }

    #[test]
    fn test_error_image_without_configured_fonts_still_draws_text() {
        let config = radar_common::FontConfig {
            path: "/nonexistent/fonts".into(),
            map: radar_common::FontMap {
                jp_medium: "jp.otf".to_string(),
                en_medium: "en.ttf".to_string(),
                en_bold: "en-bold.ttf".to_string(),
            },
        };
        let faces = FaceMap::load(&config);

        let img = error_image(400, 200, "Traceback: element timeout", &faces);

        assert_eq!(img.dimensions(), (400, 200));
        // Marker occupies the top band, diagnostic text starts at y = 100.
        assert!(ink_pixels(&img, 10..400, 10..100) > 100);
        assert!(ink_pixels(&img, 20..400, 100..200) > 0);
    }

    #[test]
    fn test_error_image_has_requested_size() {
        let img = error_image(320, 200, "something failed", &FaceMap::missing());
        assert_eq!(img.dimensions(), (320, 200));
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }
}
