//! Magnified intensity legend.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::debug;

use crate::intensity::IntensityLevel;
use crate::overlay::fill_rounded_rect;
use crate::text::{draw_text, parse_color, Align, FaceMap};

const PADDING: i32 = 20;
const TEXT_MARGIN: f32 = 1.2;
const PLATE_RADIUS: i32 = 8;
const PLATE_ALPHA: u8 = 200;
const UNIT: &str = "mm/h";

/// Render the legend plate for a 1×N swatch strip.
///
/// Each swatch is magnified to a `bar_size` square cell. Numeric band
/// labels sit above the right edge of their cell; the open-ended top bucket
/// gets the unit label instead.
pub fn render_legend(
    swatch: &RgbaImage,
    levels: &[IntensityLevel],
    bar_size: u32,
    faces: &FaceMap,
) -> RgbaImage {
    let cells = swatch.width().max(1);
    let mut bar = imageops::resize(swatch, cells * bar_size, bar_size, FilterType::Nearest);

    let outline = Rgba([20, 20, 20, 255]);
    for i in 0..cells as i32 {
        let x0 = (bar_size as i32 * i - 1).max(0);
        let x1 = bar_size as i32 * (i + 1) - 1;
        let rect = Rect::at(x0, 0).of_size((x1 - x0 + 1) as u32, bar_size);
        draw_hollow_rect_mut(&mut bar, rect, outline);
    }

    let (_, digit_height) = faces.legend.text_size("0");
    let text_height = (digit_height as f32 * TEXT_MARGIN) as i32;
    let (unit_width, unit_height) = faces.legend_unit.text_size(UNIT);
    let (unit_overlap, _) = faces.legend_unit.text_size(&UNIT[..1]);

    let width = bar.width() as i32 + PADDING * 2 + unit_width - unit_overlap;
    let height = bar.height() as i32 + PADDING * 2 + text_height;
    let mut legend = RgbaImage::from_pixel(
        width.max(1) as u32,
        height.max(1) as u32,
        Rgba([255, 255, 255, 0]),
    );
    fill_rounded_rect(
        &mut legend,
        (0, 0),
        (width - 1, height - 1),
        PLATE_RADIUS,
        Rgba([255, 255, 255, PLATE_ALPHA]),
    );

    imageops::replace(&mut legend, &bar, PADDING as i64, (PADDING + text_height) as i64);

    let gray = parse_color("#666").unwrap_or(Rgba([102, 102, 102, 255]));
    for (i, level) in levels.iter().enumerate().take(cells as usize) {
        let right_edge = PADDING + bar_size as i32 * (i as i32 + 1);
        match level.value {
            Some(value) => {
                draw_text(
                    &mut legend,
                    &value.to_string(),
                    (right_edge, PADDING),
                    &faces.legend,
                    Align::Center,
                    gray,
                );
            }
            None => {
                draw_text(
                    &mut legend,
                    UNIT,
                    (right_edge - unit_overlap, PADDING + digit_height - unit_height),
                    &faces.legend_unit,
                    Align::Left,
                    gray,
                );
            }
        }
    }

    legend
}

/// Render the legend and blend it onto `img` at `offset`.
pub fn draw_legend(
    img: &mut RgbaImage,
    swatch: &RgbaImage,
    levels: &[IntensityLevel],
    bar_size: u32,
    offset: (i64, i64),
    faces: &FaceMap,
) {
    debug!(x = offset.0, y = offset.1, "draw legend");
    let legend = render_legend(swatch, levels, bar_size, faces);
    imageops::overlay(img, &legend, offset.0, offset.1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intensity::{IntensityDecoder, RAINFALL_INTENSITY_LEVELS};

    fn swatch() -> RgbaImage {
        let decoder = IntensityDecoder::default();
        let mut strip = RgbaImage::new(RAINFALL_INTENSITY_LEVELS.len() as u32, 1);
        for i in 0..RAINFALL_INTENSITY_LEVELS.len() {
            strip.put_pixel(i as u32, 0, decoder.ramp_rgba(i));
        }
        strip
    }

    #[test]
    fn test_legend_size_without_fonts() {
        let legend = render_legend(&swatch(), &RAINFALL_INTENSITY_LEVELS, 10, &FaceMap::missing());
        assert_eq!(legend.width(), 80 + 40);
        assert_eq!(legend.height(), 10 + 40);
    }

    #[test]
    fn test_cells_are_magnified_with_nearest_neighbor() {
        let strip = swatch();
        let legend = render_legend(&strip, &RAINFALL_INTENSITY_LEVELS, 10, &FaceMap::missing());
        // Interior of the third cell keeps the exact swatch color.
        let p = legend.get_pixel(PADDING as u32 + 25, PADDING as u32 + 5);
        assert_eq!(*p, *strip.get_pixel(2, 0));
        // Cell borders are outlined.
        let border = legend.get_pixel(PADDING as u32 + 19, PADDING as u32 + 5);
        assert_eq!(border.0, [20, 20, 20, 255]);
    }

    #[test]
    fn test_draw_legend_clips_to_canvas() {
        let mut img = RgbaImage::from_pixel(60, 30, Rgba([0, 0, 0, 255]));
        draw_legend(
            &mut img,
            &swatch(),
            &RAINFALL_INTENSITY_LEVELS,
            10,
            (30, 10),
            &FaceMap::missing(),
        );
        assert_eq!(img.dimensions(), (60, 30));
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }
}
