//! Tests that need a real font. They are skipped when none is installed.

use image::{Rgba, RgbaImage};
use renderer::error_panel::error_image;
use renderer::overlay::draw_caption;
use renderer::text::{draw_text, Align, Face};
use renderer::FaceMap;
use test_utils::require_font;

fn non_white(img: &RgbaImage) -> usize {
    img.pixels().filter(|p| p.0 != [255, 255, 255, 255]).count()
}

#[test]
fn test_text_size_grows_with_length() {
    let face = Face::from_font(require_font!(), 30.0);
    let (short, h1) = face.text_size("1");
    let (long, h2) = face.text_size("1000");
    assert!(long > short);
    assert!(h1 > 0 && h2 > 0);
}

#[test]
fn test_alignment_shifts_text() {
    let face = Face::from_font(require_font!(), 20.0);
    let black = Rgba([0, 0, 0, 255]);

    let mut left = RgbaImage::from_pixel(200, 40, Rgba([255, 255, 255, 255]));
    draw_text(&mut left, "50", (100, 5), &face, Align::Left, black);
    let mut right = RgbaImage::from_pixel(200, 40, Rgba([255, 255, 255, 255]));
    draw_text(&mut right, "50", (100, 5), &face, Align::Right, black);

    let leftmost = |img: &RgbaImage| {
        (0..img.width())
            .find(|&x| (0..img.height()).any(|y| img.get_pixel(x, y).0 != [255, 255, 255, 255]))
            .unwrap()
    };
    assert!(leftmost(&left) >= 100);
    assert!(leftmost(&right) < 100);
}

#[test]
fn test_caption_draws_title() {
    let face = Face::from_font(require_font!(), 50.0);
    let mut img = RgbaImage::from_pixel(300, 120, Rgba([255, 255, 255, 255]));
    draw_caption(&mut img, "Now", &face);
    assert!(non_white(&img) > 50);
}

#[test]
fn test_error_image_renders_marker_and_text() {
    let faces = FaceMap::uniform(require_font!());
    let blank = error_image(800, 480, "", &faces);
    let with_text = error_image(800, 480, "Traceback: something failed", &faces);

    assert_eq!(with_text.dimensions(), (800, 480));
    assert!(non_white(&blank) > 100);
    assert!(non_white(&with_text) > non_white(&blank));
}
