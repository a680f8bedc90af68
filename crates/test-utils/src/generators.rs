//! Synthetic radar captures for testing.
//!
//! The colors below reproduce the radar map's rainfall palette. Each one falls
//! inside exactly one classification window, so tests can predict which level
//! a pixel lands in.

use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

/// Palette colors in classification-table order, weakest rain first.
pub const RADAR_PALETTE: [[u8; 3]; 8] = [
    [242, 242, 255], // < 1 mm/h
    [160, 210, 255], // 1-5
    [33, 140, 255],  // 5-10
    [0, 65, 255],    // 10-20
    [250, 245, 0],   // 20-30
    [255, 153, 0],   // 30-50
    [255, 40, 0],    // 50-80
    [180, 0, 104],   // >= 80
];

/// Low-saturation base-map color.
pub const TERRAIN_GRAY: [u8; 3] = [100, 100, 100];

/// Encode an RGB image as PNG bytes.
pub fn encode_png(img: RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .expect("Failed to encode test PNG");
    buf
}

/// A capture filled with a single color.
pub fn uniform_radar_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode_png(RgbImage::from_pixel(width, height, Rgb(color)))
}

/// A capture with one vertical band per palette color over a terrain
/// background. The rightmost eighth of the image stays terrain.
pub fn banded_radar_png(width: u32, height: u32) -> Vec<u8> {
    let band = (width / (RADAR_PALETTE.len() as u32 + 1)).max(1);
    let img = RgbImage::from_fn(width, height, |x, _| {
        let index = (x / band) as usize;
        Rgb(RADAR_PALETTE.get(index).copied().unwrap_or(TERRAIN_GRAY))
    });
    encode_png(img)
}
