//! PNG encoding for finished panels.
//!
//! Supports two encoding modes:
//! - **RGBA PNG (color type 6)**: full color with alpha, for previews.
//! - **Grayscale PNG (color type 0)**: 8-bit luminance for the e-ink device.
//!   Translucent pixels are flattened onto white first.

use std::io::Write;

use image::RgbaImage;
use rayon::prelude::*;

use radar_common::{RadarError, RadarResult};

/// Output color model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PngColorMode {
    #[default]
    Rgba,
    Grayscale,
}

/// Encode a panel image as PNG.
pub fn encode_panel(img: &RgbaImage, mode: PngColorMode) -> RadarResult<Vec<u8>> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    match mode {
        PngColorMode::Rgba => create_png(img.as_raw(), width, height, 6, 4),
        PngColorMode::Grayscale => {
            let gray = to_luminance(img.as_raw());
            create_png(&gray, width, height, 0, 1)
        }
    }
}

/// Flatten RGBA onto white and reduce to 8-bit luminance (Rec. 601).
fn to_luminance(pixels: &[u8]) -> Vec<u8> {
    pixels
        .par_chunks_exact(4)
        .map(|px| {
            let a = px[3] as f32 / 255.0;
            let flat = |c: u8| c as f32 * a + 255.0 * (1.0 - a);
            let y = 0.299 * flat(px[0]) + 0.587 * flat(px[1]) + 0.114 * flat(px[2]);
            y.round().clamp(0.0, 255.0) as u8
        })
        .collect()
}

fn create_png(
    pixels: &[u8],
    width: usize,
    height: usize,
    color_type: u8,
    channels: usize,
) -> RadarResult<Vec<u8>> {
    if pixels.len() != width * height * channels {
        return Err(RadarError::Render(format!(
            "pixel buffer is {} bytes, expected {}x{}x{}",
            pixels.len(),
            width,
            height,
            channels
        )));
    }

    let mut png = Vec::new();

    // PNG signature
    png.extend_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);

    // IHDR chunk
    let mut ihdr_data = Vec::with_capacity(13);
    ihdr_data.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr_data.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr_data.push(8); // bit depth
    ihdr_data.push(color_type);
    ihdr_data.push(0); // compression method
    ihdr_data.push(0); // filter method
    ihdr_data.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr_data);

    // IDAT chunk (image data)
    let idat_data = deflate_idat(pixels, width * channels, height)
        .map_err(|e| RadarError::Render(format!("IDAT compression failed: {}", e)))?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    // IEND chunk
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Write a PNG chunk
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Deflate scanlines for the IDAT chunk.
fn deflate_idat(pixels: &[u8], stride: usize, height: usize) -> std::io::Result<Vec<u8>> {
    // Each scanline is prefixed with filter type 0 (none).
    let mut uncompressed = Vec::with_capacity(height * (1 + stride));
    for row in pixels.chunks_exact(stride.max(1)).take(height) {
        uncompressed.push(0);
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&uncompressed)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_rgba_png_decodes_back() {
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        img.put_pixel(1, 1, Rgba([200, 100, 50, 128]));
        let png = encode_panel(&img, PngColorMode::Rgba).unwrap();
        assert_eq!(&png[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_grayscale_flattens_onto_white() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 0]));
        let png = encode_panel(&img, PngColorMode::Grayscale).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(decoded.get_pixel(0, 0).0, [0]);
        assert_eq!(decoded.get_pixel(1, 0).0, [255]);
    }

    #[test]
    fn test_ihdr_records_color_type() {
        let img = RgbaImage::new(4, 4);
        let png = encode_panel(&img, PngColorMode::Grayscale).unwrap();
        // signature(8) + length(4) + "IHDR"(4) + width(4) + height(4) + depth(1)
        assert_eq!(png[24], 8);
        assert_eq!(png[25], 0);
    }
}
