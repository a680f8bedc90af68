//! Per-frame annotations: distance rings, center marker and caption box.

use image::imageops;
use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::text::{draw_text, parse_color, Align, Face};

/// Diameter of the center marker.
pub const CENTER_MARKER_DIAMETER: u32 = 20;

/// Outer diameter of the 5 km ring at the map's fixed zoom level.
pub const RING_5KM_DIAMETER: u32 = 328;

/// Anchor the caption box is padded around.
const CAPTION_POS: (i32, i32) = (12, 12);
/// Top-left of the caption text, lower than the box anchor.
const CAPTION_TEXT_POS: (i32, i32) = (10, 20);
const CAPTION_PADDING: i32 = 10;
const CAPTION_RADIUS: i32 = 20;
const CAPTION_ALPHA: u8 = 200;

/// Fill the annulus between `diameter / 2 - width` and `diameter / 2`.
///
/// Matches an ellipse outline drawn inward from its bounding box.
pub fn draw_ring(
    img: &mut RgbaImage,
    center: (f32, f32),
    diameter: u32,
    width: u32,
    color: Rgba<u8>,
) {
    let outer = diameter as f32 / 2.0;
    let inner = (outer - width as f32).max(0.0);
    fill_annulus(img, center, inner, outer, color);
}

/// Fill a disk of the given diameter.
pub fn draw_disk(img: &mut RgbaImage, center: (f32, f32), diameter: u32, color: Rgba<u8>) {
    fill_annulus(img, center, 0.0, diameter as f32 / 2.0, color);
}

fn fill_annulus(img: &mut RgbaImage, center: (f32, f32), inner: f32, outer: f32, color: Rgba<u8>) {
    let (cx, cy) = center;
    let x0 = (cx - outer).floor().max(0.0) as u32;
    let y0 = (cy - outer).floor().max(0.0) as u32;
    let x1 = ((cx + outer).ceil().max(0.0) as u32).min(img.width());
    let y1 = ((cy + outer).ceil().max(0.0) as u32).min(img.height());

    let inner_sq = inner * inner;
    let outer_sq = outer * outer;
    for y in y0..y1 {
        for x in x0..x1 {
            // Sample at the pixel center.
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let d = dx * dx + dy * dy;
            if d <= outer_sq && d >= inner_sq {
                img.put_pixel(x, y, color);
            }
        }
    }
}

/// Draw the center marker and the 5 km distance ring.
pub fn draw_equidistant_circle(img: &mut RgbaImage) {
    debug!("draw equidistant circle");
    let center = (img.width() as f32 / 2.0, img.height() as f32 / 2.0);

    draw_disk(img, center, CENTER_MARKER_DIAMETER, Rgba([255, 255, 255, 255]));
    draw_ring(img, center, CENTER_MARKER_DIAMETER, 5, Rgba([60, 60, 60, 255]));

    // White halo under a gray ring keeps the ring visible on any background.
    draw_ring(img, center, RING_5KM_DIAMETER, 16, Rgba([255, 255, 255, 255]));
    draw_ring(img, center, RING_5KM_DIAMETER - 6, 10, Rgba([180, 180, 180, 255]));
}

/// Fill a rectangle with inclusive corners `(x0, y0)`-`(x1, y1)`, rounding
/// each corner with `radius`.
pub fn fill_rounded_rect(
    img: &mut RgbaImage,
    (x0, y0): (i32, i32),
    (x1, y1): (i32, i32),
    radius: i32,
    color: Rgba<u8>,
) {
    let radius = radius.max(0).min((x1 - x0) / 2).min((y1 - y0) / 2);
    let r_sq = (radius * radius) as i64;

    for y in y0.max(0)..=y1.min(img.height() as i32 - 1) {
        for x in x0.max(0)..=x1.min(img.width() as i32 - 1) {
            let cx = if x < x0 + radius {
                Some(x0 + radius)
            } else if x > x1 - radius {
                Some(x1 - radius)
            } else {
                None
            };
            let cy = if y < y0 + radius {
                Some(y0 + radius)
            } else if y > y1 - radius {
                Some(y1 - radius)
            } else {
                None
            };
            if let (Some(cx), Some(cy)) = (cx, cy) {
                let dx = (x - cx) as i64;
                let dy = (y - cy) as i64;
                if dx * dx + dy * dy > r_sq {
                    continue;
                }
            }
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Draw a translucent caption box with the frame title in the top-left
/// corner. Only the bottom-right corner of the box is rounded.
pub fn draw_caption(img: &mut RgbaImage, title: &str, face: &Face) {
    debug!(title, "draw caption");
    let (text_w, text_h) = face.text_size(title);
    let (x, y) = CAPTION_POS;
    let pad = CAPTION_PADDING;
    let fill = Rgba([255, 255, 255, CAPTION_ALPHA]);

    let right = x + text_w + pad;
    let bottom = y + text_h + pad / 2;

    let mut overlay = RgbaImage::from_pixel(img.width(), img.height(), Rgba([255, 255, 255, 0]));
    fill_rounded_rect(&mut overlay, (x - pad, y - pad), (right, bottom), CAPTION_RADIUS, fill);
    // Square off the other three corners.
    fill_rounded_rect(&mut overlay, (x - pad, y - pad), (right - CAPTION_RADIUS, bottom), 0, fill);
    fill_rounded_rect(&mut overlay, (x - pad, y - pad), (right, y + pad / 2), 0, fill);
    imageops::overlay(img, &overlay, 0, 0);

    let black = parse_color("#000").unwrap_or(Rgba([0, 0, 0, 255]));
    draw_text(img, title, CAPTION_TEXT_POS, face, Align::Left, black);
}
