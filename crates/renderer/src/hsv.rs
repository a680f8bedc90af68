//! Full-range 8-bit HSV conversion.
//!
//! Hue is stored on a 0-255 scale covering the whole 0-360° circle, so a
//! single byte per channel holds the value. Saturation and value are 0-255.

/// An HSV triple with all channels on the 0-255 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

/// Convert an RGB pixel to full-range HSV.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let s = if max > 0.0 {
        (delta * 255.0 / max).round()
    } else {
        0.0
    };

    let hue_deg = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    let hue_deg = if hue_deg < 0.0 { hue_deg + 360.0 } else { hue_deg };

    // 360° maps onto 256 steps; a full turn wraps back to 0.
    let h = ((hue_deg * 256.0 / 360.0).round() as u32 % 256) as u8;

    Hsv {
        h,
        s: s as u8,
        v: max as u8,
    }
}

/// Convert a full-range HSV triple back to RGB.
pub fn hsv_to_rgb(hsv: Hsv) -> [u8; 3] {
    let v = hsv.v as f32;
    if hsv.s == 0 {
        let v = hsv.v;
        return [v, v, v];
    }

    let s = hsv.s as f32 / 255.0;
    let hue = hsv.h as f32 * 6.0 / 256.0;
    let sector = hue.floor();
    let f = hue - sector;

    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector as u32 % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    [clamp_u8(r), clamp_u8(g), clamp_u8(b)]
}

#[inline]
fn clamp_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
