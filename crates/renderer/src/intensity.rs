//! Rainfall intensity reclassification.
//!
//! The radar map paints precipitation with its own palette. Each palette
//! entry is recognized by a hue/saturation window and replaced by a shade
//! from a gamma-shaped ramp so the result reads on a grayscale display.
//!
//! Rules are applied in list order as mask overwrites: when a pixel falls
//! inside more than one window, the **last** matching rule decides its color.
//! Every predicate is evaluated against the captured pixel, never against a
//! color written by an earlier rule.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use tracing::{debug, instrument};

use radar_common::{RadarError, RadarResult};

use crate::hsv::{hsv_to_rgb, rgb_to_hsv, Hsv};

/// Exponent of the output ramp.
pub const RAMP_GAMMA: f32 = 0.6;

/// Saturation of every reclassified pixel.
pub const RAMP_SATURATION: u8 = 80;

/// Pixels below this saturation are treated as base-map terrain.
pub const TERRAIN_SATURATION_MAX: u8 = 30;

/// Terrain brightening curve: `v' = v^TERRAIN_EXPONENT * TERRAIN_SCALE`.
pub const TERRAIN_EXPONENT: f32 = 1.35;
pub const TERRAIN_SCALE: f32 = 0.3;

/// One classification rule of the intensity table.
#[derive(Debug, Clone, Copy)]
pub struct IntensityLevel {
    /// Palette color this rule recognizes.
    pub name: &'static str,
    /// Lower bound of the band in mm/h; `None` for the open-ended top bucket.
    pub value: Option<u32>,
    matches: fn(u8, u8) -> bool,
}

impl IntensityLevel {
    /// Whether a pixel with the given hue and saturation belongs to this level.
    #[inline]
    pub fn matches(&self, h: u8, s: u8) -> bool {
        (self.matches)(h, s)
    }
}

/// Classification table, weakest rain first.
pub static RAINFALL_INTENSITY_LEVELS: [IntensityLevel; 8] = [
    IntensityLevel { name: "white", value: Some(1), matches: is_white },
    IntensityLevel { name: "pale-cyan", value: Some(5), matches: is_pale_cyan },
    IntensityLevel { name: "cyan", value: Some(10), matches: is_cyan },
    IntensityLevel { name: "blue", value: Some(20), matches: is_blue },
    IntensityLevel { name: "yellow", value: Some(30), matches: is_yellow },
    IntensityLevel { name: "orange", value: Some(50), matches: is_orange },
    IntensityLevel { name: "red", value: Some(80), matches: is_red },
    IntensityLevel { name: "purple", value: None, matches: is_purple },
];

fn is_white(h: u8, s: u8) -> bool {
    160 < h && h < 180 && s < 20
}

fn is_pale_cyan(h: u8, s: u8) -> bool {
    140 < h && h < 150 && 90 < s && s < 100
}

fn is_cyan(h: u8, s: u8) -> bool {
    145 < h && h < 155 && 210 < s && s < 230
}

fn is_blue(h: u8, s: u8) -> bool {
    155 < h && h < 165 && 230 < s
}

fn is_yellow(h: u8, _s: u8) -> bool {
    35 < h && h < 45
}

fn is_orange(h: u8, _s: u8) -> bool {
    20 < h && h < 30
}

fn is_red(h: u8, _s: u8) -> bool {
    0 < h && h < 8
}

fn is_purple(h: u8, s: u8) -> bool {
    225 < h && h < 235 && 240 < s
}

/// Output of [`IntensityDecoder::decode`].
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Recolored capture.
    pub image: RgbaImage,
    /// 1×N strip holding one ramp color per level, in table order.
    pub legend: RgbaImage,
}

/// Reclassifies captured radar rasters into the calibrated ramp.
#[derive(Debug, Clone, Copy)]
pub struct IntensityDecoder {
    levels: &'static [IntensityLevel],
}

impl Default for IntensityDecoder {
    fn default() -> Self {
        Self::new(&RAINFALL_INTENSITY_LEVELS)
    }
}

impl IntensityDecoder {
    pub fn new(levels: &'static [IntensityLevel]) -> Self {
        Self { levels }
    }

    pub fn levels(&self) -> &'static [IntensityLevel] {
        self.levels
    }

    /// Ramp color of the level at `index` (table order).
    ///
    /// Rank counts from the weakest level upward, so the strongest rain
    /// maps to the brightest value.
    pub fn ramp_color(&self, index: usize) -> Hsv {
        let count = self.levels.len() as f32;
        let rank = (index + 1) as f32;
        let value = 255.0 * (rank / count).powf(RAMP_GAMMA);
        Hsv::new(0, RAMP_SATURATION, value.round().clamp(0.0, 255.0) as u8)
    }

    /// Ramp color of the level at `index`, as RGBA.
    pub fn ramp_rgba(&self, index: usize) -> Rgba<u8> {
        let [r, g, b] = hsv_to_rgb(self.ramp_color(index));
        Rgba([r, g, b, 255])
    }

    /// Decode a PNG capture and reclassify it.
    #[instrument(skip_all, fields(bytes = raster.len()))]
    pub fn decode(&self, raster: &[u8]) -> RadarResult<DecodedFrame> {
        debug!("retouch image");
        let decoded = image::load_from_memory(raster)
            .map_err(|e| RadarError::Decode(format!("{}", e)))?;
        let rgb = decoded.to_rgb8();
        if rgb.width() == 0 || rgb.height() == 0 {
            return Err(RadarError::Decode("captured raster is empty".to_string()));
        }
        Ok(self.reclassify(&rgb))
    }

    /// Reclassify an already-decoded RGB raster.
    pub fn reclassify(&self, rgb: &image::RgbImage) -> DecodedFrame {
        let width = rgb.width();
        let height = rgb.height();
        let ramp: Vec<Rgba<u8>> = (0..self.levels.len()).map(|i| self.ramp_rgba(i)).collect();

        let mut legend = RgbaImage::new(self.levels.len() as u32, 1);
        for (i, color) in ramp.iter().enumerate() {
            legend.put_pixel(i as u32, 0, *color);
        }

        if width == 0 || height == 0 {
            return DecodedFrame {
                image: RgbaImage::new(width, height),
                legend,
            };
        }

        let src = rgb.as_raw();
        let mut out = vec![0u8; (width * height * 4) as usize];

        out.par_chunks_mut(width as usize * 4)
            .zip(src.par_chunks(width as usize * 3))
            .for_each(|(dst_row, src_row)| {
                for (dst, px) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(3)) {
                    let [r, g, b] = self.reclassify_pixel(px[0], px[1], px[2], &ramp);
                    dst.copy_from_slice(&[r, g, b, 255]);
                }
            });

        let image = RgbaImage::from_raw(width, height, out)
            .unwrap_or_else(|| RgbaImage::new(width, height));

        DecodedFrame { image, legend }
    }

    fn reclassify_pixel(&self, r: u8, g: u8, b: u8, ramp: &[Rgba<u8>]) -> [u8; 3] {
        let hsv = rgb_to_hsv(r, g, b);

        // Sequential overwrite: the last matching rule wins.
        let mut matched = None;
        for (i, level) in self.levels.iter().enumerate() {
            if level.matches(hsv.h, hsv.s) {
                matched = Some(i);
            }
        }

        if let Some(i) = matched {
            let c = ramp[i];
            return [c[0], c[1], c[2]];
        }

        if hsv.s < TERRAIN_SATURATION_MAX {
            return hsv_to_rgb(Hsv::new(hsv.h, hsv.s, brighten_terrain(hsv.v)));
        }

        hsv_to_rgb(hsv)
    }
}

/// Lighten low-saturation base-map pixels.
pub fn brighten_terrain(value: u8) -> u8 {
    let v = (value as f32).powf(TERRAIN_EXPONENT) * TERRAIN_SCALE;
    v.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_table_has_single_open_bucket_at_the_end() {
        let open: Vec<_> = RAINFALL_INTENSITY_LEVELS
            .iter()
            .enumerate()
            .filter(|(_, l)| l.value.is_none())
            .collect();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].0, RAINFALL_INTENSITY_LEVELS.len() - 1);
    }

    #[test]
    fn test_ramp_brightens_with_intensity() {
        let decoder = IntensityDecoder::default();
        let values: Vec<u8> = (0..8).map(|i| decoder.ramp_color(i).v).collect();
        assert!(values.windows(2).all(|w| w[0] < w[1]), "{:?}", values);
        assert_eq!(values[7], 255);
        // 255 * (1/8)^0.6
        assert_eq!(values[0], 73);
    }

    #[test]
    fn test_ramp_is_tinted_red() {
        let decoder = IntensityDecoder::default();
        let c = decoder.ramp_color(3);
        assert_eq!((c.h, c.s), (0, RAMP_SATURATION));
    }

    #[test]
    fn test_yellow_maps_to_its_level() {
        // Hue ~40 on the full scale is roughly 56°: a warm yellow.
        let decoder = IntensityDecoder::default();
        let px = hsv_to_rgb(Hsv::new(40, 255, 255));
        let img = RgbImage::from_pixel(4, 4, Rgb(px));
        let frame = decoder.reclassify(&img);
        let expected = decoder.ramp_rgba(4);
        assert!(frame.image.pixels().all(|p| *p == expected));
    }

    #[test]
    fn test_last_matching_rule_wins() {
        fn wide(h: u8, _s: u8) -> bool {
            100 < h && h < 200
        }
        fn narrow(h: u8, _s: u8) -> bool {
            140 < h && h < 160
        }
        // A hue of 150 falls inside both windows.
        static OVERLAP: [IntensityLevel; 2] = [
            IntensityLevel { name: "wide", value: Some(1), matches: wide },
            IntensityLevel { name: "narrow", value: None, matches: narrow },
        ];
        let decoder = IntensityDecoder::new(&OVERLAP);
        let px = hsv_to_rgb(Hsv::new(150, 200, 200));
        let frame = decoder.reclassify(&RgbImage::from_pixel(1, 1, Rgb(px)));
        assert_eq!(*frame.image.get_pixel(0, 0), decoder.ramp_rgba(1));
        assert_ne!(decoder.ramp_rgba(0), decoder.ramp_rgba(1));
    }

    #[test]
    fn test_terrain_is_brightened() {
        let decoder = IntensityDecoder::default();
        let frame = decoder.reclassify(&RgbImage::from_pixel(2, 2, Rgb([100, 100, 100])));
        let p = frame.image.get_pixel(0, 0);
        let expected = brighten_terrain(100);
        assert_eq!(p.0, [expected, expected, expected, 255]);
        assert!(expected > 100);
    }

    #[test]
    fn test_saturated_unclassified_pixel_is_kept() {
        // Pure green (hue 85) matches no rule and is saturated.
        let decoder = IntensityDecoder::default();
        let frame = decoder.reclassify(&RgbImage::from_pixel(1, 1, Rgb([0, 255, 0])));
        let p = frame.image.get_pixel(0, 0);
        assert!(p[1] >= 250 && p[0] <= 3 && p[2] <= 3, "{:?}", p);
    }

    #[test]
    fn test_brighten_terrain_clamps() {
        assert_eq!(brighten_terrain(0), 0);
        assert_eq!(brighten_terrain(255), 255);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let decoder = IntensityDecoder::default();
        let err = decoder.decode(b"definitely not a png").unwrap_err();
        assert_eq!(err.category(), "DecodeFailure");
    }
}
