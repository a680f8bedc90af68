//! Tests for rainfall reclassification of synthetic captures.
//!
//! The captures use the radar map's own palette, one color per level.

use renderer::{IntensityDecoder, RAINFALL_INTENSITY_LEVELS};
use test_utils::{banded_radar_png, uniform_radar_png, RADAR_PALETTE, TERRAIN_GRAY};

// ============================================================================
// Uniform captures
// ============================================================================

#[test]
fn test_each_palette_color_maps_to_its_level() {
    let decoder = IntensityDecoder::default();
    for (level, color) in RADAR_PALETTE.iter().enumerate() {
        let frame = decoder.decode(&uniform_radar_png(12, 7, *color)).unwrap();
        let expected = decoder.ramp_rgba(level);

        assert_eq!(frame.image.dimensions(), (12, 7));
        assert!(
            frame.image.pixels().all(|p| *p == expected),
            "level {} ({}) not uniform",
            level,
            RAINFALL_INTENSITY_LEVELS[level].name
        );
    }
}

#[test]
fn test_legend_strip_has_one_column_per_level() {
    let decoder = IntensityDecoder::default();
    let frame = decoder.decode(&uniform_radar_png(4, 4, RADAR_PALETTE[0])).unwrap();

    assert_eq!(frame.legend.dimensions(), (RAINFALL_INTENSITY_LEVELS.len() as u32, 1));
    for i in 0..RAINFALL_INTENSITY_LEVELS.len() {
        assert_eq!(*frame.legend.get_pixel(i as u32, 0), decoder.ramp_rgba(i));
    }
}

#[test]
fn test_legend_strip_is_independent_of_capture() {
    let decoder = IntensityDecoder::default();
    let a = decoder.decode(&uniform_radar_png(4, 4, RADAR_PALETTE[1])).unwrap();
    let b = decoder.decode(&banded_radar_png(90, 3)).unwrap();
    assert_eq!(a.legend, b.legend);
}

// ============================================================================
// Mixed captures
// ============================================================================

#[test]
fn test_banded_capture() {
    let decoder = IntensityDecoder::default();
    let frame = decoder.decode(&banded_radar_png(90, 3)).unwrap();

    for level in 0..RADAR_PALETTE.len() {
        let x = level as u32 * 10 + 5;
        assert_eq!(*frame.image.get_pixel(x, 1), decoder.ramp_rgba(level), "band {level}");
    }

    // The terrain tail is lightened, not reclassified.
    let terrain = frame.image.get_pixel(85, 1);
    assert!(terrain[0] > TERRAIN_GRAY[0], "{:?}", terrain);
    assert_eq!(terrain[0], terrain[1]);
    assert_eq!(terrain[1], terrain[2]);
}

#[test]
fn test_truncated_png_is_decode_failure() {
    let decoder = IntensityDecoder::default();
    let png = uniform_radar_png(10, 10, RADAR_PALETTE[2]);
    let err = decoder.decode(&png[..png.len() / 2]).unwrap_err();
    assert_eq!(err.category(), "DecodeFailure");
}
