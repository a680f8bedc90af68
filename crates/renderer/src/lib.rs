//! Image rendering for the rain cloud panel.
//!
//! Implements:
//! - Rainfall intensity reclassification (HSV masks onto a gamma ramp)
//! - Distance rings and caption boxes
//! - The magnified intensity legend
//! - The error placeholder panel
//! - PNG output encoding

pub mod error_panel;
pub mod hsv;
pub mod intensity;
pub mod legend;
pub mod overlay;
pub mod png;
pub mod text;

pub use error_panel::{error_image, ERROR_MARKER};
pub use intensity::{DecodedFrame, IntensityDecoder, IntensityLevel, RAINFALL_INTENSITY_LEVELS};
pub use png::{encode_panel, PngColorMode};
pub use text::{embedded_font, Align, Face, FaceMap};
