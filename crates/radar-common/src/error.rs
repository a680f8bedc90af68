//! Error types for the radar acquisition pipeline.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using RadarError.
pub type RadarResult<T> = Result<T, RadarError>;

/// Primary error type for radar acquisition and decoding.
#[derive(Debug, Error)]
pub enum RadarError {
    // === Fetch Errors ===
    #[error("Timed out after {}ms waiting for element: {xpath}", timeout.as_millis())]
    ElementTimeout { xpath: String, timeout: Duration },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Script execution failed: {0}")]
    Script(String),

    #[error("Screenshot capture failed: {0}")]
    Capture(String),

    #[error("Browser driver error: {0}")]
    Driver(String),

    // === Calibration Errors ===
    #[error("Calibration timed out: {0}")]
    CalibrationTimeout(String),

    #[error("Viewport cache unreadable: {0}")]
    CacheRead(String),

    // === Decode / Render Errors ===
    #[error("Failed to decode captured raster: {0}")]
    Decode(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    // === Infrastructure Errors ===
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RadarError {
    /// Taxonomy label used in structured logs.
    pub fn category(&self) -> &'static str {
        match self {
            RadarError::ElementTimeout { .. }
            | RadarError::ElementNotFound(_)
            | RadarError::Script(_)
            | RadarError::Capture(_)
            | RadarError::Driver(_) => "FetchFailure",
            RadarError::CalibrationTimeout(_) => "CalibrationTimeout",
            RadarError::CacheRead(_) => "CacheReadFailure",
            RadarError::Decode(_) => "DecodeFailure",
            RadarError::Render(_) => "RenderFailure",
            RadarError::Config(_) => "ConfigError",
            RadarError::Io(_) => "IoError",
        }
    }

    /// Whether this error came from driving the remote map page.
    pub fn is_fetch_failure(&self) -> bool {
        self.category() == "FetchFailure"
    }
}

impl From<serde_json::Error> for RadarError {
    fn from(err: serde_json::Error) -> Self {
        RadarError::CacheRead(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for RadarError {
    fn from(err: serde_yaml::Error) -> Self {
        RadarError::Config(format!("YAML error: {}", err))
    }
}
