//! Common types and utilities shared across the rain cloud panel crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    AppConfig, BrowserConfig, CacheConfig, DataConfig, FontConfig, FontMap, LegendConfig,
    PanelSize, RainCloudConfig, SlackChannel, SlackConfig, SlackErrorConfig, TimingConfig,
};
pub use error::{RadarError, RadarResult};
pub use types::{PanelLayout, SubFrameSpec, WindowSize};
