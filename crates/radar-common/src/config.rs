//! Configuration loading for the rain cloud panel.
//!
//! The configuration is a single YAML document:
//!
//! ```yaml
//! rain_cloud:
//!   panel: { width: 1000, height: 600 }
//!   data: { url: "https://www.jma.go.jp/bosai/nowc/" }
//!   legend: { bar_size: 50, offset_x: 10, offset_y: 500 }
//!   layout: side_by_side
//! font:
//!   path: ./font
//!   map:
//!     jp_medium: A-OTF-UDShinGoPro-Medium.otf
//!     en_medium: FuturaStd-Medium.otf
//!     en_bold: FuturaStd-Bold.otf
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{RadarError, RadarResult};
use crate::types::PanelLayout;

/// Root configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub rain_cloud: RainCloudConfig,
    pub font: FontConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub slack: Option<SlackConfig>,
}

impl AppConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> RadarResult<Self> {
        let config: AppConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> RadarResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RadarError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Reject values that cannot produce a panel.
    pub fn validate(&self) -> RadarResult<()> {
        let panel = &self.rain_cloud.panel;
        if panel.width == 0 || panel.height == 0 {
            return Err(RadarError::Config(format!(
                "panel size must be non-zero, got {}x{}",
                panel.width, panel.height
            )));
        }
        let (sub_w, sub_h) = self.rain_cloud.layout.subframe_size(panel.width, panel.height);
        if sub_w == 0 || sub_h == 0 {
            return Err(RadarError::Config(format!(
                "panel {}x{} is too small for layout {:?}",
                panel.width, panel.height, self.rain_cloud.layout
            )));
        }
        if self.rain_cloud.timing.retry_count == 0 {
            return Err(RadarError::Config("retry_count must be at least 1".to_string()));
        }
        if self.rain_cloud.legend.bar_size == 0 {
            return Err(RadarError::Config("legend.bar_size must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Rain cloud panel section.
#[derive(Debug, Clone, Deserialize)]
pub struct RainCloudConfig {
    pub panel: PanelSize,
    pub data: DataConfig,
    pub legend: LegendConfig,
    #[serde(default)]
    pub layout: PanelLayout,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PanelSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Interactive radar map page.
    pub url: String,
}

/// Magnified legend placement.
#[derive(Debug, Clone, Deserialize)]
pub struct LegendConfig {
    /// Edge length in pixels of one magnified legend cell.
    pub bar_size: u32,
    pub offset_x: i64,
    pub offset_y: i64,
}

/// Viewport cache file settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data/window_size.cache")
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Retry, backoff, settle and timeout constants.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub retry_count: u32,
    pub retry_delay_ms: u64,
    pub settle_ms: u64,
    pub stagger_ms: u64,
    pub element_timeout_ms: u64,
    pub calibration_settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            retry_count: 5,
            retry_delay_ms: 5000,
            settle_ms: 500,
            stagger_ms: 2000,
            element_timeout_ms: 5000,
            calibration_settle_ms: 1000,
        }
    }
}

impl TimingConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn calibration_settle(&self) -> Duration {
        Duration::from_millis(self.calibration_settle_ms)
    }
}

/// Font directory and face file names.
#[derive(Debug, Clone, Deserialize)]
pub struct FontConfig {
    pub path: PathBuf,
    pub map: FontMap,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FontMap {
    pub jp_medium: String,
    pub en_medium: String,
    pub en_bold: String,
}

impl FontConfig {
    pub fn jp_medium(&self) -> PathBuf {
        self.path.join(&self.map.jp_medium)
    }

    pub fn en_medium(&self) -> PathBuf {
        self.path.join(&self.map.en_medium)
    }

    pub fn en_bold(&self) -> PathBuf {
        self.path.join(&self.map.en_bold)
    }
}

/// Headless browser launch options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub sandbox: bool,
    /// Chrome binary; autodetected when absent.
    pub chrome_path: Option<PathBuf>,
    pub idle_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: false,
            chrome_path: None,
            idle_timeout_secs: 120,
        }
    }
}

/// Error reporting channel credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    pub bot_token: String,
    pub error: SlackErrorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackErrorConfig {
    pub channel: SlackChannel,
    /// Minimum minutes between two error reports.
    #[serde(default = "default_interval_min")]
    pub interval_min: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackChannel {
    pub name: String,
    pub id: String,
}

fn default_interval_min() -> u64 {
    60
}
