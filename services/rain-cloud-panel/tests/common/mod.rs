//! Shared helpers for the service integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use radar_common::{AppConfig, RainCloudConfig};
use rain_cloud_panel::{ErrorReport, Notifier};
use tempfile::TempDir;

pub const PANEL_WIDTH: u32 = 200;
pub const PANEL_HEIGHT: u32 = 100;

/// Panel config with millisecond timings and the cache under `dir`.
pub fn test_config(
    dir: &TempDir,
    layout: &str,
    stagger_ms: u64,
    retry_delay_ms: u64,
) -> RainCloudConfig {
    let yaml = format!(
        r#"
rain_cloud:
  panel: {{ width: {PANEL_WIDTH}, height: {PANEL_HEIGHT} }}
  data: {{ url: "https://radar.example.invalid/#zoom:11" }}
  legend: {{ bar_size: 10, offset_x: 80, offset_y: 50 }}
  layout: {layout}
  cache:
    path: {cache}
  timing:
    retry_count: 5
    retry_delay_ms: {retry_delay_ms}
    settle_ms: 0
    stagger_ms: {stagger_ms}
    element_timeout_ms: 20
    calibration_settle_ms: 0
font:
  path: /nonexistent
  map: {{ jp_medium: jp.otf, en_medium: en.otf, en_bold: en-bold.otf }}
"#,
        cache = dir.path().join("window_size.cache").display(),
    );
    AppConfig::from_yaml(&yaml).unwrap().rain_cloud
}

/// Notifier that keeps every report.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    reports: Arc<Mutex<Vec<ErrorReport>>>,
}

impl RecordingNotifier {
    pub fn reports(&self) -> Vec<ErrorReport> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, report: ErrorReport) -> Result<()> {
        self.reports.lock().unwrap().push(report);
        Ok(())
    }
}
