//! Whole-panel retry loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use image::RgbaImage;
use tracing::{error, info, warn};

use radar_common::RainCloudConfig;
use renderer::{error_image, FaceMap};

use crate::notify::format_traceback;

/// Produces one complete panel image per call.
#[async_trait]
pub trait Compose: Send + Sync {
    async fn compose(&self) -> Result<RgbaImage>;
}

/// Outcome of [`RetrySupervisor::produce`].
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub image: RgbaImage,
    /// Measured from the start of the first attempt.
    pub elapsed: Duration,
    /// Diagnostic text of the last failure; present only when every attempt
    /// failed and `image` is the error placeholder.
    pub error: Option<String>,
}

impl PipelineResult {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// Retries the composer and falls back to an error placeholder.
pub struct RetrySupervisor<C> {
    composer: C,
    retry_count: u32,
    retry_delay: Duration,
    panel: (u32, u32),
    faces: Arc<FaceMap>,
}

impl<C: Compose> RetrySupervisor<C> {
    pub fn new(composer: C, config: &RainCloudConfig, faces: Arc<FaceMap>) -> Self {
        Self {
            composer,
            retry_count: config.timing.retry_count.max(1),
            retry_delay: config.timing.retry_delay(),
            panel: (config.panel.width, config.panel.height),
            faces,
        }
    }

    pub fn composer(&self) -> &C {
        &self.composer
    }

    /// Run up to `retry_count` sequential attempts.
    ///
    /// Never fails: when every attempt errors, the result carries the
    /// placeholder image and the last diagnostic text.
    pub async fn produce(&self) -> PipelineResult {
        info!(attempts = self.retry_count, "create rain cloud panel");
        let start = Instant::now();
        let mut last_error = String::new();

        for attempt in 1..=self.retry_count {
            match self.composer.compose().await {
                Ok(image) => {
                    let elapsed = start.elapsed();
                    info!(attempt, elapsed_secs = elapsed.as_secs_f64(), "Panel created");
                    return PipelineResult {
                        image,
                        elapsed,
                        error: None,
                    };
                }
                Err(e) => {
                    last_error = format_traceback(&e);
                    error!(attempt, "{}", last_error);
                }
            }

            if attempt < self.retry_count {
                warn!(attempt, delay_ms = self.retry_delay.as_millis() as u64, "retry");
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        let (width, height) = self.panel;
        let image = error_image(width, height, &last_error, &self.faces);
        PipelineResult {
            image,
            elapsed: start.elapsed(),
            error: Some(last_error),
        }
    }
}
