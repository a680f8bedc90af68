//! Composite of the current and +1h radar frames.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::{imageops, Rgba, RgbaImage};
use tracing::{info, instrument, warn};

use radar_browser::{SessionFactory, SnapshotFetcher, ViewportCalibrator};
use radar_common::{RainCloudConfig, SubFrameSpec};
use renderer::legend::draw_legend;
use renderer::overlay::{draw_caption, draw_equidistant_circle};
use renderer::{FaceMap, IntensityDecoder};

use crate::notify::{format_traceback, ErrorReport, Notifier};
use crate::supervisor::Compose;

const SCREENSHOT_CAPTION: &str = "エラー時のスクリーンショット";

/// One annotated subframe plus the legend swatch decoded with it.
struct RenderedFrame {
    image: RgbaImage,
    legend: RgbaImage,
}

/// A failed subframe pipeline, with the browser screenshot when one could
/// be taken before the session closed.
struct FrameFailure {
    error: anyhow::Error,
    screenshot: Option<Vec<u8>>,
}

impl From<anyhow::Error> for FrameFailure {
    fn from(error: anyhow::Error) -> Self {
        Self {
            error,
            screenshot: None,
        }
    }
}

/// Dependencies of a subframe pipeline, cloned into its blocking task.
#[derive(Clone)]
struct FramePipeline {
    factory: Arc<dyn SessionFactory>,
    calibrator: Arc<ViewportCalibrator>,
    fetcher: SnapshotFetcher,
    decoder: IntensityDecoder,
    faces: Arc<FaceMap>,
    url: String,
}

impl FramePipeline {
    /// Create a session, calibrate, capture, close the session, then decode
    /// and annotate the capture.
    fn run(
        &self,
        spec: &SubFrameSpec,
        width: u32,
        height: u32,
    ) -> Result<RenderedFrame, FrameFailure> {
        let png = self.capture(spec, width, height)?;

        info!(frame = spec.label(), "retouch image");
        let decoded = self
            .decoder
            .decode(&png)
            .with_context(|| format!("failed to decode {} cloud image", spec.label()))?;

        let mut image = decoded.image;
        draw_equidistant_circle(&mut image);
        draw_caption(&mut image, &spec.title, &self.faces.title);

        Ok(RenderedFrame {
            image,
            legend: decoded.legend,
        })
    }

    fn capture(
        &self,
        spec: &SubFrameSpec,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, FrameFailure> {
        let mut session = self
            .factory
            .create()
            .context("failed to start browser session")?;

        let result = self
            .calibrator
            .resolve(session.as_mut(), width, height)
            .context("viewport calibration failed")
            .and_then(|_| {
                self.fetcher
                    .fetch(session.as_mut(), &self.url, width, height, spec.is_future)
                    .with_context(|| format!("failed to fetch {} cloud image", spec.label()))
            });

        let outcome = match result {
            Ok(png) => Ok(png),
            Err(error) => {
                let screenshot = match session.full_page_screenshot() {
                    Ok(png) => Some(png),
                    Err(e) => {
                        warn!(error = %e, "Failed to take error screenshot");
                        None
                    }
                };
                Err(FrameFailure { error, screenshot })
            }
        };

        session.quit();
        outcome
    }
}

/// Builds the two-frame rain cloud panel.
pub struct FrameComposer {
    config: RainCloudConfig,
    pipeline: FramePipeline,
    notifier: Arc<dyn Notifier>,
}

impl FrameComposer {
    pub fn new(
        config: RainCloudConfig,
        faces: Arc<FaceMap>,
        factory: Arc<dyn SessionFactory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let pipeline = FramePipeline {
            factory,
            calibrator: Arc::new(ViewportCalibrator::from_config(&config)),
            fetcher: SnapshotFetcher::from_config(&config.timing),
            decoder: IntensityDecoder::default(),
            faces,
            url: config.data.url.clone(),
        };
        Self {
            config,
            pipeline,
            notifier,
        }
    }

    /// Capture both frames in parallel and assemble the panel.
    ///
    /// The future frame starts after the configured stagger. A failure in
    /// either frame is reported to the notifier and returned; there is no
    /// retry at this level.
    pub async fn compose(&self) -> Result<RgbaImage> {
        let panel = self.config.panel;
        info!(width = panel.width, height = panel.height, "create rain cloud panel");

        let [current_spec, future_spec] =
            SubFrameSpec::pair(self.config.layout, panel.width, panel.height);

        let stagger = self.config.timing.stagger();
        let (current, future) = tokio::join!(self.render_frame(current_spec.clone()), async {
            tokio::time::sleep(stagger).await;
            self.render_frame(future_spec.clone()).await
        });
        let current = current?;
        let future = future?;

        let mut canvas =
            RgbaImage::from_pixel(panel.width, panel.height, Rgba([255, 255, 255, 255]));
        for (spec, frame) in [(&current_spec, &current), (&future_spec, &future)] {
            imageops::replace(
                &mut canvas,
                &frame.image,
                spec.offset_x as i64,
                spec.offset_y as i64,
            );
        }

        let legend = &self.config.legend;
        draw_legend(
            &mut canvas,
            &current.legend,
            self.pipeline.decoder.levels(),
            legend.bar_size,
            (legend.offset_x, legend.offset_y),
            &self.pipeline.faces,
        );

        Ok(canvas)
    }

    #[instrument(skip(self, spec), fields(frame = spec.label()))]
    async fn render_frame(&self, spec: SubFrameSpec) -> Result<RenderedFrame> {
        info!("create rain cloud image");
        let (width, height) = self
            .config
            .layout
            .subframe_size(self.config.panel.width, self.config.panel.height);

        let pipeline = self.pipeline.clone();
        let task_spec = spec.clone();
        let outcome =
            tokio::task::spawn_blocking(move || pipeline.run(&task_spec, width, height))
                .await
                .with_context(|| format!("{} frame task aborted", spec.label()))?;

        match outcome {
            Ok(frame) => Ok(frame),
            Err(failure) => {
                self.report(&failure).await;
                Err(failure.error)
            }
        }
    }

    async fn report(&self, failure: &FrameFailure) {
        let report = ErrorReport {
            traceback: format_traceback(&failure.error),
            screenshot: failure.screenshot.clone(),
            caption: SCREENSHOT_CAPTION.to_string(),
        };
        if let Err(e) = self.notifier.notify(report).await {
            warn!(error = %e, "Failed to deliver error notification");
        }
    }
}

#[async_trait]
impl Compose for FrameComposer {
    async fn compose(&self) -> Result<RgbaImage> {
        FrameComposer::compose(self).await
    }
}
