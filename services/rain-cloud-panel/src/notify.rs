//! Failure notifications.
//!
//! Every failed subframe produces an [`ErrorReport`] that is handed to a
//! [`Notifier`]. The Slack implementation posts the traceback and uploads the
//! browser screenshot, at most once per configured interval.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use radar_common::SlackConfig;

const SLACK_API: &str = "https://slack.com/api";

/// Payload describing one failed attempt.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    /// Diagnostic text, see [`format_traceback`].
    pub traceback: String,
    /// Full-page PNG of the browser at the time of failure.
    pub screenshot: Option<Vec<u8>>,
    /// Caption for the screenshot.
    pub caption: String,
}

/// Receives error reports.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, report: ErrorReport) -> Result<()>;
}

/// Render an error and its causes as a traceback-style text block.
pub fn format_traceback(err: &anyhow::Error) -> String {
    let mut text = String::from("Traceback (most recent cause last):\n");
    for (i, cause) in err.chain().enumerate() {
        text.push_str(&format!("  {i}: {cause}\n"));
    }
    text
}

/// Writes reports to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, report: ErrorReport) -> Result<()> {
        error!(
            screenshot_bytes = report.screenshot.as_ref().map_or(0, Vec::len),
            "{}",
            report.traceback
        );
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadUrlResponse {
    ok: bool,
    error: Option<String>,
    upload_url: Option<String>,
    file_id: Option<String>,
}

/// Posts reports to a Slack channel.
pub struct SlackNotifier {
    client: Client,
    config: SlackConfig,
    api_base: String,
    stamp_file: Option<PathBuf>,
    last_sent: Mutex<Option<Instant>>,
}

impl SlackNotifier {
    pub fn new(config: SlackConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            config,
            api_base: SLACK_API.to_string(),
            stamp_file: None,
            last_sent: Mutex::new(None),
        })
    }

    /// Persist the time of the last report in `path` so the interval also
    /// holds across process runs.
    pub fn with_stamp_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stamp_file = Some(path.into());
        self
    }

    /// Send API calls to a Slack-compatible endpoint other than slack.com.
    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.config.error.interval_min * 60)
    }

    /// Whether enough time has passed since the last report.
    pub fn should_send(&self) -> bool {
        let interval = self.interval();

        let recent_in_process = self
            .last_sent
            .lock()
            .ok()
            .and_then(|last| *last)
            .map_or(false, |last| last.elapsed() < interval);
        if recent_in_process {
            return false;
        }

        match &self.stamp_file {
            Some(path) => stamp_age(path).map_or(true, |age| age >= interval),
            None => true,
        }
    }

    /// Record that a report was just sent.
    pub fn mark_sent(&self) {
        if let Ok(mut last) = self.last_sent.lock() {
            *last = Some(Instant::now());
        }
        if let Some(path) = &self.stamp_file {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!(path = %parent.display(), error = %e, "Failed to create stamp directory");
                }
            }
            if let Err(e) = std::fs::write(path, b"") {
                warn!(path = %path.display(), error = %e, "Failed to write notification stamp");
            }
        }
    }

    async fn post_message(&self, text: &str) -> Result<()> {
        let response: SlackResponse = self
            .client
            .post(format!("{}/chat.postMessage", self.api_base))
            .bearer_auth(&self.config.bot_token)
            .json(&json!({
                "channel": self.config.error.channel.id,
                "text": text,
            }))
            .send()
            .await
            .context("chat.postMessage request failed")?
            .json()
            .await
            .context("chat.postMessage returned invalid JSON")?;

        if !response.ok {
            return Err(anyhow!(
                "chat.postMessage rejected: {}",
                response.error.unwrap_or_default()
            ));
        }
        Ok(())
    }

    async fn upload_image(&self, png: Vec<u8>, title: &str) -> Result<()> {
        let length = png.len().to_string();
        let ticket: UploadUrlResponse = self
            .client
            .post(format!("{}/files.getUploadURLExternal", self.api_base))
            .bearer_auth(&self.config.bot_token)
            .form(&[("filename", "screenshot.png"), ("length", length.as_str())])
            .send()
            .await
            .context("files.getUploadURLExternal request failed")?
            .json()
            .await
            .context("files.getUploadURLExternal returned invalid JSON")?;

        let (upload_url, file_id) = match (ticket.ok, ticket.upload_url, ticket.file_id) {
            (true, Some(url), Some(id)) => (url, id),
            _ => {
                return Err(anyhow!(
                    "files.getUploadURLExternal rejected: {}",
                    ticket.error.unwrap_or_default()
                ))
            }
        };

        self.client
            .post(&upload_url)
            .body(png)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .context("screenshot upload failed")?;

        let response: SlackResponse = self
            .client
            .post(format!("{}/files.completeUploadExternal", self.api_base))
            .bearer_auth(&self.config.bot_token)
            .json(&json!({
                "files": [{ "id": file_id, "title": title }],
                "channel_id": self.config.error.channel.id,
            }))
            .send()
            .await
            .context("files.completeUploadExternal request failed")?
            .json()
            .await
            .context("files.completeUploadExternal returned invalid JSON")?;

        if !response.ok {
            return Err(anyhow!(
                "files.completeUploadExternal rejected: {}",
                response.error.unwrap_or_default()
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, report: ErrorReport) -> Result<()> {
        if !self.should_send() {
            info!(
                interval_min = self.config.error.interval_min,
                "Skipping Slack notification, interval not elapsed"
            );
            return Ok(());
        }

        debug!(channel = %self.config.error.channel.name, "Posting error to Slack");
        self.post_message(&format!(
            ":warning: rain cloud panel error\n```{}```",
            report.traceback
        ))
        .await?;
        self.mark_sent();

        if let Some(png) = report.screenshot {
            self.upload_image(png, &report.caption).await?;
        }
        Ok(())
    }
}

fn stamp_age(path: &Path) -> Option<Duration> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(
        SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO),
    )
}
