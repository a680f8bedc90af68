//! Scripted stand-in for a browser session.
//!
//! The fake keeps a window size and reports the map element as the window
//! minus a fixed chrome margin, which is enough for calibration to converge.
//! Every call is appended to a log shared by all clones, so tests can count
//! how often the page was driven.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use radar_browser::{BrowserSession, SessionFactory};
use radar_common::{RadarError, RadarResult, WindowSize};

use crate::generators::{uniform_radar_png, RADAR_PALETTE};

/// Calls recorded across every clone of a session.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn push(&self, entry: String) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push(entry);
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls whose entry starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

/// A browser session that never leaves the process.
#[derive(Debug, Clone)]
pub struct FakeSession {
    window: WindowSize,
    chrome: (u32, u32),
    capture: Vec<u8>,
    screenshot: Vec<u8>,
    missing: Vec<String>,
    failing_clicks: Vec<String>,
    fail_capture: bool,
    ready_state: String,
    quit: bool,
    log: CallLog,
}

impl Default for FakeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            window: WindowSize::new(1200, 900),
            chrome: (16, 120),
            capture: uniform_radar_png(8, 8, RADAR_PALETTE[3]),
            screenshot: uniform_radar_png(4, 4, [255, 255, 255]),
            missing: Vec::new(),
            failing_clicks: Vec::new(),
            fail_capture: false,
            ready_state: "complete".to_string(),
            quit: false,
            log: CallLog::default(),
        }
    }

    /// PNG returned by `capture_element`.
    pub fn with_capture(mut self, png: Vec<u8>) -> Self {
        self.capture = png;
        self
    }

    /// Difference between window size and map element size.
    pub fn with_chrome(mut self, width: u32, height: u32) -> Self {
        self.chrome = (width, height);
        self
    }

    /// Elements matching `xpath` never appear.
    pub fn with_missing(mut self, xpath: &str) -> Self {
        self.missing.push(xpath.to_string());
        self
    }

    /// Clicking `xpath` fails with a driver error.
    pub fn with_failing_click(mut self, xpath: &str) -> Self {
        self.failing_clicks.push(xpath.to_string());
        self
    }

    pub fn with_failing_capture(mut self) -> Self {
        self.fail_capture = true;
        self
    }

    /// Value reported for `document.readyState`.
    pub fn with_ready_state(mut self, state: &str) -> Self {
        self.ready_state = state.to_string();
        self
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    pub fn is_quit(&self) -> bool {
        self.quit
    }

    pub fn current_window(&self) -> WindowSize {
        self.window
    }

    fn is_missing(&self, xpath: &str) -> bool {
        self.missing.iter().any(|m| m == xpath)
    }
}

impl BrowserSession for FakeSession {
    fn navigate(&mut self, url: &str) -> RadarResult<()> {
        self.log.push(format!("navigate {url}"));
        Ok(())
    }

    fn refresh(&mut self) -> RadarResult<()> {
        self.log.push("refresh".to_string());
        Ok(())
    }

    fn wait_for_element(&mut self, xpath: &str, timeout: Duration) -> RadarResult<()> {
        self.log.push(format!("wait {xpath}"));
        if self.is_missing(xpath) {
            return Err(RadarError::ElementTimeout {
                xpath: xpath.to_string(),
                timeout,
            });
        }
        Ok(())
    }

    fn element_present(&mut self, xpath: &str) -> bool {
        !self.is_missing(xpath)
    }

    fn element_size(&mut self, xpath: &str) -> RadarResult<WindowSize> {
        if self.is_missing(xpath) {
            return Err(RadarError::ElementNotFound(xpath.to_string()));
        }
        Ok(WindowSize::new(
            self.window.width.saturating_sub(self.chrome.0),
            self.window.height.saturating_sub(self.chrome.1),
        ))
    }

    fn click(&mut self, xpath: &str) -> RadarResult<()> {
        self.log.push(format!("click {xpath}"));
        if self.failing_clicks.iter().any(|f| f == xpath) {
            return Err(RadarError::Driver(format!("click intercepted: {xpath}")));
        }
        if self.is_missing(xpath) {
            return Err(RadarError::ElementNotFound(xpath.to_string()));
        }
        Ok(())
    }

    fn execute_script(&mut self, script: &str) -> RadarResult<serde_json::Value> {
        self.log.push(format!("script {script}"));
        if script.contains("document.readyState") {
            return Ok(serde_json::Value::String(self.ready_state.clone()));
        }
        Ok(serde_json::Value::Null)
    }

    fn window_size(&mut self) -> RadarResult<WindowSize> {
        Ok(self.window)
    }

    fn set_window_size(&mut self, size: WindowSize) -> RadarResult<()> {
        self.log
            .push(format!("set_window_size {}x{}", size.width, size.height));
        self.window = size;
        Ok(())
    }

    fn capture_element(&mut self, xpath: &str) -> RadarResult<Vec<u8>> {
        self.log.push(format!("capture {xpath}"));
        if self.fail_capture {
            return Err(RadarError::Capture("element not visible".to_string()));
        }
        Ok(self.capture.clone())
    }

    fn full_page_screenshot(&mut self) -> RadarResult<Vec<u8>> {
        self.log.push("screenshot".to_string());
        Ok(self.screenshot.clone())
    }

    fn quit(&mut self) {
        self.log.push("quit".to_string());
        self.quit = true;
    }
}

/// Hands out clones of a template session.
///
/// The first `fail_creates` calls to `create` fail, which simulates a browser
/// that cannot be launched.
#[derive(Debug)]
pub struct FakeSessionFactory {
    template: FakeSession,
    fail_creates: usize,
    created: AtomicUsize,
}

impl FakeSessionFactory {
    pub fn new(template: FakeSession) -> Self {
        Self {
            template,
            fail_creates: 0,
            created: AtomicUsize::new(0),
        }
    }

    pub fn with_failing_creates(mut self, count: usize) -> Self {
        self.fail_creates = count;
        self
    }

    /// Log shared by every session this factory creates.
    pub fn log(&self) -> CallLog {
        self.template.log()
    }

    /// Number of `create` calls so far, failed ones included.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl SessionFactory for FakeSessionFactory {
    fn create(&self) -> RadarResult<Box<dyn BrowserSession>> {
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        self.template.log.push("create".to_string());
        if n < self.fail_creates {
            return Err(RadarError::Driver(format!(
                "session not created: chrome failed to start (launch {})",
                n + 1
            )));
        }
        Ok(Box::new(self.template.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_log() {
        let session = FakeSession::new();
        let log = session.log();
        let mut a = session.clone();
        let mut b = session;
        a.refresh().unwrap();
        b.navigate("http://example.invalid").unwrap();
        assert_eq!(log.count("refresh"), 1);
        assert_eq!(log.count("navigate"), 1);
    }

    #[test]
    fn test_element_tracks_window() {
        let mut session = FakeSession::new().with_chrome(10, 20);
        session.set_window_size(WindowSize::new(300, 400)).unwrap();
        assert_eq!(session.element_size("//div").unwrap(), WindowSize::new(290, 380));
    }

    #[test]
    fn test_missing_element_times_out() {
        let mut session = FakeSession::new().with_missing("//nope");
        let err = session
            .wait_for_element("//nope", Duration::from_millis(5))
            .unwrap_err();
        assert!(matches!(err, RadarError::ElementTimeout { .. }));
        assert!(!session.element_present("//nope"));
    }

    #[test]
    fn test_factory_fails_first_creates() {
        let factory = FakeSessionFactory::new(FakeSession::new()).with_failing_creates(1);
        assert!(factory.create().is_err());
        assert!(factory.create().is_ok());
        assert_eq!(factory.created(), 2);
        assert_eq!(factory.log().count("create"), 2);
    }
}
