//! Headless Chrome implementation of [`BrowserSession`].

use std::ffi::OsStr;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::types::Bounds;
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use tracing::{debug, info, warn};

use radar_common::{BrowserConfig, RadarError, RadarResult, WindowSize};

use crate::session::{BrowserSession, SessionFactory};

/// Initial window size before calibration adjusts it.
const INITIAL_WINDOW: (u32, u32) = (1920, 1080);

fn driver<E: Display>(what: &'static str) -> impl FnOnce(E) -> RadarError {
    move |e| RadarError::Driver(format!("{what}: {e:#}"))
}

/// A single Chrome process with one tab.
pub struct ChromeSession {
    browser: Option<Browser>,
    tab: Arc<Tab>,
}

impl ChromeSession {
    pub fn launch(config: &BrowserConfig, default_timeout: Duration) -> RadarResult<Self> {
        let options = LaunchOptionsBuilder::default()
            .headless(config.headless)
            .sandbox(config.sandbox)
            .path(config.chrome_path.clone())
            .window_size(Some(INITIAL_WINDOW))
            .idle_browser_timeout(Duration::from_secs(config.idle_timeout_secs))
            .args(vec![
                OsStr::new("--force-device-scale-factor=1"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--hide-scrollbars"),
                OsStr::new("--lang=ja-JP"),
            ])
            .build()
            .map_err(driver("invalid launch options"))?;

        let browser = Browser::new(options).map_err(driver("failed to launch Chrome"))?;
        let tab = browser.new_tab().map_err(driver("failed to open tab"))?;
        tab.set_default_timeout(default_timeout);

        debug!(headless = config.headless, "Chrome session started");
        Ok(Self {
            browser: Some(browser),
            tab,
        })
    }
}

impl BrowserSession for ChromeSession {
    fn navigate(&mut self, url: &str) -> RadarResult<()> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(driver("navigation failed"))?;
        Ok(())
    }

    fn refresh(&mut self) -> RadarResult<()> {
        self.tab
            .reload(false, None)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(driver("reload failed"))?;
        Ok(())
    }

    fn wait_for_element(&mut self, xpath: &str, timeout: Duration) -> RadarResult<()> {
        self.tab
            .wait_for_xpath_with_custom_timeout(xpath, timeout)
            .map_err(|_| RadarError::ElementTimeout {
                xpath: xpath.to_string(),
                timeout,
            })?;
        Ok(())
    }

    fn element_present(&mut self, xpath: &str) -> bool {
        self.tab.find_element_by_xpath(xpath).is_ok()
    }

    fn element_size(&mut self, xpath: &str) -> RadarResult<WindowSize> {
        let element = self
            .tab
            .find_element_by_xpath(xpath)
            .map_err(|_| RadarError::ElementNotFound(xpath.to_string()))?;
        let model = element
            .get_box_model()
            .map_err(driver("failed to read box model"))?;
        Ok(WindowSize::new(
            model.width.round() as u32,
            model.height.round() as u32,
        ))
    }

    fn click(&mut self, xpath: &str) -> RadarResult<()> {
        let element = self
            .tab
            .find_element_by_xpath(xpath)
            .map_err(|_| RadarError::ElementNotFound(xpath.to_string()))?;
        element.click().map_err(driver("click failed"))?;
        Ok(())
    }

    fn execute_script(&mut self, script: &str) -> RadarResult<serde_json::Value> {
        let wrapped = format!("(function() {{ {script} }})()");
        let result = self
            .tab
            .evaluate(&wrapped, false)
            .map_err(|e| RadarError::Script(format!("{e:#}")))?;
        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }

    fn window_size(&mut self) -> RadarResult<WindowSize> {
        let bounds = self
            .tab
            .get_bounds()
            .map_err(driver("failed to read window bounds"))?;
        Ok(WindowSize::new(
            bounds.width.round() as u32,
            bounds.height.round() as u32,
        ))
    }

    fn set_window_size(&mut self, size: WindowSize) -> RadarResult<()> {
        self.tab
            .set_bounds(Bounds::Normal {
                left: None,
                top: None,
                width: Some(size.width.into()),
                height: Some(size.height.into()),
            })
            .map_err(driver("failed to resize window"))?;
        Ok(())
    }

    fn capture_element(&mut self, xpath: &str) -> RadarResult<Vec<u8>> {
        let element = self
            .tab
            .find_element_by_xpath(xpath)
            .map_err(|_| RadarError::ElementNotFound(xpath.to_string()))?;
        element
            .capture_screenshot(CaptureScreenshotFormatOption::Png)
            .map_err(|e| RadarError::Capture(format!("{e:#}")))
    }

    fn full_page_screenshot(&mut self) -> RadarResult<Vec<u8>> {
        self.tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| RadarError::Capture(format!("{e:#}")))
    }

    fn quit(&mut self) {
        if let Some(browser) = self.browser.take() {
            if let Err(e) = self.tab.close(false) {
                warn!(error = %e, "Failed to close tab");
            }
            drop(browser);
            debug!("Chrome session closed");
        }
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.quit();
    }
}

/// Launches a new Chrome process for every session.
#[derive(Debug, Clone)]
pub struct ChromeSessionFactory {
    config: BrowserConfig,
    default_timeout: Duration,
}

impl ChromeSessionFactory {
    pub fn new(config: BrowserConfig, default_timeout: Duration) -> Self {
        Self {
            config,
            default_timeout,
        }
    }
}

impl SessionFactory for ChromeSessionFactory {
    fn create(&self) -> RadarResult<Box<dyn BrowserSession>> {
        info!("Launching browser session");
        let session = ChromeSession::launch(&self.config, self.default_timeout)?;
        Ok(Box::new(session))
    }
}
