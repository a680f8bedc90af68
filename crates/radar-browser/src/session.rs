//! Browser session abstraction.

use std::time::Duration;

use radar_common::{RadarResult, WindowSize};

/// One exclusive browser window driving the map page.
///
/// Every remote call is blocking. Waits are bounded by the timeout passed in
/// or by the session's own default timeout.
pub trait BrowserSession: Send {
    /// Load `url` and wait for navigation to finish.
    fn navigate(&mut self, url: &str) -> RadarResult<()>;

    /// Reload the current page.
    fn refresh(&mut self) -> RadarResult<()>;

    /// Block until an element matching `xpath` exists, or fail with
    /// `RadarError::ElementTimeout`.
    fn wait_for_element(&mut self, xpath: &str, timeout: Duration) -> RadarResult<()>;

    /// Whether an element matching `xpath` currently exists.
    fn element_present(&mut self, xpath: &str) -> bool;

    /// Rendered size of the first element matching `xpath`.
    fn element_size(&mut self, xpath: &str) -> RadarResult<WindowSize>;

    /// Click the first element matching `xpath`.
    fn click(&mut self, xpath: &str) -> RadarResult<()>;

    /// Run a script body in the page. A `return` statement yields the result.
    fn execute_script(&mut self, script: &str) -> RadarResult<serde_json::Value>;

    fn window_size(&mut self) -> RadarResult<WindowSize>;

    fn set_window_size(&mut self, size: WindowSize) -> RadarResult<()>;

    /// PNG screenshot of the first element matching `xpath`.
    fn capture_element(&mut self, xpath: &str) -> RadarResult<Vec<u8>>;

    /// PNG screenshot of the whole page.
    fn full_page_screenshot(&mut self) -> RadarResult<Vec<u8>>;

    /// Close the browser. Calling it more than once is harmless.
    fn quit(&mut self);
}

/// Creates a fresh session per fetch.
pub trait SessionFactory: Send + Sync {
    fn create(&self) -> RadarResult<Box<dyn BrowserSession>>;
}
