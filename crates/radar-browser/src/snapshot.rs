//! Capture of one radar map frame.

use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use radar_common::{RadarError, RadarResult, TimingConfig};

use crate::session::BrowserSession;

/// The tiled map container.
pub const CLOUD_IMAGE_XPATH: &str = r#"//div[contains(@id, "jmatile_map_")]"#;

/// Color intensity menu and its darkest option.
pub const INTENSITY_MENU_XPATH: &str = r#"//a[contains(@aria-label, "色の濃さ")]"#;
pub const DARK_INTENSITY_XPATH: &str = r#"//span[contains(text(), "濃い")]"#;

/// Base map menu and its label-free style.
pub const MAP_STYLE_MENU_XPATH: &str = r#"//a[contains(@aria-label, "地図を切り替え")]"#;
pub const NO_LABEL_MAP_XPATH: &str = r#"//span[contains(text(), "地名なし")]"#;

/// Time control that advances the layer to the one-hour forecast.
pub const FUTURE_LAYER_XPATH: &str =
    r#"//div[@class="jmatile-control"]//div[contains(text(), " +1時間 ")]"#;

/// Page furniture hidden before capture: title, zoom buttons, attribution and
/// scale bar.
pub const HIDDEN_CLASSES: [&str; 4] = [
    "jmatile-map-title",
    "leaflet-bar",
    "leaflet-control-attribution",
    "leaflet-control-scale-line",
];

const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn class_xpath(class_name: &str) -> String {
    format!(r#"//*[contains(concat(" ", normalize-space(@class), " "), " {class_name} ")]"#)
}

fn hide_script(class_name: &str) -> String {
    format!(
        r#"var elements = document.getElementsByClassName("{class_name}");
for (var i = 0; i < elements.length; i++) {{
    elements[i].style.display = "none";
}}"#
    )
}

/// Drives a session through one frame capture.
#[derive(Debug, Clone)]
pub struct SnapshotFetcher {
    element_timeout: Duration,
    settle: Duration,
}

impl SnapshotFetcher {
    pub fn new(element_timeout: Duration, settle: Duration) -> Self {
        Self {
            element_timeout,
            settle,
        }
    }

    pub fn from_config(timing: &TimingConfig) -> Self {
        Self::new(timing.element_timeout(), timing.settle())
    }

    /// Capture the map element as PNG bytes.
    ///
    /// The page is reloaded before returning. Errors leave the session as it
    /// was at the failing step so the caller can screenshot it.
    #[instrument(skip(self, session, url))]
    pub fn fetch(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
        width: u32,
        height: u32,
        is_future: bool,
    ) -> RadarResult<Vec<u8>> {
        info!("Fetching cloud image");

        session.navigate(url)?;
        session.wait_for_element(CLOUD_IMAGE_XPATH, self.element_timeout)?;

        self.shape_display(session, is_future)?;

        self.wait_until_ready(session)?;
        std::thread::sleep(self.settle);

        let png = session.capture_element(CLOUD_IMAGE_XPATH)?;
        debug!(bytes = png.len(), "Captured map element");

        session.refresh()?;

        Ok(png)
    }

    fn shape_display(&self, session: &mut dyn BrowserSession, is_future: bool) -> RadarResult<()> {
        click_if_present(session, INTENSITY_MENU_XPATH)?;
        click_if_present(session, DARK_INTENSITY_XPATH)?;

        click_if_present(session, MAP_STYLE_MENU_XPATH)?;
        click_if_present(session, NO_LABEL_MAP_XPATH)?;

        if is_future {
            click_if_present(session, FUTURE_LAYER_XPATH)?;
        }

        self.hide_furniture(session)
    }

    fn hide_furniture(&self, session: &mut dyn BrowserSession) -> RadarResult<()> {
        for class_name in HIDDEN_CLASSES {
            session.wait_for_element(&class_xpath(class_name), self.element_timeout)?;
        }
        for class_name in HIDDEN_CLASSES {
            session.execute_script(&hide_script(class_name))?;
        }
        Ok(())
    }

    fn wait_until_ready(&self, session: &mut dyn BrowserSession) -> RadarResult<()> {
        let deadline = Instant::now() + self.element_timeout;
        loop {
            let state = session.execute_script("return document.readyState")?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(RadarError::Script(format!(
                    "document.readyState stuck at {} after {}ms",
                    state,
                    self.element_timeout.as_millis()
                )));
            }
            std::thread::sleep(READY_POLL_INTERVAL);
        }
    }
}

fn click_if_present(session: &mut dyn BrowserSession, xpath: &str) -> RadarResult<()> {
    if session.element_present(xpath) {
        debug!(xpath, "click");
        session.click(xpath)
    } else {
        debug!(xpath, "Control not present, skipping");
        Ok(())
    }
}
