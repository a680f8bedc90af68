//! Viewport calibration.
//!
//! The map element's rendered size depends on the browser window size in ways
//! that are not known up front (toolbars, margins, scrollbars). Calibration
//! measures the element and corrects the window by the observed delta, first
//! horizontally and then vertically. Results are kept in a small JSON file so
//! calibration only runs once per target size per freshness window.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use tracing::{debug, info, instrument, warn};

use radar_common::{RadarError, RadarResult, RainCloudConfig, WindowSize};

use crate::session::BrowserSession;
use crate::snapshot::CLOUD_IMAGE_XPATH;

/// Target width -> target height -> window size that produces it.
pub type ViewportMap = BTreeMap<u32, BTreeMap<u32, WindowSize>>;

/// On-disk cache of calibrated window sizes.
///
/// The file is valid as a whole for `ttl` after its last write. A stale file is
/// deleted; an unreadable one is ignored.
#[derive(Debug, Clone)]
pub struct ViewportCache {
    path: PathBuf,
    ttl: Duration,
}

impl ViewportCache {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cache, treating any failure as an empty cache.
    pub fn load(&self) -> ViewportMap {
        match self.try_load() {
            Ok(Some(map)) => map,
            Ok(None) => ViewportMap::new(),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    category = e.category(),
                    error = %e,
                    "Ignoring unreadable viewport cache"
                );
                ViewportMap::new()
            }
        }
    }

    fn try_load(&self) -> RadarResult<Option<ViewportMap>> {
        let metadata = match std::fs::metadata(&self.path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RadarError::CacheRead(e.to_string())),
        };

        let modified = metadata
            .modified()
            .map_err(|e| RadarError::CacheRead(e.to_string()))?;
        // A timestamp in the future counts as fresh.
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);

        if age >= self.ttl {
            info!(
                path = %self.path.display(),
                age_secs = age.as_secs(),
                "Viewport cache expired, discarding"
            );
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(error = %e, "Failed to remove expired viewport cache");
            }
            return Ok(None);
        }

        let data =
            std::fs::read(&self.path).map_err(|e| RadarError::CacheRead(e.to_string()))?;
        let map: ViewportMap = serde_json::from_slice(&data)?;
        Ok(Some(map))
    }

    /// Rewrite the whole cache file.
    pub fn save(&self, map: &ViewportMap) -> RadarResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec_pretty(map)?;
        std::fs::write(&self.path, data)?;
        debug!(path = %self.path.display(), entries = map.len(), "Viewport cache written");
        Ok(())
    }

    pub fn lookup(map: &ViewportMap, width: u32, height: u32) -> Option<WindowSize> {
        map.get(&width).and_then(|row| row.get(&height)).copied()
    }
}

/// Finds the window size that renders the map element at a target size.
pub struct ViewportCalibrator {
    cache: Mutex<ViewportCache>,
    url: String,
    element_timeout: Duration,
    settle: Duration,
}

impl ViewportCalibrator {
    pub fn new(
        cache: ViewportCache,
        url: impl Into<String>,
        element_timeout: Duration,
        settle: Duration,
    ) -> Self {
        Self {
            cache: Mutex::new(cache),
            url: url.into(),
            element_timeout,
            settle,
        }
    }

    pub fn from_config(config: &RainCloudConfig) -> Self {
        Self::new(
            ViewportCache::new(config.cache.path.clone(), config.cache.ttl()),
            config.data.url.clone(),
            config.timing.element_timeout(),
            config.timing.calibration_settle(),
        )
    }

    /// Size `session`'s window so the map element renders at
    /// `width` x `height`, and return that window size.
    ///
    /// A cached size is applied directly. Otherwise the window is calibrated
    /// against the live page and the result is persisted. The cache lock is
    /// held for the whole call, so a concurrent resolve of the same target
    /// waits and then hits the cache.
    #[instrument(skip(self, session))]
    pub fn resolve(
        &self,
        session: &mut dyn BrowserSession,
        width: u32,
        height: u32,
    ) -> RadarResult<WindowSize> {
        let cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Viewport cache lock poisoned, continuing");
                poisoned.into_inner()
            }
        };

        let mut map = cache.load();
        if let Some(size) = ViewportCache::lookup(&map, width, height) {
            info!(
                width,
                height,
                window_width = size.width,
                window_height = size.height,
                "Resizing window from cache"
            );
            session.set_window_size(size)?;
            return Ok(size);
        }

        let size = self.calibrate(session, width, height)?;

        map.entry(width).or_default().insert(height, size);
        if let Err(e) = cache.save(&map) {
            warn!(error = %e, "Failed to persist viewport cache");
        }

        Ok(size)
    }

    fn calibrate(
        &self,
        session: &mut dyn BrowserSession,
        width: u32,
        height: u32,
    ) -> RadarResult<WindowSize> {
        info!(width, height, "Calibrating viewport");

        session.navigate(&self.url)?;
        self.wait_for_map(session)?;

        // Start oversized so the element is never clipped by the window.
        session.set_window_size(WindowSize::new(height * 2, height * 3 / 2))?;
        session.refresh()?;
        self.wait_for_map(session)?;

        if let Some((window, element)) = self.measure(session)? {
            if element.width != width {
                let target = WindowSize::new(adjust(window.width, width, element.width), height);
                info!(
                    window_width = target.width,
                    window_height = target.height,
                    "Changing window width"
                );
                session.set_window_size(target)?;
            }
        }
        session.refresh()?;
        self.wait_for_map(session)?;
        std::thread::sleep(self.settle);

        if let Some((window, element)) = self.measure(session)? {
            if element.height != height {
                let target =
                    WindowSize::new(window.width, adjust(window.height, height, element.height));
                info!(
                    window_width = target.width,
                    window_height = target.height,
                    "Changing window height"
                );
                session.set_window_size(target)?;
            }
        }
        session.refresh()?;
        self.wait_for_map(session)?;
        std::thread::sleep(self.settle);

        if let Some((_, element)) = self.measure(session)? {
            let status = if element == WindowSize::new(width, height) {
                "OK"
            } else {
                "unmatch"
            };
            info!(status, "Calibration finished");
        }

        session.window_size()
    }

    /// Timeouts here are logged and sizing continues with the current window.
    fn wait_for_map(&self, session: &mut dyn BrowserSession) -> RadarResult<()> {
        match session.wait_for_element(CLOUD_IMAGE_XPATH, self.element_timeout) {
            Ok(()) => Ok(()),
            Err(e @ RadarError::ElementTimeout { .. }) => {
                let e = RadarError::CalibrationTimeout(e.to_string());
                warn!(category = e.category(), error = %e, "Map element did not appear");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Current window and map element sizes, if the element can be measured.
    fn measure(
        &self,
        session: &mut dyn BrowserSession,
    ) -> RadarResult<Option<(WindowSize, WindowSize)>> {
        let window = session.window_size()?;
        let element = match session.element_size(CLOUD_IMAGE_XPATH) {
            Ok(size) => size,
            Err(e) => {
                warn!(error = %e, "Cannot measure map element");
                return Ok(None);
            }
        };
        info!(
            window_width = window.width,
            window_height = window.height,
            element_width = element.width,
            element_height = element.height,
            "Current size"
        );
        Ok(Some((window, element)))
    }
}

/// Shift a window dimension by the difference between target and measured.
fn adjust(window: u32, target: u32, measured: u32) -> u32 {
    (window as i64 + target as i64 - measured as i64).max(1) as u32
}
