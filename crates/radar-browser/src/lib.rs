//! Browser-side acquisition of radar map snapshots.
//!
//! The map page is driven through the [`BrowserSession`] trait so the
//! calibration and capture logic can run against a scripted session in tests.
//! [`ChromeSession`] is the production implementation on top of headless
//! Chrome.

pub mod chrome;
pub mod session;
pub mod snapshot;
pub mod viewport;

pub use chrome::{ChromeSession, ChromeSessionFactory};
pub use session::{BrowserSession, SessionFactory};
pub use snapshot::{SnapshotFetcher, CLOUD_IMAGE_XPATH, FUTURE_LAYER_XPATH, HIDDEN_CLASSES};
pub use viewport::{ViewportCache, ViewportCalibrator, ViewportMap};
