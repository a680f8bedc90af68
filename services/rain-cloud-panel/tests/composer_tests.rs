//! Tests for the two-frame composer against scripted browser sessions.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use radar_browser::FUTURE_LAYER_XPATH;
use rain_cloud_panel::FrameComposer;
use renderer::{FaceMap, IntensityDecoder};
use tempfile::TempDir;
use test_utils::{uniform_radar_png, FakeSession, FakeSessionFactory, RADAR_PALETTE};

use common::{test_config, RecordingNotifier, PANEL_HEIGHT, PANEL_WIDTH};

// ============================================================================
// Helper functions
// ============================================================================

fn composer(
    dir: &TempDir,
    layout: &str,
    stagger_ms: u64,
    factory: Arc<FakeSessionFactory>,
    notifier: RecordingNotifier,
) -> FrameComposer {
    FrameComposer::new(
        test_config(dir, layout, stagger_ms, 10),
        Arc::new(FaceMap::missing()),
        factory,
        Arc::new(notifier),
    )
}

fn blue_capture(width: u32, height: u32) -> FakeSession {
    FakeSession::new().with_capture(uniform_radar_png(width, height, RADAR_PALETTE[3]))
}

// ============================================================================
// Successful composition
// ============================================================================

#[tokio::test]
async fn test_side_by_side_composite() {
    let dir = TempDir::new().unwrap();
    let factory = Arc::new(FakeSessionFactory::new(blue_capture(100, 100)));
    let notifier = RecordingNotifier::default();
    let composer = composer(&dir, "side_by_side", 0, factory.clone(), notifier.clone());

    let image = composer.compose().await.unwrap();

    assert_eq!(image.dimensions(), (PANEL_WIDTH, PANEL_HEIGHT));
    let expected = IntensityDecoder::default().ramp_rgba(3);
    // Clear of the center marker, caption box and legend in both halves.
    assert_eq!(*image.get_pixel(80, 20), expected);
    assert_eq!(*image.get_pixel(180, 20), expected);
    // Center marker of the current frame.
    assert_eq!(image.get_pixel(50, 50).0, [255, 255, 255, 255]);

    assert!(notifier.reports().is_empty());
    let log = factory.log();
    assert_eq!(factory.created(), 2);
    assert_eq!(log.count("quit"), 2);
    assert_eq!(log.count("capture"), 2);
    // One calibration plus one navigation per frame.
    assert_eq!(log.count("navigate"), 3);
    assert_eq!(log.count(&format!("click {FUTURE_LAYER_XPATH}")), 1);
}

#[tokio::test]
async fn test_stacked_composite() {
    let dir = TempDir::new().unwrap();
    let factory = Arc::new(FakeSessionFactory::new(blue_capture(200, 50)));
    let composer = composer(&dir, "stacked", 0, factory, RecordingNotifier::default());

    let image = composer.compose().await.unwrap();

    assert_eq!(image.dimensions(), (PANEL_WIDTH, PANEL_HEIGHT));
    let expected = IntensityDecoder::default().ramp_rgba(3);
    assert_eq!(*image.get_pixel(40, 40), expected);
    assert_eq!(*image.get_pixel(40, 90), expected);
}

#[tokio::test]
async fn test_small_capture_leaves_white_background() {
    let dir = TempDir::new().unwrap();
    let factory = Arc::new(FakeSessionFactory::new(blue_capture(60, 60)));
    let composer = composer(&dir, "side_by_side", 0, factory, RecordingNotifier::default());

    let image = composer.compose().await.unwrap();

    assert_eq!(image.dimensions(), (PANEL_WIDTH, PANEL_HEIGHT));
    assert_eq!(image.get_pixel(70, 20).0, [255, 255, 255, 255]);
}

#[tokio::test]
async fn test_future_frame_is_staggered() {
    let dir = TempDir::new().unwrap();
    let factory = Arc::new(FakeSessionFactory::new(blue_capture(100, 100)));
    let composer = composer(&dir, "side_by_side", 100, factory, RecordingNotifier::default());

    let start = Instant::now();
    composer.compose().await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(100));
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_one_failing_frame_notifies_once() {
    let dir = TempDir::new().unwrap();
    let template = blue_capture(100, 100).with_failing_click(FUTURE_LAYER_XPATH);
    let factory = Arc::new(FakeSessionFactory::new(template));
    let notifier = RecordingNotifier::default();
    let composer = composer(&dir, "side_by_side", 0, factory.clone(), notifier.clone());

    let err = composer.compose().await.unwrap_err();
    assert!(format!("{err:#}").contains(FUTURE_LAYER_XPATH), "{err:#}");

    let reports = notifier.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].traceback.contains("Traceback"));
    assert!(reports[0].traceback.contains("future"));
    assert!(reports[0].screenshot.is_some());
    assert!(!reports[0].caption.is_empty());

    // Both sessions are closed, the failing one after its screenshot.
    let log = factory.log();
    assert_eq!(log.count("quit"), 2);
    assert_eq!(log.count("screenshot"), 1);
}

#[tokio::test]
async fn test_undecodable_capture_notifies_without_screenshot() {
    let dir = TempDir::new().unwrap();
    let template = FakeSession::new().with_capture(b"not a png".to_vec());
    let factory = Arc::new(FakeSessionFactory::new(template));
    let notifier = RecordingNotifier::default();
    let composer = composer(&dir, "side_by_side", 0, factory, notifier.clone());

    let err = composer.compose().await.unwrap_err();
    assert!(format!("{err:#}").contains("decode"), "{err:#}");

    let reports = notifier.reports();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.screenshot.is_none()));
}

#[tokio::test]
async fn test_browser_launch_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let factory = Arc::new(FakeSessionFactory::new(blue_capture(100, 100)).with_failing_creates(1));
    let notifier = RecordingNotifier::default();
    let composer = composer(&dir, "side_by_side", 0, factory, notifier.clone());

    assert!(composer.compose().await.is_err());

    let reports = notifier.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].traceback.contains("failed to start browser session"));
    assert!(reports[0].screenshot.is_none());
}
