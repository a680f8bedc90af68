//! Path utilities for locating test resources.

use std::path::PathBuf;

/// Font files tried in order when `TEST_FONT` is not set.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

/// Returns the workspace root directory.
pub fn workspace_root() -> PathBuf {
    // Start from the test-utils crate manifest dir
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Searches for a TrueType font usable in tests.
///
/// This function checks the following locations in order:
/// 1. Environment variable `TEST_FONT` (if set)
/// 2. `testdata/fonts/test.ttf` under the workspace root
/// 3. Common system font locations
pub fn find_system_font() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(font) = std::env::var("TEST_FONT") {
        candidates.push(PathBuf::from(font));
    }
    candidates.push(workspace_root().join("testdata/fonts/test.ttf"));
    candidates.extend(FONT_CANDIDATES.iter().map(PathBuf::from));

    candidates.into_iter().find(|path| path.exists())
}

/// Loads the first font found by [`find_system_font`].
pub fn load_test_font() -> Option<rusttype::Font<'static>> {
    let path = find_system_font()?;
    let data = std::fs::read(path).ok()?;
    rusttype::Font::try_from_vec(data)
}
