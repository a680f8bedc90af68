//! Shared test utilities for the rain cloud panel workspace.
//!
//! This crate provides common testing infrastructure including:
//! - A scripted browser session and session factory
//! - Synthetic radar captures in the map's palette
//! - System font discovery and skip macros for font-dependent tests
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{require_font, FakeSession};
//! ```

pub mod fake_session;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fake_session::*;
pub use generators::*;
pub use paths::*;

/// Macro to skip a test if no usable system font is installed.
///
/// Evaluates to a `rusttype::Font<'static>`.
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_font;
///
/// #[test]
/// fn test_caption_text() {
///     let font = require_font!();
///     // Test code drawing text...
/// }
/// ```
///
/// If no font is found, the test will print a skip message and return early.
#[macro_export]
macro_rules! require_font {
    () => {{
        match $crate::load_test_font() {
            Some(font) => font,
            None => {
                eprintln!(
                    "SKIPPED: No TrueType font found. Install DejaVu/Liberation or set TEST_FONT."
                );
                return;
            }
        }
    }};
}
