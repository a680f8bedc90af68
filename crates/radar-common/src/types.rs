//! Value types shared between the browser, renderer and composer.

use serde::{Deserialize, Serialize};

/// Outer browser window size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// How the two time-offset frames are arranged on the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelLayout {
    /// Current frame on the left half, +1h frame on the right half.
    #[default]
    SideBySide,
    /// Current frame on the top half, +1h frame on the bottom half.
    Stacked,
}

impl PanelLayout {
    /// Pixel size of a single subframe for the given panel size.
    pub fn subframe_size(&self, panel_width: u32, panel_height: u32) -> (u32, u32) {
        match self {
            PanelLayout::SideBySide => (panel_width / 2, panel_height),
            PanelLayout::Stacked => (panel_width, panel_height / 2),
        }
    }
}

/// One of the two captures composited onto the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubFrameSpec {
    /// Whether the map is advanced to the +1 hour forecast layer.
    pub is_future: bool,
    /// Caption drawn in the top-left corner.
    pub title: String,
    /// Paste position on the composite.
    pub offset_x: u32,
    pub offset_y: u32,
}

impl SubFrameSpec {
    /// Short label used in log fields.
    pub fn label(&self) -> &'static str {
        if self.is_future {
            "future"
        } else {
            "current"
        }
    }

    /// Build the current and +1h subframes for a panel.
    pub fn pair(layout: PanelLayout, panel_width: u32, panel_height: u32) -> [SubFrameSpec; 2] {
        let (future_x, future_y) = match layout {
            PanelLayout::SideBySide => (panel_width / 2, 0),
            PanelLayout::Stacked => (0, panel_height / 2),
        };
        [
            SubFrameSpec {
                is_future: false,
                title: "現在".to_string(),
                offset_x: 0,
                offset_y: 0,
            },
            SubFrameSpec {
                is_future: true,
                title: "１時間後".to_string(),
                offset_x: future_x,
                offset_y: future_y,
            },
        ]
    }
}
