//! Client configuration.
//!
//! Everything has a default matching the deployed web client, so an empty
//! JSON object is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};

/// Default vertical offset of the first marker stacked on an element.
pub const DEFAULT_FIRST_OFFSET: f64 = 600.0;
/// Default distance between two markers stacked on the same element.
pub const DEFAULT_OFFSET_STEP: f64 = 180.0;
/// Default marker width and height (SVG user units of the score page).
pub const DEFAULT_MARKER_SIZE: f64 = 380.0;
/// Opacity of the marker glyph.
pub const DEFAULT_GLYPH_OPACITY: f64 = 0.6;

/// Top-level configuration for a [`crate::ScoreController`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL prepended to every REST path (e.g. `https://neuma.example.org`).
    /// Empty means paths are sent as-is, relative to the page origin.
    pub base_url: String,
    /// Origin of the page the client runs on. Used for the same-origin CSRF check.
    pub origin: String,
    /// Name of the cookie carrying the CSRF token.
    pub csrf_cookie: String,
    /// Header the token is sent in.
    pub csrf_header: String,
    /// Per-request timeout. `None` waits forever.
    pub timeout_secs: Option<u64>,
    /// Marker stacking geometry.
    pub anchors: AnchorLayout,
    /// Highlight colours.
    pub highlight: HighlightStyle,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            origin: String::new(),
            csrf_cookie: "csrftoken".to_string(),
            csrf_header: "X-CSRFToken".to_string(),
            timeout_secs: None,
            anchors: AnchorLayout::default(),
            highlight: HighlightStyle::default(),
        }
    }
}

impl ClientConfig {
    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ScoreError::Config(e.to_string()))
    }
}

/// Geometry of annotation markers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorLayout {
    pub first_offset: f64,
    pub step: f64,
    pub marker_size: f64,
    pub glyph_opacity: f64,
}

impl Default for AnchorLayout {
    fn default() -> Self {
        Self {
            first_offset: DEFAULT_FIRST_OFFSET,
            step: DEFAULT_OFFSET_STEP,
            marker_size: DEFAULT_MARKER_SIZE,
            glyph_opacity: DEFAULT_GLYPH_OPACITY,
        }
    }
}

impl AnchorLayout {
    /// Vertical offset of the `index`-th marker on one element.
    pub fn offset(&self, index: usize) -> f64 {
        self.first_offset + index as f64 * self.step
    }
}

/// A stroke/fill style applied to score elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightStyle {
    pub stroke: String,
    pub fill: String,
    pub fill_opacity: f64,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            stroke: "#ff0487".to_string(),
            fill: "#ff0000".to_string(),
            fill_opacity: 1.0,
        }
    }
}

impl HighlightStyle {
    /// Style of a note under the pointer.
    pub fn hover() -> Self {
        Self::solid("#FE9A2E")
    }

    /// Style restored when the pointer leaves a note.
    pub fn plain() -> Self {
        Self::solid("#000000")
    }

    fn solid(color: &str) -> Self {
        Self {
            stroke: color.to_string(),
            fill: color.to_string(),
            fill_opacity: 1.0,
        }
    }

    /// Inline CSS form, as written into a `style` attribute.
    pub fn to_css(&self) -> String {
        format!(
            "stroke:{};fill:{};fill-opacity:{}",
            self.stroke, self.fill, self.fill_opacity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let cfg = ClientConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, ClientConfig::default());
        assert_eq!(cfg.anchors.offset(0), 600.0);
        assert_eq!(cfg.anchors.offset(1), 780.0);
    }

    #[test]
    fn partial_anchor_layout_keeps_other_defaults() {
        let cfg = ClientConfig::from_json_str(r#"{"anchors": {"step": 100}}"#).unwrap();
        assert_eq!(cfg.anchors.step, 100.0);
        assert_eq!(cfg.anchors.first_offset, 600.0);
        assert_eq!(cfg.csrf_header, "X-CSRFToken");
    }

    #[test]
    fn malformed_json_is_config_error() {
        let err = ClientConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, ScoreError::Config(_)));
    }
}
