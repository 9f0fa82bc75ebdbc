//! scoremark: annotation anchors, concept trees and playback for rendered
//! MEI scores, backed by the score library's REST API.
//!
//! The notation toolkit renders MEI to one SVG document per page. This crate
//! decorates those pages with annotation markers keyed by
//! `{opus}@{element}@{annotation}@{model}`, builds the concept tree used to
//! filter them, follows MIDI playback on the page, and talks to the backend.
//!
//! # Example
//! ```no_run
//! use scoremark::{decorate_svg, AnchorLayout};
//!
//! let svg = std::fs::read_to_string("page1.svg").unwrap();
//! let annotations = std::fs::read_to_string("annotations.json").unwrap();
//! let decorated = decorate_svg(&svg, "corpus:opus1", "quality", &annotations, &AnchorLayout::default()).unwrap();
//! println!("{decorated}");
//! ```

pub mod anchor;
pub mod chart;
pub mod concepts;
pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod mei;
pub mod model;
pub mod page;
pub mod playback;
pub mod rest;
pub mod sync;

pub use anchor::AnchorKey;
pub use config::{AnchorLayout, ClientConfig, HighlightStyle};
pub use controller::{LogNotifier, Notifier, ScoreController};
pub use display::{NotationToolkit, ScoreDisplay, ToolkitOptions};
pub use error::{Result, ScoreError};
pub use model::*;
pub use page::{Marker, ScoreSurface, SvgPage};
pub use playback::{MidiPlayer, PlaybackBridge};
pub use rest::{ScoreClient, Transport, UreqTransport};
pub use sync::{clear_anchors, sync_anchors, ClearScope, SyncReport};

/// Parse an annotation map as returned by the annotations endpoint.
pub fn annotations_from_json(json: &str) -> Result<AnnotationMap> {
    serde_json::from_str(json).map_err(|e| ScoreError::Decode {
        url: "<inline>".to_string(),
        message: e.to_string(),
    })
}

/// Add the markers of every annotation in `annotations_json` to a rendered
/// page and return the decorated SVG.
pub fn decorate_svg(
    svg: &str,
    opus_ref: &str,
    model_code: &str,
    annotations_json: &str,
    layout: &AnchorLayout,
) -> Result<String> {
    let annotations = annotations_from_json(annotations_json)?;
    let mut page = SvgPage::parse(svg)?;
    sync_anchors(&mut page, opus_ref, model_code, &annotations, true, layout);
    Ok(page.to_svg_string())
}
