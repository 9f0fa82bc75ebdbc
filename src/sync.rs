//! Anchor synchronization: keep the markers on a page consistent with the
//! annotations fetched for the active concept scope.
//!
//! Markers carry no state of their own. Showing a scope creates exactly one
//! marker per (element, annotation) pair; hiding it removes the markers by
//! the same composite key. Nothing else touches them.

use log::{debug, warn};

use crate::anchor::{icon_id, AnchorKey};
use crate::config::AnchorLayout;
use crate::model::{Annotation, AnnotationMap};
use crate::page::{Marker, ScoreSurface};

/// Element classes that can carry annotations, scanned in this order.
pub const WATCHED_CLASSES: [&str; 2] = ["note", "measure"];

/// What a synchronization pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Markers appended
    pub added: usize,
    /// Markers removed
    pub removed: usize,
    /// Annotated elements not present on the page
    pub skipped: usize,
}

/// Which markers [`clear_anchors`] removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearScope {
    /// Every marker on the page
    All,
    /// Markers of one analytic model
    Model(String),
}

impl ClearScope {
    /// Scope for a concept code: `_all` clears everything.
    pub fn for_concept(concept_code: &str, model_code: &str) -> Self {
        if concept_code == crate::model::ALL_CONCEPTS {
            ClearScope::All
        } else {
            ClearScope::Model(model_code.to_string())
        }
    }

    fn matches(&self, key: &AnchorKey) -> bool {
        match self {
            ClearScope::All => true,
            ClearScope::Model(code) => key.model_code() == code,
        }
    }
}

/// Show (`visible`) or hide the markers for every annotation in `annotations`.
pub fn sync_anchors<S: ScoreSurface + ?Sized>(
    surface: &mut S,
    opus_ref: &str,
    model_code: &str,
    annotations: &AnnotationMap,
    visible: bool,
    layout: &AnchorLayout,
) -> SyncReport {
    debug!(
        "Sync anchors for opus {opus_ref}, model {model_code}: {} annotated elements, visible={visible}",
        annotations.len()
    );
    let mut report = SyncReport::default();

    for class in WATCHED_CLASSES {
        for element_id in surface.element_ids_of_class(class) {
            let Some(list) = annotations.get(&element_id) else {
                continue;
            };
            for (index, annotation) in list.iter().enumerate() {
                let key = match AnchorKey::new(opus_ref, &element_id, annotation.id.as_str(), model_code) {
                    Ok(key) => key,
                    Err(e) => {
                        warn!("Skipping annotation {} on {element_id}: {e}", annotation.id);
                        continue;
                    }
                };
                if visible {
                    let marker = marker_for(surface, &key, annotation, index, layout);
                    match surface.append_marker(&element_id, &marker) {
                        Ok(()) => report.added += 1,
                        Err(e) => warn!("Cannot attach anchor {key}: {e}"),
                    }
                } else if surface.remove_element(&key.to_string()) {
                    report.removed += 1;
                }
            }
        }
    }

    report.skipped = annotations
        .iter()
        .filter(|(element_id, _)| !surface.contains(element_id))
        .count();
    report
}

/// Remove the markers in `scope`. Returns how many were removed.
pub fn clear_anchors<S: ScoreSurface + ?Sized>(surface: &mut S, scope: &ClearScope) -> usize {
    let mut removed = 0;
    for id in surface.marker_ids() {
        let Ok(key) = id.parse::<AnchorKey>() else {
            continue;
        };
        if scope.matches(&key) && surface.remove_element(&id) {
            removed += 1;
        }
    }
    debug!("Cleared {removed} anchors ({scope:?})");
    removed
}

/// Build the marker of the `index`-th annotation stacked on an element.
pub fn marker_for<S: ScoreSurface + ?Sized>(
    surface: &S,
    key: &AnchorKey,
    annotation: &Annotation,
    index: usize,
    layout: &AnchorLayout,
) -> Marker {
    let (x, y) = surface.anchor_origin(key.element_id()).unwrap_or((0.0, 0.0));
    let style = annotation.marker_style();
    Marker {
        id: key.to_string(),
        x,
        y: y - layout.offset(index),
        size: layout.marker_size,
        glyph_id: icon_id(key.element_id()),
        path_data: style.icon,
        color: style.color,
        opacity: layout.glyph_opacity,
    }
}
