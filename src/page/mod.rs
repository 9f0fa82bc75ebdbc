//! The rendered score page as an editable element tree.
//!
//! The toolkit hands back one SVG string per page. [`SvgPage`] parses it
//! into an owned tree, lets the anchor and playback layers decorate it, and
//! writes it back out with [`SvgPage::to_svg_string`]. Code that only needs
//! to decorate a page goes through the [`ScoreSurface`] trait.

mod geometry;
pub(crate) mod tree;
mod writer;

use crate::config::HighlightStyle;
use crate::error::{Result, ScoreError};
use tree::{NodeId, NodeKind, Tree};

/// Class carried by every annotation marker.
pub const MARKER_CLASS: &str = "anchor";

/// An annotation marker ready to be attached to a score element.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Composite anchor id
    pub id: String,
    pub x: f64,
    pub y: f64,
    /// Width and height of the marker viewport
    pub size: f64,
    /// Id of the glyph path
    pub glyph_id: String,
    /// SVG path data of the glyph (drawn in a 5×5 view box)
    pub path_data: String,
    pub color: String,
    pub opacity: f64,
}

/// Operations the annotation and playback layers need from a rendered page.
pub trait ScoreSurface {
    /// Ids of elements carrying `class`, in document order.
    fn element_ids_of_class(&self, class: &str) -> Vec<String>;

    fn contains(&self, id: &str) -> bool;

    /// Append `marker` as the last child of element `parent_id`. A marker
    /// with the same id is replaced.
    fn append_marker(&mut self, parent_id: &str, marker: &Marker) -> Result<()>;

    /// Remove an element and its subtree. Returns whether it existed.
    fn remove_element(&mut self, id: &str) -> bool;

    /// Ids of every marker currently on the page.
    fn marker_ids(&self) -> Vec<String>;

    /// Where a marker for `id` sits before stacking.
    fn anchor_origin(&self, id: &str) -> Option<(f64, f64)>;

    fn add_class(&mut self, id: &str, class: &str) -> bool;

    fn remove_class(&mut self, id: &str, class: &str) -> bool;

    fn set_style(&mut self, id: &str, style: &HighlightStyle) -> bool;
}

/// One rendered page.
#[derive(Debug, Clone)]
pub struct SvgPage {
    tree: Tree,
}

impl SvgPage {
    /// Parse the SVG markup of a page.
    pub fn parse(svg: &str) -> Result<Self> {
        Ok(Self {
            tree: Tree::parse(svg)?,
        })
    }

    /// Serialize the page, including every decoration applied so far.
    pub fn to_svg_string(&self) -> String {
        writer::write_svg(&self.tree)
    }

    fn node(&self, id: &str) -> Option<NodeId> {
        self.tree.ids.get(id).copied()
    }

    /// Value of an attribute of the element with the given id.
    pub fn attribute(&self, id: &str, key: &str) -> Option<&str> {
        self.node(id).and_then(|n| self.tree.attr(n, key))
    }

    /// Local tag name of the element with the given id.
    pub fn tag_name(&self, id: &str) -> Option<&str> {
        self.node(id).and_then(|n| self.tree.name(n))
    }

    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.node(id).is_some_and(|n| self.tree.has_class(n, class))
    }

    /// Ids of the direct element children of `id`.
    pub fn child_ids(&self, id: &str) -> Vec<String> {
        let Some(n) = self.node(id) else {
            return Vec::new();
        };
        self.tree.nodes[n]
            .children
            .iter()
            .filter_map(|&c| self.tree.attr(c, "id").map(String::from))
            .collect()
    }

    /// Id of the element's parent, if the parent has one.
    pub fn parent_id(&self, id: &str) -> Option<&str> {
        let parent = self.tree.nodes[self.node(id)?].parent?;
        self.tree.attr(parent, "id")
    }

    /// Position of the element's first coordinate pair.
    pub fn element_position(&self, id: &str) -> Option<(f64, f64)> {
        self.node(id).and_then(|n| geometry::first_position(&self.tree, n))
    }

    /// Index, in document order, of the `g.system` that contains `id`.
    pub fn system_index(&self, id: &str) -> Option<usize> {
        let system = self.tree.ancestor_with_class(self.node(id)?, "system")?;
        self.tree
            .elements()
            .filter(|&n| self.tree.has_class(n, "system"))
            .position(|n| n == system)
    }

    /// Width of the page's root element, when it is a plain number.
    pub fn width(&self) -> Option<f64> {
        let w = self.tree.attr(self.tree.root, "width")?;
        w.trim_end_matches("px").trim().parse().ok()
    }

    fn element(&mut self, name: &str, attrs: Vec<(String, String)>, parent: NodeId) -> NodeId {
        self.tree.push(
            NodeKind::Element {
                name: name.to_string(),
                attrs,
            },
            Some(parent),
        )
    }
}

impl ScoreSurface for SvgPage {
    fn element_ids_of_class(&self, class: &str) -> Vec<String> {
        self.tree
            .elements()
            .filter(|&n| self.tree.has_class(n, class))
            .filter_map(|n| self.tree.attr(n, "id").map(String::from))
            .collect()
    }

    fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    fn append_marker(&mut self, parent_id: &str, marker: &Marker) -> Result<()> {
        let parent = self
            .node(parent_id)
            .ok_or_else(|| ScoreError::MissingElement(parent_id.to_string()))?;
        if let Some(existing) = self.node(&marker.id) {
            self.tree.detach(existing);
        }

        let attrs = vec![
            ("class".to_string(), MARKER_CLASS.to_string()),
            ("id".to_string(), marker.id.clone()),
            ("x".to_string(), format!("{}", marker.x)),
            ("y".to_string(), format!("{}", marker.y)),
            ("width".to_string(), format!("{}", marker.size)),
            ("height".to_string(), format!("{}", marker.size)),
            ("viewBox".to_string(), "0 0 5 5".to_string()),
        ];
        let svg = self.element("svg", attrs, parent);

        // The glyph id is shared by every marker of the element, so it is
        // not registered in the id index.
        self.tree.push_unindexed(
            NodeKind::Element {
                name: "path".to_string(),
                attrs: vec![
                    ("id".to_string(), marker.glyph_id.clone()),
                    ("d".to_string(), marker.path_data.clone()),
                    ("fill-opacity".to_string(), format!("{}", marker.opacity)),
                    ("fill".to_string(), marker.color.clone()),
                    ("stroke".to_string(), "none".to_string()),
                ],
            },
            Some(svg),
        );
        Ok(())
    }

    fn remove_element(&mut self, id: &str) -> bool {
        match self.node(id) {
            Some(n) => {
                self.tree.detach(n);
                true
            }
            None => false,
        }
    }

    fn marker_ids(&self) -> Vec<String> {
        self.element_ids_of_class(MARKER_CLASS)
    }

    fn anchor_origin(&self, id: &str) -> Option<(f64, f64)> {
        self.node(id).and_then(|n| geometry::anchor_origin(&self.tree, n))
    }

    fn add_class(&mut self, id: &str, class: &str) -> bool {
        match self.node(id) {
            Some(n) => {
                self.tree.add_class(n, class);
                true
            }
            None => false,
        }
    }

    fn remove_class(&mut self, id: &str, class: &str) -> bool {
        match self.node(id) {
            Some(n) => {
                self.tree.remove_class(n, class);
                true
            }
            None => false,
        }
    }

    fn set_style(&mut self, id: &str, style: &HighlightStyle) -> bool {
        match self.node(id) {
            Some(n) => {
                self.tree.set_attr(n, "style", &style.to_css());
                true
            }
            None => false,
        }
    }
}
