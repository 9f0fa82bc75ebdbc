//! Data model for the REST payloads the client consumes.
//!
//! Annotations follow the W3C web-annotation shape produced by the backend,
//! extended with the analytic model/concept the annotation classifies and
//! the display style of that concept.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Motivation values the backend emits.
pub const MOTIVATION_LINKING: &str = "linking";
pub const MOTIVATION_COMMENTING: &str = "commenting";
pub const MOTIVATION_QUESTIONING: &str = "questioning";

/// Concept code meaning "every concept of the model".
pub const ALL_CONCEPTS: &str = "_all";

// ─── Identifiers ─────────────────────────────────────────────────────

/// Identifier of an annotation.
///
/// The backend sends either a bare number (`5`) or a formatted string
/// (`"annot5"`); both are kept verbatim as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AnnotationId(pub String);

impl AnnotationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnnotationId {
    fn from(s: &str) -> Self {
        AnnotationId(s.to_string())
    }
}

impl From<u64> for AnnotationId {
    fn from(n: u64) -> Self {
        AnnotationId(n.to_string())
    }
}

impl<'de> Deserialize<'de> for AnnotationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        flexible_id(deserializer).map(AnnotationId)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Accept a number or a string where the backend is inconsistent about ids.
fn flexible_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(n) => n.to_string(),
        RawId::Float(f) => f.to_string(),
        RawId::Text(s) => s,
    })
}

// ─── Annotations ─────────────────────────────────────────────────────

/// An annotation attached to one element (note, measure) of a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    #[serde(default)]
    pub creator: Creator,
    /// One of the `MOTIVATION_*` values
    #[serde(default)]
    pub motivation: String,
    /// Code of the analytic model (e.g. "quality")
    #[serde(default)]
    pub annotation_model: String,
    /// Code of the concept inside the model
    #[serde(default)]
    pub annotation_concept: String,
    #[serde(default)]
    pub target: Target,
    #[serde(default)]
    pub body: Body,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Replacement MEI markup for the target element, if any
    #[serde(default)]
    pub xml_fragment: Option<String>,
    /// Marker glyph and colour, copied from the concept
    #[serde(default)]
    pub style: Option<Style>,
}

impl Annotation {
    /// A bare annotation with only an id, as used by tests and placeholders.
    pub fn with_id(id: impl Into<AnnotationId>) -> Self {
        Self {
            id: id.into(),
            creator: Creator::default(),
            motivation: String::new(),
            annotation_model: String::new(),
            annotation_concept: String::new(),
            target: Target::default(),
            body: Body::default(),
            created: None,
            modified: None,
            comment: None,
            xml_fragment: None,
            style: None,
        }
    }

    pub fn with_style(mut self, icon: &str, color: &str) -> Self {
        self.style = Some(Style {
            icon: icon.to_string(),
            color: color.to_string(),
        });
        self
    }

    /// Style to draw the marker with. Falls back to the backend's default
    /// concept colour with an empty glyph.
    pub fn marker_style(&self) -> Style {
        self.style.clone().unwrap_or_default()
    }
}

/// The agent that created an annotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    #[serde(default, deserialize_with = "flexible_id")]
    pub id: String,
    /// "Person" or "Software"
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
}

/// What an annotation is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default, alias = "source")]
    pub resource: SpecificResource,
}

/// A web resource, optionally narrowed to a fragment by a selector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecificResource {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub selector: Option<FragmentSelector>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentSelector {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default, rename = "conformsTo")]
    pub conforms_to: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// What is said about the target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Body {
    TextualBody {
        #[serde(default)]
        value: String,
    },
    SpecificResource {
        #[serde(default)]
        resource: SpecificResource,
    },
    #[default]
    #[serde(other)]
    Other,
}

/// Marker glyph (SVG path data) and colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default)]
    pub icon: String,
    #[serde(default = "default_concept_color")]
    pub color: String,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            icon: String::new(),
            color: default_concept_color(),
        }
    }
}

fn default_concept_color() -> String {
    "#ff0000".to_string()
}

/// Annotations of a score grouped by the id of the element they target.
/// Within one element the order is exactly the server's order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationMap(pub BTreeMap<String, Vec<Annotation>>);

impl AnnotationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, element_id: impl Into<String>, annotations: Vec<Annotation>) {
        self.0.insert(element_id.into(), annotations);
    }

    /// Annotations of one element, if it has any.
    pub fn get(&self, element_id: &str) -> Option<&[Annotation]> {
        self.0.get(element_id).map(Vec::as_slice)
    }

    pub fn contains(&self, element_id: &str) -> bool {
        self.0.contains_key(element_id)
    }

    /// Number of annotated elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of annotations across all elements.
    pub fn annotation_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Annotation])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Every non-empty inline markup fragment, element by element.
    pub fn xml_fragments(&self) -> Vec<XmlFragment> {
        self.iter()
            .flat_map(|(element_id, annotations)| {
                annotations.iter().filter_map(move |a| match a.xml_fragment.as_deref() {
                    Some(frag) if !frag.is_empty() => Some(XmlFragment {
                        element_id: element_id.to_string(),
                        xml_fragment: frag.to_string(),
                    }),
                    _ => None,
                })
            })
            .collect()
    }
}

/// Inline markup proposed as a replacement for one score element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XmlFragment {
    pub element_id: String,
    pub xml_fragment: String,
}

// ─── Concepts ────────────────────────────────────────────────────────

/// A node of an analytic model's concept taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    /// Unique key
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Display colour
    #[serde(default = "default_concept_color")]
    pub display_options: String,
    /// SVG path data of the marker glyph
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub children: Vec<Concept>,
}

impl Concept {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            description: String::new(),
            display_options: default_concept_color(),
            icon: String::new(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Concept>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + tree_node_count(&self.children)
    }

    /// Find a concept by code in this subtree.
    pub fn find(&self, code: &str) -> Option<&Concept> {
        if self.code == code {
            return Some(self);
        }
        find_concept(&self.children, code)
    }
}

/// Total number of nodes in a forest of concepts.
pub fn tree_node_count(concepts: &[Concept]) -> usize {
    concepts.iter().map(Concept::node_count).sum()
}

/// Find a concept by code in a forest.
pub fn find_concept<'a>(concepts: &'a [Concept], code: &str) -> Option<&'a Concept> {
    concepts.iter().find_map(|c| c.find(code))
}

/// Pre-order walk of a forest, yielding each concept with its depth.
pub fn walk_concepts(concepts: &[Concept]) -> Vec<(usize, &Concept)> {
    fn visit<'a>(concepts: &'a [Concept], depth: usize, out: &mut Vec<(usize, &'a Concept)>) {
        for c in concepts {
            out.push((depth, c));
            visit(&c.children, depth + 1, out);
        }
    }
    let mut out = Vec::new();
    visit(concepts, 0, &mut out);
    out
}

// ─── Misc payloads ───────────────────────────────────────────────────

/// The currently connected user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
}

impl User {
    pub fn is_authenticated(&self) -> bool {
        !self.username.is_empty()
    }
}

/// Description of one score element, with its annotations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementDetail {
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// Result of a comparison computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonCost {
    #[serde(default)]
    pub cost: Option<f64>,
}

/// The two MEI documents of a comparison view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonScores {
    pub score1_mei: String,
    pub score2_mei: String,
}

/// Result of importing an uploaded archive into a corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    #[serde(default)]
    pub imported_opera: Vec<ImportedOpus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedOpus {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
}
