//! Owned element arena for a rendered page.
//!
//! roxmltree gives a read-only view, so the parsed document is copied into
//! a flat arena that can be edited in place: markers appended, elements
//! detached, attributes rewritten.

use std::collections::HashMap;

use roxmltree::{Document, Node as XmlNode};

use crate::error::{Result, ScoreError};

pub(crate) const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
pub(crate) const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

pub(crate) type NodeId = usize;

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub(crate) struct Tree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    /// Namespace declarations of the root element: (prefix, uri)
    pub(crate) namespaces: Vec<(Option<String>, String)>,
    /// `id` attribute → node, for attached elements only
    pub(crate) ids: HashMap<String, NodeId>,
    /// Slots of detached nodes, reused by the next insertions
    free: Vec<NodeId>,
}

impl Tree {
    pub(crate) fn parse(svg: &str) -> Result<Tree> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let doc = Document::parse_with_options(svg, options)
            .map_err(|e| ScoreError::Xml(e.to_string()))?;
        let root_el = doc.root_element();

        let namespaces = root_el
            .namespaces()
            .filter(|ns| ns.uri() != XML_NS)
            .map(|ns| (ns.name().map(String::from), ns.uri().to_string()))
            .collect();

        let mut tree = Tree {
            nodes: Vec::new(),
            root: 0,
            namespaces,
            ids: HashMap::new(),
            free: Vec::new(),
        };
        tree.root = tree.copy_element(&root_el, None);
        Ok(tree)
    }

    fn copy_element(&mut self, xml: &XmlNode, parent: Option<NodeId>) -> NodeId {
        let attrs = xml
            .attributes()
            .map(|a| (qualified_name(a.namespace(), a.name()), a.value().to_string()))
            .collect();
        let id = self.push(
            NodeKind::Element {
                name: xml.tag_name().name().to_string(),
                attrs,
            },
            parent,
        );

        for child in xml.children() {
            if child.is_element() {
                self.copy_element(&child, Some(id));
            } else if child.is_text() {
                if let Some(text) = child.text() {
                    if !text.trim().is_empty() {
                        self.push(NodeKind::Text(text.to_string()), Some(id));
                    }
                }
            }
        }
        id
    }

    /// Add a node at the end of `parent`'s children.
    pub(crate) fn push(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let element_id = match &kind {
            NodeKind::Element { attrs, .. } => {
                attrs.iter().find(|(k, _)| k == "id").map(|(_, v)| v.clone())
            }
            NodeKind::Text(_) => None,
        };
        let id = self.push_unindexed(kind, parent);
        if let Some(v) = element_id {
            self.ids.insert(v, id);
        }
        id
    }

    /// Like [`Tree::push`], but the node's `id` is left out of the index.
    pub(crate) fn push_unindexed(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let node = Node {
            kind,
            parent,
            children: Vec::new(),
        };
        let id = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        if let Some(p) = parent {
            self.nodes[p].children.push(id);
        }
        id
    }

    /// Remove a node and its subtree from the document. Their slots are
    /// handed out again by later insertions.
    pub(crate) fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent {
            self.nodes[parent].children.retain(|&c| c != id);
        }
        for n in self.subtree(id) {
            if let Some(eid) = self.attr(n, "id").map(String::from) {
                if self.ids.get(&eid) == Some(&n) {
                    self.ids.remove(&eid);
                }
            }
            let node = &mut self.nodes[n];
            node.parent = None;
            node.children.clear();
            node.kind = NodeKind::Text(String::new());
            self.free.push(n);
        }
    }

    /// Pre-order list of `id` and its descendants.
    pub(crate) fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n].children.iter().rev());
        }
        out
    }

    /// Attached elements in document order.
    pub(crate) fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.subtree(self.root)
            .into_iter()
            .filter(move |&n| matches!(self.nodes[n].kind, NodeKind::Element { .. }))
    }

    pub(crate) fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element { name, .. } => Some(name),
            NodeKind::Text(_) => None,
        }
    }

    pub(crate) fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element { attrs, .. } => {
                attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
            }
            NodeKind::Text(_) => None,
        }
    }

    pub(crate) fn set_attr(&mut self, id: NodeId, key: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id].kind {
            match attrs.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1 = value.to_string(),
                None => attrs.push((key.to_string(), value.to_string())),
            }
        }
    }

    pub(crate) fn remove_attr(&mut self, id: NodeId, key: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id].kind {
            attrs.retain(|(k, _)| k != key);
        }
    }

    pub(crate) fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    pub(crate) fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let value = match self.attr(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attr(id, "class", &value);
    }

    pub(crate) fn remove_class(&mut self, id: NodeId, class: &str) {
        let Some(existing) = self.attr(id, "class") else {
            return;
        };
        let kept: Vec<&str> = existing.split_whitespace().filter(|c| *c != class).collect();
        if kept.is_empty() {
            self.remove_attr(id, "class");
        } else {
            let value = kept.join(" ");
            self.set_attr(id, "class", &value);
        }
    }

    /// Closest ancestor (excluding `id` itself) that carries `class`.
    pub(crate) fn ancestor_with_class(&self, id: NodeId, class: &str) -> Option<NodeId> {
        let mut cur = self.nodes[id].parent;
        while let Some(n) = cur {
            if self.has_class(n, class) {
                return Some(n);
            }
            cur = self.nodes[n].parent;
        }
        None
    }
}

fn qualified_name(namespace: Option<&str>, local: &str) -> String {
    match namespace {
        Some(XLINK_NS) => format!("xlink:{local}"),
        Some(XML_NS) => format!("xml:{local}"),
        _ => local.to_string(),
    }
}
