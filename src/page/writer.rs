//! Serializes an edited page back to SVG markup.

use super::tree::{NodeId, NodeKind, Tree};

pub(super) fn write_svg(tree: &Tree) -> String {
    let mut out = String::new();
    write_node(tree, tree.root, true, &mut out);
    out.push('\n');
    out
}

fn write_node(tree: &Tree, id: NodeId, is_root: bool, out: &mut String) {
    let node = &tree.nodes[id];
    match &node.kind {
        NodeKind::Text(text) => out.push_str(&escape_text(text)),
        NodeKind::Element { name, attrs } => {
            out.push('<');
            out.push_str(name);
            if is_root {
                for (prefix, uri) in &tree.namespaces {
                    match prefix {
                        Some(p) => out.push_str(&format!(r#" xmlns:{p}="{}""#, escape_attr(uri))),
                        None => out.push_str(&format!(r#" xmlns="{}""#, escape_attr(uri))),
                    }
                }
            }
            for (k, v) in attrs {
                out.push_str(&format!(r#" {k}="{}""#, escape_attr(v)));
            }
            if node.children.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for &child in &node.children {
                write_node(tree, child, false, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}

fn escape_text(content: &str) -> String {
    content
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(content: &str) -> String {
    escape_text(content).replace('"', "&quot;")
}
