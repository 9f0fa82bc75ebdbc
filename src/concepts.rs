//! Concept tree UI: the checkbox list that shows or hides annotations per
//! concept, and the indented option list used by the annotation forms.
//!
//! Both are rebuilt from scratch whenever a model is selected. They are
//! plain values built by recursion over the concept tree, rendered to
//! markup only at the edge.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{walk_concepts, Concept};

/// A `<ul>` of concepts under one parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptList {
    /// `concepts_list:{parent_code}`
    pub id: String,
    pub items: Vec<ConceptItem>,
}

/// One concept with its visibility checkbox.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptItem {
    /// The concept code; also the checkbox name
    pub code: String,
    pub name: String,
    pub description: String,
    pub color: String,
    /// Glyph path data, present for leaves only
    pub icon: Option<String>,
    pub checked: bool,
    pub children: ConceptList,
}

impl ConceptItem {
    pub fn item_id(&self) -> String {
        format!("concept_item:{}", self.code)
    }

    pub fn checkbox_id(&self) -> String {
        format!("concept_checkbox:{}", self.code)
    }
}

/// Build the checkbox tree for `concepts`, all checkboxes set to `checked`.
pub fn checkbox_tree(concepts: &[Concept], parent_code: &str, checked: bool) -> ConceptList {
    ConceptList {
        id: format!("concepts_list:{parent_code}"),
        items: concepts
            .iter()
            .map(|c| ConceptItem {
                code: c.code.clone(),
                name: c.name.clone(),
                description: c.description.clone(),
                color: c.display_options.clone(),
                icon: c.is_leaf().then(|| c.icon.clone()),
                checked,
                children: checkbox_tree(&c.children, &c.code, checked),
            })
            .collect(),
    }
}

impl ConceptList {
    /// Total number of items, nested ones included.
    pub fn len(&self) -> usize {
        self.items.iter().map(|i| 1 + i.children.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, code: &str) -> Option<&ConceptItem> {
        self.items
            .iter()
            .find_map(|i| if i.code == code { Some(i) } else { i.children.find(code) })
    }

    /// Set one checkbox. Descendants keep their own state.
    pub fn set_checked(&mut self, code: &str, checked: bool) -> bool {
        for item in &mut self.items {
            if item.code == code {
                item.checked = checked;
                return true;
            }
            if item.children.set_checked(code, checked) {
                return true;
            }
        }
        false
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push_str(&format!(r#"<ul id="{}">"#, escape(&self.id)));
        for item in &self.items {
            out.push_str(&format!(r#"<li id="{}">"#, escape(&item.item_id())));
            out.push_str(&format!(
                r#"<input id="{}" type="checkbox" name="{}"{}/>"#,
                escape(&item.checkbox_id()),
                escape(&item.code),
                if item.checked { " checked" } else { "" }
            ));
            out.push_str(&format!(
                r#"<span class="tooltip" style="color:{}">"#,
                escape(&item.color)
            ));
            if let Some(icon) = &item.icon {
                out.push_str(&format!(
                    r#"<span class="svg-icon-container"><svg class="svg-icon" viewBox="0 0 5 5"><path d="{}" id="icon-{}" style="fill:{};fill-opacity:1;stroke:none;"/></svg></span>"#,
                    escape(icon),
                    escape(&item.name),
                    escape(&item.color)
                ));
            }
            out.push_str(&format!(" {}", escape(&item.name)));
            out.push_str(r#"<img src="/static/images/question_mark_icon.jpg" width="15" height="15" class="question-mark"/>"#);
            out.push_str(&format!(
                r#"<span class="tooltiptext"> {}</span>"#,
                escape(&item.description)
            ));
            out.push_str("</span>");
            if !item.children.is_empty() {
                item.children.write_html(out);
            }
            out.push_str("</li>");
        }
        out.push_str("</ul>");
    }
}

/// An entry of the concept select list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    /// Only leaves can be chosen
    pub disabled: bool,
}

/// Flatten a concept forest into indented options, parents first.
pub fn select_options(concepts: &[Concept]) -> Vec<SelectOption> {
    walk_concepts(concepts)
        .into_iter()
        .map(|(depth, c)| SelectOption {
            value: c.code.clone(),
            label: format!(" {} {} ", "--".repeat(depth), c.name),
            disabled: !c.is_leaf(),
        })
        .collect()
}

/// `<option>` markup for a select list.
pub fn render_select(options: &[SelectOption]) -> String {
    options
        .iter()
        .map(|o| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                escape(&o.value),
                if o.disabled { " disabled" } else { "" },
                escape(&o.label)
            )
        })
        .collect()
}

/// Which concepts currently have their annotations shown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConceptVisibility(BTreeMap<String, bool>);

impl ConceptVisibility {
    pub fn set(&mut self, code: &str, shown: bool) {
        self.0.insert(code.to_string(), shown);
    }

    /// Concepts are shown until explicitly hidden.
    pub fn is_shown(&self, code: &str) -> bool {
        self.0.get(code).copied().unwrap_or(true)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn hidden(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, shown)| !**shown)
            .map(|(code, _)| code.as_str())
            .collect()
    }
}

fn escape(content: &str) -> String {
    content
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
