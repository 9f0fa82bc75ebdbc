//! Concept tree UI built from a model's taxonomy.

mod common;

use common::fixture;
use pretty_assertions::assert_eq;
use scoremark::concepts::{checkbox_tree, render_select, select_options, ConceptVisibility, SelectOption};
use scoremark::{tree_node_count, Concept};

fn concepts() -> Vec<Concept> {
    serde_json::from_str(&fixture("concepts.json")).expect("Failed to parse concepts.json")
}

#[test]
fn checkbox_tree_mirrors_the_taxonomy() {
    let list = checkbox_tree(&concepts(), "_all", true);

    assert_eq!(list.id, "concepts_list:_all");
    assert_eq!(list.len(), tree_node_count(&concepts()));
    assert_eq!(list.items.len(), 2);

    let dissonance = &list.items[0];
    assert_eq!(dissonance.item_id(), "concept_item:dissonance");
    assert_eq!(dissonance.checkbox_id(), "concept_checkbox:dissonance");
    assert_eq!(dissonance.children.id, "concepts_list:dissonance");
    assert_eq!(dissonance.color, "#ff0000");
    // Only leaves show their glyph
    assert_eq!(dissonance.icon, None);

    let retardation = list.find("retardation").expect("nested concept");
    assert_eq!(retardation.icon.as_deref(), Some("M1 1 L4 4"));
    assert!(retardation.checked);
    assert_eq!(list.find("suspension").map(|c| c.children.id.as_str()), Some("concepts_list:suspension"));
}

#[test]
fn unchecking_does_not_cascade() {
    let mut list = checkbox_tree(&concepts(), "_all", true);
    assert!(list.set_checked("dissonance", false));

    assert!(!list.find("dissonance").unwrap().checked);
    assert!(list.find("suspension").unwrap().checked);
    assert!(list.find("retardation").unwrap().checked);
    assert!(!list.set_checked("missing", false));
}

#[test]
fn checkbox_html_carries_ids_and_names() {
    let html = checkbox_tree(&concepts(), "_all", false).to_html();

    assert!(html.starts_with(r#"<ul id="concepts_list:_all"><li id="concept_item:dissonance">"#));
    assert!(html.contains(r#"<input id="concept_checkbox:cadence" type="checkbox" name="cadence"/>"#));
    assert!(!html.contains(" checked"));
    assert!(html.contains(r#"<ul id="concepts_list:suspension">"#));
    assert!(html.contains(r#"<path d="M0 0 H5 V5 H0 Z" id="icon-Cadence""#));
    assert_eq!(html.matches("<li ").count(), 5);
}

#[test]
fn select_options_flatten_with_indentation() {
    let options = select_options(&concepts());

    assert_eq!(options.len(), tree_node_count(&concepts()));
    assert_eq!(
        options,
        vec![
            SelectOption { value: "dissonance".into(), label: "  Dissonance ".into(), disabled: true },
            SelectOption { value: "unprepared".into(), label: " -- Unprepared ".into(), disabled: false },
            SelectOption { value: "suspension".into(), label: " -- Suspension ".into(), disabled: true },
            SelectOption { value: "retardation".into(), label: " ---- Retardation ".into(), disabled: false },
            SelectOption { value: "cadence".into(), label: "  Cadence ".into(), disabled: false },
        ]
    );
}

#[test]
fn disabled_iff_node_has_children() {
    let options = select_options(&concepts());
    for option in &options {
        let concept = scoremark::find_concept(&concepts(), &option.value).cloned().unwrap();
        assert_eq!(option.disabled, !concept.is_leaf(), "{}", option.value);
    }
}

#[test]
fn select_markup() {
    let options = select_options(&[Concept::new("a&b", "A & B").with_children(vec![Concept::new("c", "C")])]);
    assert_eq!(
        render_select(&options),
        r#"<option value="a&amp;b" disabled>  A &amp; B </option><option value="c"> -- C </option>"#
    );
}

#[test]
fn empty_taxonomy() {
    let list = checkbox_tree(&[], "quality", true);
    assert!(list.is_empty());
    assert_eq!(list.to_html(), r#"<ul id="concepts_list:quality"></ul>"#);
    assert!(select_options(&[]).is_empty());
}

#[test]
fn visibility_defaults_to_shown() {
    let mut visibility = ConceptVisibility::default();
    assert!(visibility.is_shown("dissonance"));
    visibility.set("dissonance", false);
    visibility.set("cadence", true);
    assert!(!visibility.is_shown("dissonance"));
    assert_eq!(visibility.hidden(), vec!["dissonance"]);
    visibility.clear();
    assert!(visibility.hidden().is_empty());
}
