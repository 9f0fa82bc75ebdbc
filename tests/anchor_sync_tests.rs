//! Anchor synchronization against a rendered page.

mod common;

use common::{fixture, init_logger};
use pretty_assertions::assert_eq;
use scoremark::{
    annotations_from_json, clear_anchors, decorate_svg, sync_anchors, AnchorKey, AnchorLayout, Annotation,
    AnnotationMap, ClearScope, ScoreSurface, SvgPage, SyncReport,
};

fn page() -> SvgPage {
    SvgPage::parse(&fixture("page1.svg")).expect("Failed to parse page1.svg")
}

fn annotations() -> AnnotationMap {
    annotations_from_json(&fixture("annotations.json")).expect("Failed to parse annotations.json")
}

#[test]
fn single_annotation_gets_one_marker_under_its_element() {
    init_logger();
    let mut page = page();
    let mut map = AnnotationMap::new();
    map.insert("n12", vec![Annotation::with_id(5u64).with_style("M0 0", "red")]);

    let report = sync_anchors(&mut page, "opusA", "quality", &map, true, &AnchorLayout::default());

    assert_eq!(report, SyncReport { added: 1, removed: 0, skipped: 0 });
    assert_eq!(page.marker_ids(), vec!["opusA@n12@5@quality"]);
    assert_eq!(page.parent_id("opusA@n12@5@quality"), Some("n12"));
    assert_eq!(page.child_ids("n12").last().map(String::as_str), Some("opusA@n12@5@quality"));

    // Aligned with the note head, 600 above the top staff line
    assert_eq!(page.attribute("opusA@n12@5@quality", "x"), Some("500"));
    assert_eq!(page.attribute("opusA@n12@5@quality", "y"), Some("820"));
    assert_eq!(page.attribute("opusA@n12@5@quality", "width"), Some("380"));
    assert_eq!(page.attribute("opusA@n12@5@quality", "height"), Some("380"));
    assert_eq!(page.attribute("opusA@n12@5@quality", "viewBox"), Some("0 0 5 5"));
    assert_eq!(page.attribute("opusA@n12@5@quality", "class"), Some("anchor"));

    let svg = page.to_svg_string();
    assert!(
        svg.contains(r#"<path id="icon:n12" d="M0 0" fill-opacity="0.6" fill="red" stroke="none"/>"#),
        "glyph path missing in {svg}"
    );
}

#[test]
fn stacked_annotations_are_offset_in_server_order() {
    init_logger();
    let mut page = page();
    let report = sync_anchors(&mut page, "corpus:opusA", "quality", &annotations(), true, &AnchorLayout::default());

    assert_eq!(report.added, 3);
    // n99 is not on this page
    assert_eq!(report.skipped, 1);

    assert_eq!(page.attribute("corpus:opusA@n12@5@quality", "y"), Some("820"));
    assert_eq!(page.attribute("corpus:opusA@n12@6@quality", "y"), Some("640"));
    assert_eq!(
        page.child_ids("n12"),
        vec!["corpus:opusA@n12@5@quality", "corpus:opusA@n12@6@quality"]
    );

    // Measures take their origin from their first staff line
    assert_eq!(page.attribute("corpus:opusA@m2@7@quality", "x"), Some("361"));
    assert_eq!(page.attribute("corpus:opusA@m2@7@quality", "y"), Some("2820"));
}

#[test]
fn offsets_follow_the_layout() {
    let layout = AnchorLayout::default();
    assert_eq!(layout.offset(0), 600.0);
    assert_eq!(layout.offset(1), 780.0);
    assert_eq!(layout.offset(2), 960.0);

    let mut page = page();
    let mut map = AnnotationMap::new();
    map.insert(
        "n13",
        vec![
            Annotation::with_id(1u64),
            Annotation::with_id(2u64),
            Annotation::with_id(3u64),
        ],
    );
    sync_anchors(&mut page, "o", "m", &map, true, &layout);
    // Staff top line is at 1420 whatever the note's own y
    let ys: Vec<_> = ["o@n13@1@m", "o@n13@2@m", "o@n13@3@m"]
        .iter()
        .map(|id| page.attribute(id, "y").map(String::from))
        .collect();
    assert_eq!(
        ys,
        vec![Some("820".to_string()), Some("640".to_string()), Some("460".to_string())]
    );
}

#[test]
fn unannotated_elements_never_get_markers() {
    let mut page = page();
    sync_anchors(&mut page, "opusA", "quality", &annotations(), true, &AnchorLayout::default());

    for id in ["n13", "n21", "n22", "m1"] {
        assert!(
            page.child_ids(id).iter().all(|c| !c.contains('@')),
            "{id} should carry no marker"
        );
    }
    for marker in page.marker_ids() {
        let key: AnchorKey = marker.parse().expect("marker ids are anchor keys");
        assert!(annotations().contains(key.element_id()));
    }
}

#[test]
fn show_then_hide_leaves_no_markers() {
    let mut page = page();
    let before = page.to_svg_string();
    let layout = AnchorLayout::default();
    let map = annotations();

    sync_anchors(&mut page, "opusA", "quality", &map, true, &layout);
    assert_eq!(page.marker_ids().len(), 3);

    let report = sync_anchors(&mut page, "opusA", "quality", &map, false, &layout);
    assert_eq!(report.removed, 3);
    assert!(page.marker_ids().is_empty());
    assert_eq!(page.to_svg_string(), before);
}

#[test]
fn showing_twice_does_not_duplicate_markers() {
    let mut page = page();
    let layout = AnchorLayout::default();
    let map = annotations();
    sync_anchors(&mut page, "opusA", "quality", &map, true, &layout);
    sync_anchors(&mut page, "opusA", "quality", &map, true, &layout);
    assert_eq!(page.marker_ids().len(), 3);
    assert_eq!(
        page.child_ids("n12"),
        vec!["opusA@n12@5@quality", "opusA@n12@6@quality"]
    );
}

#[test]
fn clear_scope_all_and_by_model() {
    let mut page = page();
    let layout = AnchorLayout::default();
    let map = annotations();
    sync_anchors(&mut page, "opusA", "quality", &map, true, &layout);
    sync_anchors(&mut page, "opusA", "comparison", &map, true, &layout);
    assert_eq!(page.marker_ids().len(), 6);

    assert_eq!(clear_anchors(&mut page, &ClearScope::Model("comparison".to_string())), 3);
    assert!(page.marker_ids().iter().all(|id| id.ends_with("@quality")));

    assert_eq!(ClearScope::for_concept("_all", "quality"), ClearScope::All);
    assert_eq!(clear_anchors(&mut page, &ClearScope::for_concept("_all", "quality")), 3);
    assert!(page.marker_ids().is_empty());
}

#[test]
fn annotations_with_reserved_characters_are_skipped() {
    init_logger();
    let mut page = page();
    let mut map = AnnotationMap::new();
    map.insert("n12", vec![Annotation::with_id("a@b"), Annotation::with_id(9u64)]);
    let report = sync_anchors(&mut page, "opusA", "quality", &map, true, &AnchorLayout::default());
    assert_eq!(report.added, 1);
    // The valid annotation keeps its stacking index
    assert_eq!(page.attribute("opusA@n12@9@quality", "y"), Some("640"));
}

#[test]
fn decorate_svg_round_trips_through_markup() {
    let svg = decorate_svg(
        &fixture("page1.svg"),
        "opusA",
        "quality",
        &fixture("annotations.json"),
        &AnchorLayout::default(),
    )
    .expect("decorate");
    let page = SvgPage::parse(&svg).expect("decorated page parses");
    assert_eq!(
        page.marker_ids(),
        vec!["opusA@n12@5@quality", "opusA@n12@6@quality", "opusA@m2@7@quality"]
    );
    assert!(svg.contains("Allegro &amp; con brio"));
    assert!(svg.contains(r##"xlink:href="#E0A4""##));
}
