//! Analysis charts laid out under the rendered score.

mod common;

use common::fixture;
use pretty_assertions::assert_eq;
use scoremark::chart::{
    build_chart, note_positions, ChartElement, ChartKind, ChartPanel, ChartToggle, ConcordanceData, NotePosition,
};
use scoremark::SvgPage;

const RESULTS: &str = r#"{"results": [
    {"identifiant": "n12", "nombreDeNotes": 3, "concordance": 0.5, "coherence": 0.25, "concordanceTotale": 0.25, "concordanceOrdre3": 0.5},
    {"identifiant": "n13", "nombreDeNotes": 2, "concordance": -0.25, "coherence": 0.5, "concordanceTotale": 0.5, "concordanceOrdre3": 0.0},
    {"identifiant": "n21", "nombreDeNotes": 4, "concordance": 1.0, "coherence": 1.0, "concordanceTotale": 1.0, "concordanceOrdre3": 1.0},
    {"identifiant": "n22", "nombreDeNotes": 1, "concordance": 0.0, "coherence": 0.0, "concordanceTotale": 0.0, "concordanceOrdre3": 0.0}
]}"#;

fn data() -> ConcordanceData {
    serde_json::from_str(RESULTS).expect("Failed to parse results")
}

fn page() -> SvgPage {
    SvgPage::parse(&fixture("page1.svg")).expect("Failed to parse page1.svg")
}

#[test]
fn positions_come_from_the_page() {
    let positions = note_positions(&page(), ["n12", "n21", "missing"]);
    assert_eq!(positions.len(), 2);
    assert_eq!(positions["n12"], NotePosition { x: 500.0, system: 0 });
    assert_eq!(positions["n21"], NotePosition { x: 450.0, system: 1 });
}

#[test]
fn concordance_bars_span_to_the_next_note() {
    let data = data();
    let ids: Vec<&str> = data.results.iter().map(|r| r.identifiant.as_str()).collect();
    let positions = note_positions(&page(), ids);

    let chart = build_chart(ChartKind::Concordance, &data, &positions, 10.0);

    assert_eq!(chart.levels(), 2);
    assert_eq!(
        chart.elements,
        vec![
            ChartElement::Baseline { level: 0 },
            ChartElement::Label { level: 0, text: "concordance".to_string() },
            ChartElement::Bar {
                level: 0,
                x: 5000.0,
                y: -350.0,
                width: 4000.0,
                height: 350.0,
                color: "blue".to_string(),
                opacity: 2.0 / 3.0,
            },
            // Next note wraps to the following system; negative value hangs below
            ChartElement::Bar {
                level: 0,
                x: 9000.0,
                y: 0.0,
                width: 500.0,
                height: 175.0,
                color: "blue".to_string(),
                opacity: 1.0 / 3.0,
            },
            ChartElement::Baseline { level: 1 },
            ChartElement::Label { level: 1, text: "concordance".to_string() },
            ChartElement::Bar {
                level: 1,
                x: 4500.0,
                y: -700.0,
                width: 3500.0,
                height: 700.0,
                color: "blue".to_string(),
                opacity: 1.0,
            },
        ]
    );
}

#[test]
fn harmonic_strip_uses_mixed_colours() {
    let data = data();
    let positions = note_positions(&page(), data.results.iter().map(|r| r.identifiant.as_str()));

    let chart = build_chart(ChartKind::CouleurHarmonique, &data, &positions, 1.0);

    let first = chart.bars().next().expect("a bar");
    assert_eq!(
        first,
        &ChartElement::Bar {
            level: 0,
            x: 500.0,
            y: -20.0,
            width: 400.0,
            height: 20.0,
            color: "rgb(64,64,128)".to_string(),
            opacity: 1.0,
        }
    );
    assert_eq!(chart.bars().count(), 3);
}

#[test]
fn chart_svg_markup() {
    let data = data();
    let positions = note_positions(&page(), data.results.iter().map(|r| r.identifiant.as_str()));
    let svg = build_chart(ChartKind::ConcordanceOrdre3, &data, &positions, 10.0).to_svg();

    assert!(svg.starts_with(r#"<svg class="chart" id="chart-concordanceOrdre3">"#));
    assert!(svg.contains(r#"<line x1="0" y1="0" x2="100%" y2="0" stroke="black" stroke-width="40" data-level="0"/>"#));
    assert!(svg.contains(r#"<text x="0" y="400" font-size="300" data-level="1">concordanceOrdre3</text>"#));
    assert!(svg.contains(r##"<rect x="5000" y="-350" height="350" width="4000" fill="#FFCF0B" fill-opacity="0.5""##));
    assert!(svg.ends_with("</svg>"));
}

#[test]
fn unknown_notes_are_skipped() {
    let data: ConcordanceData = serde_json::from_str(
        r#"{"results": [{"identifiant": "gone"}, {"identifiant": "n12"}, {"identifiant": "n13", "nombreDeNotes": 2}]}"#,
    )
    .unwrap();
    let positions = note_positions(&page(), ["n12", "n13"]);
    let chart = build_chart(ChartKind::Coherence, &data, &positions, 1.0);
    assert_eq!(chart.bars().count(), 1);
    assert_eq!(chart.levels(), 1);
}

#[test]
fn panel_draws_once_then_toggles() {
    let page = page();
    let mut panel = ChartPanel::new();
    assert!(panel.needs_data());
    assert_eq!(panel.toggle(ChartKind::Concordance, &page), None);

    panel.set_data(data());
    assert_eq!(panel.toggle(ChartKind::Concordance, &page), Some(ChartToggle::Drawn));
    assert_eq!(panel.toggle(ChartKind::Coherence, &page), Some(ChartToggle::Drawn));
    assert_eq!(panel.visible().len(), 2);

    // Page is 2100 wide, so bars are drawn at ten times page scale
    let chart = panel.chart(ChartKind::Concordance).unwrap();
    assert!(matches!(chart.bars().next(), Some(ChartElement::Bar { x, .. }) if *x == 5000.0));

    assert_eq!(panel.level_offset(ChartKind::Coherence, 1, 3000.0), Some(11000.0));
    assert_eq!(panel.system_shift(2), 8000.0);

    assert_eq!(panel.toggle(ChartKind::Concordance, &page), Some(ChartToggle::Hidden));
    assert!(!panel.is_visible(ChartKind::Concordance));
    assert_eq!(panel.level_offset(ChartKind::Concordance, 0, 0.0), None);
    assert_eq!(panel.level_offset(ChartKind::Coherence, 0, 0.0), Some(2000.0));

    assert_eq!(panel.toggle(ChartKind::Concordance, &page), Some(ChartToggle::Shown));
    assert_eq!(panel.visible().len(), 2);
}
