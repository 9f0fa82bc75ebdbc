//! Analysis charts drawn under the score: one bar per analysed note,
//! one chart per analysis kind.
//!
//! Bars are laid out in page units. A bar spans from its note to the next
//! analysed note and its height is the analysis value scaled by
//! [`BAR_SCALE`]. Each system of the score starts a new chart level with
//! its own baseline.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::page::SvgPage;

// ─── Layout constants ───────────────────────────────────────────────

/// Page units per unit of analysis value.
pub const BAR_SCALE: f64 = 70.0;
/// Bar width when the next note wraps to another system.
pub const WRAP_WIDTH: f64 = 50.0;
/// Height of the harmonic colour strip.
pub const STRIP_HEIGHT: f64 = 20.0;
/// Vertical room reserved per chart and system.
pub const CHART_HEIGHT: f64 = 2000.0;
/// Width of the toolkit's page definition scale.
pub const DEFINITION_WIDTH: f64 = 21000.0;

const STROKE_WIDTH: u32 = 40;
const LABEL_Y: f64 = 400.0;
const LABEL_FONT_SIZE: u32 = 300;

// ─── Data ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Concordance,
    Coherence,
    ConcordanceTotale,
    ConcordanceOrdre3,
    CouleurHarmonique,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Concordance,
        ChartKind::Coherence,
        ChartKind::ConcordanceTotale,
        ChartKind::ConcordanceOrdre3,
        ChartKind::CouleurHarmonique,
    ];

    /// Field name in the analysis results, also used in the chart id.
    pub fn key(self) -> &'static str {
        match self {
            ChartKind::Concordance => "concordance",
            ChartKind::Coherence => "coherence",
            ChartKind::ConcordanceTotale => "concordanceTotale",
            ChartKind::ConcordanceOrdre3 => "concordanceOrdre3",
            ChartKind::CouleurHarmonique => "couleurHarmonique",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }

    /// Bar colour. The harmonic strip computes one per note.
    pub fn color(self) -> Option<&'static str> {
        match self {
            ChartKind::Concordance => Some("blue"),
            ChartKind::Coherence => Some("red"),
            ChartKind::ConcordanceTotale => Some("green"),
            ChartKind::ConcordanceOrdre3 => Some("#FFCF0B"),
            ChartKind::CouleurHarmonique => None,
        }
    }

    fn value(self, result: &ConcordanceResult) -> f64 {
        match self {
            ChartKind::Concordance => result.concordance,
            ChartKind::Coherence => result.coherence,
            ChartKind::ConcordanceTotale => result.concordance_totale,
            ChartKind::ConcordanceOrdre3 => result.concordance_ordre3,
            ChartKind::CouleurHarmonique => 0.0,
        }
    }
}

/// Analysis of the chord sounding at one note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcordanceResult {
    /// Id of the note in the rendered score
    pub identifiant: String,
    #[serde(default)]
    pub nombre_de_notes: u32,
    #[serde(default)]
    pub concordance: f64,
    #[serde(default)]
    pub coherence: f64,
    #[serde(default)]
    pub concordance_totale: f64,
    #[serde(default)]
    pub concordance_ordre3: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcordanceData {
    #[serde(default)]
    pub results: Vec<ConcordanceResult>,
}

impl ConcordanceData {
    pub fn max_notes(&self) -> u32 {
        self.results.iter().map(|r| r.nombre_de_notes).max().unwrap_or(0)
    }
}

/// Bar opacity: chords with more notes are drawn more opaque.
pub fn opacity(kind: ChartKind, notes: u32, max_notes: u32) -> f64 {
    let ratio = |floor: u32| {
        if notes <= floor {
            0.0
        } else if max_notes <= floor {
            1.0
        } else {
            f64::from(notes - floor) / f64::from(max_notes - floor)
        }
    };
    match kind {
        ChartKind::Concordance => ratio(1),
        ChartKind::ConcordanceTotale if max_notes == 0 => 1.0,
        ChartKind::ConcordanceTotale => f64::from(notes) / f64::from(max_notes),
        ChartKind::ConcordanceOrdre3 => ratio(2),
        ChartKind::Coherence | ChartKind::CouleurHarmonique => 1.0,
    }
}

/// Colour mixing the three analysis values:
/// coherence → red, concordance totale → green, concordance → blue.
pub fn harmonic_color(concordance: f64, coherence: f64, totale: f64) -> String {
    let sum = concordance + coherence + totale;
    if sum == 0.0 {
        return "rgb(0,0,0)".to_string();
    }
    let channel = |v: f64| (v * 255.0 / sum).round() as i64;
    format!(
        "rgb({},{},{})",
        channel(coherence),
        channel(totale),
        channel(concordance)
    )
}

// ─── Chart building ─────────────────────────────────────────────────

/// Where an analysed note sits on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotePosition {
    pub x: f64,
    /// Index of the system holding the note
    pub system: usize,
}

/// Positions of the given notes on a page. Notes not on the page are left out.
pub fn note_positions<'a>(page: &SvgPage, ids: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, NotePosition> {
    ids.into_iter()
        .filter_map(|id| {
            let (x, _) = page.element_position(id)?;
            let system = page.system_index(id).unwrap_or(0);
            Some((id.to_string(), NotePosition { x, system }))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartElement {
    Baseline {
        level: usize,
    },
    Label {
        level: usize,
        text: String,
    },
    Bar {
        level: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: String,
        opacity: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub kind: ChartKind,
    pub elements: Vec<ChartElement>,
}

impl Chart {
    pub fn id(&self) -> String {
        format!("chart-{}", self.kind.key())
    }

    pub fn bars(&self) -> impl Iterator<Item = &ChartElement> {
        self.elements
            .iter()
            .filter(|e| matches!(e, ChartElement::Bar { .. }))
    }

    /// Number of levels (systems) the chart spans.
    pub fn levels(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e, ChartElement::Baseline { .. }))
            .count()
    }

    pub fn to_svg(&self) -> String {
        let mut svg = format!(r#"<svg class="chart" id="{}">"#, self.id());
        for element in &self.elements {
            match element {
                ChartElement::Baseline { level } => svg.push_str(&format!(
                    r#"<line x1="0" y1="0" x2="100%" y2="0" stroke="black" stroke-width="{STROKE_WIDTH}" data-level="{level}"/>"#
                )),
                ChartElement::Label { level, text } => svg.push_str(&format!(
                    r#"<text x="0" y="{LABEL_Y}" font-size="{LABEL_FONT_SIZE}" data-level="{level}">{}</text>"#,
                    escape(text)
                )),
                ChartElement::Bar {
                    level,
                    x,
                    y,
                    width,
                    height,
                    color,
                    opacity,
                } => svg.push_str(&format!(
                    r#"<rect x="{x}" y="{y}" height="{height}" width="{width}" fill="{color}" fill-opacity="{opacity}" stroke-width="{STROKE_WIDTH}" stroke="black" data-level="{level}"/>"#
                )),
            }
        }
        svg.push_str("</svg>");
        svg
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Build the chart of `kind` for consecutive analysed notes. `ratio`
/// converts page positions to chart units.
pub fn build_chart(
    kind: ChartKind,
    data: &ConcordanceData,
    positions: &BTreeMap<String, NotePosition>,
    ratio: f64,
) -> Chart {
    let max_notes = data.max_notes();
    let mut elements = Vec::new();
    let mut current_system: Option<usize> = None;
    let mut level = 0usize;

    for pair in data.results.windows(2) {
        let (result, next) = (&pair[0], &pair[1]);
        let (Some(note), Some(next_note)) = (
            positions.get(&result.identifiant),
            positions.get(&next.identifiant),
        ) else {
            debug!("Note {} is not on the page", result.identifiant);
            continue;
        };

        if current_system != Some(note.system) {
            if current_system.is_some() {
                level += 1;
            }
            current_system = Some(note.system);
            elements.push(ChartElement::Baseline { level });
            elements.push(ChartElement::Label {
                level,
                text: kind.key().to_string(),
            });
        }

        let width = if next_note.x < note.x {
            WRAP_WIDTH
        } else {
            next_note.x - note.x
        };
        let (y, height, color, opacity) = match kind.color() {
            Some(color) => {
                let value = kind.value(result) * BAR_SCALE;
                let (y, height) = if value > 0.0 { (-value, value) } else { (0.0, value.abs()) };
                (y, height, color.to_string(), self::opacity(kind, result.nombre_de_notes, max_notes))
            }
            None => (
                -STRIP_HEIGHT,
                STRIP_HEIGHT,
                harmonic_color(result.concordance, result.coherence, result.concordance_totale),
                1.0,
            ),
        };
        elements.push(ChartElement::Bar {
            level,
            x: note.x * ratio,
            y: y * ratio,
            width: width * ratio,
            height: height * ratio,
            color,
            opacity,
        });
    }
    Chart { kind, elements }
}

// ─── Panel ──────────────────────────────────────────────────────────

/// Outcome of toggling a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartToggle {
    Drawn,
    Shown,
    Hidden,
}

/// The charts drawn under a score, in the order they were first drawn.
#[derive(Debug, Default)]
pub struct ChartPanel {
    data: Option<ConcordanceData>,
    charts: Vec<(Chart, bool)>,
}

impl ChartPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the analysis still has to be fetched.
    pub fn needs_data(&self) -> bool {
        self.data.is_none()
    }

    pub fn set_data(&mut self, data: ConcordanceData) {
        self.data = Some(data);
        self.charts.clear();
    }

    pub fn data(&self) -> Option<&ConcordanceData> {
        self.data.as_ref()
    }

    /// Draw the chart of `kind` on first use, then flip its visibility.
    /// `None` until analysis data is set.
    pub fn toggle(&mut self, kind: ChartKind, page: &SvgPage) -> Option<ChartToggle> {
        if let Some((_, visible)) = self.charts.iter_mut().find(|(c, _)| c.kind == kind) {
            *visible = !*visible;
            return Some(if *visible { ChartToggle::Shown } else { ChartToggle::Hidden });
        }
        let data = self.data.as_ref()?;
        let positions = note_positions(page, data.results.iter().map(|r| r.identifiant.as_str()));
        let ratio = page.width().filter(|w| *w > 0.0).map_or(1.0, |w| DEFINITION_WIDTH / w);
        self.charts.push((build_chart(kind, data, &positions, ratio), true));
        Some(ChartToggle::Drawn)
    }

    pub fn chart(&self, kind: ChartKind) -> Option<&Chart> {
        self.charts.iter().find(|(c, _)| c.kind == kind).map(|(c, _)| c)
    }

    pub fn is_visible(&self, kind: ChartKind) -> bool {
        self.charts.iter().any(|(c, v)| c.kind == kind && *v)
    }

    /// Visible charts, in stacking order.
    pub fn visible(&self) -> Vec<&Chart> {
        self.charts.iter().filter(|(_, v)| *v).map(|(c, _)| c).collect()
    }

    /// Vertical offset of a chart level below a system whose bottom edge is
    /// at `system_bottom`. `None` for hidden charts.
    pub fn level_offset(&self, kind: ChartKind, level: usize, system_bottom: f64) -> Option<f64> {
        let visible = self.visible();
        let index = visible.iter().position(|c| c.kind == kind)?;
        let stacked = visible.len() as f64;
        Some(system_bottom + level as f64 * CHART_HEIGHT * stacked + (index + 1) as f64 * CHART_HEIGHT)
    }

    /// Vertical shift applied to the system at `index` to make room for
    /// the visible charts above it.
    pub fn system_shift(&self, index: usize) -> f64 {
        index as f64 * CHART_HEIGHT * self.visible().len() as f64
    }
}
