//! Score display: fetch an MEI document, render it with the notation
//! toolkit, and keep the current page as an [`SvgPage`].

use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::config::HighlightStyle;
use crate::error::{Result, ScoreError};
use crate::page::{ScoreSurface, SvgPage};
use crate::rest::{ScoreClient, Transport};

/// Element ids highlighted in the comparison view.
// FIXME: comes from the comparison result once the backend returns the differing elements
pub const COMPARISON_HIGHLIGHTS: [&str; 2] = ["d1e150", "d1e262"];

/// Options passed to the toolkit, serialized in its camelCase JSON form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolkitOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breaks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condense: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condense_first_page: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjust_page_height: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_margin_left: Option<u32>,
}

impl ToolkitOptions {
    /// Paginated single-score view, keeping the encoded system breaks.
    pub fn viewer() -> Self {
        Self {
            scale: Some(35),
            breaks: Some("encoded".to_string()),
            condense: Some("auto".to_string()),
            condense_first_page: Some(true),
            ..Default::default()
        }
    }

    /// Side-by-side comparison: one tall page per score.
    pub fn comparison() -> Self {
        Self {
            scale: Some(35),
            breaks: Some("auto".to_string()),
            page_height: Some(20000),
            adjust_page_height: Some(true),
            page_margin_left: Some(0),
            ..Default::default()
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Elements sounding at a given time, as reported by the toolkit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementsAtTime {
    /// Page holding the elements; 0 when nothing is sounding
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// The external engraving engine.
pub trait NotationToolkit {
    fn set_options(&mut self, options: &ToolkitOptions);

    /// Load an MEI document and return the SVG of its first page.
    fn load_data(&mut self, mei: &str) -> Result<String>;

    /// SVG of a page of the loaded document (1-based).
    fn render_page(&mut self, page: u32) -> Result<String>;

    fn page_count(&self) -> u32;

    /// Standard MIDI file of the loaded document.
    fn render_to_midi(&mut self) -> Result<Vec<u8>>;

    fn elements_at_time(&mut self, millis: f64) -> ElementsAtTime;

    /// Onset of an element in milliseconds.
    fn time_for_element(&mut self, id: &str) -> Option<f64>;

    /// A separate engine with default options and nothing loaded, for
    /// views rendered beside the displayed score.
    fn new_instance(&self) -> Self
    where
        Self: Sized;
}

/// A link of the page navigation bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLink {
    pub class: Option<&'static str>,
    pub href: String,
    pub label: Option<String>,
}

/// Navigation links for a score of `page_count` pages: first-page arrow,
/// one link per page, last-page arrow. None for single-page scores.
pub fn page_links(page_count: u32) -> Vec<PageLink> {
    if page_count <= 1 {
        return Vec::new();
    }
    (0..=page_count + 1)
        .map(|i| {
            if i == 0 {
                PageLink {
                    class: Some("leftend"),
                    href: "?page=1".to_string(),
                    label: None,
                }
            } else if i == page_count + 1 {
                PageLink {
                    class: Some("lastRight"),
                    href: format!("?page={page_count}"),
                    label: None,
                }
            } else {
                PageLink {
                    class: None,
                    href: format!("?page={i}"),
                    label: Some(i.to_string()),
                }
            }
        })
        .collect()
}

pub struct ScoreDisplay<T: NotationToolkit> {
    toolkit: T,
    container: Option<String>,
    page: Option<SvgPage>,
    current_page: u32,
}

impl<T: NotationToolkit> ScoreDisplay<T> {
    /// A display rendering into the container with id `container`.
    pub fn new(mut toolkit: T, container: &str) -> Self {
        toolkit.set_options(&ToolkitOptions::viewer());
        Self {
            toolkit,
            container: Some(container.to_string()),
            page: None,
            current_page: 1,
        }
    }

    /// A display whose container is not on the page (yet).
    pub fn detached(toolkit: T) -> Self {
        Self {
            toolkit,
            container: None,
            page: None,
            current_page: 1,
        }
    }

    pub fn toolkit(&self) -> &T {
        &self.toolkit
    }

    pub fn toolkit_mut(&mut self) -> &mut T {
        &mut self.toolkit
    }

    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    fn require_container(&self) -> Result<()> {
        if self.container.is_none() {
            return Err(ScoreError::MissingContainer("verovio".to_string()));
        }
        Ok(())
    }

    /// Fetch the MEI of `opus_ref` and render its first page.
    pub fn show_score<C: Transport>(&mut self, client: &mut ScoreClient<C>, opus_ref: &str) -> Result<()> {
        self.require_container()?;
        let mei = client.mei(opus_ref)?;
        self.show_score_text(&mei)
    }

    /// Render MEI already in hand.
    pub fn show_score_text(&mut self, mei: &str) -> Result<()> {
        self.require_container()?;
        let svg = self.toolkit.load_data(mei)?;
        self.page = Some(SvgPage::parse(&svg)?);
        self.current_page = 1;
        debug!("Score loaded, {} pages", self.toolkit.page_count());
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.page.is_some()
    }

    pub fn page(&self) -> Option<&SvgPage> {
        self.page.as_ref()
    }

    pub fn page_mut(&mut self) -> Option<&mut SvgPage> {
        self.page.as_mut()
    }

    /// Current page number (1-based).
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_count(&self) -> u32 {
        self.toolkit.page_count()
    }

    pub fn page_links(&self) -> Vec<PageLink> {
        page_links(self.page_count())
    }

    /// Render page `page`, clamped to `[1, page_count]`.
    pub fn goto_page(&mut self, page: u32) -> Result<u32> {
        self.require_container()?;
        let target = page.clamp(1, self.page_count().max(1));
        let svg = self.toolkit.render_page(target)?;
        self.page = Some(SvgPage::parse(&svg)?);
        self.current_page = target;
        Ok(target)
    }

    pub fn next_page(&mut self) -> Result<u32> {
        self.goto_page(self.current_page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> Result<u32> {
        self.goto_page(self.current_page.saturating_sub(1))
    }

    /// Apply `style` to every listed element on the page. Returns how many
    /// were found.
    pub fn highlight(&mut self, ids: &[&str], style: &HighlightStyle) -> usize {
        let Some(page) = self.page.as_mut() else {
            return 0;
        };
        ids.iter().filter(|id| page.set_style(id, style)).count()
    }

    /// Pointer entered (`true`) or left a note.
    pub fn hover_note(&mut self, id: &str, hovering: bool) -> bool {
        let style = if hovering {
            HighlightStyle::hover()
        } else {
            HighlightStyle::plain()
        };
        self.page.as_mut().is_some_and(|p| p.set_style(id, &style))
    }

    /// SVG of the current page with its decorations.
    pub fn to_svg(&self) -> Option<String> {
        self.page.as_ref().map(SvgPage::to_svg_string)
    }
}

/// Two scores rendered next to each other.
#[derive(Debug, Clone)]
pub struct ComparisonView {
    pub left: SvgPage,
    pub right: SvgPage,
    /// Highlighted element ids found on either side
    pub highlighted: Vec<String>,
}

/// Fetch both scores of a comparison, render them with the comparison
/// layout, and highlight [`COMPARISON_HIGHLIGHTS`].
pub fn render_comparison<T: NotationToolkit, C: Transport>(
    toolkit: &mut T,
    client: &mut ScoreClient<C>,
    opus_ref1: &str,
    opus_ref2: &str,
    style: &HighlightStyle,
) -> Result<ComparisonView> {
    let scores = client.comparison_scores(opus_ref1, opus_ref2)?;
    toolkit.set_options(&ToolkitOptions::comparison());
    let mut left = SvgPage::parse(&toolkit.load_data(&scores.score1_mei)?)?;
    let mut right = SvgPage::parse(&toolkit.load_data(&scores.score2_mei)?)?;

    let mut highlighted = Vec::new();
    for id in COMPARISON_HIGHLIGHTS {
        let on_left = left.set_style(id, style);
        let on_right = right.set_style(id, style);
        if on_left || on_right {
            highlighted.push(id.to_string());
        } else {
            error!("Comparison highlight {id} not found in either score");
        }
    }
    Ok(ComparisonView {
        left,
        right,
        highlighted,
    })
}
