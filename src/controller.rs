//! The UI controller: one object owning everything a score page needs,
//! from the REST client and the displayed page to the concept tree and
//! the playback state.
//!
//! Operations run their requests one after the other. A failed request is
//! reported through the [`Notifier`] and the operation returns `None` (or
//! `false`); nothing is retried.

use log::{debug, error, info, warn};

use crate::anchor::AnchorKey;
use crate::chart::{ChartKind, ChartPanel, ChartToggle};
use crate::concepts::{checkbox_tree, select_options, ConceptList, ConceptVisibility, SelectOption};
use crate::config::{AnchorLayout, ClientConfig, HighlightStyle};
use crate::display::{render_comparison, ComparisonView, NotationToolkit, ScoreDisplay};
use crate::error::{Result, ScoreError};
use crate::mei;
use crate::model::{Annotation, ComparisonCost, User, XmlFragment, ALL_CONCEPTS};
use crate::page::ScoreSurface;
use crate::playback::{HighlightChange, MidiPlayer, PlaybackBridge};
use crate::rest::{AnnotationUpdate, NewAnnotation, ScoreClient, Transport};
use crate::sync::{clear_anchors, sync_anchors, ClearScope, SyncReport};

/// Where alerts end up.
pub trait Notifier {
    /// A failure the user must acknowledge.
    fn alert(&mut self, message: &str);

    /// A progress message.
    fn inform(&mut self, message: &str) {
        info!("{message}");
    }

    /// A write and its refresh started (`true`) or ended (`false`).
    fn busy(&mut self, busy: bool) {
        debug!("Busy: {busy}");
    }
}

/// Notifier writing to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&mut self, message: &str) {
        error!("{message}");
    }
}

/// The "create annotation" form.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationForm {
    pub note_id: String,
    /// Selected concept code
    pub concept: String,
    pub comment: String,
}

/// An annotation as listed in the element description.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationView {
    pub annotation: Annotation,
    /// The current user created it and may update it
    pub editable: bool,
}

/// Everything shown in the info box for one score element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDescription {
    pub opus_ref: String,
    pub element_id: String,
    pub user: User,
    pub annotations: Vec<AnnotationView>,
    /// Whether the create-annotation form is offered
    pub can_annotate: bool,
    /// Whether the XML fragment editor is offered
    pub can_edit_xml: bool,
    /// Source markup of the element in the MEI document
    pub xml: Option<String>,
}

/// Message shown after a comparison computation.
pub fn comparison_message(cost: &ComparisonCost) -> String {
    match cost.cost {
        Some(cost) => format!("Comparison Cost: {cost}"),
        None => "The cost was not compiled".to_string(),
    }
}

pub struct ScoreController<C: Transport, T: NotationToolkit, P: MidiPlayer, N: Notifier> {
    client: ScoreClient<C>,
    display: ScoreDisplay<T>,
    bridge: PlaybackBridge,
    player: P,
    notifier: N,
    layout: AnchorLayout,
    highlight: HighlightStyle,
    opus_ref: String,
    model_code: Option<String>,
    concept_list: Option<ConceptList>,
    select_options: Vec<SelectOption>,
    visibility: ConceptVisibility,
    charts: ChartPanel,
    xml_fragments: Vec<XmlFragment>,
}

impl<C: Transport, T: NotationToolkit, P: MidiPlayer, N: Notifier> ScoreController<C, T, P, N> {
    pub fn new(
        client: ScoreClient<C>,
        display: ScoreDisplay<T>,
        player: P,
        notifier: N,
        config: &ClientConfig,
        opus_ref: &str,
    ) -> Self {
        Self {
            client,
            display,
            bridge: PlaybackBridge::new(),
            player,
            notifier,
            layout: config.anchors,
            highlight: config.highlight.clone(),
            opus_ref: opus_ref.to_string(),
            model_code: None,
            concept_list: None,
            select_options: Vec::new(),
            visibility: ConceptVisibility::default(),
            charts: ChartPanel::new(),
            xml_fragments: Vec::new(),
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    pub fn opus_ref(&self) -> &str {
        &self.opus_ref
    }

    pub fn model_code(&self) -> Option<&str> {
        self.model_code.as_deref()
    }

    pub fn client(&self) -> &ScoreClient<C> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut ScoreClient<C> {
        &mut self.client
    }

    pub fn display(&self) -> &ScoreDisplay<T> {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut ScoreDisplay<T> {
        &mut self.display
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn concept_list(&self) -> Option<&ConceptList> {
        self.concept_list.as_ref()
    }

    pub fn select_options(&self) -> &[SelectOption] {
        &self.select_options
    }

    pub fn visibility(&self) -> &ConceptVisibility {
        &self.visibility
    }

    pub fn charts(&self) -> &ChartPanel {
        &self.charts
    }

    pub fn playback(&self) -> &PlaybackBridge {
        &self.bridge
    }

    /// Replacement markup found in the last fetch of all the model's
    /// annotations.
    pub fn xml_fragments(&self) -> &[XmlFragment] {
        &self.xml_fragments
    }

    // ─── Error routing ──────────────────────────────────────────────

    fn report<R>(&mut self, result: Result<R>) -> Option<R> {
        match result {
            Ok(value) => Some(value),
            Err(e @ (ScoreError::MissingContainer(_) | ScoreError::MissingElement(_))) => {
                error!("{e}");
                None
            }
            Err(e) => {
                self.notifier.alert(&format!("Request: {e}"));
                None
            }
        }
    }

    fn write<R>(&mut self, f: impl FnOnce(&mut ScoreClient<C>) -> Result<R>) -> Option<R> {
        let result = f(&mut self.client);
        self.report(result)
    }

    /// Run a write and its follow-up refresh with the busy indicator on.
    fn busy_while<R>(&mut self, f: impl FnOnce(&mut Self) -> Option<R>) -> Option<R> {
        self.notifier.busy(true);
        let result = f(self);
        self.notifier.busy(false);
        result
    }

    // ─── Score ──────────────────────────────────────────────────────

    /// Fetch and render the current opus.
    pub fn load_score(&mut self) -> bool {
        let result = self.display.show_score(&mut self.client, &self.opus_ref);
        self.charts = ChartPanel::new();
        self.report(result).is_some()
    }

    pub fn next_page(&mut self) -> Option<u32> {
        let result = self.display.next_page();
        let page = self.report(result)?;
        self.refresh_anchors();
        Some(page)
    }

    pub fn prev_page(&mut self) -> Option<u32> {
        let result = self.display.prev_page();
        let page = self.report(result)?;
        self.refresh_anchors();
        Some(page)
    }

    pub fn hover_note(&mut self, note_id: &str, hovering: bool) -> bool {
        self.display.hover_note(note_id, hovering)
    }

    // ─── Concepts and anchors ───────────────────────────────────────

    /// Load the concepts of `model` and show all its annotations.
    pub fn select_model(&mut self, model: &str) -> bool {
        self.show_model_concepts(model, ALL_CONCEPTS, true)
    }

    /// Rebuild the concept tree of `model` below `concept` and show (or
    /// hide) the matching annotations.
    pub fn show_model_concepts(&mut self, model: &str, concept: &str, show: bool) -> bool {
        self.model_code = Some(model.to_string());
        self.concept_list = None;
        self.select_options.clear();
        self.visibility.clear();

        self.show_annotations(concept, show);

        let result = self.client.concepts(model, concept);
        let Some(concepts) = self.report(result) else {
            return false;
        };
        self.concept_list = Some(checkbox_tree(&concepts, concept, show));
        self.select_options = select_options(&concepts);
        debug!(
            "Model {model}: {} concepts below {concept}",
            self.select_options.len()
        );
        true
    }

    /// Fetch the annotations of `concept` and add (`show`) or remove their
    /// markers. `_all` starts from a page without markers.
    pub fn show_annotations(&mut self, concept: &str, show: bool) -> Option<SyncReport> {
        let Some(model) = self.model_code.clone() else {
            warn!("No annotation model selected");
            return None;
        };
        let Some(page) = self.display.page_mut() else {
            error!("{}", ScoreError::MissingContainer("verovio".to_string()));
            return None;
        };
        if concept == ALL_CONCEPTS {
            clear_anchors(page, &ClearScope::All);
        }

        let result = self.client.annotations(&self.opus_ref, &model, concept);
        let annotations = self.report(result)?;
        if concept == ALL_CONCEPTS {
            self.xml_fragments = annotations.xml_fragments();
        }
        let page = self.display.page_mut()?;
        let report = sync_anchors(page, &self.opus_ref, &model, &annotations, show, &self.layout);
        debug!("Concept {concept}: {report:?}");
        Some(report)
    }

    /// Checkbox of `code` changed. Only that concept's markers change.
    pub fn toggle_concept(&mut self, code: &str, checked: bool) -> Option<SyncReport> {
        self.visibility.set(code, checked);
        if let Some(list) = self.concept_list.as_mut() {
            list.set_checked(code, checked);
        }
        self.show_annotations(code, checked)
    }

    /// Markers of a newly rendered page: every annotation of the selected
    /// model, minus the concepts the user unchecked.
    fn refresh_anchors(&mut self) {
        if self.model_code.is_none() {
            return;
        }
        self.show_annotations(ALL_CONCEPTS, true);
        let hidden: Vec<String> = self.visibility.hidden().into_iter().map(String::from).collect();
        for code in hidden {
            self.show_annotations(&code, false);
        }
    }

    /// Remove every marker of the selected model.
    pub fn clear_model_anchors(&mut self) -> usize {
        let Some(model) = self.model_code.clone() else {
            return 0;
        };
        self.display
            .page_mut()
            .map_or(0, |page| clear_anchors(page, &ClearScope::Model(model)))
    }

    // ─── Writes ─────────────────────────────────────────────────────

    /// Create an annotation, then refresh the element and its concept.
    pub fn insert_annotation(&mut self, form: &AnnotationForm) -> Option<ElementDescription> {
        self.busy_while(|this| {
            let opus_ref = this.opus_ref.clone();
            let annotation = NewAnnotation {
                concept: form.concept.clone(),
                note_id: form.note_id.clone(),
                comment: form.comment.clone(),
            };
            this.write(|client| client.insert_annotation(&opus_ref, &annotation))?;
            let description = this.describe_element(&form.note_id);
            this.show_annotations(&form.concept, true);
            description
        })
    }

    /// Store replacement markup for an element, then reload the model's
    /// annotations and their fragments.
    pub fn insert_xml_fragment(&mut self, note_id: &str, xml: &str) -> Option<ElementDescription> {
        self.busy_while(|this| {
            let opus_ref = this.opus_ref.clone();
            this.write(|client| client.insert_xml_fragment(&opus_ref, note_id, xml))?;
            this.refresh_anchors();
            this.describe_element(note_id)
        })
    }

    pub fn update_annotation(&mut self, note_id: &str, update: &AnnotationUpdate) -> Option<ElementDescription> {
        self.busy_while(|this| {
            let opus_ref = this.opus_ref.clone();
            this.write(|client| client.update_annotation(&opus_ref, update))?;
            this.describe_element(note_id)
        })
    }

    /// Recompute the annotations of the selected model, then show them all.
    pub fn compute_annotations(&mut self) -> Option<SyncReport> {
        let Some(model) = self.model_code.clone() else {
            warn!("No annotation model selected");
            return None;
        };
        self.busy_while(|this| {
            let opus_ref = this.opus_ref.clone();
            this.write(|client| client.compute_annotations(&opus_ref, &model))?;
            this.show_annotations(ALL_CONCEPTS, true)
        })
    }

    /// Compare the current opus with `other_ref` and return the cost message.
    /// Only the displayed opus gets its markers refreshed; `other_ref` is not
    /// on screen.
    pub fn compute_comparison(&mut self, other_ref: &str) -> Option<String> {
        let Some(model) = self.model_code.clone() else {
            warn!("No annotation model selected");
            return None;
        };
        self.busy_while(|this| {
            let opus_ref = this.opus_ref.clone();
            let cost = this.write(|client| client.compute_comparison(&opus_ref, other_ref, &model))?;
            this.show_annotations(ALL_CONCEPTS, true);
            Some(comparison_message(&cost))
        })
    }

    /// Render the current opus next to `other_ref` on a toolkit of its own,
    /// leaving the displayed score loaded.
    pub fn show_comparison(&mut self, other_ref: &str) -> Option<ComparisonView> {
        let mut toolkit = self.display.toolkit().new_instance();
        let result = render_comparison(
            &mut toolkit,
            &mut self.client,
            &self.opus_ref,
            other_ref,
            &self.highlight,
        );
        self.report(result)
    }

    /// Import an uploaded archive. Returns one `"{id} : {title}"` line per opus.
    pub fn import_file(&mut self, corpus_ref: &str, upload_id: &str) -> Option<Vec<String>> {
        self.busy_while(|this| {
            this.notifier.inform(&format!(
                "Import in progress for corpus {corpus_ref} and file {upload_id}"
            ));
            let report = this.write(|client| client.import_upload(corpus_ref, upload_id))?;
            let lines: Vec<String> = report
                .imported_opera
                .iter()
                .map(|o| format!("{} : {}", o.id, o.title))
                .collect();
            this.notifier
                .inform(&format!("List of imported opera:\n {}", lines.join("\n")));
            Some(lines)
        })
    }

    // ─── Element description ────────────────────────────────────────

    pub fn describe_element(&mut self, note_id: &str) -> Option<ElementDescription> {
        let opus_ref = self.opus_ref.clone();
        self.describe(&opus_ref, note_id)
    }

    /// A marker was clicked: describe the element it is attached to.
    pub fn anchor_clicked(&mut self, marker_id: &str) -> Option<ElementDescription> {
        let key: AnchorKey = match marker_id.parse() {
            Ok(key) => key,
            Err(e) => {
                warn!("{e}");
                return None;
            }
        };
        self.describe(key.opus_ref(), key.element_id())
    }

    fn describe(&mut self, opus_ref: &str, note_id: &str) -> Option<ElementDescription> {
        let result = self.client.current_user();
        let user = self.report(result).unwrap_or_default();

        let xml = match self.client.mei(opus_ref) {
            Ok(text) => mei::element_xml(&text, note_id).unwrap_or_else(|e| {
                warn!("Cannot read the MEI of {opus_ref}: {e}");
                None
            }),
            Err(e) => {
                debug!("No MEI for {opus_ref}: {e}");
                None
            }
        };

        let result = self.client.element_detail(opus_ref, note_id);
        let detail = self.report(result)?;
        let annotations = detail
            .annotations
            .into_iter()
            .map(|annotation| AnnotationView {
                editable: user.is_authenticated() && annotation.creator.name == user.username,
                annotation,
            })
            .collect();
        let logged_in = user.is_authenticated();
        Some(ElementDescription {
            opus_ref: opus_ref.to_string(),
            element_id: note_id.to_string(),
            user,
            annotations,
            can_annotate: logged_in,
            can_edit_xml: logged_in,
            xml,
        })
    }

    // ─── Charts ─────────────────────────────────────────────────────

    /// Show or hide the analysis chart of `kind`, fetching the analysis
    /// with the form `params` on first use.
    pub fn toggle_chart(&mut self, kind: ChartKind, params: &[(String, String)]) -> Option<ChartToggle> {
        if self.charts.needs_data() {
            let result = self.client.concordance(&self.opus_ref, params);
            let data = self.report(result)?;
            self.charts.set_data(data);
        }
        let page = self.display.page()?;
        self.charts.toggle(kind, page)
    }

    // ─── Playback ───────────────────────────────────────────────────

    pub fn play(&mut self) -> bool {
        let result = self.bridge.play(self.display.toolkit_mut(), &mut self.player);
        self.report(result).is_some()
    }

    /// Play from the onset of `note_id`.
    pub fn play_from(&mut self, note_id: &str) -> bool {
        let result = self
            .bridge
            .play_from(self.display.toolkit_mut(), &mut self.player, note_id);
        self.report(result).is_some()
    }

    pub fn stop(&mut self) {
        let surface = self.display.page_mut().map(|p| p as &mut dyn ScoreSurface);
        self.bridge.stop(&mut self.player, surface);
    }

    /// Player clock callback.
    pub fn on_player_time(&mut self, seconds: f64) -> Option<HighlightChange> {
        let result = self.bridge.on_time(seconds, &mut self.display);
        let change = self.report(result)?;
        if change.page_changed.is_some() {
            self.refresh_anchors();
        }
        Some(change)
    }
}
