//! Scripted collaborators shared by the integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use scoremark::display::{ElementsAtTime, NotationToolkit, ToolkitOptions};
use scoremark::rest::{Request, Response, Transport};
use scoremark::{ClientConfig, MidiPlayer, Notifier, ScoreClient, ScoreError};

pub const BASE_URL: &str = "http://scores.test";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()))
}

pub fn config() -> ClientConfig {
    ClientConfig {
        base_url: BASE_URL.to_string(),
        origin: BASE_URL.to_string(),
        ..Default::default()
    }
}

pub fn client(transport: FakeTransport) -> ScoreClient<FakeTransport> {
    ScoreClient::with_transport(transport, &config())
}

// ─── Transport ───────────────────────────────────────────────────────

struct Route {
    method: &'static str,
    path: String,
    status: u16,
    body: String,
}

/// Answers requests from a list of routes and records every request.
/// Unrouted requests fail like a refused connection.
#[derive(Default)]
pub struct FakeTransport {
    routes: Vec<Route>,
    pub requests: Vec<Request>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with a 200 and `body`. Later routes win.
    pub fn on(self, method: &'static str, path: &str, body: &str) -> Self {
        self.on_status(method, path, 200, body)
    }

    pub fn on_status(mut self, method: &'static str, path: &str, status: u16, body: &str) -> Self {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            status,
            body: body.to_string(),
        });
        self
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests
            .iter()
            .map(|r| format!("{} {}", r.method, r.url.trim_start_matches(BASE_URL)))
            .collect()
    }

    pub fn last(&self) -> &Request {
        self.requests.last().expect("no request sent")
    }
}

impl Transport for FakeTransport {
    fn send(&mut self, request: &Request) -> scoremark::Result<Response> {
        self.requests.push(request.clone());
        let path = request.url.trim_start_matches(BASE_URL);
        let route = self
            .routes
            .iter()
            .rev()
            .find(|r| r.method == request.method && r.path == path);
        match route {
            Some(r) if (200..300).contains(&r.status) => Ok(Response {
                status: r.status,
                body: r.body.clone(),
            }),
            Some(r) => Err(ScoreError::Status {
                method: request.method.to_string(),
                url: request.url.clone(),
                status: r.status,
                body: r.body.clone(),
            }),
            None => Err(ScoreError::Transport {
                method: request.method.to_string(),
                url: request.url.clone(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

// ─── Toolkit ─────────────────────────────────────────────────────────

/// A toolkit with pre-rendered pages.
#[derive(Default)]
pub struct FakeToolkit {
    /// SVG of each page, page 1 first
    pub pages: Vec<String>,
    /// Documents containing the marker text render as the given SVG
    pub documents: Vec<(String, String)>,
    pub midi: Vec<u8>,
    /// Onset in milliseconds of each element
    pub onsets: Vec<(String, f64)>,
    /// Sounding elements from a start time in milliseconds on
    pub timeline: Vec<(f64, ElementsAtTime)>,
    pub options: Vec<ToolkitOptions>,
    pub loaded: Vec<String>,
    pub rendered: Vec<u32>,
    pub time_queries: Vec<f64>,
}

impl FakeToolkit {
    pub fn with_pages(pages: Vec<String>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn at(mut self, millis: f64, page: u32, notes: &[&str]) -> Self {
        self.timeline.push((
            millis,
            ElementsAtTime {
                page,
                notes: notes.iter().map(|n| n.to_string()).collect(),
            },
        ));
        self
    }
}

impl NotationToolkit for FakeToolkit {
    fn set_options(&mut self, options: &ToolkitOptions) {
        self.options.push(options.clone());
    }

    fn load_data(&mut self, mei: &str) -> scoremark::Result<String> {
        self.loaded.push(mei.to_string());
        if mei.trim().is_empty() {
            return Err(ScoreError::Toolkit("empty document".to_string()));
        }
        if let Some((_, svg)) = self.documents.iter().find(|(marker, _)| mei.contains(marker.as_str())) {
            return Ok(svg.clone());
        }
        self.render_page(1)
    }

    fn render_page(&mut self, page: u32) -> scoremark::Result<String> {
        self.rendered.push(page);
        (page as usize)
            .checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .cloned()
            .ok_or_else(|| ScoreError::Toolkit(format!("no page {page}")))
    }

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn render_to_midi(&mut self) -> scoremark::Result<Vec<u8>> {
        Ok(self.midi.clone())
    }

    fn elements_at_time(&mut self, millis: f64) -> ElementsAtTime {
        self.time_queries.push(millis);
        self.timeline
            .iter()
            .rev()
            .find(|(start, _)| *start <= millis)
            .map(|(_, e)| e.clone())
            .unwrap_or_default()
    }

    fn time_for_element(&mut self, id: &str) -> Option<f64> {
        self.onsets.iter().find(|(e, _)| e == id).map(|(_, t)| *t)
    }

    fn new_instance(&self) -> Self {
        Self {
            pages: self.pages.clone(),
            documents: self.documents.clone(),
            midi: self.midi.clone(),
            onsets: self.onsets.clone(),
            timeline: self.timeline.clone(),
            ..Default::default()
        }
    }
}

// ─── Player and notifier ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingPlayer {
    pub played: Vec<String>,
    pub seeks: Vec<f64>,
    pub stops: usize,
}

impl MidiPlayer for RecordingPlayer {
    fn play(&mut self, data_url: &str) {
        self.played.push(data_url.to_string());
    }

    fn seek(&mut self, seconds: f64) {
        self.seeks.push(seconds);
    }

    fn stop(&mut self) {
        self.stops += 1;
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub alerts: Vec<String>,
    pub infos: Vec<String>,
    /// Every call in order: `alert: ..`, `info: ..`, `busy` and `idle`
    pub events: Vec<String>,
}

impl Notifier for RecordingNotifier {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
        self.events.push(format!("alert: {message}"));
    }

    fn inform(&mut self, message: &str) {
        self.infos.push(message.to_string());
        self.events.push(format!("info: {message}"));
    }

    fn busy(&mut self, busy: bool) {
        self.events.push(if busy { "busy" } else { "idle" }.to_string());
    }
}

// ─── Pages ───────────────────────────────────────────────────────────

/// A one-system page with the given notes, `x` apart on one staff.
pub fn simple_page(notes: &[&str]) -> String {
    let mut svg = String::from(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="2100px"><g id="system-1" class="system"><g id="m1" class="measure"><g id="s1" class="staff"><path d="M361 1420 L5479 1420"/>"#,
    );
    for (i, id) in notes.iter().enumerate() {
        svg.push_str(&format!(
            r##"<g id="{id}" class="note"><use xlink:href="#E0A4" x="{}" y="1600"/></g>"##,
            500 + 400 * i
        ));
    }
    svg.push_str("</g></g></g></svg>");
    svg
}
