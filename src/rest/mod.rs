//! Client for the score library's REST backend.
//!
//! Every call is a single sequential round trip. Writes carry the CSRF
//! header when [`csrf::needs_token`] says so. Responses are decoded into the
//! [`crate::model`] types.

pub mod csrf;
pub mod transport;

use log::debug;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{Result, ScoreError};
use crate::model::{
    AnnotationId, AnnotationMap, ComparisonCost, ComparisonScores, Concept, ElementDetail,
    ImportReport, User,
};
pub use transport::{Request, Response, Transport, UreqTransport};

/// Opus references use `:` between collection levels; URLs use `/`.
pub fn opus_path(opus_ref: &str) -> String {
    opus_ref.replace(':', "/")
}

/// REST paths, relative to the backend root.
pub struct Endpoints;

impl Endpoints {
    pub fn annotations(opus_ref: &str, model: &str, concept: &str) -> String {
        format!(
            "/rest/collections/{}/_annotations/{model}/{concept}/_all",
            opus_path(opus_ref)
        )
    }

    pub fn insert_annotation(opus_ref: &str) -> String {
        format!("/rest/collections/{}/_annotations/", opus_path(opus_ref))
    }

    pub fn update_annotation(opus_ref: &str, annotation_id: &str) -> String {
        format!(
            "/rest/collections/{}/_annotations/{annotation_id}/",
            opus_path(opus_ref)
        )
    }

    pub fn concepts(model: &str, concept: &str) -> String {
        format!("/rest/analysis/_models/{model}/_concepts/{concept}/_all/")
    }

    pub fn compute_annotations(opus_ref: &str, model: &str) -> String {
        format!(
            "/rest/collections/{}/_annotations/{model}/_compute/",
            opus_path(opus_ref)
        )
    }

    pub fn compute_comparison(opus_ref1: &str, opus_ref2: &str, model: &str) -> String {
        format!(
            "/rest/collections/{}/_comparison/{}/_model/{model}/_compute/",
            opus_path(opus_ref1),
            opus_path(opus_ref2)
        )
    }

    pub fn comparison_scores(opus_ref1: &str, opus_ref2: &str) -> String {
        format!(
            "/rest/collections/{}/_comparison/{}/_mei/",
            opus_path(opus_ref1),
            opus_path(opus_ref2)
        )
    }

    pub fn mei(opus_ref: &str) -> String {
        format!("/rest/collections/{}/mei.xml/", opus_path(opus_ref))
    }

    pub fn element(opus_ref: &str, element_id: &str) -> String {
        format!("/rest/collections/{}/{element_id}", opus_path(opus_ref))
    }

    pub fn current_user() -> String {
        "/rest/misc/user/".to_string()
    }

    pub fn import_upload(corpus_ref: &str, upload_id: &str) -> String {
        format!(
            "/rest/collections/{}/_uploads/{upload_id}/_import/",
            opus_path(corpus_ref)
        )
    }

    pub fn concordance(opus_ref: &str) -> String {
        format!("/rest/opus/{opus_ref}/concordance")
    }
}

/// Fields of the "create annotation" form.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnnotation {
    pub concept: String,
    pub note_id: String,
    pub comment: String,
}

/// Fields of the "update annotation" form.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationUpdate {
    pub annotation_id: AnnotationId,
    pub concept: String,
    pub comment: String,
}

pub struct ScoreClient<T: Transport> {
    transport: T,
    base_url: String,
    origin: String,
    csrf_header: String,
    csrf_cookie: String,
    csrf_token: Option<String>,
}

impl ScoreClient<UreqTransport> {
    /// Client over HTTP, configured from `config`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_transport(UreqTransport::new(config.timeout_secs), config)
    }
}

impl<T: Transport> ScoreClient<T> {
    pub fn with_transport(transport: T, config: &ClientConfig) -> Self {
        let origin = if config.origin.is_empty() {
            config.base_url.clone()
        } else {
            config.origin.clone()
        };
        Self {
            transport,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            origin,
            csrf_header: config.csrf_header.clone(),
            csrf_cookie: config.csrf_cookie.clone(),
            csrf_token: None,
        }
    }

    /// Pick up the CSRF token from the page's cookie string.
    pub fn set_cookies(&mut self, cookie_header: &str) {
        self.csrf_token = csrf::cookie_value(cookie_header, &self.csrf_cookie);
    }

    pub fn set_csrf_token(&mut self, token: impl Into<String>) {
        self.csrf_token = Some(token.into());
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn request(&self, method: &'static str, path: &str) -> Request {
        let mut request = Request::new(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.csrf_token {
            if csrf::needs_token(method, &request.url, &self.origin) {
                request.headers.push((self.csrf_header.clone(), token.clone()));
            }
        }
        request
    }

    fn execute(&mut self, request: Request) -> Result<Response> {
        debug!("REST call {}", request.describe());
        self.transport.send(&request)
    }

    fn execute_json<R: DeserializeOwned>(&mut self, request: Request) -> Result<R> {
        let url = request.url.clone();
        let response = self.execute(request)?;
        serde_json::from_str(&response.body).map_err(|e| ScoreError::Decode {
            url,
            message: e.to_string(),
        })
    }

    /// Annotations of an opus for a model and a concept (`_all` for every
    /// concept), keyed by target element id.
    pub fn annotations(&mut self, opus_ref: &str, model: &str, concept: &str) -> Result<AnnotationMap> {
        let request = self.request("GET", &Endpoints::annotations(opus_ref, model, concept));
        self.execute_json(request)
    }

    /// Create a user annotation on an element.
    pub fn insert_annotation(&mut self, opus_ref: &str, annotation: &NewAnnotation) -> Result<()> {
        let request = self
            .request("PUT", &Endpoints::insert_annotation(opus_ref))
            .form_field("concept", &annotation.concept)
            .form_field("note_id", &annotation.note_id)
            .form_field("comment", &annotation.comment);
        self.execute(request).map(|_| ())
    }

    /// Store replacement markup for an element.
    pub fn insert_xml_fragment(&mut self, opus_ref: &str, note_id: &str, xml: &str) -> Result<()> {
        let request = self
            .request("PUT", &Endpoints::insert_annotation(opus_ref))
            .form_field("xml_fragment", xml)
            .form_field("note_id", note_id);
        self.execute(request).map(|_| ())
    }

    pub fn update_annotation(&mut self, opus_ref: &str, update: &AnnotationUpdate) -> Result<()> {
        let request = self
            .request(
                "POST",
                &Endpoints::update_annotation(opus_ref, update.annotation_id.as_str()),
            )
            .form_field("concept", &update.concept)
            .form_field("note_id", "0")
            .form_field("comment", &update.comment);
        self.execute(request).map(|_| ())
    }

    /// Concept tree of a model, rooted at `concept` (`_all` for the whole model).
    pub fn concepts(&mut self, model: &str, concept: &str) -> Result<Vec<Concept>> {
        let request = self.request("GET", &Endpoints::concepts(model, concept));
        self.execute_json(request)
    }

    /// Ask the backend to (re)compute the annotations of a model.
    pub fn compute_annotations(&mut self, opus_ref: &str, model: &str) -> Result<()> {
        let request = self.request("POST", &Endpoints::compute_annotations(opus_ref, model));
        self.execute(request).map(|_| ())
    }

    /// Compare two opera under a model. An empty answer means no cost.
    pub fn compute_comparison(
        &mut self,
        opus_ref1: &str,
        opus_ref2: &str,
        model: &str,
    ) -> Result<ComparisonCost> {
        let request = self.request(
            "POST",
            &Endpoints::compute_comparison(opus_ref1, opus_ref2, model),
        );
        let url = request.url.clone();
        let response = self.execute(request)?;
        let body = response.body.trim();
        if body.is_empty() || body == "null" {
            return Ok(ComparisonCost::default());
        }
        serde_json::from_str(body).map_err(|e| ScoreError::Decode {
            url,
            message: e.to_string(),
        })
    }

    /// Both MEI documents of a comparison.
    pub fn comparison_scores(&mut self, opus_ref1: &str, opus_ref2: &str) -> Result<ComparisonScores> {
        let request = self.request("GET", &Endpoints::comparison_scores(opus_ref1, opus_ref2));
        self.execute_json(request)
    }

    /// Raw MEI text of an opus.
    pub fn mei(&mut self, opus_ref: &str) -> Result<String> {
        let request = self.request("GET", &Endpoints::mei(opus_ref));
        self.execute(request).map(|r| r.body)
    }

    pub fn element_detail(&mut self, opus_ref: &str, element_id: &str) -> Result<ElementDetail> {
        let request = self.request("GET", &Endpoints::element(opus_ref, element_id));
        self.execute_json(request)
    }

    pub fn current_user(&mut self) -> Result<User> {
        let request = self.request("GET", &Endpoints::current_user());
        self.execute_json(request)
    }

    /// Import a previously uploaded archive into a corpus.
    pub fn import_upload(&mut self, corpus_ref: &str, upload_id: &str) -> Result<ImportReport> {
        let request = self.request("POST", &Endpoints::import_upload(corpus_ref, upload_id));
        self.execute_json(request)
    }

    /// Concordance analysis of an opus. `params` are the chart form fields.
    pub fn concordance(
        &mut self,
        opus_ref: &str,
        params: &[(String, String)],
    ) -> Result<crate::chart::ConcordanceData> {
        let mut request = self.request("GET", &Endpoints::concordance(opus_ref));
        for (k, v) in params {
            request = request.query_param(k, v);
        }
        self.execute_json(request)
    }
}
