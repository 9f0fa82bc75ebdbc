//! HTTP transport seam.
//!
//! [`ScoreClient`](super::ScoreClient) builds [`Request`]s and hands them to
//! a [`Transport`]. Production code uses [`UreqTransport`]; tests script the
//! responses.

use std::io::Read;
use std::time::Duration;

use log::debug;

use crate::error::{Result, ScoreError};

/// An HTTP request, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: &'static str,
    pub url: String,
    pub query: Vec<(String, String)>,
    /// Form-encoded body fields
    pub form: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: &'static str, url: String) -> Self {
        Self {
            method,
            url,
            query: Vec::new(),
            form: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn form_field(mut self, key: &str, value: &str) -> Self {
        self.form.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_param(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// One-line description used in alerts and logs.
    pub fn describe(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// A 2xx response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

pub trait Transport {
    /// Send a request. Non-2xx answers are [`ScoreError::Status`].
    fn send(&mut self, request: &Request) -> Result<Response>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, request: &Request) -> Result<Response> {
        (**self).send(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout_secs: Option<u64>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Self {
            agent: builder.build(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Transport for UreqTransport {
    fn send(&mut self, request: &Request) -> Result<Response> {
        debug!("{}", request.describe());
        let mut req = self.agent.request(request.method, &request.url);
        for (k, v) in &request.query {
            req = req.query(k, v);
        }
        for (k, v) in &request.headers {
            req = req.set(k, v);
        }

        let result = if request.form.is_empty() && matches!(request.method, "GET" | "HEAD") {
            req.call()
        } else {
            let pairs: Vec<(&str, &str)> = request
                .form
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            req.send_form(&pairs)
        };

        match result {
            Ok(resp) => {
                let status = resp.status();
                let body = read_body(resp.into_reader()).map_err(|e| ScoreError::Transport {
                    method: request.method.to_string(),
                    url: request.url.clone(),
                    message: e.to_string(),
                })?;
                Ok(Response { status, body })
            }
            Err(ureq::Error::Status(status, resp)) => Err(ScoreError::Status {
                method: request.method.to_string(),
                url: request.url.clone(),
                status,
                body: read_body(resp.into_reader()).unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(t)) => Err(ScoreError::Transport {
                method: request.method.to_string(),
                url: request.url.clone(),
                message: t.to_string(),
            }),
        }
    }
}

/// Read a whole response body. Scores can be far larger than the size
/// `ureq` caps `into_string` at.
fn read_body(mut reader: impl Read) -> std::io::Result<String> {
    let mut body = String::new();
    reader.read_to_string(&mut body)?;
    Ok(body)
}
