//! Error types for the score client.
//!
//! Library functions return [`Result`] and propagate with `?`. Only the
//! controller turns an error into a user-facing alert or a log line.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoreError {
    /// The request never produced an HTTP response (DNS, connection, I/O).
    #[error("Transport error on {method} {url}: {message}")]
    Transport {
        method: String,
        url: String,
        message: String,
    },

    /// The backend answered with a non-2xx status.
    #[error("{method} {url} failed with status {status}: {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// A response body did not have the expected JSON shape.
    #[error("Cannot decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// An SVG page or MEI document could not be parsed.
    #[error("XML parse error: {0}")]
    Xml(String),

    /// A composite anchor id was malformed, or one of its parts contained
    /// the separator.
    ///
    /// ```
    /// # use scoremark::ScoreError;
    /// let err = ScoreError::InvalidAnchorKey("a@b".to_string());
    /// assert_eq!(err.to_string(), "Invalid anchor key: a@b");
    /// ```
    #[error("Invalid anchor key: {0}")]
    InvalidAnchorKey(String),

    /// The container the score is rendered into does not exist yet.
    #[error("Cannot find target = {0}")]
    MissingContainer(String),

    /// An element id is not present on the rendered page.
    #[error("Element '{0}' not found on the current page")]
    MissingElement(String),

    /// The external notation toolkit reported a failure.
    #[error("Notation toolkit error: {0}")]
    Toolkit(String),

    /// Configuration could not be loaded.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ScoreError {
    /// Whether the error came from the network round trip (transport or
    /// status). These are the ones surfaced as blocking alerts.
    pub fn is_network(&self) -> bool {
        matches!(self, ScoreError::Transport { .. } | ScoreError::Status { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScoreError>;
