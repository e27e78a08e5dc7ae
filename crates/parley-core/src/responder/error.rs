use std::fmt;

use serde_json::Value;

/// Detail used when a failure carries no usable text.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// Message for a success status with an unusable body.
pub const INVALID_RESPONSE: &str = "Invalid response from server";

/// Categories of responder failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderErrorKind {
    /// Connection refused, reset, DNS, TLS...
    Transport,
    /// No reply within the bounded wait
    Timeout,
    /// Non-2xx status
    HttpStatus,
    /// Success status with an unusable body
    Malformed,
}

impl fmt::Display for ResponderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponderErrorKind::Transport => write!(f, "transport"),
            ResponderErrorKind::Timeout => write!(f, "timeout"),
            ResponderErrorKind::HttpStatus => write!(f, "http_status"),
            ResponderErrorKind::Malformed => write!(f, "malformed"),
        }
    }
}

/// Structured responder failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponderError {
    pub kind: ResponderErrorKind,
    /// One-line summary of what went wrong
    pub message: String,
    /// Error text supplied by the responder itself (preferred for display)
    pub detail: Option<String>,
}

impl ResponderError {
    pub fn new(kind: ResponderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ResponderErrorKind::Transport, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ResponderErrorKind::Timeout, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ResponderErrorKind::Malformed, message)
    }

    /// Creates an HTTP status error, pulling `{"error": ...}` out of the body.
    pub fn http_status(status: u16, body: &str) -> Self {
        Self {
            kind: ResponderErrorKind::HttpStatus,
            message: format!("Request failed with status code {status}"),
            detail: extract_error_detail(body),
        }
    }

    /// Text for the error banner: the responder's detail, else the message,
    /// else a generic fallback.
    pub fn description(&self) -> &str {
        [self.detail.as_deref(), Some(self.message.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|text| !text.is_empty())
            .unwrap_or(UNEXPECTED_ERROR)
    }
}

impl fmt::Display for ResponderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ResponderError {}

/// Reads `error` from a JSON body: a string, or an object with `message`.
fn extract_error_detail(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    let error = json.get("error")?;
    error
        .as_str()
        .or_else(|| error.get("message").and_then(Value::as_str))
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
}
