use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{INVALID_RESPONSE, Responder, ResponderError, ResponderReply, ResponderRequest};

/// User-Agent header for responder requests.
pub const USER_AGENT: &str = concat!("parley/", env!("CARGO_PKG_VERSION"));

/// JSON request body.
#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    session_id: Option<&'a str>,
    message: &'a str,
}

/// JSON success body. Both fields are optional on the wire; emptiness is
/// judged by the session layer.
#[derive(Debug, Deserialize)]
struct WireReply {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

/// Responder that POSTs JSON to a chat endpoint.
#[derive(Debug, Clone)]
pub struct HttpResponder {
    http: reqwest::Client,
    url: String,
}

impl HttpResponder {
    /// Creates a responder for `url` with an optional request timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, request: ResponderRequest) -> Result<ResponderReply, ResponderError> {
        let body = WireRequest {
            session_id: request.continuation_token.as_deref(),
            message: &request.message,
        };
        debug!(url = %self.url, has_token = body.session_id.is_some(), "posting message");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;
        if !status.is_success() {
            return Err(ResponderError::http_status(status.as_u16(), &text));
        }

        let reply: WireReply = serde_json::from_str(&text).map_err(|e| {
            debug!(error = %e, "reply body is not a valid JSON object");
            ResponderError::malformed(INVALID_RESPONSE)
        })?;
        Ok(ResponderReply {
            message: reply.message,
            continuation_token: reply.session_id,
        })
    }
}

impl Responder for HttpResponder {
    fn respond(
        &self,
        request: ResponderRequest,
    ) -> BoxFuture<'_, Result<ResponderReply, ResponderError>> {
        Box::pin(self.post(request))
    }
}

fn classify_reqwest_error(e: &reqwest::Error) -> ResponderError {
    if e.is_timeout() {
        ResponderError::timeout(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ResponderError::transport(format!("Connection failed: {e}"))
    } else if e.is_request() {
        ResponderError::transport(format!("Request error: {e}"))
    } else {
        ResponderError::transport(format!("Network error: {e}"))
    }
}
