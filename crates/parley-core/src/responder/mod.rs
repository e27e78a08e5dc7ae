//! Responder capability.
//!
//! The remote conversational backend behind a single async trait. The
//! session layer only sees `Responder`; the HTTP implementation lives in
//! `http`.

mod error;
mod http;

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;

pub use error::{INVALID_RESPONSE, ResponderError, ResponderErrorKind, UNEXPECTED_ERROR};
pub use http::HttpResponder;

/// One user message plus the opaque conversation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponderRequest {
    /// Token from the previous reply (`None` starts a new conversation)
    pub continuation_token: Option<String>,
    pub message: String,
}

/// Raw reply fields. Validation is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponderReply {
    pub message: Option<String>,
    pub continuation_token: Option<String>,
}

impl ResponderReply {
    pub fn new(message: impl Into<String>, continuation_token: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            continuation_token: Some(continuation_token.into()),
        }
    }
}

/// Async request/response capability.
pub trait Responder: Send + Sync {
    fn respond(
        &self,
        request: ResponderRequest,
    ) -> BoxFuture<'_, Result<ResponderReply, ResponderError>>;
}

impl<T: Responder + ?Sized> Responder for Arc<T> {
    fn respond(
        &self,
        request: ResponderRequest,
    ) -> BoxFuture<'_, Result<ResponderReply, ResponderError>> {
        (**self).respond(request)
    }
}

/// Calls the responder under a bounded wait (`None` waits forever).
pub async fn respond_within(
    responder: &dyn Responder,
    request: ResponderRequest,
    timeout: Option<Duration>,
) -> Result<ResponderReply, ResponderError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, responder.respond(request))
            .await
            .unwrap_or_else(|_| {
                Err(ResponderError::timeout(format!(
                    "timeout of {}ms exceeded",
                    limit.as_millis()
                )))
            }),
        None => responder.respond(request).await,
    }
}
