//! Conversation session and turn controller.
//!
//! `TurnController` owns the transcript and the exchange lifecycle:
//!
//! ```text
//! Idle --submit--> Pending --resolve(reply)--> Idle   (+assistant turn)
//!                          --resolve(error)--> Idle   (+fallback turn, banner)
//! ```
//!
//! Submitting and resolving are split so a UI can append the user turn
//! synchronously and hand the request to an async task. `exchange` runs both
//! halves for callers that can simply await.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::responder::{
    INVALID_RESPONSE, Responder, ResponderError, ResponderReply, ResponderRequest, respond_within,
};

/// Assistant turn appended when an exchange fails.
pub const FALLBACK_REPLY: &str = "I apologize, but I encountered an error. Please try again.";

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Assistant",
        }
    }
}

/// One message in the transcript. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Observable session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Append-only.
    pub transcript: Vec<Turn>,
    /// Opaque token from the last successful reply.
    pub continuation_token: Option<String>,
    /// True exactly while a responder call is outstanding.
    pub pending: bool,
    /// Banner text for the last failed exchange.
    pub last_error: Option<String>,
}

/// Identifies one submitted exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExchangeId(u64);

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An accepted submission, ready to dispatch to a responder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub id: ExchangeId,
    pub request: ResponderRequest,
}

/// Why a submission was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    /// Text was empty after trimming
    Empty,
    /// Another exchange is still outstanding
    Pending,
}

impl fmt::Display for SubmitRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitRejected::Empty => write!(f, "message is empty"),
            SubmitRejected::Pending => write!(f, "a reply is still pending"),
        }
    }
}

impl std::error::Error for SubmitRejected {}

/// What `resolve` did with an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Assistant reply appended, token updated.
    Replied,
    /// Fallback turn appended; `banner` is the new `last_error`.
    Failed { banner: String },
    /// Not the outstanding exchange; nothing changed.
    Stale,
}

/// Owns the session and drives exchanges through it.
#[derive(Debug, Default)]
pub struct TurnController {
    state: SessionState,
    outstanding: Option<ExchangeId>,
    next_id: u64,
    timeout: Option<Duration>,
}

impl TurnController {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }

    /// Continues an existing conversation.
    #[must_use]
    pub fn with_continuation_token(mut self, token: Option<String>) -> Self {
        self.state.continuation_token = token;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.state.transcript
    }

    pub fn is_pending(&self) -> bool {
        self.state.pending
    }

    pub fn last_error(&self) -> Option<&str> {
        self.state.last_error.as_deref()
    }

    pub fn continuation_token(&self) -> Option<&str> {
        self.state.continuation_token.as_deref()
    }

    /// Bounded wait applied by `exchange`.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Accepts a user message and moves to `Pending`.
    ///
    /// Appends the user turn and clears the banner. The returned exchange
    /// must be dispatched by the caller and its outcome passed to `resolve`.
    ///
    /// # Errors
    /// Rejects empty (whitespace-only) text and any submission while pending.
    /// A rejected submission changes nothing.
    pub fn submit(&mut self, text: &str) -> Result<Exchange, SubmitRejected> {
        if self.state.pending {
            debug!("submit rejected: reply pending");
            return Err(SubmitRejected::Pending);
        }
        if text.trim().is_empty() {
            return Err(SubmitRejected::Empty);
        }

        let id = ExchangeId(self.next_id);
        self.next_id += 1;

        self.state.transcript.push(Turn::user(text));
        self.state.last_error = None;
        self.state.pending = true;
        self.outstanding = Some(id);

        info!(
            exchange_id = %id,
            transcript_len = self.state.transcript.len(),
            has_token = self.state.continuation_token.is_some(),
            "exchange submitted"
        );

        Ok(Exchange {
            id,
            request: ResponderRequest {
                continuation_token: self.state.continuation_token.clone(),
                message: text.to_string(),
            },
        })
    }

    /// Folds a responder outcome back into the session.
    pub fn resolve(
        &mut self,
        id: ExchangeId,
        outcome: Result<ResponderReply, ResponderError>,
    ) -> Resolution {
        if self.outstanding != Some(id) {
            debug!(exchange_id = %id, "ignoring stale responder result");
            return Resolution::Stale;
        }
        self.outstanding = None;
        self.state.pending = false;

        match outcome.and_then(validate_reply) {
            Ok((message, token)) => {
                self.state.transcript.push(Turn::assistant(message));
                self.state.continuation_token = Some(token);
                info!(
                    exchange_id = %id,
                    transcript_len = self.state.transcript.len(),
                    outcome = "replied",
                    "exchange resolved"
                );
                Resolution::Replied
            }
            Err(err) => {
                let banner = format!("Error: {}", err.description());
                self.state.transcript.push(Turn::assistant(FALLBACK_REPLY));
                self.state.last_error = Some(banner.clone());
                warn!(
                    exchange_id = %id,
                    transcript_len = self.state.transcript.len(),
                    outcome = "failed",
                    kind = %err.kind,
                    error = %err,
                    "exchange failed"
                );
                Resolution::Failed { banner }
            }
        }
    }

    /// Submits `text`, awaits the responder under the bounded wait, and
    /// resolves the outcome.
    ///
    /// # Errors
    /// Returns `SubmitRejected` if the submission is not accepted; responder
    /// failures are reported through `Resolution::Failed`.
    pub async fn exchange(
        &mut self,
        responder: &dyn Responder,
        text: &str,
    ) -> Result<Resolution, SubmitRejected> {
        let exchange = self.submit(text)?;
        let outcome = respond_within(responder, exchange.request, self.timeout).await;
        Ok(self.resolve(exchange.id, outcome))
    }
}

/// A usable reply has a non-empty message and a token.
fn validate_reply(reply: ResponderReply) -> Result<(String, String), ResponderError> {
    match reply {
        ResponderReply {
            message: Some(message),
            continuation_token: Some(token),
        } if !message.is_empty() => Ok((message, token)),
        _ => Err(ResponderError::malformed(INVALID_RESPONSE)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures_util::future::BoxFuture;

    use super::*;

    /// Replays canned outcomes and records requests.
    #[derive(Default)]
    struct Scripted {
        outcomes: Mutex<Vec<Result<ResponderReply, ResponderError>>>,
        requests: Mutex<Vec<ResponderRequest>>,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<ResponderReply, ResponderError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into_iter().rev().collect()),
                requests: Mutex::default(),
            }
        }
    }

    impl Responder for Scripted {
        fn respond(
            &self,
            request: ResponderRequest,
        ) -> BoxFuture<'_, Result<ResponderReply, ResponderError>> {
            self.requests.lock().unwrap().push(request);
            let outcome = self.outcomes.lock().unwrap().pop().expect("scripted outcome");
            Box::pin(async move { outcome })
        }
    }

    struct Hang;

    impl Responder for Hang {
        fn respond(
            &self,
            _request: ResponderRequest,
        ) -> BoxFuture<'_, Result<ResponderReply, ResponderError>> {
            Box::pin(futures_util::future::pending())
        }
    }

    #[test]
    fn test_submit_appends_user_turn_and_sets_pending() {
        let mut controller = TurnController::default();
        let exchange = controller.submit("hi").unwrap();

        assert!(controller.is_pending());
        assert_eq!(controller.transcript(), &[Turn::user("hi")]);
        assert_eq!(exchange.request.message, "hi");
        assert_eq!(exchange.request.continuation_token, None);
    }

    #[test]
    fn test_submit_rejects_blank_text() {
        let mut controller = TurnController::default();
        assert_eq!(controller.submit("  \n\t"), Err(SubmitRejected::Empty));
        assert_eq!(controller.state(), &SessionState::default());
    }

    #[test]
    fn test_submit_while_pending_is_noop() {
        let mut controller = TurnController::default();
        controller.submit("first").unwrap();
        let before = controller.state().clone();

        assert_eq!(controller.submit("second"), Err(SubmitRejected::Pending));
        assert_eq!(controller.state(), &before);
    }

    #[test]
    fn test_success_appends_reply_and_sets_token() {
        let mut controller = TurnController::default();
        let exchange = controller.submit("hi").unwrap();

        let resolution = controller.resolve(exchange.id, Ok(ResponderReply::new("hello", "s1")));

        assert_eq!(resolution, Resolution::Replied);
        assert!(!controller.is_pending());
        assert_eq!(
            controller.transcript(),
            &[Turn::user("hi"), Turn::assistant("hello")]
        );
        assert_eq!(controller.continuation_token(), Some("s1"));
        assert_eq!(controller.last_error(), None);
    }

    #[test]
    fn test_token_is_forwarded_on_next_submit() {
        let mut controller = TurnController::default();
        let first = controller.submit("hi").unwrap();
        controller.resolve(first.id, Ok(ResponderReply::new("hello", "s1")));

        let second = controller.submit("again").unwrap();
        assert_eq!(second.request.continuation_token.as_deref(), Some("s1"));
    }

    #[test]
    fn test_failure_appends_fallback_and_keeps_token() {
        let mut controller =
            TurnController::default().with_continuation_token(Some("s0".to_string()));
        let exchange = controller.submit("hi").unwrap();

        let resolution = controller.resolve(
            exchange.id,
            Err(ResponderError::http_status(500, r#"{"error": "boom"}"#)),
        );

        assert_eq!(
            resolution,
            Resolution::Failed {
                banner: "Error: boom".to_string()
            }
        );
        assert!(!controller.is_pending());
        assert_eq!(
            controller.transcript(),
            &[Turn::user("hi"), Turn::assistant(FALLBACK_REPLY)]
        );
        assert_eq!(controller.continuation_token(), Some("s0"));
        assert_eq!(controller.last_error(), Some("Error: boom"));
    }

    #[test]
    fn test_banner_prefers_message_without_detail() {
        let mut controller = TurnController::default();
        let exchange = controller.submit("hi").unwrap();
        controller.resolve(exchange.id, Err(ResponderError::transport("Connection failed")));
        assert_eq!(controller.last_error(), Some("Error: Connection failed"));
    }

    #[test]
    fn test_next_submit_clears_banner() {
        let mut controller = TurnController::default();
        let exchange = controller.submit("hi").unwrap();
        controller.resolve(exchange.id, Err(ResponderError::transport("down")));
        assert!(controller.last_error().is_some());

        controller.submit("retry").unwrap();
        assert_eq!(controller.last_error(), None);
    }

    #[test]
    fn test_empty_message_is_malformed() {
        let mut controller = TurnController::default();
        let exchange = controller.submit("hi").unwrap();
        let resolution = controller.resolve(exchange.id, Ok(ResponderReply::new("", "s1")));

        assert_eq!(
            resolution,
            Resolution::Failed {
                banner: "Error: Invalid response from server".to_string()
            }
        );
        assert_eq!(controller.continuation_token(), None);
        assert_eq!(controller.transcript().len(), 2);
    }

    #[test]
    fn test_missing_token_is_malformed() {
        let mut controller = TurnController::default();
        let exchange = controller.submit("hi").unwrap();
        let reply = ResponderReply {
            message: Some("hello".to_string()),
            continuation_token: None,
        };

        assert!(matches!(
            controller.resolve(exchange.id, Ok(reply)),
            Resolution::Failed { .. }
        ));
        assert_eq!(controller.transcript()[1], Turn::assistant(FALLBACK_REPLY));
    }

    #[test]
    fn test_stale_result_is_ignored() {
        let mut controller = TurnController::default();
        let first = controller.submit("one").unwrap();
        controller.resolve(first.id, Ok(ResponderReply::new("1", "s1")));
        let _second = controller.submit("two").unwrap();
        let before = controller.state().clone();

        let resolution = controller.resolve(first.id, Ok(ResponderReply::new("late", "s9")));

        assert_eq!(resolution, Resolution::Stale);
        assert_eq!(controller.state(), &before);
    }

    #[tokio::test]
    async fn test_exchange_success() {
        let responder = Scripted::new(vec![Ok(ResponderReply::new("hello", "s1"))]);
        let mut controller = TurnController::new(Some(Duration::from_secs(500)));

        let resolution = controller.exchange(&responder, "hi").await.unwrap();

        assert_eq!(resolution, Resolution::Replied);
        assert_eq!(controller.transcript().len(), 2);
        assert_eq!(controller.continuation_token(), Some("s1"));
        assert_eq!(
            responder.requests.lock().unwrap()[0],
            ResponderRequest {
                continuation_token: None,
                message: "hi".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_exchange_sequence_grows_by_two_each() {
        let responder = Scripted::new(vec![
            Ok(ResponderReply::new("a", "s1")),
            Err(ResponderError::transport("down")),
            Ok(ResponderReply::new("c", "s2")),
        ]);
        let mut controller = TurnController::default();

        for (index, text) in ["one", "two", "three"].into_iter().enumerate() {
            controller.exchange(&responder, text).await.unwrap();
            assert_eq!(controller.transcript().len(), 2 * (index + 1));
            assert!(!controller.is_pending());
        }
        assert_eq!(controller.continuation_token(), Some("s2"));

        let tokens: Vec<Option<String>> = responder
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.continuation_token.clone())
            .collect();
        assert_eq!(tokens, vec![None, Some("s1".to_string()), Some("s1".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exchange_timeout_appends_fallback() {
        let mut controller = TurnController::new(Some(Duration::from_secs(500)));

        let resolution = controller.exchange(&Hang, "hi").await.unwrap();

        assert!(matches!(resolution, Resolution::Failed { .. }));
        assert_eq!(
            controller.transcript(),
            &[Turn::user("hi"), Turn::assistant(FALLBACK_REPLY)]
        );
        assert_eq!(controller.continuation_token(), None);
        assert_eq!(
            controller.last_error(),
            Some("Error: timeout of 500000ms exceeded")
        );
    }

    #[tokio::test]
    async fn test_exchange_rejects_blank_without_calling_responder() {
        let responder = Scripted::new(vec![]);
        let mut controller = TurnController::default();

        let result = controller.exchange(&responder, "   ").await;

        assert_eq!(result, Err(SubmitRejected::Empty));
        assert!(responder.requests.lock().unwrap().is_empty());
    }
}
