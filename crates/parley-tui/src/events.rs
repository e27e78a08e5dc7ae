//! UI event types.
//!
//! Everything that can change `AppState` arrives as a `UiEvent`: terminal
//! input, timer ticks, and results of async work sent back through the
//! runtime inbox.

use crossterm::event::Event;
use parley_core::copy::BlockId;
use parley_core::responder::{ResponderError, ResponderReply};
use parley_core::session::ExchangeId;

use crate::clipboard::{ClipboardError, Transport};

#[derive(Debug)]
pub enum UiEvent {
    /// Periodic timer (animation, copy-feedback deadlines).
    Tick,

    /// Start of a frame with the current terminal size.
    Frame { width: u16, height: u16 },

    /// Raw terminal input.
    Terminal(Event),

    /// Outcome of a responder call.
    ReplyReceived {
        id: ExchangeId,
        result: Result<ResponderReply, ResponderError>,
    },

    /// Outcome of a clipboard write for a code block.
    CopyFinished {
        block: BlockId,
        result: Result<Transport, ClipboardError>,
    },
}
