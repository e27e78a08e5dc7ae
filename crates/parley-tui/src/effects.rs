//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent I/O only; the reducer never performs I/O or spawns tasks
//! directly.

use parley_core::copy::BlockId;
use parley_core::session::Exchange;

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug, PartialEq, Eq)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Dispatch an accepted exchange to the responder.
    SendMessage { exchange: Exchange },

    /// Write a code block's source to the clipboard.
    CopyToClipboard {
        block: BlockId,
        /// Raw (non-highlighted) code.
        text: String,
    },
}
