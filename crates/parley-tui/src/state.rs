//! Application state.
//!
//! ```text
//! AppState
//! ├── session: TurnController   (transcript, token, pending, last error)
//! ├── transcript: TranscriptState (rendered turns, focus, scroll)
//! ├── input: InputState
//! ├── copies: CopyTracker       (per-block copy feedback deadlines)
//! └── theme / highlighter       (rendering inputs)
//! ```

use std::sync::Arc;

use parley_core::config::Config;
use parley_core::copy::CopyTracker;
use parley_core::highlight::Highlighter;
use parley_core::session::TurnController;

use crate::input::InputState;
use crate::theme::Theme;
use crate::transcript::TranscriptState;

/// Last known terminal size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

pub struct AppState {
    pub session: TurnController,
    pub transcript: TranscriptState,
    pub input: InputState,
    pub copies: CopyTracker,
    pub theme: Theme,
    pub highlighter: Arc<dyn Highlighter>,
    /// Shown in the transcript title (usually the responder URL).
    pub title: String,
    pub viewport: Viewport,
    /// Animation counter, advanced on every tick.
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(config: &Config, highlighter: Arc<dyn Highlighter>, title: String) -> Self {
        Self {
            session: TurnController::new(config.timeout()),
            transcript: TranscriptState::default(),
            input: InputState::default(),
            copies: CopyTracker::new(config.copy_feedback()),
            theme: Theme::from_config(&config.theme),
            highlighter,
            title,
            viewport: Viewport::default(),
            spinner_frame: 0,
            should_quit: false,
        }
    }

    /// Re-renders any turns appended since the last sync.
    pub fn sync_transcript(&mut self) {
        self.transcript
            .sync(self.session.transcript(), self.highlighter.as_ref());
    }
}
