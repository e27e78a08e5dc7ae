//! Full-screen chat TUI for parley.

pub mod clipboard;
pub mod effects;
pub mod events;
pub mod input;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod theme;
pub mod transcript;
pub mod update;
pub mod wrap;

use std::io::{IsTerminal, Write, stderr};
use std::sync::Arc;

use anyhow::{Context, Result};
use parley_core::config::Config;
use parley_core::highlight::{Highlighter, SyntectHighlighter};
use parley_core::responder::Responder;
pub use runtime::TuiRuntime;

use crate::state::AppState;

/// Runs the interactive chat loop against `responder`.
///
/// `title` is shown in the transcript border, usually the responder URL.
pub async fn run_chat(config: &Config, responder: Arc<dyn Responder>, title: String) -> Result<()> {
    if !stderr().is_terminal() {
        anyhow::bail!(
            "Chat mode requires a terminal.\n\
             Use `parley exec --prompt '...'` for non-interactive use."
        );
    }

    let highlighter: Arc<dyn Highlighter> = Arc::new(
        SyntectHighlighter::new(config.highlight.registry(), &config.highlight.theme)
            .context("Failed to load syntax highlighting")?,
    );

    let mut err = stderr();
    writeln!(err, "parley")?;
    writeln!(err, "Responder: {title}")?;
    err.flush()?;

    let state = AppState::new(config, highlighter, title);
    let mut runtime = TuiRuntime::new(state, responder)?;
    runtime.run()?;
    drop(runtime);

    writeln!(stderr(), "Goodbye!")?;
    Ok(())
}
