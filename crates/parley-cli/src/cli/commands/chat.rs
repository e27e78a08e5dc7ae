//! Chat command handler (the default mode).

use std::io::{IsTerminal, Read};

use anyhow::{Context, Result};
use parley_core::config::Config;

use super::exec;

pub async fn run(config: &Config, responder_url: &str) -> Result<()> {
    // Piped stdin runs a single exchange instead of the TUI.
    if !std::io::stdin().is_terminal() {
        let mut prompt = String::new();
        std::io::stdin().lock().read_to_string(&mut prompt)?;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            anyhow::bail!("No input provided via pipe");
        }
        return exec::run(exec::ExecRunOptions {
            config,
            responder_url,
            prompt,
            continuation: None,
        })
        .await;
    }

    run_tui(config, responder_url)
        .await
        .context("interactive chat failed")
}

#[cfg(feature = "tui")]
async fn run_tui(config: &Config, responder_url: &str) -> Result<()> {
    use std::sync::Arc;

    use parley_core::responder::HttpResponder;

    let responder = HttpResponder::new(responder_url, config.timeout())
        .context("create responder client")?;
    let title = responder.url().to_string();
    parley_tui::run_chat(config, Arc::new(responder), title).await
}

#[cfg(not(feature = "tui"))]
async fn run_tui(_config: &Config, _responder_url: &str) -> Result<()> {
    anyhow::bail!("TUI support is disabled in this build (feature \"tui\").");
}
