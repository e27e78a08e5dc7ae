//! `parley exec`: one exchange, no terminal UI.
//!
//! The reply is printed to stdout as plain text (code blocks numbered), the
//! new continuation token to stderr so it can be captured separately.

use anyhow::{Context, Result, bail};
use parley_core::config::Config;
use parley_core::copy::CopyState;
use parley_core::highlight::PlainHighlighter;
use parley_core::render::{plain_text, render_content};
use parley_core::responder::HttpResponder;
use parley_core::session::{Resolution, TurnController};
use tracing::info;

pub struct ExecRunOptions<'a> {
    pub config: &'a Config,
    pub responder_url: &'a str,
    pub prompt: &'a str,
    pub continuation: Option<&'a str>,
}

pub async fn run(options: ExecRunOptions<'_>) -> Result<()> {
    let responder = HttpResponder::new(options.responder_url, options.config.timeout())
        .context("create responder client")?;
    let mut controller = TurnController::new(options.config.timeout())
        .with_continuation_token(options.continuation.map(str::to_string));

    info!(url = responder.url(), "exec exchange");
    let resolution = controller
        .exchange(&responder, options.prompt)
        .await
        .context("submit prompt")?;

    match resolution {
        Resolution::Replied => {
            let reply = controller
                .transcript()
                .last()
                .map(|turn| turn.content.as_str())
                .unwrap_or_default();
            let units = render_content(reply, &PlainHighlighter, |_| CopyState::Idle);
            println!("{}", plain_text(&units));
            if let Some(token) = controller.continuation_token() {
                eprintln!("continuation: {token}");
            }
            Ok(())
        }
        Resolution::Failed { banner } => bail!("{banner}"),
        Resolution::Stale => bail!("reply arrived for a superseded exchange"),
    }
}
