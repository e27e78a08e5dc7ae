//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use parley_core::config;
use parley_core::logging::{self, LogTarget};

mod commands;

#[derive(Parser)]
#[command(name = "parley")]
#[command(version)]
#[command(about = "Terminal chat client for a remote conversational responder")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Responder endpoint (overrides PARLEY_RESPONDER_URL and config)
    #[arg(long, global = true, value_name = "URL")]
    url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sends one message and prints the reply
    Exec {
        /// The message to send
        #[arg(short, long)]
        prompt: String,

        /// Continuation token from a previous exchange
        #[arg(short, long, value_name = "TOKEN")]
        continuation: Option<String>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli { command, url } = cli;

    match command {
        // Config commands must work even when the existing file is broken.
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },

        Some(Commands::Exec {
            prompt,
            continuation,
        }) => {
            let (config, responder_url) = load_config(url.as_deref())?;
            let _log = logging::init(&LogTarget::Stderr, &config.log.level)?;
            commands::exec::run(commands::exec::ExecRunOptions {
                config: &config,
                responder_url: &responder_url,
                prompt: &prompt,
                continuation: continuation.as_deref(),
            })
            .await
        }

        // default to chat mode
        None => {
            let (config, responder_url) = load_config(url.as_deref())?;
            let _log = logging::init(
                &LogTarget::File(config::paths::logs_dir()),
                &config.log.level,
            )?;
            commands::chat::run(&config, &responder_url).await
        }
    }
}

fn load_config(url_override: Option<&str>) -> Result<(config::Config, String)> {
    let config = config::Config::load().context("load config")?;
    let responder_url = config.effective_responder_url(url_override);
    Ok((config, responder_url))
}
