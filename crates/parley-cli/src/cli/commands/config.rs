//! `parley config` handlers.

use anyhow::{Context, Result};
use parley_core::config::{self, Config, RESPONDER_URL_ENV};

pub fn path() {
    println!("{}", config::paths::config_path().display());
}

/// Writes the commented template; refuses to overwrite.
pub fn init() -> Result<()> {
    let target = config::paths::config_path();
    Config::init(&target).with_context(|| format!("Failed to initialize {}", target.display()))?;
    println!("Created config at {}", target.display());
    println!("Set responder_url there, or export {RESPONDER_URL_ENV}.");
    Ok(())
}
