//! Configuration management for parley.
//!
//! Loads configuration from ${PARLEY_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::highlight::{DEFAULT_LANGUAGES, DEFAULT_THEME, LanguageRegistry};

/// Env var that overrides the configured responder URL.
pub const RESPONDER_URL_ENV: &str = "PARLEY_RESPONDER_URL";

/// Returns the default config template with comments.
///
/// Embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for parley configuration and data directories.
    //!
    //! PARLEY_HOME resolution order:
    //! 1. PARLEY_HOME environment variable (if set)
    //! 2. ~/.config/parley (default)

    use std::path::PathBuf;

    /// Returns the parley home directory.
    ///
    /// Checks PARLEY_HOME env var first, falls back to ~/.config/parley
    /// (or `./.config/parley` when no home directory is known).
    pub fn parley_home() -> PathBuf {
        if let Ok(home) = std::env::var("PARLEY_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("parley")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        parley_home().join("config.toml")
    }

    /// Returns the directory chat-mode log files are written to.
    pub fn logs_dir() -> PathBuf {
        parley_home().join("logs")
    }
}

/// Code highlighting configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Languages the highlighter recognizes; everything else renders as text.
    pub languages: Vec<String>,
    /// Bundled syntect theme name.
    pub theme: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            languages: DEFAULT_LANGUAGES.iter().map(ToString::to_string).collect(),
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

impl HighlightConfig {
    pub fn registry(&self) -> LanguageRegistry {
        LanguageRegistry::new(&self.languages)
    }
}

/// Semantic color roles as `#RRGGBB` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub background: String,
    pub text: String,
    /// User bubble / header color.
    pub primary: String,
    /// Assistant bubble color.
    pub secondary: String,
    pub input: String,
    pub border: String,
    /// Buttons and focus highlights.
    pub accent: String,
    pub accent_hover: String,
    pub error: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            background: "#000000".to_string(),
            text: "#FFFFFF".to_string(),
            primary: "#3D3D3D".to_string(),
            secondary: "#3D3D3D".to_string(),
            input: "#2D2D2D".to_string(),
            border: "#555555".to_string(),
            accent: "#6B8E23".to_string(),
            accent_hover: "#556B2F".to_string(),
            error: "#B22222".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when PARLEY_LOG is unset (e.g. "warn", "parley_core=debug").
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Responder endpoint (HTTP POST).
    pub responder_url: String,

    /// Bounded wait for a single responder call, in seconds (0 disables)
    pub timeout_secs: u64,

    /// How long a code block shows "copied", in milliseconds
    pub copy_feedback_ms: u64,

    #[serde(default)]
    pub highlight: HighlightConfig,

    #[serde(default)]
    pub theme: ThemeConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    pub const DEFAULT_RESPONDER_URL: &str = "http://localhost:8000/chat";
    const DEFAULT_TIMEOUT_SECS: u64 = 500;
    const DEFAULT_COPY_FEEDBACK_MS: u64 = 2000;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Returns the responder URL to use.
    ///
    /// Resolution order:
    /// 1) Explicit override (CLI flag)
    /// 2) PARLEY_RESPONDER_URL env var
    /// 3) `responder_url` from config (if non-empty)
    /// 4) Built-in default
    pub fn effective_responder_url(&self, cli_override: Option<&str>) -> String {
        let env = std::env::var(RESPONDER_URL_ENV).ok();
        resolve_url(cli_override, env.as_deref(), &self.responder_url)
    }

    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }

    pub fn copy_feedback(&self) -> Duration {
        Duration::from_millis(self.copy_feedback_ms)
    }
}

fn resolve_url(cli: Option<&str>, env: Option<&str>, configured: &str) -> String {
    [cli, env, Some(configured)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(Config::DEFAULT_RESPONDER_URL)
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            responder_url: Self::DEFAULT_RESPONDER_URL.to_string(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            copy_feedback_ms: Self::DEFAULT_COPY_FEEDBACK_MS,
            highlight: HighlightConfig::default(),
            theme: ThemeConfig::default(),
            log: LogConfig::default(),
        }
    }
}
