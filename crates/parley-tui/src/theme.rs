//! Color roles resolved from config.

use std::str::FromStr;

use parley_core::config::ThemeConfig;
use parley_core::highlight::Rgb;
use ratatui::style::Color;
use tracing::warn;

/// Resolved semantic colors used by rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub primary: Color,
    pub secondary: Color,
    pub input: Color,
    pub border: Color,
    pub accent: Color,
    pub accent_hover: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&ThemeConfig::default())
    }
}

impl Theme {
    /// Resolves every role, replacing unparsable values with the default.
    pub fn from_config(config: &ThemeConfig) -> Self {
        let defaults = ThemeConfig::default();
        let pick = |role: &str, value: &str, fallback: &str| {
            parse_color(value).unwrap_or_else(|| {
                warn!(role, value, "invalid theme color, using default");
                parse_color(fallback).unwrap_or(Color::Reset)
            })
        };

        Self {
            background: pick("background", &config.background, &defaults.background),
            text: pick("text", &config.text, &defaults.text),
            primary: pick("primary", &config.primary, &defaults.primary),
            secondary: pick("secondary", &config.secondary, &defaults.secondary),
            input: pick("input", &config.input, &defaults.input),
            border: pick("border", &config.border, &defaults.border),
            accent: pick("accent", &config.accent, &defaults.accent),
            accent_hover: pick("accent_hover", &config.accent_hover, &defaults.accent_hover),
            error: pick("error", &config.error, &defaults.error),
        }
    }
}

fn parse_color(value: &str) -> Option<Color> {
    Color::from_str(value.trim()).ok()
}

/// Converts a highlighter color to a terminal color.
pub fn rgb(color: Rgb) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}
