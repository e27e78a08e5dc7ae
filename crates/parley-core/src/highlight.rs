//! Syntax highlighting adapter for code blocks.
//!
//! The supported language set is an explicit `LanguageRegistry` handed to the
//! highlighter at construction. Anything the registry does not resolve is
//! treated as `"text"` and passes through unhighlighted.
//!
//! Highlighting runs line by line, so a styled span never crosses a line
//! boundary and the output always has one entry per source line.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use tracing::debug;

use crate::segments::{DEFAULT_LANGUAGE, split_code_lines};

/// Languages enabled when the config does not list any.
pub const DEFAULT_LANGUAGES: &[&str] = &["python", "java", "c", "bash", "javascript", "jsx"];

/// Default syntect theme (works well on dark backgrounds).
pub const DEFAULT_THEME: &str = "base16-ocean.dark";

/// Common spellings mapped to a canonical language id.
const ALIASES: &[(&str, &str)] = &[
    ("py", "python"),
    ("python3", "python"),
    ("js", "javascript"),
    ("node", "javascript"),
    ("sh", "bash"),
    ("shell", "bash"),
    ("zsh", "bash"),
    ("console", "bash"),
    ("h", "c"),
    ("ts", "typescript"),
    ("rs", "rust"),
    ("rb", "ruby"),
    ("yml", "yaml"),
    ("c++", "cpp"),
];

/// 24-bit foreground color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A fragment of a highlighted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub text: String,
    /// `None` means the renderer's default code color.
    pub color: Option<Rgb>,
}

/// One highlighted source line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HighlightedLine {
    pub spans: Vec<HighlightSpan>,
}

impl HighlightedLine {
    /// An unhighlighted line.
    pub fn plain(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        Self {
            spans: vec![HighlightSpan {
                text: text.to_string(),
                color: None,
            }],
        }
    }

    /// Line text without markup.
    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

/// Pure highlighting capability: code plus language in, one line of markup
/// per source line out.
pub trait Highlighter: Send + Sync {
    fn highlight(&self, code: &str, language: &str) -> Vec<HighlightedLine>;
}

/// Passthrough highlighter (every language is `"text"`).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, code: &str, _language: &str) -> Vec<HighlightedLine> {
        plain_lines(code)
    }
}

fn plain_lines(code: &str) -> Vec<HighlightedLine> {
    split_code_lines(code).map(HighlightedLine::plain).collect()
}

/// Explicit set of languages the highlighter is allowed to recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageRegistry {
    /// Canonical id -> token used to look up the grammar.
    languages: BTreeMap<String, String>,
}

impl LanguageRegistry {
    /// Creates a registry from canonical language ids (case-insensitive).
    pub fn new<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let languages = languages
            .into_iter()
            .map(|id| canonical(id.as_ref()))
            .filter(|id| !id.is_empty() && id != DEFAULT_LANGUAGE)
            .map(|id| {
                let token = grammar_token(&id).to_string();
                (id, token)
            })
            .collect();
        Self { languages }
    }

    /// Registered canonical ids, sorted.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    /// Resolves a fence tag to a registered canonical id.
    ///
    /// Returns `None` for unknown or unregistered languages (rendered as text).
    pub fn resolve(&self, language: &str) -> Option<&str> {
        let id = canonical(language);
        self.languages.get_key_value(&id).map(|(id, _)| id.as_str())
    }

    fn grammar_for(&self, language: &str) -> Option<&str> {
        self.languages.get(&canonical(language)).map(String::as_str)
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGES)
    }
}

fn canonical(language: &str) -> String {
    let lower = language.trim().to_lowercase();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map_or(lower, |(_, id)| (*id).to_string())
}

/// Grammar lookup token for a canonical id.
fn grammar_token(id: &str) -> &str {
    match id {
        // The bundled grammars have no JSX syntax; JavaScript covers it.
        "jsx" => "js",
        other => other,
    }
}

/// Highlighter backed by syntect's bundled grammars and themes.
pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
    registry: LanguageRegistry,
}

impl SyntectHighlighter {
    /// Creates a highlighter for the given registry and theme name.
    ///
    /// # Errors
    /// Returns an error if `theme_name` is not a bundled syntect theme.
    pub fn new(registry: LanguageRegistry, theme_name: &str) -> Result<Self> {
        let mut themes = ThemeSet::load_defaults().themes;
        let available = themes.keys().cloned().collect::<Vec<_>>().join(", ");
        let theme = themes.remove(theme_name).with_context(|| {
            format!("Unknown highlight theme '{theme_name}' (available: {available})")
        })?;

        Ok(Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme,
            registry,
        })
    }

    fn syntax_for(&self, language: &str) -> Option<&SyntaxReference> {
        let token = self.registry.grammar_for(language)?;
        self.syntaxes
            .find_syntax_by_token(token)
            .or_else(|| self.syntaxes.find_syntax_by_extension(token))
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, language: &str) -> Vec<HighlightedLine> {
        let Some(syntax) = self.syntax_for(language) else {
            return plain_lines(code);
        };

        // Fresh parser state per call; nothing is shared between calls.
        let mut highlighter = HighlightLines::new(syntax, &self.theme);

        split_code_lines(code)
            .map(|line| {
                // Grammars are loaded in newline mode and expect the terminator.
                let with_newline = format!("{line}\n");
                match highlighter.highlight_line(&with_newline, &self.syntaxes) {
                    Ok(ranges) => HighlightedLine {
                        spans: ranges
                            .into_iter()
                            .filter_map(|(style, text)| {
                                let text = text.trim_end_matches('\n');
                                (!text.is_empty()).then(|| HighlightSpan {
                                    text: text.to_string(),
                                    color: Some(Rgb {
                                        r: style.foreground.r,
                                        g: style.foreground.g,
                                        b: style.foreground.b,
                                    }),
                                })
                            })
                            .collect(),
                    },
                    Err(err) => {
                        debug!(error = %err, language, "highlight failed, using plain line");
                        HighlightedLine::plain(line)
                    }
                }
            })
            .collect()
    }
}
