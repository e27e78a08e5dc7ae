//! Message content segmentation.
//!
//! Splits a turn's raw text into an ordered list of segments:
//! - `TextSegment`: plain runs with `**bold**` emphasis resolved
//! - `CodeSegment`: fenced code blocks with their language tag
//!
//! Parsing is permissive. Malformed markup never produces an error; the
//! worst case is the whole input returned as one plain segment.

mod emphasis;
mod parse;

pub use emphasis::split_emphasis;
pub use parse::parse;

/// Language used for fences without a tag.
pub const DEFAULT_LANGUAGE: &str = "text";

/// A parsed fragment of a turn's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(TextSegment),
    Code(CodeSegment),
}

impl Segment {
    /// Creates a text segment holding `text` as a single non-emphasized run.
    pub fn plain(text: impl Into<String>) -> Self {
        Segment::Text(TextSegment::plain(text))
    }

    pub fn as_code(&self) -> Option<&CodeSegment> {
        match self {
            Segment::Code(code) => Some(code),
            Segment::Text(_) => None,
        }
    }
}

/// A run of text with a single emphasis state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub emphasized: bool,
}

impl TextRun {
    pub fn new(text: impl Into<String>, emphasized: bool) -> Self {
        Self {
            text: text.into(),
            emphasized,
        }
    }
}

/// Plain text between (or around) code blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextSegment {
    pub runs: Vec<TextRun>,
}

impl TextSegment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            runs: vec![TextRun::new(text, false)],
        }
    }

    /// Concatenated run text, emphasis markers removed.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

/// A fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSegment {
    /// Fence language tag (`"text"` when the fence had none).
    pub language: String,
    /// Trimmed block body, exactly what the copy action writes.
    pub code: String,
    /// `code` split on line breaks.
    pub lines: Vec<String>,
}

impl CodeSegment {
    pub fn new(language: &str, body: &str) -> Self {
        let language = if language.is_empty() {
            DEFAULT_LANGUAGE
        } else {
            language
        };
        let code = body.trim().to_string();
        let lines = split_code_lines(&code).map(str::to_string).collect();
        Self {
            language: language.to_string(),
            code,
            lines,
        }
    }
}

/// Splits code into display lines (`\n` or `\r\n` line breaks).
///
/// Shared by the parser and the highlighter so numbered lines always line up
/// with the raw lines.
pub fn split_code_lines(code: &str) -> impl Iterator<Item = &str> {
    code.split('\n').map(|line| line.trim_end_matches('\r'))
}
