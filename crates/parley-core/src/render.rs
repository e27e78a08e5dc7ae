//! Segment rendering.
//!
//! Turns parsed segments into UI-agnostic render units:
//! - `RenderUnit::Text`: emphasis-aware runs, unchanged and in order
//! - `RenderUnit::Code`: numbered, highlighted lines plus the raw source
//!   used by the copy action
//!
//! Rendering is pure given the segments and the per-block copy state.

use tracing::debug;

use crate::copy::CopyState;
use crate::highlight::{HighlightedLine, Highlighter};
use crate::segments::{CodeSegment, Segment, TextRun, parse};

/// A rendered fragment of one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderUnit {
    Text(TextBlock),
    Code(CodeBlockUnit),
}

/// Emphasis-aware text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub runs: Vec<TextRun>,
}

/// A highlighted source line with its 1-based number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedLine {
    pub number: usize,
    pub markup: HighlightedLine,
}

/// A rendered code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlockUnit {
    /// Position among the code blocks of the turn (0-based).
    pub ordinal: usize,
    pub language: String,
    /// Original (non-highlighted) code, written by the copy action.
    pub source: String,
    pub numbered_lines: Vec<NumberedLine>,
    pub copy_state: CopyState,
}

impl CodeBlockUnit {
    /// Width of the widest line number (for gutter alignment).
    pub fn gutter_width(&self) -> usize {
        self.numbered_lines.len().max(1).to_string().len()
    }
}

/// Parses and renders a turn's content.
pub fn render_content<F>(
    content: &str,
    highlighter: &dyn Highlighter,
    copy_state_of: F,
) -> Vec<RenderUnit>
where
    F: Fn(usize) -> CopyState,
{
    render_segments(&parse(content), highlighter, copy_state_of)
}

/// Renders parsed segments.
///
/// `copy_state_of` maps a code block ordinal to its current copy state.
pub fn render_segments<F>(
    segments: &[Segment],
    highlighter: &dyn Highlighter,
    copy_state_of: F,
) -> Vec<RenderUnit>
where
    F: Fn(usize) -> CopyState,
{
    let mut ordinal = 0;
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Text(text) => RenderUnit::Text(TextBlock {
                runs: text.runs.clone(),
            }),
            Segment::Code(code) => {
                let unit = render_code(code, ordinal, highlighter, copy_state_of(ordinal));
                ordinal += 1;
                RenderUnit::Code(unit)
            }
        })
        .collect()
}

fn render_code(
    code: &CodeSegment,
    ordinal: usize,
    highlighter: &dyn Highlighter,
    copy_state: CopyState,
) -> CodeBlockUnit {
    let mut highlighted = highlighter.highlight(&code.code, &code.language);

    // Numbering follows the raw lines; a highlighter that disagrees on the
    // line count is ignored for this block.
    if highlighted.len() != code.lines.len() {
        debug!(
            language = %code.language,
            expected = code.lines.len(),
            got = highlighted.len(),
            "highlighter line count mismatch, using plain lines"
        );
        highlighted = code
            .lines
            .iter()
            .map(|line| HighlightedLine::plain(line))
            .collect();
    }

    CodeBlockUnit {
        ordinal,
        language: code.language.clone(),
        source: code.code.clone(),
        numbered_lines: highlighted
            .into_iter()
            .enumerate()
            .map(|(index, markup)| NumberedLine {
                number: index + 1,
                markup,
            })
            .collect(),
        copy_state,
    }
}

/// Renders units as plain text (no colors, bold markers dropped).
///
/// Code blocks get a language header and a line-number gutter.
pub fn plain_text(units: &[RenderUnit]) -> String {
    let mut out = String::new();
    for unit in units {
        match unit {
            RenderUnit::Text(block) => {
                for run in &block.runs {
                    out.push_str(&run.text);
                }
            }
            RenderUnit::Code(code) => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(&format!("[{}]\n", code.language));
                let width = code.gutter_width();
                for line in &code.numbered_lines {
                    out.push_str(&format!(
                        "{:>width$} | {}\n",
                        line.number,
                        line.markup.text()
                    ));
                }
            }
        }
    }
    out
}
