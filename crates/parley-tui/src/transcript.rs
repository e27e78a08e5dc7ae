//! Transcript view.
//!
//! - `TranscriptState`: render cache (one `Vec<RenderUnit>` per turn), block
//!   focus, and scroll position
//! - `TranscriptView`: what the transcript shows for one frame
//! - `build_lines()`: view to wrapped ratatui lines
//!
//! Turns are rendered once, when they are appended. Copy state changes every
//! tick, so it is patched onto the cached units when a view is built.

use std::time::Instant;

use parley_core::copy::{BlockId, CopyState, CopyTracker};
use parley_core::highlight::Highlighter;
use parley_core::render::{CodeBlockUnit, RenderUnit, TextBlock, render_content};
use parley_core::session::{Role, SessionState, Turn};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::theme::{Theme, rgb};
use crate::wrap::{WrapOptions, wrap_spans};

/// Render frames per thinking-dot step.
pub const SPINNER_SPEED_DIVISOR: usize = 20;

const INDENT: &str = "  ";

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Default)]
pub struct TranscriptState {
    rendered: Vec<Vec<RenderUnit>>,
    /// Code block targeted by the copy action.
    pub focus: Option<BlockId>,
    /// Lines scrolled up from the bottom. Zero follows the tail.
    pub scroll_back: usize,
}

impl TranscriptState {
    /// Renders turns that are not cached yet.
    ///
    /// The transcript is append-only, so the cache is a prefix of it.
    pub fn sync(&mut self, turns: &[Turn], highlighter: &dyn Highlighter) {
        if turns.len() < self.rendered.len() {
            self.rendered.truncate(turns.len());
        }
        for turn in &turns[self.rendered.len()..] {
            self.rendered
                .push(render_content(&turn.content, highlighter, |_| CopyState::Idle));
        }
    }

    pub fn units(&self, turn: usize) -> &[RenderUnit] {
        self.rendered.get(turn).map_or(&[][..], Vec::as_slice)
    }

    /// Every code block, in transcript order.
    pub fn code_blocks(&self) -> impl Iterator<Item = (BlockId, &CodeBlockUnit)> {
        self.rendered.iter().enumerate().flat_map(|(turn, units)| {
            units.iter().filter_map(move |unit| match unit {
                RenderUnit::Code(code) => Some((BlockId::new(turn, code.ordinal), code)),
                RenderUnit::Text(_) => None,
            })
        })
    }

    pub fn block(&self, id: BlockId) -> Option<&CodeBlockUnit> {
        self.code_blocks()
            .find_map(|(block, code)| (block == id).then_some(code))
    }

    /// Focused block, or the newest one when nothing is focused.
    pub fn copy_target(&self) -> Option<BlockId> {
        self.focus
            .filter(|id| self.block(*id).is_some())
            .or_else(|| self.code_blocks().last().map(|(id, _)| id))
    }

    /// Moves focus to the next code block, wrapping around.
    pub fn focus_next(&mut self) {
        let blocks: Vec<BlockId> = self.code_blocks().map(|(id, _)| id).collect();
        self.focus = match self.focus.and_then(|f| blocks.iter().position(|id| *id == f)) {
            Some(index) => blocks.get((index + 1) % blocks.len()).copied(),
            None => blocks.first().copied(),
        };
    }

    /// Moves focus to the previous code block, wrapping around.
    pub fn focus_prev(&mut self) {
        let blocks: Vec<BlockId> = self.code_blocks().map(|(id, _)| id).collect();
        self.focus = match self.focus.and_then(|f| blocks.iter().position(|id| *id == f)) {
            Some(0) => blocks.last().copied(),
            Some(index) => blocks.get(index - 1).copied(),
            None => blocks.last().copied(),
        };
    }

    pub fn follow_tail(&mut self) {
        self.scroll_back = 0;
    }
}

// ============================================================================
// View
// ============================================================================

/// One turn as displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnView {
    pub index: usize,
    pub role: Role,
    pub units: Vec<RenderUnit>,
}

/// Everything the transcript area shows for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptView<'a> {
    pub turns: Vec<TurnView>,
    /// Present iff a reply is pending.
    pub thinking: bool,
    /// Present iff the last exchange failed.
    pub error_banner: Option<&'a str>,
}

impl<'a> TranscriptView<'a> {
    pub fn build(
        session: &'a SessionState,
        transcript: &TranscriptState,
        copies: &CopyTracker,
        now: Instant,
    ) -> Self {
        let turns = session
            .transcript
            .iter()
            .enumerate()
            .map(|(index, turn)| {
                let mut units = transcript.units(index).to_vec();
                for unit in &mut units {
                    if let RenderUnit::Code(code) = unit {
                        code.copy_state = copies.state_at(BlockId::new(index, code.ordinal), now);
                    }
                }
                TurnView {
                    index,
                    role: turn.role,
                    units,
                }
            })
            .collect();

        Self {
            turns,
            thinking: session.pending,
            error_banner: session.last_error.as_deref(),
        }
    }
}

// ============================================================================
// Lines
// ============================================================================

/// Wrapped transcript plus the row of every code block header.
#[derive(Debug, Default)]
pub struct TranscriptLines {
    pub lines: Vec<Line<'static>>,
    pub block_rows: Vec<(BlockId, usize)>,
}

impl TranscriptLines {
    pub fn row_of(&self, block: BlockId) -> Option<usize> {
        self.block_rows
            .iter()
            .find_map(|(id, row)| (*id == block).then_some(*row))
    }
}

/// "Assistant is thinking" with 0-3 animated dots.
pub fn thinking_text(spinner_frame: usize) -> String {
    let dots = (spinner_frame / SPINNER_SPEED_DIVISOR) % 4;
    format!("Assistant is thinking{}", ".".repeat(dots))
}

pub fn build_lines(
    view: &TranscriptView<'_>,
    theme: &Theme,
    width: u16,
    focus: Option<BlockId>,
    spinner_frame: usize,
) -> TranscriptLines {
    let width = usize::from(width);
    let mut out = TranscriptLines::default();

    for turn in &view.turns {
        out.lines.push(role_header(turn.role, theme));
        for (position, unit) in turn.units.iter().enumerate() {
            match unit {
                RenderUnit::Text(text) => {
                    let trim_start = position > 0;
                    let trim_end = position + 1 < turn.units.len();
                    push_text(&mut out.lines, text, theme, width, trim_start, trim_end);
                }
                RenderUnit::Code(code) => {
                    let id = BlockId::new(turn.index, code.ordinal);
                    out.block_rows.push((id, out.lines.len()));
                    push_code(&mut out.lines, code, theme, width, focus == Some(id));
                }
            }
        }
        out.lines.push(Line::default());
    }

    if view.thinking {
        out.lines.push(role_header(Role::Assistant, theme));
        out.lines.push(Line::from(vec![
            Span::raw(INDENT),
            Span::styled(
                thinking_text(spinner_frame),
                Style::default()
                    .fg(theme.text)
                    .add_modifier(Modifier::ITALIC | Modifier::DIM),
            ),
        ]));
    }

    out
}

fn role_header(role: Role, theme: &Theme) -> Line<'static> {
    let chip = match role {
        Role::User => theme.primary,
        Role::Assistant => theme.secondary,
    };
    Line::from(Span::styled(
        format!(" {} ", role.label()),
        Style::default()
            .fg(theme.text)
            .bg(chip)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Text runs; newlines that only separate text from an adjacent code block
/// are dropped since the block starts on its own line anyway.
fn push_text(
    lines: &mut Vec<Line<'static>>,
    text: &TextBlock,
    theme: &Theme,
    width: usize,
    trim_start: bool,
    trim_end: bool,
) {
    let mut spans: Vec<Span<'static>> = text
        .runs
        .iter()
        .map(|run| {
            let mut style = Style::default().fg(theme.text);
            if run.emphasized {
                style = style.add_modifier(Modifier::BOLD);
            }
            Span::styled(run.text.clone(), style)
        })
        .collect();

    if trim_start && let Some(first) = spans.first_mut() {
        let trimmed = first.content.trim_start_matches('\n').to_string();
        first.content = trimmed.into();
    }
    if trim_end && let Some(last) = spans.last_mut() {
        let trimmed = last.content.trim_end_matches('\n').to_string();
        last.content = trimmed.into();
    }
    if spans.iter().all(|span| span.content.is_empty()) {
        return;
    }

    let opts = WrapOptions::new(width).with_prefix(vec![Span::raw(INDENT)]);
    lines.extend(wrap_spans(&spans, &opts));
}

fn push_code(
    lines: &mut Vec<Line<'static>>,
    code: &CodeBlockUnit,
    theme: &Theme,
    width: usize,
    focused: bool,
) {
    let (label, label_style) = match code.copy_state {
        CopyState::Copied => (
            "[copied]",
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ),
        CopyState::Idle if focused => (
            "[copy]",
            Style::default()
                .fg(theme.text)
                .bg(theme.accent_hover)
                .add_modifier(Modifier::BOLD),
        ),
        CopyState::Idle => ("[copy]", Style::default().fg(theme.border)),
    };
    let mut language_style = Style::default().fg(theme.accent).add_modifier(Modifier::BOLD);
    if focused {
        language_style = language_style.add_modifier(Modifier::UNDERLINED);
    }
    lines.push(Line::from(vec![
        Span::raw(INDENT),
        Span::styled(code.language.clone(), language_style),
        Span::raw(" "),
        Span::styled(label, label_style),
    ]));

    let gutter = code.gutter_width();
    let gutter_style = Style::default().fg(theme.border).bg(theme.input);
    let continuation = vec![
        Span::raw(INDENT),
        Span::styled(format!("{} │ ", " ".repeat(gutter)), gutter_style),
    ];
    for numbered in &code.numbered_lines {
        let spans: Vec<Span<'static>> = numbered
            .markup
            .spans
            .iter()
            .map(|span| {
                let fg = span.color.map_or(theme.text, rgb);
                Span::styled(span.text.clone(), Style::default().fg(fg).bg(theme.input))
            })
            .collect();
        let opts = WrapOptions {
            width,
            first_prefix: vec![
                Span::raw(INDENT),
                Span::styled(format!("{:>gutter$} │ ", numbered.number), gutter_style),
            ],
            rest_prefix: continuation.clone(),
        };
        lines.extend(wrap_spans(&spans, &opts));
    }
}
