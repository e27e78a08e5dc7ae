//! Pure view/render functions for the TUI.
//!
//! Functions here take `&AppState`, draw to a ratatui `Frame`, and never
//! mutate state. `layout()` and `transcript_lines()` are shared with the
//! reducer so scroll math sees the same geometry the user does.

use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Margin, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::state::AppState;
use crate::transcript::{TranscriptLines, TranscriptView, build_lines};

/// Visible input rows before the box scrolls.
const MAX_INPUT_LINES: u16 = 6;

/// Banner rows before the text is cut.
const MAX_BANNER_LINES: u16 = 3;

const HINTS_HEIGHT: u16 = 1;

const HINTS: &str = "Enter send · Ctrl+J newline · Tab focus code · Ctrl+Y copy · PgUp/PgDn scroll · Ctrl+C quit";

const PENDING_TITLE: &str = " waiting for reply… ";
const INPUT_TITLE: &str = " message ";

/// Screen regions for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Areas {
    pub transcript: Rect,
    pub banner: Rect,
    pub input: Rect,
    pub hints: Rect,
}

impl Areas {
    /// Transcript area inside its border.
    pub fn transcript_inner(&self) -> Rect {
        self.transcript.inner(Margin::new(1, 1))
    }
}

pub fn layout(app: &AppState, area: Rect) -> Areas {
    let input_lines = u16::try_from(app.input.lines().len()).unwrap_or(u16::MAX);
    let input_height = input_lines.clamp(1, MAX_INPUT_LINES) + 2;
    let banner_height = app
        .session
        .last_error()
        .map_or(0, |banner| banner_rows(banner, area.width));

    let [transcript, banner, input, hints] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(banner_height),
        Constraint::Length(input_height),
        Constraint::Length(HINTS_HEIGHT),
    ])
    .areas(area);

    Areas {
        transcript,
        banner,
        input,
        hints,
    }
}

fn banner_rows(banner: &str, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = banner
        .split('\n')
        .map(|line| line.width().div_ceil(width).max(1))
        .sum();
    u16::try_from(rows)
        .unwrap_or(MAX_BANNER_LINES)
        .clamp(1, MAX_BANNER_LINES)
}

/// Builds the transcript lines for the given content width.
pub fn transcript_lines(app: &AppState, width: u16) -> TranscriptLines {
    let view = TranscriptView::build(
        app.session.state(),
        &app.transcript,
        &app.copies,
        Instant::now(),
    );
    build_lines(
        &view,
        &app.theme,
        width,
        app.transcript.focus,
        app.spinner_frame,
    )
}

/// First visible row given total rows, viewport height and scroll-back.
pub fn scroll_offset(total: usize, height: usize, scroll_back: usize) -> usize {
    let max_offset = total.saturating_sub(height);
    max_offset - scroll_back.min(max_offset)
}

/// Renders the entire TUI to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(app.theme.background)),
        area,
    );

    let areas = layout(app, area);
    render_transcript(app, frame, &areas);
    if let Some(banner) = app.session.last_error() {
        render_banner(app, frame, areas.banner, banner);
    }
    render_input(app, frame, areas.input);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            HINTS,
            Style::default().fg(app.theme.border),
        ))),
        areas.hints,
    );
}

fn render_transcript(app: &AppState, frame: &mut Frame, areas: &Areas) {
    let inner = areas.transcript_inner();
    let height = usize::from(inner.height);
    let out = transcript_lines(app, inner.width);
    let total = out.lines.len();
    let offset = scroll_offset(total, height, app.transcript.scroll_back);

    let mut visible: Vec<Line<'static>> = out.lines.into_iter().skip(offset).take(height).collect();
    // Bottom-align short transcripts.
    if visible.len() < height {
        let mut padded = vec![Line::default(); height - visible.len()];
        padded.append(&mut visible);
        visible = padded;
    }

    let mut title = format!(" parley · {} ", app.title);
    if offset + height < total {
        title = format!(" parley · {} · ↓ {} more ", app.title, total - offset - height);
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border))
        .title(Span::styled(title, Style::default().fg(app.theme.text)));
    frame.render_widget(Paragraph::new(visible).block(block), areas.transcript);
}

fn render_banner(app: &AppState, frame: &mut Frame, area: Rect, banner: &str) {
    let style = Style::default()
        .fg(app.theme.text)
        .bg(app.theme.error)
        .add_modifier(Modifier::BOLD);
    frame.render_widget(
        Paragraph::new(banner.to_string())
            .style(style)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn render_input(app: &AppState, frame: &mut Frame, area: Rect) {
    let pending = app.session.is_pending();
    let (title, border) = if pending {
        (PENDING_TITLE, app.theme.border)
    } else {
        (INPUT_TITLE, app.theme.accent)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(app.theme.input))
        .title(Span::styled(title, Style::default().fg(app.theme.text)));
    let inner = block.inner(area);

    let (cursor_row, cursor_col) = app.input.cursor_position();
    let visible_rows = usize::from(inner.height.max(1));
    let first_row = (cursor_row + 1).saturating_sub(visible_rows);

    let mut text_style = Style::default().fg(app.theme.text);
    if pending {
        text_style = text_style.add_modifier(Modifier::DIM);
    }
    let lines: Vec<Line<'static>> = app
        .input
        .lines()
        .into_iter()
        .skip(first_row)
        .take(visible_rows)
        .map(|line| Line::from(Span::styled(line.to_string(), text_style)))
        .collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);

    if !pending && inner.width > 0 {
        let col = u16::try_from(cursor_col).unwrap_or(u16::MAX).min(inner.width - 1);
        let row = u16::try_from(cursor_row - first_row).unwrap_or(0);
        frame.set_cursor_position(Position::new(inner.x + col, inner.y + row));
    }
}
