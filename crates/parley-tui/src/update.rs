//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use parley_core::session::Resolution;
use ratatui::layout::Rect;
use tracing::debug;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::render;
use crate::state::{AppState, Viewport};

/// Lines per mouse wheel notch.
const WHEEL_LINES: usize = 3;

/// The main reducer function.
///
/// Takes the current state and an event, mutates state, and returns effects
/// for the runtime to execute.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            let expired = app.copies.expire();
            if !expired.is_empty() {
                debug!(count = expired.len(), "copy feedback expired");
            }
            vec![]
        }
        UiEvent::Frame { width, height } => {
            app.viewport = Viewport { width, height };
            vec![]
        }
        UiEvent::Terminal(event) => handle_terminal_event(app, event),
        UiEvent::ReplyReceived { id, result } => {
            match app.session.resolve(id, result) {
                Resolution::Stale => debug!(exchange_id = %id, "ignoring stale reply"),
                Resolution::Replied | Resolution::Failed { .. } => {
                    app.sync_transcript();
                    app.transcript.follow_tail();
                }
            }
            vec![]
        }
        UiEvent::CopyFinished { block, result } => {
            match result {
                Ok(transport) => {
                    debug!(turn = block.turn, ordinal = block.ordinal, %transport, "copied code block");
                    app.copies.mark_copied(block);
                }
                Err(err) => debug!(error = %err, "copy failed"),
            }
            vec![]
        }
    }
}

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
        Event::Paste(text) => {
            if !app.session.is_pending() {
                app.input.insert_str(&text);
            }
            vec![]
        }
        Event::Mouse(mouse) => {
            match mouse.kind {
                MouseEventKind::ScrollUp => scroll_up(app, WHEEL_LINES),
                MouseEventKind::ScrollDown => scroll_down(app, WHEEL_LINES),
                _ => {}
            }
            vec![]
        }
        _ => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    match key.code {
        KeyCode::Char('c') if ctrl => {
            app.should_quit = true;
            return vec![UiEffect::Quit];
        }
        KeyCode::Char('d') if ctrl && app.input.is_empty() => {
            app.should_quit = true;
            return vec![UiEffect::Quit];
        }
        KeyCode::Char('y') if ctrl => return copy_target(app),
        KeyCode::Char('y')
            if !ctrl && !alt && app.input.is_empty() && app.transcript.focus.is_some() =>
        {
            return copy_target(app);
        }
        KeyCode::Tab => {
            app.transcript.focus_next();
            reveal_focus(app);
            return vec![];
        }
        KeyCode::BackTab => {
            app.transcript.focus_prev();
            reveal_focus(app);
            return vec![];
        }
        KeyCode::Esc => {
            app.transcript.focus = None;
            return vec![];
        }
        KeyCode::PageUp => {
            scroll_up(app, page_size(app));
            return vec![];
        }
        KeyCode::PageDown => {
            scroll_down(app, page_size(app));
            return vec![];
        }
        KeyCode::End if ctrl || app.input.is_empty() => {
            app.transcript.follow_tail();
            return vec![];
        }
        _ => {}
    }

    // Everything below edits the input, which is locked while a reply is pending.
    if app.session.is_pending() {
        return vec![];
    }

    match key.code {
        KeyCode::Enter if shift || alt => app.input.insert_char('\n'),
        KeyCode::Char('j') if ctrl => app.input.insert_char('\n'),
        KeyCode::Enter => return submit(app),
        KeyCode::Char('a') if ctrl => app.input.move_line_start(),
        KeyCode::Char('e') if ctrl => app.input.move_line_end(),
        KeyCode::Char('u') if ctrl => app.input.clear(),
        KeyCode::Char(ch) if !ctrl && !alt => app.input.insert_char(ch),
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Delete => app.input.delete(),
        KeyCode::Left => app.input.move_left(),
        KeyCode::Right => app.input.move_right(),
        KeyCode::Home => app.input.move_line_start(),
        KeyCode::End => app.input.move_line_end(),
        _ => {}
    }
    vec![]
}

fn submit(app: &mut AppState) -> Vec<UiEffect> {
    match app.session.submit(app.input.text()) {
        Ok(exchange) => {
            app.input.clear();
            app.sync_transcript();
            app.transcript.follow_tail();
            vec![UiEffect::SendMessage { exchange }]
        }
        Err(reason) => {
            debug!(%reason, "submit ignored");
            vec![]
        }
    }
}

fn copy_target(app: &AppState) -> Vec<UiEffect> {
    let Some(block) = app.transcript.copy_target() else {
        return vec![];
    };
    let Some(code) = app.transcript.block(block) else {
        return vec![];
    };
    vec![UiEffect::CopyToClipboard {
        block,
        text: code.source.clone(),
    }]
}

// ============================================================================
// Scrolling
// ============================================================================

fn transcript_area(app: &AppState) -> Rect {
    let area = Rect::new(0, 0, app.viewport.width, app.viewport.height);
    render::layout(app, area).transcript_inner()
}

fn page_size(app: &AppState) -> usize {
    usize::from(transcript_area(app).height.saturating_sub(1)).max(1)
}

/// Largest useful scroll-back for the current geometry.
fn max_scroll_back(app: &AppState) -> usize {
    let inner = transcript_area(app);
    let total = render::transcript_lines(app, inner.width).lines.len();
    total.saturating_sub(usize::from(inner.height))
}

fn scroll_up(app: &mut AppState, lines: usize) {
    let max = max_scroll_back(app);
    app.transcript.scroll_back = (app.transcript.scroll_back + lines).min(max);
}

fn scroll_down(app: &mut AppState, lines: usize) {
    app.transcript.scroll_back = app.transcript.scroll_back.saturating_sub(lines);
}

/// Scrolls so the focused block header is visible.
fn reveal_focus(app: &mut AppState) {
    let Some(focus) = app.transcript.focus else {
        return;
    };
    let inner = transcript_area(app);
    let height = usize::from(inner.height);
    let out = render::transcript_lines(app, inner.width);
    let Some(row) = out.row_of(focus) else {
        return;
    };

    let total = out.lines.len();
    let max = total.saturating_sub(height);
    let offset = render::scroll_offset(total, height, app.transcript.scroll_back);
    if row < offset || row >= offset + height {
        let target_offset = row.min(max);
        app.transcript.scroll_back = max - target_offset;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crossterm::event::{KeyEventState, MouseEvent};
    use parley_core::config::Config;
    use parley_core::copy::{BlockId, CopyState};
    use parley_core::highlight::PlainHighlighter;
    use parley_core::responder::{ResponderError, ResponderReply};

    use super::*;
    use crate::clipboard::{ClipboardError, Transport};

    fn app() -> AppState {
        let mut app = AppState::new(
            &Config::default(),
            Arc::new(PlainHighlighter),
            "test".to_string(),
        );
        update(&mut app, UiEvent::Frame { width: 60, height: 20 });
        app
    }

    fn key(code: KeyCode) -> UiEvent {
        key_with(code, KeyModifiers::NONE)
    }

    fn key_with(code: KeyCode, modifiers: KeyModifiers) -> UiEvent {
        UiEvent::Terminal(Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }))
    }

    fn type_text(app: &mut AppState, text: &str) {
        for ch in text.chars() {
            update(app, key(KeyCode::Char(ch)));
        }
    }

    fn send(app: &mut AppState, text: &str) -> parley_core::session::Exchange {
        type_text(app, text);
        let mut effects = update(app, key(KeyCode::Enter));
        match effects.pop() {
            Some(UiEffect::SendMessage { exchange }) => exchange,
            other => panic!("expected SendMessage, got {other:?}"),
        }
    }

    fn reply(app: &mut AppState, text: &str) {
        let exchange = send(app, "question");
        update(
            app,
            UiEvent::ReplyReceived {
                id: exchange.id,
                result: Ok(ResponderReply::new(text, "s1")),
            },
        );
    }

    #[test]
    fn test_enter_submits_and_clears_input() {
        let mut app = app();
        let exchange = send(&mut app, "hi");

        assert_eq!(exchange.request.message, "hi");
        assert!(app.input.is_empty());
        assert!(app.session.is_pending());
        assert_eq!(app.session.transcript().len(), 1);
        assert_eq!(app.transcript.units(0).len(), 1);
    }

    #[test]
    fn test_blank_enter_is_ignored() {
        let mut app = app();
        type_text(&mut app, "   ");
        assert!(update(&mut app, key(KeyCode::Enter)).is_empty());
        assert_eq!(app.input.text(), "   ");
        assert!(app.session.transcript().is_empty());
    }

    #[test]
    fn test_input_is_locked_while_pending() {
        let mut app = app();
        send(&mut app, "hi");
        type_text(&mut app, "more");
        assert!(app.input.is_empty());
        assert!(update(&mut app, key(KeyCode::Enter)).is_empty());

        update(
            &mut app,
            UiEvent::Terminal(Event::Paste("pasted".to_string())),
        );
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_ctrl_j_inserts_newline() {
        let mut app = app();
        type_text(&mut app, "a");
        update(&mut app, key_with(KeyCode::Char('j'), KeyModifiers::CONTROL));
        type_text(&mut app, "b");
        assert_eq!(app.input.text(), "a\nb");
    }

    #[test]
    fn test_reply_resolves_and_follows_tail() {
        let mut app = app();
        let exchange = send(&mut app, "hi");
        app.transcript.scroll_back = 5;

        update(
            &mut app,
            UiEvent::ReplyReceived {
                id: exchange.id,
                result: Ok(ResponderReply::new("hello", "s1")),
            },
        );

        assert!(!app.session.is_pending());
        assert_eq!(app.session.continuation_token(), Some("s1"));
        assert_eq!(app.session.transcript().len(), 2);
        assert_eq!(app.transcript.units(1).len(), 1);
        assert_eq!(app.transcript.scroll_back, 0);
    }

    #[test]
    fn test_failed_reply_sets_banner_and_fallback() {
        let mut app = app();
        let exchange = send(&mut app, "hi");
        update(
            &mut app,
            UiEvent::ReplyReceived {
                id: exchange.id,
                result: Err(ResponderError::timeout("timeout of 500000ms exceeded")),
            },
        );

        assert_eq!(
            app.session.last_error(),
            Some("Error: timeout of 500000ms exceeded")
        );
        assert_eq!(app.session.transcript().len(), 2);
        assert_eq!(app.transcript.units(1).len(), 1);
    }

    #[test]
    fn test_ctrl_y_copies_newest_block_source() {
        let mut app = app();
        reply(&mut app, "```python\nprint(1)\n```");

        let effects = update(&mut app, key_with(KeyCode::Char('y'), KeyModifiers::CONTROL));
        assert_eq!(
            effects,
            vec![UiEffect::CopyToClipboard {
                block: BlockId::new(1, 0),
                text: "print(1)".to_string(),
            }]
        );
    }

    #[test]
    fn test_plain_y_types_unless_block_is_focused() {
        let mut app = app();
        reply(&mut app, "```c\nint x;\n```");

        assert!(update(&mut app, key(KeyCode::Char('y'))).is_empty());
        assert_eq!(app.input.text(), "y");
        app.input.clear();

        update(&mut app, key(KeyCode::Tab));
        assert_eq!(app.transcript.focus, Some(BlockId::new(1, 0)));
        let effects = update(&mut app, key(KeyCode::Char('y')));
        assert_eq!(effects.len(), 1);
        assert!(app.input.is_empty());

        update(&mut app, key(KeyCode::Esc));
        assert_eq!(app.transcript.focus, None);
    }

    #[test]
    fn test_copy_with_no_blocks_does_nothing() {
        let mut app = app();
        reply(&mut app, "no code here");
        assert!(update(&mut app, key_with(KeyCode::Char('y'), KeyModifiers::CONTROL)).is_empty());
    }

    #[test]
    fn test_copy_finished_drives_feedback() {
        let mut app = app();
        reply(&mut app, "```c\na\n```");
        let block = BlockId::new(1, 0);

        update(
            &mut app,
            UiEvent::CopyFinished {
                block,
                result: Err(ClipboardError::System("no display".to_string())),
            },
        );
        assert_eq!(app.copies.state(block), CopyState::Idle);

        update(
            &mut app,
            UiEvent::CopyFinished {
                block,
                result: Ok(Transport::Osc52),
            },
        );
        assert_eq!(app.copies.state(block), CopyState::Copied);

        update(&mut app, UiEvent::Tick);
        assert_eq!(app.copies.state(block), CopyState::Copied);
    }

    #[test]
    fn test_stale_reply_is_ignored() {
        let mut app = app();
        let first = send(&mut app, "one");
        update(
            &mut app,
            UiEvent::ReplyReceived {
                id: first.id,
                result: Ok(ResponderReply::new("a", "s1")),
            },
        );
        update(
            &mut app,
            UiEvent::ReplyReceived {
                id: first.id,
                result: Ok(ResponderReply::new("b", "s2")),
            },
        );
        assert_eq!(app.session.transcript().len(), 2);
        assert_eq!(app.session.continuation_token(), Some("s1"));
    }

    #[test]
    fn test_scrolling_is_clamped() {
        let mut app = app();
        reply(&mut app, &"line\n".repeat(40));

        update(&mut app, key(KeyCode::PageUp));
        let after_page = app.transcript.scroll_back;
        assert!(after_page > 0);

        for _ in 0..20 {
            update(&mut app, key(KeyCode::PageUp));
        }
        let max = app.transcript.scroll_back;
        update(&mut app, key(KeyCode::PageUp));
        assert_eq!(app.transcript.scroll_back, max);

        update(
            &mut app,
            UiEvent::Terminal(Event::Mouse(MouseEvent {
                kind: MouseEventKind::ScrollDown,
                column: 0,
                row: 0,
                modifiers: KeyModifiers::NONE,
            })),
        );
        assert_eq!(app.transcript.scroll_back, max - WHEEL_LINES);

        update(&mut app, key(KeyCode::End));
        assert_eq!(app.transcript.scroll_back, 0);
    }

    #[test]
    fn test_focus_scrolls_block_into_view() {
        let mut app = app();
        reply(&mut app, &format!("```c\nfirst\n```\n{}", "filler\n".repeat(40)));

        update(&mut app, key(KeyCode::Tab));
        assert_eq!(app.transcript.focus, Some(BlockId::new(1, 0)));
        assert!(app.transcript.scroll_back > 0);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = app();
        let effects = update(&mut app, key_with(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(effects, vec![UiEffect::Quit]);
        assert!(app.should_quit);
    }
}
