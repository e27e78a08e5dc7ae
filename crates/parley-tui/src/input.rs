//! Message input buffer.
//!
//! Single string with a char-indexed cursor. Multi-line entry is done by
//! inserting `\n` (Ctrl+J); Enter submits and is handled by the reducer.

use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    text: String,
    /// Cursor position in chars.
    cursor: usize,
}

impl InputState {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, ch: char) {
        let index = self.byte_index();
        self.text.insert(index, ch);
        self.cursor += 1;
    }

    /// Inserts pasted text, normalizing `\r\n` and lone `\r` to `\n`.
    pub fn insert_str(&mut self, text: &str) {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let index = self.byte_index();
        self.text.insert_str(index, &normalized);
        self.cursor += normalized.chars().count();
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let index = self.byte_index();
        self.text.remove(index);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let index = self.byte_index();
            self.text.remove(index);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    /// Moves to the start of the current line.
    pub fn move_line_start(&mut self) {
        let before: String = self.text.chars().take(self.cursor).collect();
        let line_start = before.rfind('\n').map_or(0, |index| before[..=index].chars().count());
        self.cursor = line_start;
    }

    /// Moves to the end of the current line.
    pub fn move_line_end(&mut self) {
        let rest = &self.text[self.byte_index()..];
        let to_end = rest.find('\n').unwrap_or(rest.len());
        self.cursor += rest[..to_end].chars().count();
    }

    /// Display lines of the buffer (at least one).
    pub fn lines(&self) -> Vec<&str> {
        self.text.split('\n').collect()
    }

    /// Cursor as (row, display column).
    pub fn cursor_position(&self) -> (usize, usize) {
        let before = &self.text[..self.byte_index()];
        let row = before.matches('\n').count();
        let line = before.rsplit('\n').next().unwrap_or("");
        (row, line.width())
    }

    fn byte_index(&self) -> usize {
        self.text
            .char_indices()
            .nth(self.cursor)
            .map_or(self.text.len(), |(index, _)| index)
    }
}
