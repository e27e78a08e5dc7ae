//! Styled word wrapping.
//!
//! Wraps ratatui spans to a display width while keeping each fragment's
//! style. Breaks at whitespace when possible and by character otherwise.
//! Embedded `\n` characters are hard breaks.

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Options for wrapping styled spans with hanging indents.
#[derive(Debug, Clone, Default)]
pub struct WrapOptions {
    /// Maximum display width for lines.
    pub width: usize,
    /// Prefix spans for the first line (e.g., a line-number gutter).
    pub first_prefix: Vec<Span<'static>>,
    /// Prefix spans for continuation lines (e.g., blank gutter).
    pub rest_prefix: Vec<Span<'static>>,
}

impl WrapOptions {
    /// Creates wrap options with just a width (no prefixes).
    pub fn new(width: usize) -> Self {
        Self {
            width,
            ..Default::default()
        }
    }

    /// Uses the same prefix on every line.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Vec<Span<'static>>) -> Self {
        self.first_prefix.clone_from(&prefix);
        self.rest_prefix = prefix;
        self
    }
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|s| s.content.width()).sum()
}

struct WrapContext<'a> {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    current_width: usize,
    is_first_line: bool,
    first_width: usize,
    rest_width: usize,
    opts: &'a WrapOptions,
}

impl<'a> WrapContext<'a> {
    fn new(opts: &'a WrapOptions) -> Self {
        Self {
            lines: Vec::new(),
            current: Vec::new(),
            current_width: 0,
            is_first_line: true,
            first_width: opts.width.saturating_sub(spans_width(&opts.first_prefix)).max(1),
            rest_width: opts.width.saturating_sub(spans_width(&opts.rest_prefix)).max(1),
            opts,
        }
    }

    fn available(&self) -> usize {
        if self.is_first_line {
            self.first_width
        } else {
            self.rest_width
        }
    }

    fn flush_line(&mut self) {
        let prefix = if self.is_first_line {
            &self.opts.first_prefix
        } else {
            &self.opts.rest_prefix
        };
        let mut spans = prefix.clone();
        spans.append(&mut self.current);
        self.lines.push(Line::from(spans));
        self.current_width = 0;
        self.is_first_line = false;
    }

    /// Ends the line at a wrap point, dropping trailing whitespace.
    fn soft_break(&mut self) {
        while let Some(last) = self.current.last_mut() {
            let trimmed = last.content.trim_end().len();
            let removed = last.content[trimmed..].width();
            last.content.to_mut().truncate(trimmed);
            self.current_width -= removed;
            if !last.content.is_empty() {
                break;
            }
            self.current.pop();
        }
        self.flush_line();
    }

    /// Appends text to the current line, merging with a same-styled tail.
    fn push(&mut self, text: &str, style: Style) {
        self.current_width += text.width();
        if let Some(last) = self.current.last_mut()
            && last.style == style
        {
            last.content.to_mut().push_str(text);
            return;
        }
        self.current.push(Span::styled(text.to_string(), style));
    }

    fn place_token(&mut self, token: &str, style: Style) {
        let width = token.width();
        if self.current_width + width <= self.available() {
            self.push(token, style);
        } else if token.chars().all(char::is_whitespace) {
            // Whitespace at a wrap point is dropped.
            if self.current_width > 0 {
                self.soft_break();
            }
        } else if width <= self.rest_width && self.current_width > 0 {
            self.soft_break();
            self.push(token, style);
        } else {
            self.place_by_char(token, style);
        }
    }

    fn place_by_char(&mut self, token: &str, style: Style) {
        let mut buf = [0u8; 4];
        for ch in token.chars() {
            let width = ch.width().unwrap_or(0);
            if width > 0 && self.current_width + width > self.available() && self.current_width > 0
            {
                self.soft_break();
            }
            self.push(ch.encode_utf8(&mut buf), style);
        }
    }
}

/// Splits text into alternating whitespace / non-whitespace tokens.
fn tokens(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let is_space = first.is_whitespace();
        let end = rest
            .char_indices()
            .find(|(_, c)| c.is_whitespace() != is_space)
            .map_or(rest.len(), |(index, _)| index);
        let (token, tail) = rest.split_at(end);
        rest = tail;
        Some(token)
    })
}

/// Wraps styled spans while preserving styles across line breaks.
pub fn wrap_spans(spans: &[Span<'static>], opts: &WrapOptions) -> Vec<Line<'static>> {
    if opts.width == 0 {
        let mut all = opts.first_prefix.clone();
        all.extend(spans.iter().cloned());
        return vec![Line::from(all)];
    }

    let mut ctx = WrapContext::new(opts);
    for span in spans {
        for (index, part) in span.content.split('\n').enumerate() {
            if index > 0 {
                ctx.flush_line();
            }
            for token in tokens(part) {
                ctx.place_token(token, span.style);
            }
        }
    }

    if !ctx.current.is_empty() || ctx.lines.is_empty() {
        ctx.flush_line();
    }
    ctx.lines
}

#[cfg(test)]
mod tests {
    use ratatui::style::{Color, Modifier};

    use super::*;

    fn texts(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_wraps_at_word_boundaries() {
        let spans = vec![Span::raw("the quick brown fox")];
        let lines = wrap_spans(&spans, &WrapOptions::new(10));
        assert_eq!(texts(&lines), vec!["the quick", "brown fox"]);
    }

    #[test]
    fn test_breaks_long_words_by_char() {
        let spans = vec![Span::raw("abcdefghij")];
        let lines = wrap_spans(&spans, &WrapOptions::new(4));
        assert_eq!(texts(&lines), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_hard_breaks_keep_empty_lines() {
        let spans = vec![Span::raw("a\n\nb")];
        let lines = wrap_spans(&spans, &WrapOptions::new(20));
        assert_eq!(texts(&lines), vec!["a", "", "b"]);
    }

    #[test]
    fn test_prefixes_apply_per_line() {
        let spans = vec![Span::raw("one two three")];
        let opts = WrapOptions {
            width: 9,
            first_prefix: vec![Span::raw("1 | ")],
            rest_prefix: vec![Span::raw("  | ")],
        };
        let lines = wrap_spans(&spans, &opts);
        assert_eq!(texts(&lines), vec!["1 | one", "  | two", "  | three"]);
    }

    #[test]
    fn test_styles_survive_wrapping() {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let green = Style::default().fg(Color::Green);
        let spans = vec![Span::styled("hello ", bold), Span::styled("world again", green)];
        let lines = wrap_spans(&spans, &WrapOptions::new(11));

        assert_eq!(texts(&lines), vec!["hello world", "again"]);
        assert_eq!(lines[0].spans[0].style, bold);
        assert_eq!(lines[0].spans[1].style, green);
        assert_eq!(lines[1].spans[0].style, green);
    }

    #[test]
    fn test_wide_chars_count_double() {
        let spans = vec![Span::raw("日本語です")];
        let lines = wrap_spans(&spans, &WrapOptions::new(4));
        assert_eq!(texts(&lines), vec!["日本", "語で", "す"]);
    }

    #[test]
    fn test_leading_indent_is_kept() {
        let spans = vec![Span::raw("    return x")];
        let lines = wrap_spans(&spans, &WrapOptions::new(40));
        assert_eq!(texts(&lines), vec!["    return x"]);
    }

    #[test]
    fn test_empty_input_yields_prefix_line() {
        let opts = WrapOptions::new(10).with_prefix(vec![Span::raw("> ")]);
        let lines = wrap_spans(&[], &opts);
        assert_eq!(texts(&lines), vec!["> "]);
    }
}
