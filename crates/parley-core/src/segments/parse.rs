use std::fmt;

use tracing::warn;

use super::{CodeSegment, Segment, TextSegment, split_emphasis};

/// Code fence marker.
const FENCE: &str = "```";

/// Parses a turn's content into ordered segments.
///
/// - Fenced regions (` ```lang\n ... ``` `) become `Segment::Code`
/// - Everything else becomes `Segment::Text` with bold spans resolved
/// - An opening fence without a closing fence stays plain text
///
/// Never fails: on an internal scanner fault the whole input is returned
/// as one plain segment.
pub fn parse(text: &str) -> Vec<Segment> {
    if text.is_empty() {
        return vec![Segment::plain("")];
    }

    or_plain(text, scan(text))
}

fn or_plain(text: &str, scanned: Result<Vec<Segment>, ScanError>) -> Vec<Segment> {
    match scanned {
        Ok(segments) => segments,
        Err(err) => {
            warn!(error = %err, len = text.len(), "segment scan failed, using plain text");
            vec![Segment::plain(text)]
        }
    }
}

/// Internal scanner fault (an offset that is not a char boundary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScanError {
    offset: usize,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid scan offset {}", self.offset)
    }
}

impl std::error::Error for ScanError {}

/// A complete fence pair found in the input.
struct Fence<'a> {
    language: &'a str,
    body: &'a str,
    /// Byte offset just past the closing fence.
    end: usize,
}

fn scan(text: &str) -> Result<Vec<Segment>, ScanError> {
    let mut segments = Vec::new();
    let mut run_start = 0;
    let mut cursor = 0;

    while let Some(start) = find_from(text, cursor, FENCE)? {
        match match_fence(text, start)? {
            Some(fence) => {
                push_plain(&mut segments, slice(text, run_start, start)?);
                segments.push(Segment::Code(CodeSegment::new(fence.language, fence.body)));
                run_start = fence.end;
                cursor = fence.end;
            }
            // Not an opening fence here; retry one byte later (fence chars are ASCII).
            None => cursor = start + 1,
        }
    }

    push_plain(&mut segments, slice(text, run_start, text.len())?);
    Ok(segments)
}

/// Tries to match a complete fenced block whose opening marker is at `start`.
///
/// The opening line is the marker, an optional tag with no whitespace or
/// backticks, and a line break. The body runs up to the next marker.
fn match_fence(text: &str, start: usize) -> Result<Option<Fence<'_>>, ScanError> {
    let tag_start = start + FENCE.len();
    let after_marker = slice(text, tag_start, text.len())?;
    let tag_len = after_marker
        .find(|c: char| c.is_whitespace() || c == '`')
        .unwrap_or(after_marker.len());
    let language = slice(text, tag_start, tag_start + tag_len)?;

    let rest = slice(text, tag_start + tag_len, text.len())?;
    let newline_len = if rest.starts_with("\r\n") {
        2
    } else if rest.starts_with('\n') {
        1
    } else {
        return Ok(None);
    };

    let body_start = tag_start + tag_len + newline_len;
    let Some(close) = find_from(text, body_start, FENCE)? else {
        return Ok(None);
    };

    Ok(Some(Fence {
        language,
        body: slice(text, body_start, close)?,
        end: close + FENCE.len(),
    }))
}

fn push_plain(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    segments.push(Segment::Text(TextSegment {
        runs: split_emphasis(text),
    }));
}

fn find_from(text: &str, from: usize, pattern: &str) -> Result<Option<usize>, ScanError> {
    Ok(slice(text, from, text.len())?
        .find(pattern)
        .map(|index| index + from))
}

fn slice(text: &str, start: usize, end: usize) -> Result<&str, ScanError> {
    text.get(start..end).ok_or(ScanError { offset: start })
}
