//! Clipboard writes for the copy action.
//!
//! Two transports:
//! - System clipboard via `arboard`, tried first in a local GUI session
//! - OSC 52 escape sequence (terminal-side clipboard), tried first over SSH
//!   or without a display
//!
//! OSC 52 cannot report whether the terminal honoured the sequence, so a
//! successful write counts as a successful copy.

use std::cell::RefCell;
use std::fmt;
use std::io::Write;

use base64::Engine;

/// Which transport accepted the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Osc52,
    System,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Osc52 => write!(f, "osc52"),
            Transport::System => write!(f, "system"),
        }
    }
}

/// Clipboard operation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// OSC 52 write failed.
    Osc52(String),
    /// System clipboard operation failed.
    System(String),
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::Osc52(msg) => write!(f, "OSC 52 clipboard failed: {msg}"),
            ClipboardError::System(msg) => write!(f, "System clipboard failed: {msg}"),
        }
    }
}

impl std::error::Error for ClipboardError {}

/// Writes `text` to the clipboard.
///
/// Returns the transport that succeeded, or the error of the second
/// transport when both fail.
pub fn copy(text: &str) -> Result<Transport, ClipboardError> {
    let [first, second] = transport_order(|key| std::env::var(key).ok());
    match write_with(first, text) {
        Ok(()) => Ok(first),
        Err(err) => {
            tracing::debug!(error = %err, fallback = %second, "clipboard transport failed");
            write_with(second, text).map(|()| second)
        }
    }
}

fn write_with(transport: Transport, text: &str) -> Result<(), ClipboardError> {
    match transport {
        Transport::Osc52 => copy_osc52(text),
        Transport::System => copy_system(text),
    }
}

/// Picks the transport order from the environment seen through `var`.
fn transport_order(var: impl Fn(&str) -> Option<String>) -> [Transport; 2] {
    let set = |key: &str| var(key).is_some_and(|value| !value.trim().is_empty());
    let remote = set("SSH_TTY") || set("SSH_CONNECTION");
    let display = !cfg!(any(
        target_os = "linux",
        target_os = "freebsd",
        target_os = "dragonfly",
        target_os = "netbsd",
        target_os = "openbsd",
    )) || set("DISPLAY")
        || set("WAYLAND_DISPLAY");

    if display && !remote {
        [Transport::System, Transport::Osc52]
    } else {
        [Transport::Osc52, Transport::System]
    }
}

/// OSC 52 payload: `ESC ] 52 ; c ; <base64> ESC \`.
pub fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text);
    format!("\x1b]52;c;{encoded}\x1b\\")
}

fn copy_osc52(text: &str) -> Result<(), ClipboardError> {
    let mut stdout = std::io::stdout();
    stdout
        .write_all(osc52_sequence(text).as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| ClipboardError::Osc52(e.to_string()))
}

thread_local! {
    /// Kept alive after a copy; on X11 and Wayland the copied text is served
    /// by this handle.
    static SYSTEM: RefCell<Option<arboard::Clipboard>> = const { RefCell::new(None) };
}

fn copy_system(text: &str) -> Result<(), ClipboardError> {
    SYSTEM.with_borrow_mut(|slot| {
        if slot.is_none() {
            *slot =
                Some(arboard::Clipboard::new().map_err(|e| ClipboardError::System(e.to_string()))?);
        }
        let Some(clipboard) = slot.as_mut() else {
            return Err(ClipboardError::System("clipboard unavailable".to_string()));
        };
        clipboard
            .set_text(text)
            .map_err(|e| ClipboardError::System(e.to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osc52_sequence() {
        assert_eq!(osc52_sequence("hi"), "\x1b]52;c;aGk=\x1b\\");
    }

    #[test]
    fn test_osc52_keeps_newlines_inside_payload() {
        let sequence = osc52_sequence("a\nb");
        assert!(!sequence.contains('\n'));
        assert_eq!(sequence, "\x1b]52;c;YQpi\x1b\\");
    }

    fn env(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let pairs = pairs.to_vec();
        move |key| {
            pairs
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value).to_string())
        }
    }

    #[test]
    fn test_ssh_session_prefers_osc52() {
        let order = transport_order(env(&[("SSH_TTY", "/dev/pts/1"), ("DISPLAY", ":0")]));
        assert_eq!(order, [Transport::Osc52, Transport::System]);
    }

    #[test]
    fn test_local_display_prefers_system_clipboard() {
        let order = transport_order(env(&[("WAYLAND_DISPLAY", "wayland-0")]));
        assert_eq!(order, [Transport::System, Transport::Osc52]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_headless_linux_prefers_osc52() {
        let order = transport_order(env(&[("DISPLAY", "  ")]));
        assert_eq!(order, [Transport::Osc52, Transport::System]);
    }
}
