//! Terminal backend: raw-mode RAII guard, a crossterm line editor, and
//! single-key reads for the pager and menus.
//!
//! The REPL stays on the normal screen (listings scroll into the terminal's
//! history); raw mode is entered only while a line or a single key is being
//! read, and always restored by a guard so an early return or panic cannot
//! leave the terminal unusable.

use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use unicode_width::UnicodeWidthChar;

pub mod editor;

pub use editor::{LineEditor, ReadOutcome};

/// RAII guard: raw mode is left on drop even if the caller early-returns.
pub struct RawGuard {
    active: bool,
}

impl RawGuard {
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self { active: true })
    }

    pub fn leave(&mut self) -> io::Result<()> {
        if self.active {
            disable_raw_mode()?;
            self.active = false;
        }
        Ok(())
    }
}

impl Drop for RawGuard {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

/// Keys the pager and menu prompts care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Down,
    PageDown,
    Esc,
    Char(char),
    Other,
}

/// Block for one key press in raw mode.
pub fn read_single_key() -> io::Result<Key> {
    let _guard = RawGuard::enter()?;
    loop {
        match event::read()? {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                modifiers,
                ..
            }) => {
                if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
                    return Ok(Key::Esc);
                }
                return Ok(match code {
                    KeyCode::Enter => Key::Enter,
                    KeyCode::Char(' ') => Key::Space,
                    KeyCode::Down => Key::Down,
                    KeyCode::PageDown => Key::PageDown,
                    KeyCode::Esc => Key::Esc,
                    KeyCode::Char(c) => Key::Char(c),
                    _ => Key::Other,
                });
            }
            _ => continue,
        }
    }
}

/// Terminal size with a conventional fallback when the probe fails.
pub fn term_size() -> (usize, usize) {
    match terminal::size() {
        Ok((cols, rows)) => (cols as usize, rows as usize),
        Err(_) => (80, 24),
    }
}

pub fn set_title(title: &str) {
    let _ = execute!(io::stdout(), terminal::SetTitle(title));
}

/// Display width of a string, skipping ANSI SGR sequences.
pub fn ansi_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;
    for c in s.chars() {
        if in_escape {
            if c.is_ascii_alphabetic() {
                in_escape = false;
            }
            continue;
        }
        if c == '\x1b' {
            in_escape = true;
            continue;
        }
        width += c.width().unwrap_or(0);
    }
    width
}

pub fn flush() {
    let _ = io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi_width_skips_sgr() {
        assert_eq!(ansi_width("abc"), 3);
        assert_eq!(ansi_width("\x1b[1;34mabc\x1b[0m"), 3);
        assert_eq!(ansi_width("\x1b[0m"), 0);
    }

    #[test]
    fn ansi_width_counts_wide_chars() {
        assert_eq!(ansi_width("日本"), 4);
        assert_eq!(ansi_width("\x1b[32m日\x1b[0m本"), 4);
    }
}
