//! A small readline built on crossterm events.
//!
//! Supports the editing keys the REPL needs: cursor movement, backspace and
//! delete, Ctrl-A/E/U/K/W, history navigation with a preserved draft, Ctrl-C
//! to cancel the line, and Ctrl-D on an empty line for EOF. The prompt may
//! contain ANSI sequences and newlines; only its final line is repainted.

use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::trace;
use unicode_width::UnicodeWidthChar;

use crate::{ansi_width, RawGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Ctrl-C: line abandoned, prompt re-entered.
    Interrupted,
    /// Ctrl-D on an empty line.
    Eof,
}

#[derive(Debug, Default)]
pub struct LineEditor {
    history: Vec<String>,
}

struct EditState {
    buf: Vec<char>,
    cursor: usize,
    hist_index: Option<usize>,
    draft: Vec<char>,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn push_history(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        if self.history.last().map(String::as_str) == Some(line) {
            return;
        }
        self.history.push(line.to_string());
    }

    pub fn load_history(&mut self, lines: impl IntoIterator<Item = String>) {
        for line in lines {
            self.push_history(&line);
        }
    }

    /// Read one line. The prompt is printed once; edits repaint only its
    /// final (post-newline) segment.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome> {
        let mut stdout = io::stdout();
        let (head, tail) = match prompt.rfind('\n') {
            Some(i) => (&prompt[..=i], &prompt[i + 1..]),
            None => ("", prompt),
        };
        if !head.is_empty() {
            // Raw mode needs explicit carriage returns.
            write!(stdout, "{}", head.replace('\n', "\r\n"))?;
        }
        write!(stdout, "{tail}")?;
        stdout.flush()?;

        let guard = RawGuard::enter()?;
        let tail_width = ansi_width(tail);
        let mut st = EditState {
            buf: Vec::new(),
            cursor: 0,
            hist_index: None,
            draft: Vec::new(),
        };

        loop {
            let ev = event::read()?;
            let Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) = ev
            else {
                continue;
            };

            if modifiers.contains(KeyModifiers::CONTROL) {
                match code {
                    KeyCode::Char('c') => {
                        drop(guard);
                        println!("^C");
                        return Ok(ReadOutcome::Interrupted);
                    }
                    KeyCode::Char('d') if st.buf.is_empty() => {
                        drop(guard);
                        println!();
                        return Ok(ReadOutcome::Eof);
                    }
                    KeyCode::Char('a') => st.cursor = 0,
                    KeyCode::Char('e') => st.cursor = st.buf.len(),
                    KeyCode::Char('u') => {
                        st.buf.drain(..st.cursor);
                        st.cursor = 0;
                    }
                    KeyCode::Char('k') => {
                        st.buf.truncate(st.cursor);
                    }
                    KeyCode::Char('w') => delete_word(&mut st),
                    KeyCode::Char('l') => {
                        write!(stdout, "\x1b[2J\x1b[H")?;
                        write!(stdout, "{tail}")?;
                    }
                    _ => {}
                }
                repaint(&mut stdout, tail, tail_width, &st)?;
                continue;
            }

            match code {
                KeyCode::Enter => {
                    drop(guard);
                    println!();
                    let line: String = st.buf.iter().collect();
                    trace!(target: "terminal.editor", len = line.len(), "line_read");
                    return Ok(ReadOutcome::Line(line));
                }
                KeyCode::Char(c) => {
                    st.buf.insert(st.cursor, c);
                    st.cursor += 1;
                }
                KeyCode::Backspace => {
                    if st.cursor > 0 {
                        st.cursor -= 1;
                        st.buf.remove(st.cursor);
                    }
                }
                KeyCode::Delete => {
                    if st.cursor < st.buf.len() {
                        st.buf.remove(st.cursor);
                    }
                }
                KeyCode::Left => st.cursor = st.cursor.saturating_sub(1),
                KeyCode::Right => st.cursor = (st.cursor + 1).min(st.buf.len()),
                KeyCode::Home => st.cursor = 0,
                KeyCode::End => st.cursor = st.buf.len(),
                KeyCode::Up => self.hist_prev(&mut st),
                KeyCode::Down => self.hist_next(&mut st),
                KeyCode::Tab => {} // completion is out of scope
                _ => {}
            }
            repaint(&mut stdout, tail, tail_width, &st)?;
        }
    }

    fn hist_prev(&self, st: &mut EditState) {
        if self.history.is_empty() {
            return;
        }
        let next = match st.hist_index {
            None => {
                st.draft = st.buf.clone();
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        st.hist_index = Some(next);
        st.buf = self.history[next].chars().collect();
        st.cursor = st.buf.len();
    }

    fn hist_next(&self, st: &mut EditState) {
        let Some(i) = st.hist_index else {
            return;
        };
        if i + 1 < self.history.len() {
            st.hist_index = Some(i + 1);
            st.buf = self.history[i + 1].chars().collect();
        } else {
            st.hist_index = None;
            st.buf = std::mem::take(&mut st.draft);
        }
        st.cursor = st.buf.len();
    }
}

fn delete_word(st: &mut EditState) {
    let mut i = st.cursor;
    while i > 0 && st.buf[i - 1].is_whitespace() {
        i -= 1;
    }
    while i > 0 && !st.buf[i - 1].is_whitespace() {
        i -= 1;
    }
    st.buf.drain(i..st.cursor);
    st.cursor = i;
}

fn repaint(stdout: &mut impl Write, tail: &str, tail_width: usize, st: &EditState) -> io::Result<()> {
    let line: String = st.buf.iter().collect();
    let cursor_width: usize = st.buf[..st.cursor]
        .iter()
        .map(|c| c.width().unwrap_or(0))
        .sum();
    // Repaint the prompt tail and buffer, then place the cursor.
    write!(stdout, "\r\x1b[K{tail}{line}")?;
    let target = tail_width + cursor_width;
    let end = tail_width
        + st.buf
            .iter()
            .map(|c| c.width().unwrap_or(0))
            .sum::<usize>();
    if end > target {
        write!(stdout, "\x1b[{}D", end - target)?;
    }
    stdout.flush()
}
