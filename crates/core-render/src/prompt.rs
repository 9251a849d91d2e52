//! Prompt rendering.
//!
//! The prompt string is a printf-like template: `\u` user, `\h` host, `\w`
//! CWD with home abbreviated to `~`, `\W` CWD basename, `\S` workspace
//! number, `\$` sigil, `\z` last exit status, `\l` read-only flag, `\A`
//! time, `\e` escape, `\[`/`\]` non-printing group markers (stripped here;
//! the line editor measures widths by skipping ANSI itself). Notification
//! sigils (messages, selection, trash) are prepended automatically.

use std::fs;
use std::path::Path;

use chrono::Local;
use core_config::ColorKey;
use core_state::{MsgLevel, Session};

fn username() -> String {
    std::env::var("USER").unwrap_or_else(|_| "user".to_string())
}

fn hostname() -> String {
    if let Ok(h) = fs::read_to_string("/proc/sys/kernel/hostname") {
        return h.trim().to_string();
    }
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

fn abbreviate_home(path: &Path, home: &Path) -> String {
    match path.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => path.display().to_string(),
    }
}

/// Leading sigils: message counts, a selection marker, a trash marker.
fn sigils(session: &Session) -> String {
    let colors = &session.colors;
    let reset = colors.reset();
    let mut out = String::new();
    let errors = session.msgs.count(MsgLevel::Error);
    let warnings = session.msgs.count(MsgLevel::Warning);
    let notices = session.msgs.count(MsgLevel::Notice);
    if errors > 0 {
        out.push_str(&format!("{}E{errors}{reset} ", colors.seq(ColorKey::Warning)));
    }
    if warnings > 0 {
        out.push_str(&format!("{}W{warnings}{reset} ", colors.seq(ColorKey::Warning)));
    }
    if notices > 0 {
        out.push_str(&format!("N{notices} "));
    }
    if !session.selbox.is_empty() {
        out.push_str(&format!(
            "{}*{}{reset} ",
            colors.seq(ColorKey::SelMarker),
            session.selbox.len()
        ));
    }
    if trash_present(session) {
        out.push_str("T ");
    }
    out
}

fn trash_present(session: &Session) -> bool {
    session
        .paths
        .trash_dir
        .join("files")
        .read_dir()
        .map(|mut rd| rd.next().is_some())
        .unwrap_or(false)
}

/// Expand the prompt template against the live session.
pub fn render(session: &Session) -> String {
    let colors = &session.colors;
    let cwd = session.cwd();
    let mut out = sigils(session);
    let template = session.opts.prompt.clone();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('u') => out.push_str(&username()),
            Some('h') => out.push_str(&hostname()),
            Some('w') => out.push_str(&abbreviate_home(cwd, &session.paths.home)),
            Some('W') => out.push_str(
                &cwd.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "/".to_string()),
            ),
            Some('S') => out.push_str(&session.workspaces.current_num().to_string()),
            Some('$') => out.push(if username() == "root" { '#' } else { '$' }),
            Some('z') => {
                if session.last_exit == 0 {
                    out.push_str("0");
                } else {
                    out.push_str(&format!(
                        "{}{}{}",
                        colors.seq(ColorKey::Warning),
                        session.last_exit,
                        colors.reset()
                    ));
                }
            }
            Some('l') => {
                let read_only = fs::metadata(cwd)
                    .map(|m| m.permissions().readonly())
                    .unwrap_or(false);
                if read_only {
                    out.push_str("RO");
                }
            }
            Some('A') => out.push_str(&Local::now().format("%H:%M").to_string()),
            Some('e') => out.push('\x1b'),
            Some('n') => out.push('\n'),
            // Readline-style non-printing markers carry no width info here.
            Some('[') | Some(']') => {}
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    if !colors.enabled {
        strip_ansi(&out)
    } else {
        out
    }
}

/// Title for the terminal window.
pub fn title(session: &Session) -> String {
    format!(
        "clifm: {}",
        abbreviate_home(session.cwd(), &session.paths.home)
    )
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
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
        out.push(c);
    }
    out
}
