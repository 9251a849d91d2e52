//! Long view: one entry per row with a fixed-width properties block.
//!
//! ELN, selection marker, permissions (symbolic or numeric), optional
//! uid/gid, the timestamp selected by the sort key, size (human or bytes),
//! then the name in whatever width remains.

use chrono::{Local, TimeZone};
use core_config::{ColorKey, PermsStyle};
use core_state::{EntryType, FileEntry, Session};
use humansize::{format_size, DECIMAL};

use crate::trim::trim_name;

fn type_char(t: EntryType) -> char {
    match t {
        EntryType::Dir => 'd',
        EntryType::Link | EntryType::BrokenLink => 'l',
        EntryType::Socket => 's',
        EntryType::Fifo => 'p',
        EntryType::BlockDev => 'b',
        EntryType::CharDev => 'c',
        EntryType::Regular => '-',
        EntryType::Unknown => '?',
    }
}

/// `rwxr-xr-x` with the setuid/setgid/sticky substitutions.
pub fn symbolic_perms(t: EntryType, mode: u32) -> String {
    let mut s = String::with_capacity(10);
    s.push(type_char(t));
    let bits = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];
    for (mask, c) in bits {
        s.push(if mode & mask != 0 { c } else { '-' });
    }
    let mut chars: Vec<char> = s.chars().collect();
    if mode & 0o4000 != 0 {
        chars[3] = if mode & 0o100 != 0 { 's' } else { 'S' };
    }
    if mode & 0o2000 != 0 {
        chars[6] = if mode & 0o010 != 0 { 's' } else { 'S' };
    }
    if mode & 0o1000 != 0 {
        chars[9] = if mode & 0o001 != 0 { 't' } else { 'T' };
    }
    chars.into_iter().collect()
}

pub fn format_time(secs: i64) -> String {
    match Local.timestamp_opt(secs, 0).single() {
        Some(t) => t.format("%b %e %H:%M").to_string(),
        None => "-".to_string(),
    }
}

pub fn format_entry_size(entry: &FileEntry, human: bool) -> String {
    if human {
        format_size(entry.size, DECIMAL)
    } else {
        entry.size.to_string()
    }
}

fn props_block(session: &Session, entry: &FileEntry) -> String {
    let opts = &session.opts;
    let perms = match opts.long_view_perms {
        PermsStyle::Symbolic => symbolic_perms(entry.ftype, entry.mode),
        PermsStyle::Numeric => format!("{:04o}", entry.mode & 0o7777),
    };
    let ids = if opts.long_view_ids {
        format!(" {:>5} {:>5}", entry.uid, entry.gid)
    } else {
        String::new()
    };
    format!(
        "{perms}{ids} {} {:>9}",
        format_time(entry.time),
        format_entry_size(entry, opts.human_size),
    )
}

/// Render the long view as text rows.
pub fn long_rows(session: &Session, term_cols: usize) -> Vec<String> {
    let shown = match session.opts.max_files {
        Some(max) => session.entries.len().min(max),
        None => session.entries.len(),
    };
    let colors = &session.colors;
    let reset = colors.reset();
    let eln_width = {
        let mut d = 1;
        let mut n = shown;
        while n >= 10 {
            n /= 10;
            d += 1;
        }
        d
    };

    let mut out = Vec::with_capacity(shown);
    for (i, entry) in session.entries[..shown].iter().enumerate() {
        let props = props_block(session, entry);
        // eln + space + marker + props + space
        let used = eln_width + 1 + 1 + props.len() + 1;
        let name_budget = term_cols.saturating_sub(used);
        let (name, _, cut) = trim_name(&entry.name, name_budget, session.opts.unicode);
        let color = match &entry.ext_color {
            Some(sgr) if colors.enabled => format!("\x1b[{sgr}m"),
            _ => colors.seq(entry.color),
        };
        let rendered_name = if cut {
            let mut body = name.clone();
            body.pop();
            format!(
                "{color}{body}{reset}{}{}{reset}",
                colors.seq(ColorKey::Trim),
                crate::trim::TRIM_SENTINEL
            )
        } else {
            format!("{color}{name}{reset}")
        };
        let marker = if entry.selected {
            format!("{}*{}", colors.seq(ColorKey::SelMarker), reset)
        } else {
            " ".to_string()
        };
        out.push(format!(
            "{}{:>eln_width$}{} {marker}{props} {rendered_name}",
            colors.seq(ColorKey::Eln),
            i + 1,
            reset,
        ));
    }
    out
}
