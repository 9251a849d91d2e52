//! Quick search: `/PATTERN [-TYPE] [DIR]`.
//!
//! The pattern is tried as a glob first, then as a regex. Matches print with
//! their ELNs when the search runs over the current listing; an explicit
//! directory operand searches that directory's names instead.

use std::path::PathBuf;

use core_state::{EntryType, Session};
use glob::Pattern;
use regex::Regex;

use super::fail;
use crate::exec::exit;
use crate::expand::arg_to_path;
use crate::expand::helpers::unescape;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeFilter {
    Dir,
    File,
    Link,
}

impl TypeFilter {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "-d" => Some(Self::Dir),
            "-f" => Some(Self::File),
            "-l" => Some(Self::Link),
            _ => None,
        }
    }

    fn keeps(self, t: EntryType) -> bool {
        match self {
            Self::Dir => t == EntryType::Dir,
            Self::File => t == EntryType::Regular,
            Self::Link => matches!(t, EntryType::Link | EntryType::BrokenLink),
        }
    }
}

enum Matcher {
    Glob(Pattern),
    Re(Regex),
}

impl Matcher {
    fn compile(pattern: &str) -> Option<Self> {
        if pattern.contains(['*', '?', '[']) {
            if let Ok(p) = Pattern::new(pattern) {
                return Some(Self::Glob(p));
            }
        }
        Regex::new(pattern).ok().map(Self::Re)
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Glob(p) => p.matches(name),
            Self::Re(r) => r.is_match(name),
        }
    }
}

pub fn quick_search(session: &mut Session, args: &[String]) -> i32 {
    let pattern = unescape(&args[0])[1..].to_string();
    if pattern.is_empty() {
        return fail(session, "search: empty pattern");
    }

    let mut type_filter = None;
    let mut dir: Option<PathBuf> = None;
    for arg in &args[1..] {
        if let Some(tf) = TypeFilter::parse(arg) {
            type_filter = Some(tf);
        } else {
            dir = Some(arg_to_path(arg, session.cwd()));
        }
    }

    let Some(matcher) = Matcher::compile(&pattern) else {
        return fail(session, format!("search: {pattern}: invalid pattern"));
    };

    let mut hits = Vec::new();
    match dir {
        // Against the live listing: report ELNs.
        None => {
            for (i, entry) in session.entries.iter().enumerate() {
                if !matcher.matches(&entry.name) {
                    continue;
                }
                if let Some(tf) = type_filter {
                    if !tf.keeps(entry.ftype) {
                        continue;
                    }
                }
                hits.push(format!("{:>4} {}", i + 1, entry.name));
            }
        }
        // Against another directory: plain names.
        Some(dir) => {
            let rd = match std::fs::read_dir(&dir) {
                Ok(rd) => rd,
                Err(e) => return fail(session, format!("search: {}: {e}", dir.display())),
            };
            let mut names: Vec<(String, EntryType)> = rd
                .flatten()
                .map(|e| {
                    let t = e
                        .file_type()
                        .map(|t| {
                            if t.is_dir() {
                                EntryType::Dir
                            } else if t.is_symlink() {
                                EntryType::Link
                            } else {
                                EntryType::Regular
                            }
                        })
                        .unwrap_or_default();
                    (e.file_name().to_string_lossy().to_string(), t)
                })
                .collect();
            names.sort();
            for (name, t) in names {
                if !matcher.matches(&name) {
                    continue;
                }
                if let Some(tf) = type_filter {
                    if !tf.keeps(t) {
                        continue;
                    }
                }
                hits.push(format!("     {name}"));
            }
        }
    }

    if hits.is_empty() {
        println!("no matches");
        return exit::FAILURE;
    }
    let count = hits.len();
    for h in hits {
        println!("{h}");
    }
    println!("{count} match(es)");
    exit::SUCCESS
}
