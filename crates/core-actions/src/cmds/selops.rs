//! The selection box commands: `s`, `ds`, `sb`, `sel-all`, `desel-all`.
//!
//! By the time these run, the pipeline has already expanded ELNs, ranges,
//! globs, and regexes; arguments are names or paths. Every mutation ends in
//! a full-file rewrite of `selbox.clifm`.

use core_state::Session;

use super::{fail, usage};
use crate::exec::exit;
use crate::expand::arg_to_path;

fn save(session: &mut Session) -> i32 {
    if session.paths.stealth {
        return exit::SUCCESS;
    }
    match session.selbox.save() {
        Ok(()) => exit::SUCCESS,
        Err(e) => fail(session, e.to_string()),
    }
}

pub fn sel_cmd(session: &mut Session, args: &[String]) -> i32 {
    if args.len() < 2 {
        return usage(session, "s FILE...");
    }
    let cwd = session.cwd().to_path_buf();
    let mut added = 0usize;
    for arg in &args[1..] {
        let path = arg_to_path(arg, &cwd);
        if !path.exists() {
            return fail(session, format!("s: {}: no such file", path.display()));
        }
        if session.selbox.add(path) {
            added += 1;
        }
    }
    println!("{added} file(s) selected ({} total)", session.selbox.len());
    session.needs_refresh = true;
    save(session)
}

pub fn desel_cmd(session: &mut Session, args: &[String]) -> i32 {
    if args.len() < 2 {
        return usage(session, "ds FILE...");
    }
    let cwd = session.cwd().to_path_buf();
    let mut removed = 0usize;
    for arg in &args[1..] {
        let path = arg_to_path(arg, &cwd);
        if session.selbox.remove(&path) {
            removed += 1;
        }
    }
    println!("{removed} file(s) deselected ({} left)", session.selbox.len());
    session.needs_refresh = true;
    save(session)
}

pub fn show_box(session: &mut Session) -> i32 {
    if session.selbox.is_empty() {
        println!("no selected files");
        return exit::SUCCESS;
    }
    let lines: Vec<String> = session
        .selbox
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{:>3} {}", i + 1, p.display()))
        .collect();
    for l in lines {
        println!("{l}");
    }
    exit::SUCCESS
}

pub fn sel_all(session: &mut Session) -> i32 {
    let cwd = session.cwd().to_path_buf();
    let names: Vec<String> = session.entries.iter().map(|e| e.name.clone()).collect();
    for name in names {
        session.selbox.add(cwd.join(name));
    }
    println!("{} file(s) selected", session.selbox.len());
    session.needs_refresh = true;
    save(session)
}

pub fn desel_all(session: &mut Session) -> i32 {
    session.selbox.clear();
    session.needs_refresh = true;
    save(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::{ColorScheme, ConfigPaths, Options};
    use core_state::FileEntry;
    use std::fs;
    use std::path::Path;

    fn session_at(dir: &Path) -> Session {
        let paths = ConfigPaths::resolve(Some(dir.join("cfg")), None, true).unwrap();
        Session::new(
            paths,
            Options::default(),
            ColorScheme::default(),
            dir.to_path_buf(),
        )
    }

    #[test]
    fn sel_then_desel_is_identity() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), "x").unwrap();
        let mut s = session_at(tmp.path());
        assert_eq!(sel_cmd(&mut s, &["s".into(), "a.txt".into()]), 0);
        assert_eq!(s.selbox.len(), 1);
        assert_eq!(desel_cmd(&mut s, &["ds".into(), "a.txt".into()]), 0);
        assert!(s.selbox.is_empty());
    }

    #[test]
    fn selecting_missing_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = session_at(tmp.path());
        assert_eq!(sel_cmd(&mut s, &["s".into(), "ghost".into()]), 1);
    }

    #[test]
    fn sel_all_takes_listing_entries() {
        let tmp = tempfile::tempdir().unwrap();
        for n in ["a", "b"] {
            fs::write(tmp.path().join(n), "x").unwrap();
        }
        let mut s = session_at(tmp.path());
        s.entries.push(FileEntry::named("a"));
        s.entries.push(FileEntry::named("b"));
        assert_eq!(sel_all(&mut s), 0);
        assert_eq!(s.selbox.len(), 2);
        assert_eq!(desel_all(&mut s), 0);
        assert!(s.selbox.is_empty());
    }
}
