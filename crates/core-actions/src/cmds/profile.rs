//! Profile management: `pf [ls | add | del | set] [NAME]`.
//!
//! Switching profiles is a restart-level operation: the handler validates
//! the target and flags a reload; the binary swaps the path tree and re-runs
//! the startup loaders.

use std::fs;

use core_state::Session;

use super::{fail, usage};
use crate::exec::exit;

pub fn profile_cmd(session: &mut Session, args: &[String]) -> i32 {
    match args.get(1).map(String::as_str) {
        None | Some("ls") => list(session),
        Some("add") => add(session, args.get(2)),
        Some("del") => del(session, args.get(2)),
        Some("set") => set(session, args.get(2)),
        Some(_) => usage(session, "pf [ls | add NAME | del NAME | set NAME]"),
    }
}

fn list(session: &mut Session) -> i32 {
    let root = session.paths.profiles_root();
    let mut names: Vec<String> = match fs::read_dir(&root) {
        Ok(rd) => rd
            .flatten()
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => Vec::new(),
    };
    if names.is_empty() {
        names.push(session.paths.profile.clone());
    }
    names.sort();
    for n in names {
        let marker = if n == session.paths.profile { "*" } else { " " };
        println!("{marker}{n}");
    }
    exit::SUCCESS
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\0')
}

fn add(session: &mut Session, name: Option<&String>) -> i32 {
    let Some(name) = name else {
        return usage(session, "pf add NAME");
    };
    if !valid_name(name) {
        return fail(session, format!("pf: {name}: invalid profile name"));
    }
    let dir = session.paths.profiles_root().join(name);
    if dir.exists() {
        return fail(session, format!("pf: {name}: profile exists"));
    }
    match fs::create_dir_all(&dir) {
        Ok(()) => {
            println!("profile {name} created");
            exit::SUCCESS
        }
        Err(e) => fail(session, format!("pf: {name}: {e}")),
    }
}

fn del(session: &mut Session, name: Option<&String>) -> i32 {
    let Some(name) = name else {
        return usage(session, "pf del NAME");
    };
    if *name == session.paths.profile {
        return fail(session, "pf: cannot delete the active profile");
    }
    let dir = session.paths.profiles_root().join(name);
    if !dir.is_dir() {
        return fail(session, format!("pf: {name}: no such profile"));
    }
    match fs::remove_dir_all(&dir) {
        Ok(()) => {
            println!("profile {name} removed");
            exit::SUCCESS
        }
        Err(e) => fail(session, format!("pf: {name}: {e}")),
    }
}

fn set(session: &mut Session, name: Option<&String>) -> i32 {
    let Some(name) = name else {
        return usage(session, "pf set NAME");
    };
    if !valid_name(name) {
        return fail(session, format!("pf: {name}: invalid profile name"));
    }
    if *name == session.paths.profile {
        println!("already on profile {name}");
        return exit::SUCCESS;
    }
    let dir = session.paths.profiles_root().join(name);
    if !dir.is_dir() {
        return fail(session, format!("pf: {name}: no such profile (try 'pf add {name}')"));
    }
    session.paths.profile = name.clone();
    session.reload_requested = true;
    println!("switching to profile {name}");
    exit::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::{ColorScheme, ConfigPaths, Options};
    use std::path::Path;

    fn session_at(dir: &Path) -> Session {
        let paths = ConfigPaths::resolve(Some(dir.to_path_buf()), None, false).unwrap();
        paths.ensure_tree().unwrap();
        Session::new(
            paths,
            Options::default(),
            ColorScheme::default(),
            dir.to_path_buf(),
        )
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn add_set_del_lifecycle() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = session_at(tmp.path());
        assert_eq!(profile_cmd(&mut s, &strings(&["pf", "add", "work"])), 0);
        assert_eq!(profile_cmd(&mut s, &strings(&["pf", "set", "work"])), 0);
        assert_eq!(s.paths.profile, "work");
        assert!(s.reload_requested);
        // The now-active profile cannot be deleted.
        assert_eq!(profile_cmd(&mut s, &strings(&["pf", "del", "work"])), 1);
        assert_eq!(profile_cmd(&mut s, &strings(&["pf", "set", "default"])), 0);
        assert_eq!(profile_cmd(&mut s, &strings(&["pf", "del", "work"])), 0);
    }

    #[test]
    fn bogus_names_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = session_at(tmp.path());
        assert_eq!(profile_cmd(&mut s, &strings(&["pf", "add", "a/b"])), 1);
        assert_eq!(profile_cmd(&mut s, &strings(&["pf", "set", "ghost"])), 1);
    }
}
