//! Bookmark commands: list, jump, add, del, edit.

use core_state::{Bookmark, Session};

use super::{fail, usage};
use crate::exec::exit;
use crate::expand::arg_to_path;

pub fn bm_cmd(session: &mut Session, args: &[String]) -> i32 {
    match args.get(1).map(String::as_str) {
        None | Some("ls") => list(session),
        Some("add") => add(session, &args[2..]),
        Some("del") => del(session, &args[2..]),
        Some("edit") => edit(session),
        Some(key) => jump_to(session, key),
    }
}

fn list(session: &mut Session) -> i32 {
    if session.bookmarks.is_empty() {
        println!("no bookmarks");
        return exit::SUCCESS;
    }
    let lines: Vec<String> = session
        .bookmarks
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let shortcut = b
                .shortcut
                .as_ref()
                .map(|s| format!("[{s}]"))
                .unwrap_or_default();
            let name = b.name.clone().unwrap_or_default();
            format!("{:>3} {shortcut}{name}: {}", i + 1, b.path)
        })
        .collect();
    for l in lines {
        println!("{l}");
    }
    exit::SUCCESS
}

fn jump_to(session: &mut Session, key: &str) -> i32 {
    let Some(path) = session.bookmarks.lookup(key).map(|b| b.path.clone()) else {
        return fail(session, format!("bm: {key}: no such bookmark"));
    };
    super::nav::change_dir(session, std::path::Path::new(&path), true)
}

fn add(session: &mut Session, args: &[String]) -> i32 {
    let Some(raw) = args.first() else {
        return usage(session, "bm add PATH [NAME] [SHORTCUT]");
    };
    let cwd = session.cwd().to_path_buf();
    let path = arg_to_path(raw, &cwd);
    if !path.exists() {
        return fail(session, format!("bm: {}: no such file", path.display()));
    }
    let name = args.get(1).cloned().or_else(|| {
        path.file_name().map(|n| n.to_string_lossy().to_string())
    });
    let bm = Bookmark {
        shortcut: args.get(2).cloned(),
        name,
        path: path.to_string_lossy().to_string(),
    };
    if !session.bookmarks.add(bm) {
        return fail(session, "bm: duplicate bookmark");
    }
    persist(session)
}

fn del(session: &mut Session, args: &[String]) -> i32 {
    let Some(key) = args.first() else {
        return usage(session, "bm del NAME");
    };
    if !session.bookmarks.remove(key) {
        return fail(session, format!("bm: {key}: no such bookmark"));
    }
    persist(session)
}

fn persist(session: &mut Session) -> i32 {
    if session.paths.stealth {
        return exit::SUCCESS;
    }
    let file = session.paths.bookmarks_file();
    match session.bookmarks.save(&file) {
        Ok(()) => exit::SUCCESS,
        Err(e) => fail(session, e.to_string()),
    }
}

/// Open the bookmarks file in the editor; reload if the mtime moved.
fn edit(session: &mut Session) -> i32 {
    if session.paths.stealth {
        return fail(session, "bm edit: unavailable in stealth mode");
    }
    let file = session.paths.bookmarks_file();
    let code = super::misc::edit_file(session, &file);
    if code != exit::SUCCESS {
        return code;
    }
    match session.bookmarks.reload_if_modified(&file) {
        Ok(true) => println!("bookmarks reloaded"),
        Ok(false) => {}
        Err(e) => return fail(session, e.to_string()),
    }
    exit::SUCCESS
}
