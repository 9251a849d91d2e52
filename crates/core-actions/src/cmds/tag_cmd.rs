//! The `tag` command family over the symlink tag graph.
//!
//! `tag add FILE... :TAG...`, `tag del :TAG...`, `tag untag FILE... :TAG...`,
//! `tag rename OLD NEW`, `tag merge SRC DST`, `tag ls [TAG...]`, `tag new
//! :TAG...`. Tag operands carry a `:` prefix; anything else is a file.

use core_state::Session;

use super::{fail, usage};
use crate::exec::exit;
use crate::expand::arg_to_path;

const USAGE: &str = "tag [ls | new | add | del | untag | rename | merge] ...";

/// Split operands into (files, tags), tags recognized by their `:` prefix.
fn split_operands(args: &[String]) -> (Vec<String>, Vec<String>) {
    let mut files = Vec::new();
    let mut tags = Vec::new();
    for a in args {
        match a.strip_prefix(':') {
            Some(t) if !t.is_empty() => tags.push(t.to_string()),
            _ => files.push(a.clone()),
        }
    }
    (files, tags)
}

pub fn tag_cmd(session: &mut Session, args: &[String]) -> i32 {
    let sub = args.get(1).map(String::as_str).unwrap_or("ls");
    match sub {
        "ls" | "list" => list(session, &args[2.min(args.len())..]),
        "new" => new(session, &args[2..]),
        "add" => add(session, &args[2..]),
        "del" | "rm" => del(session, &args[2..]),
        "untag" => untag(session, &args[2..]),
        "rename" | "mv" => rename(session, &args[2..]),
        "merge" => merge(session, &args[2..]),
        _ => usage(session, USAGE),
    }
}

fn list(session: &mut Session, args: &[String]) -> i32 {
    let (_, tags) = split_operands(args);
    if tags.is_empty() {
        let all = session.tags.list();
        if all.is_empty() {
            println!("no tags");
            return exit::SUCCESS;
        }
        for t in all {
            println!("{t} ({})", session.tags.count(&t));
        }
        return exit::SUCCESS;
    }
    for t in &tags {
        match session.tags.files(t) {
            Ok(files) => {
                println!("{t}:");
                for f in files {
                    println!("  {}", f.display());
                }
            }
            Err(e) => return fail(session, e.to_string()),
        }
    }
    exit::SUCCESS
}

fn new(session: &mut Session, args: &[String]) -> i32 {
    let (_, tags) = split_operands(args);
    if tags.is_empty() {
        return usage(session, "tag new :TAG...");
    }
    for t in &tags {
        if let Err(e) = session.tags.create(t) {
            return fail(session, e.to_string());
        }
    }
    exit::SUCCESS
}

fn add(session: &mut Session, args: &[String]) -> i32 {
    let (files, tags) = split_operands(args);
    if files.is_empty() || tags.is_empty() {
        return usage(session, "tag add FILE... :TAG...");
    }
    let cwd = session.cwd().to_path_buf();
    for file in &files {
        let path = arg_to_path(file, &cwd);
        for t in &tags {
            if let Err(e) = session.tags.tag_file(&path, t) {
                return fail(session, e.to_string());
            }
        }
    }
    println!("tagged {} file(s) with {} tag(s)", files.len(), tags.len());
    exit::SUCCESS
}

fn del(session: &mut Session, args: &[String]) -> i32 {
    let (_, tags) = split_operands(args);
    if tags.is_empty() {
        return usage(session, "tag del :TAG...");
    }
    for t in &tags {
        if let Err(e) = session.tags.delete(t) {
            return fail(session, e.to_string());
        }
    }
    exit::SUCCESS
}

fn untag(session: &mut Session, args: &[String]) -> i32 {
    let (files, tags) = split_operands(args);
    if files.is_empty() || tags.is_empty() {
        return usage(session, "tag untag FILE... :TAG...");
    }
    let cwd = session.cwd().to_path_buf();
    for file in &files {
        let path = arg_to_path(file, &cwd);
        for t in &tags {
            if let Err(e) = session.tags.untag_file(&path, t) {
                return fail(session, e.to_string());
            }
        }
    }
    exit::SUCCESS
}

fn rename(session: &mut Session, args: &[String]) -> i32 {
    let (mut names, tags) = split_operands(args);
    names.extend(tags);
    let [old, new] = names.as_slice() else {
        return usage(session, "tag rename OLD NEW");
    };
    match session.tags.rename(old, new) {
        Ok(()) => exit::SUCCESS,
        Err(e) => fail(session, e.to_string()),
    }
}

fn merge(session: &mut Session, args: &[String]) -> i32 {
    let (mut names, tags) = split_operands(args);
    names.extend(tags);
    let [src, dst] = names.as_slice() else {
        return usage(session, "tag merge SRC DST");
    };
    match session.tags.merge(src, dst) {
        Ok(()) => exit::SUCCESS,
        Err(e) => fail(session, e.to_string()),
    }
}
