//! Small session commands: sort, pager, color schemes, toggles, messages,
//! history, properties, config editing.

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use core_config::{ColorScheme, SortKey};
use core_state::{EntryType, FileEntry, Session};
use tracing::info;

use super::{fail, usage};
use crate::dispatch::child_env;
use crate::exec::{self, exit};
use crate::expand::arg_to_path;

/// Run `$VISUAL`/`$EDITOR` on a file, foreground.
pub fn edit_file(session: &mut Session, file: &Path) -> i32 {
    let Some(line) = super::open_cmd::editor_line(file) else {
        return fail(session, "no editor set (export EDITOR or VISUAL)");
    };
    let env = child_env(session);
    let cwd = session.cwd().to_path_buf();
    exec::run_shell(&line, &cwd, &env)
}

/// `edit`: open `clifmrc` and schedule a reload.
pub fn edit_config(session: &mut Session) -> i32 {
    if session.paths.stealth {
        return fail(session, "edit: unavailable in stealth mode");
    }
    let rc = session.paths.rc_file();
    let mtime_before = fs::metadata(&rc).and_then(|m| m.modified()).ok();
    let code = edit_file(session, &rc);
    if code != exit::SUCCESS {
        return code;
    }
    let mtime_after = fs::metadata(&rc).and_then(|m| m.modified()).ok();
    if mtime_before != mtime_after {
        session.reload_requested = true;
    }
    exit::SUCCESS
}

/// `rl`/`reload`: re-read config at the next loop turn.
pub fn reload_marker(session: &mut Session) -> i32 {
    session.reload_requested = true;
    exit::SUCCESS
}

/// `st [KEY] [rev]`: report or set the sort key.
pub fn sort_cmd(session: &mut Session, args: &[String]) -> i32 {
    let Some(arg) = args.get(1) else {
        println!(
            "sort: {}{}",
            session.opts.sort.as_str(),
            if session.opts.sort_reverse { " (reversed)" } else { "" }
        );
        return exit::SUCCESS;
    };
    if arg == "rev" {
        session.opts.sort_reverse = !session.opts.sort_reverse;
        session.needs_refresh = true;
        return exit::SUCCESS;
    }
    let Some(key) = SortKey::parse(arg) else {
        return usage(session, "st [name|size|atime|btime|ctime|mtime|version|extension|inode|owner|group|rev]");
    };
    session.opts.sort = key;
    if args.get(2).map(String::as_str) == Some("rev") {
        session.opts.sort_reverse = true;
    }
    session.needs_refresh = true;
    info!(target: "dispatch", sort = key.as_str(), "sort key changed");
    exit::SUCCESS
}

fn toggle(current: &mut bool, arg: Option<&str>, name: &str) -> i32 {
    match arg {
        Some("on") | Some("true") => *current = true,
        Some("off") | Some("false") => *current = false,
        Some("status") | None => {}
        Some(_) => {
            eprintln!("clifm: usage: {name} [on | off | status]");
            return exit::USAGE;
        }
    }
    println!("{name} is {}", if *current { "enabled" } else { "disabled" });
    exit::SUCCESS
}

pub fn toggle_pager(session: &mut Session, args: &[String]) -> i32 {
    let mut v = session.opts.pager;
    let code = toggle(&mut v, args.get(1).map(String::as_str), "pager");
    session.opts.pager = v;
    code
}

pub fn toggle_ext(session: &mut Session, args: &[String]) -> i32 {
    let mut v = session.opts.ext_cmd_ok;
    let code = toggle(&mut v, args.get(1).map(String::as_str), "ext");
    session.opts.ext_cmd_ok = v;
    code
}

pub fn toggle_autocd(session: &mut Session, args: &[String]) -> i32 {
    let mut v = session.opts.autocd;
    let code = toggle(&mut v, args.get(1).map(String::as_str), "autocd");
    session.opts.autocd = v;
    code
}

pub fn toggle_auto_open(session: &mut Session, args: &[String]) -> i32 {
    let mut v = session.opts.auto_open;
    let code = toggle(&mut v, args.get(1).map(String::as_str), "auto-open");
    session.opts.auto_open = v;
    code
}

/// `cs [NAME]`: list available color schemes or switch to one.
pub fn color_scheme_cmd(session: &mut Session, args: &[String]) -> i32 {
    let colors_dir = session.paths.colors_dir();
    let Some(name) = args.get(1) else {
        println!("current: {}", session.colors.name);
        if let Ok(rd) = fs::read_dir(&colors_dir) {
            for entry in rd.flatten() {
                let fname = entry.file_name().to_string_lossy().to_string();
                if let Some(scheme) = fname.strip_suffix(".clifm") {
                    println!("  {scheme}");
                }
            }
        }
        return exit::SUCCESS;
    };
    let enabled = session.colors.enabled;
    session.colors = ColorScheme::load(&colors_dir, name, enabled);
    session.opts.color_scheme = name.clone();
    session.needs_refresh = true;
    exit::SUCCESS
}

/// `mf [N | unset]`: cap the number of listed files.
pub fn max_files_cmd(session: &mut Session, args: &[String]) -> i32 {
    match args.get(1).map(String::as_str) {
        None => {
            match session.opts.max_files {
                Some(n) => println!("max files: {n}"),
                None => println!("max files: unset"),
            }
            exit::SUCCESS
        }
        Some("unset") => {
            session.opts.max_files = None;
            session.needs_refresh = true;
            exit::SUCCESS
        }
        Some(v) => match v.parse::<usize>() {
            Ok(n) => {
                session.opts.max_files = Some(n);
                session.needs_refresh = true;
                exit::SUCCESS
            }
            Err(_) => usage(session, "mf [N | unset]"),
        },
    }
}

/// `opener [APP | default]`: override or restore the resource opener.
pub fn opener_cmd(session: &mut Session, args: &[String]) -> i32 {
    match args.get(1).map(String::as_str) {
        None => {
            println!(
                "opener: {}",
                session.opts.opener.as_deref().unwrap_or("default (mimelist)")
            );
            exit::SUCCESS
        }
        Some("default") => {
            session.opts.opener = None;
            exit::SUCCESS
        }
        Some(app) => {
            session.opts.opener = Some(app.to_string());
            exit::SUCCESS
        }
    }
}

/// `msg` lists accumulated messages; `msg clear` empties the list.
pub fn msg_cmd(session: &mut Session, args: &[String]) -> i32 {
    if args.get(1).map(String::as_str) == Some("clear") {
        session.msgs.drain();
        return exit::SUCCESS;
    }
    if session.msgs.is_empty() {
        println!("no messages");
        return exit::SUCCESS;
    }
    let lines: Vec<String> = session
        .msgs
        .iter()
        .map(|(level, text)| format!("{level:?}: {text}"))
        .collect();
    for l in lines {
        println!("{l}");
    }
    exit::SUCCESS
}

pub fn history_cmd(session: &mut Session) -> i32 {
    for (i, line) in session.cmd_history.iter().enumerate() {
        println!("{:>4} {line}", i + 1);
    }
    exit::SUCCESS
}

pub fn alias_cmd(session: &mut Session, _args: &[String]) -> i32 {
    if session.aliases.is_empty() {
        println!("no aliases");
        return exit::SUCCESS;
    }
    let mut names: Vec<&String> = session.aliases.keys().collect();
    names.sort();
    let lines: Vec<String> = names
        .iter()
        .map(|n| format!("alias {n}='{}'", session.aliases[*n]))
        .collect();
    for l in lines {
        println!("{l}");
    }
    exit::SUCCESS
}

/// `log`: where the session log lives, plus its tail.
pub fn show_log(session: &mut Session) -> i32 {
    if session.paths.stealth {
        println!("logging is disabled in stealth mode");
        return exit::SUCCESS;
    }
    let log = session.paths.log_file();
    println!("{}", log.display());
    if let Ok(content) = fs::read_to_string(&log) {
        let lines: Vec<&str> = content.lines().collect();
        let start = lines.len().saturating_sub(20);
        for l in &lines[start..] {
            println!("{l}");
        }
    }
    exit::SUCCESS
}

/// `net`/`mp`: the remotes table lives in an external mount helper.
pub fn remotes_stub(session: &mut Session, cmd: &str) -> i32 {
    let nets = session.paths.nets_file();
    println!("{cmd}: remotes are defined in {} and mounted by the external helper", nets.display());
    exit::SUCCESS
}

/// `p FILE...`: full lstat report per operand (the long-view row,
/// verticalized).
pub fn properties(session: &mut Session, args: &[String]) -> i32 {
    if args.len() < 2 {
        return usage(session, "p FILE...");
    }
    let cwd = session.cwd().to_path_buf();
    for arg in &args[1..] {
        let path = arg_to_path(arg, &cwd);
        let meta = match fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(e) => return fail(session, format!("p: {}: {e}", path.display())),
        };
        let ftype = if meta.file_type().is_symlink() {
            if fs::metadata(&path).is_ok() {
                EntryType::Link
            } else {
                EntryType::BrokenLink
            }
        } else if meta.is_dir() {
            EntryType::Dir
        } else {
            EntryType::Regular
        };
        let mut entry = FileEntry::named(&path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default());
        entry.size = meta.size();
        println!("{}", path.display());
        println!("  perms: {}", core_render::long::symbolic_perms(ftype, meta.mode()));
        println!("  links: {}  inode: {}  dev: {}", meta.nlink(), meta.ino(), meta.dev());
        println!("  owner: {}  group: {}", meta.uid(), meta.gid());
        println!(
            "  size:  {} ({} bytes)",
            core_render::long::format_entry_size(&entry, true),
            meta.size()
        );
        println!("  mtime: {}", core_render::long::format_time(meta.mtime()));
        println!("  ctime: {}", core_render::long::format_time(meta.ctime()));
        println!("  atime: {}", core_render::long::format_time(meta.atime()));
        if ftype == EntryType::Link {
            if let Ok(target) = fs::read_link(&path) {
                println!("  link:  {}", target.display());
            }
        }
    }
    exit::SUCCESS
}
