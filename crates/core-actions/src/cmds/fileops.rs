//! File operation wrappers and bulk rename.
//!
//! `c`/`m`/`r`/`l` wrap `cp`/`mv`/`rm`/`ln` with safe flags; `md` wraps
//! `mkdir -p`. The argument vector is already in shell-safe word form, so
//! the wrappers just join it behind the real command. `br` renames in bulk
//! through an editor round-trip.

use std::fs;

use core_state::Session;
use tracing::info;

use super::{fail, usage};
use crate::dispatch::child_env;
use crate::exec::{self, exit};
use crate::expand::arg_to_path;
use crate::expand::helpers::{shell_quote_path, unescape};

/// `c`/`m`/`r`/`l` with their safe flags. A successful operation that
/// consumed the selection deselects everything.
pub fn wrapper(session: &mut Session, cmd: &str, args: &[String], used_sel: bool) -> i32 {
    if args.len() < 2 {
        return usage(session, format!("{cmd} FILE..."));
    }
    let (real, flags) = match cmd {
        "c" => ("cp", "-iRp"),
        "m" => ("mv", "-i"),
        "r" => ("rm", rm_flags(session, &args[1..])),
        "l" => ("ln", "-sn"),
        _ => return usage(session, "c|m|r|l FILE..."),
    };
    let line = format!("{real} {flags} {}", args[1..].join(" "));
    let env = child_env(session);
    let cwd = session.cwd().to_path_buf();
    let code = exec::run_shell(&line, &cwd, &env);
    if code == exit::SUCCESS {
        info!(target: "fileops", cmd = real, args = args.len() - 1, "file operation done");
        if used_sel {
            session.selbox.clear();
            let _ = session.selbox.save();
        }
        session.needs_refresh = true;
    } else {
        session
            .msgs
            .error(format!("{real}: exited with status {code}"));
    }
    code
}

/// `rm` needs `-r` only when a directory operand is present; `-f` is never
/// passed, the user answers the prompts.
fn rm_flags(session: &Session, operands: &[String]) -> &'static str {
    let cwd = session.cwd();
    let any_dir = operands
        .iter()
        .any(|a| arg_to_path(a, cwd).is_dir());
    if any_dir { "-ri" } else { "-i" }
}

pub fn mkdir_cmd(session: &mut Session, args: &[String]) -> i32 {
    if args.len() < 2 {
        return usage(session, "md DIR...");
    }
    let cwd = session.cwd().to_path_buf();
    for arg in &args[1..] {
        let path = arg_to_path(arg, &cwd);
        if let Err(e) = fs::create_dir_all(&path) {
            return fail(session, format!("md: {}: {e}", path.display()));
        }
    }
    session.needs_refresh = true;
    exit::SUCCESS
}

/// `br [FILE...]`: write the operand names to a temp file, run the editor,
/// apply one `mv` per changed line. Falls back to the selection when no
/// operands are given.
pub fn bulk_rename(session: &mut Session, args: &[String]) -> i32 {
    let cwd = session.cwd().to_path_buf();
    let names: Vec<String> = if args.len() > 1 {
        args[1..].iter().map(|a| unescape(a)).collect()
    } else {
        session
            .selbox
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect()
    };
    if names.is_empty() {
        return usage(session, "br FILE... (or a non-empty selection)");
    }
    for n in &names {
        if !arg_to_path(n, &cwd).exists() {
            return fail(session, format!("br: {n}: no such file"));
        }
    }

    let tmp = std::env::temp_dir().join(format!("clifm-br-{}.clifm", std::process::id()));
    if let Err(e) = fs::write(&tmp, names.join("\n") + "\n") {
        return fail(session, format!("br: {e}"));
    }
    let code = super::misc::edit_file(session, &tmp);
    if code != exit::SUCCESS {
        let _ = fs::remove_file(&tmp);
        return code;
    }
    let edited = match fs::read_to_string(&tmp) {
        Ok(c) => c,
        Err(e) => return fail(session, format!("br: {e}")),
    };
    let _ = fs::remove_file(&tmp);
    let new_names: Vec<&str> = edited.lines().filter(|l| !l.trim().is_empty()).collect();
    if new_names.len() != names.len() {
        return fail(
            session,
            format!(
                "br: line count changed ({} -> {}), aborting",
                names.len(),
                new_names.len()
            ),
        );
    }

    let mut renamed = 0usize;
    for (old, new) in names.iter().zip(new_names) {
        if old == new {
            continue;
        }
        let from = arg_to_path(old, &cwd);
        let to = arg_to_path(new, &cwd);
        if to.exists() {
            return fail(session, format!("br: {new}: already exists"));
        }
        if let Err(e) = fs::rename(&from, &to) {
            return fail(session, format!("br: {old} -> {new}: {e}"));
        }
        renamed += 1;
    }
    println!("{renamed} file(s) renamed");
    session.needs_refresh = renamed > 0;
    exit::SUCCESS
}

/// `ac`/`ad`: the archiver interface. The heavy lifting belongs to the
/// external helper tools; this resolves one and forwards the operands.
pub fn archive_cmd(session: &mut Session, cmd: &str, args: &[String]) -> i32 {
    if args.len() < 2 {
        return usage(session, format!("{cmd} FILE..."));
    }
    let cwd = session.cwd().to_path_buf();
    let env = child_env(session);
    let line = if cmd == "ac" {
        let Some(archiver) = ["atool", "7z", "zip"]
            .iter()
            .find(|a| which::which(a).is_ok())
        else {
            return fail(session, "ac: no archiver found (install atool, 7z, or zip)");
        };
        let out = shell_quote_path(&format!("{}.zip", unescape(&args[1])));
        match *archiver {
            "atool" => format!("atool -a {out} {}", args[1..].join(" ")),
            "7z" => format!("7z a {out} {}", args[1..].join(" ")),
            _ => format!("zip -r {out} {}", args[1..].join(" ")),
        }
    } else {
        let Some(extractor) = ["atool", "7z", "unzip", "tar"]
            .iter()
            .find(|a| which::which(a).is_ok())
        else {
            return fail(session, "ad: no extractor found (install atool or 7z)");
        };
        match *extractor {
            "atool" => format!("atool -x {}", args[1..].join(" ")),
            "7z" => format!("7z x {}", args[1..].join(" ")),
            "unzip" => format!("unzip {}", args[1..].join(" ")),
            _ => format!("tar -xf {}", args[1..].join(" ")),
        }
    };
    let code = exec::run_shell(&line, &cwd, &env);
    if code == exit::SUCCESS {
        session.needs_refresh = true;
    }
    code
}
