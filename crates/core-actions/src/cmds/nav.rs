//! Navigation: `cd`, history moves, `bd`, workspaces, the pinned dir.

use std::env;
use std::path::{Path, PathBuf};

use core_state::Session;
use tracing::{debug, info};

use super::{fail, usage};
use crate::exec::exit;
use crate::expand::helpers::unescape;

/// Change directory. `record` pushes directory history and queues a jumper
/// visit; history moves pass false to avoid the visit stutter.
pub fn change_dir(session: &mut Session, target: &Path, record: bool) -> i32 {
    let path = match std::fs::canonicalize(target) {
        Ok(p) => p,
        Err(e) => return fail(session, format!("cd: {}: {e}", target.display())),
    };
    if !path.is_dir() {
        return fail(session, format!("cd: {}: not a directory", path.display()));
    }
    if let Err(e) = env::set_current_dir(&path) {
        return fail(session, format!("cd: {}: {e}", path.display()));
    }
    session.workspaces.set_current_path(path.clone());
    if record {
        session.dirhist.push(path.clone());
        session.pending_visit = Some(path.clone());
    }
    session.needs_refresh = true;
    debug!(target: "nav", dir = %path.display(), record, "directory changed");
    exit::SUCCESS
}

/// `cd [DIR]`: resolve against CWD, then each `CDPATH` component in order.
pub fn cd_cmd(session: &mut Session, args: &[String]) -> i32 {
    let target = match args.get(1) {
        None => session.paths.home.clone(),
        Some(raw) => {
            let clean = unescape(raw);
            let p = PathBuf::from(&clean);
            if p.is_absolute() {
                p
            } else {
                let relative = session.cwd().join(&p);
                if relative.is_dir() {
                    relative
                } else {
                    match cdpath_resolve(&clean) {
                        Some(hit) => hit,
                        None => relative, // let change_dir report the error
                    }
                }
            }
        }
    };
    change_dir(session, &target, true)
}

fn cdpath_resolve(name: &str) -> Option<PathBuf> {
    let cdpath = env::var("CDPATH").ok()?;
    for component in cdpath.split(':').filter(|c| !c.is_empty()) {
        let candidate = Path::new(component).join(name);
        if candidate.is_dir() {
            return Some(candidate);
        }
    }
    None
}

pub fn back(session: &mut Session) -> i32 {
    let Some(path) = session.dirhist.back().map(Path::to_path_buf) else {
        return fail(session, "b: no previous directory");
    };
    change_dir(session, &path, false)
}

pub fn forth(session: &mut Session) -> i32 {
    let Some(path) = session.dirhist.forth().map(Path::to_path_buf) else {
        return fail(session, "f: no next directory");
    };
    change_dir(session, &path, false)
}

/// `bd NAME`: jump back to the closest parent whose component matches NAME.
pub fn bd_cmd(session: &mut Session, args: &[String]) -> i32 {
    let Some(name) = args.get(1) else {
        return usage(session, "bd NAME");
    };
    let name = unescape(name);
    let cwd = session.cwd().to_path_buf();
    let mut candidate: Option<PathBuf> = None;
    let mut walk = PathBuf::new();
    for comp in cwd.components() {
        walk.push(comp);
        let last = walk
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if walk != cwd && last.contains(&name) {
            candidate = Some(walk.clone());
        }
    }
    match candidate {
        Some(p) => change_dir(session, &p, true),
        None => fail(session, format!("bd: {name}: no matching parent")),
    }
}

/// `ws [N]`: list workspaces or switch to one.
pub fn ws_cmd(session: &mut Session, args: &[String]) -> i32 {
    let Some(arg) = args.get(1) else {
        for n in 1..=core_state::MAX_WORKSPACES {
            if let Some(w) = session.workspaces.get(n) {
                let marker = if n == session.workspaces.current_num() {
                    "*"
                } else {
                    " "
                };
                println!("{marker}{n}: {}", w.path.display());
            }
        }
        return exit::SUCCESS;
    };
    let Ok(num) = arg.parse::<usize>() else {
        return usage(session, "ws [1-8]");
    };
    // Split the borrow: switch first, then chdir to the slot's path.
    let mut opts = session.opts.clone();
    let path = match session.workspaces.switch(num, &mut opts) {
        Ok(w) => w.path.clone(),
        Err(e) => return fail(session, e.to_string()),
    };
    session.opts = opts;
    info!(target: "nav", workspace = num, "workspace switched");
    change_dir(session, &path, false)
}

pub fn pin_cmd(session: &mut Session, args: &[String]) -> i32 {
    let target = match args.get(1) {
        Some(raw) => {
            let clean = unescape(raw);
            let p = PathBuf::from(&clean);
            if p.is_absolute() {
                p
            } else {
                session.cwd().join(p)
            }
        }
        None => session.cwd().to_path_buf(),
    };
    match std::fs::canonicalize(&target) {
        Ok(p) if p.is_dir() => {
            println!("pinned {}", p.display());
            session.pinned = Some(p);
            exit::SUCCESS
        }
        _ => fail(session, format!("pin: {}: not a directory", target.display())),
    }
}

pub fn unpin_cmd(session: &mut Session) -> i32 {
    match session.pinned.take() {
        Some(p) => {
            println!("unpinned {}", p.display());
            exit::SUCCESS
        }
        None => fail(session, "unpin: no pinned directory"),
    }
}
