//! `o`/`open`, `ow`, and `mm`/`mime`.

use std::io::Write;
use std::path::Path;

use core_state::Session;
use tracing::info;

use super::{fail, usage};
use crate::dispatch::child_env;
use crate::exec::{self, exit};
use crate::expand::arg_to_path;
use crate::opener::{self, Opener};

fn load_opener(session: &Session) -> Opener {
    Opener::load(&session.paths.mimelist_file())
}

/// `o FILE [APP]`: directories cd, files dispatch through the opener; an
/// explicit APP skips the rule file entirely.
pub fn open_cmd(session: &mut Session, args: &[String], background: bool) -> i32 {
    let Some(raw) = args.get(1) else {
        return usage(session, "o FILE [APP]");
    };
    let cwd = session.cwd().to_path_buf();
    let path = arg_to_path(raw, &cwd);
    if path.is_dir() {
        return super::nav::change_dir(session, &path, true);
    }
    if !path.exists() {
        return fail(session, format!("o: {}: no such file", path.display()));
    }
    if let Some(app) = args.get(2) {
        return launch_spec(session, app, &path, background);
    }
    // A session-wide opener override bypasses the rule file (`opener` cmd).
    if let Some(app) = session.opts.opener.clone() {
        return launch_spec(session, &app, &path, background);
    }
    open_via_rules(session, &path, background)
}

fn open_via_rules(session: &mut Session, path: &Path, background: bool) -> i32 {
    let opener = load_opener(session);
    let mime = opener::mime_type(path);
    match opener.resolve(path, mime.as_deref(), opener::gui_session()) {
        Ok(app) => {
            info!(target: "opener", file = %path.display(), app = %app, "opening");
            launch_spec(session, &app, path, background)
        }
        Err(_) => {
            // Archive fallback when the magic says so.
            if let Some(m) = &mime {
                if m.contains("archive") || m.contains("compressed") || m.contains("iso9660") {
                    let args = vec!["ad".to_string(), path.to_string_lossy().to_string()];
                    return super::fileops::archive_cmd(session, "ad", &args);
                }
            }
            fail(
                session,
                format!("o: {}: no associated application", path.display()),
            )
        }
    }
}

fn launch_spec(session: &mut Session, spec: &str, path: &Path, force_bg: bool) -> i32 {
    if spec == "ad" {
        let args = vec!["ad".to_string(), path.to_string_lossy().to_string()];
        return super::fileops::archive_cmd(session, "ad", &args);
    }
    let launch = opener::build_launch(spec, path);
    let env = child_env(session);
    let cwd = session.cwd().to_path_buf();
    if launch.background || force_bg {
        exec::run_shell_bg(&launch.line, &cwd, &env)
    } else {
        exec::run_shell(&launch.line, &cwd, &env)
    }
}

/// `ow FILE`: numbered menu over every matching application.
pub fn open_with(session: &mut Session, args: &[String]) -> i32 {
    let Some(raw) = args.get(1) else {
        return usage(session, "ow FILE");
    };
    let cwd = session.cwd().to_path_buf();
    let path = arg_to_path(raw, &cwd);
    if !path.exists() {
        return fail(session, format!("ow: {}: no such file", path.display()));
    }
    let opener = load_opener(session);
    let mime = opener::mime_type(&path);
    let candidates = opener.candidates(&path, mime.as_deref(), opener::gui_session());
    if candidates.is_empty() {
        return fail(session, format!("ow: {}: no candidates", path.display()));
    }
    for (i, app) in candidates.iter().enumerate() {
        println!("{:>2} {app}", i + 1);
    }
    print!("open with (1-{}, q): ", candidates.len());
    let _ = std::io::stdout().flush();
    match core_terminal::read_single_key() {
        Ok(core_terminal::Key::Char(c)) if c.is_ascii_digit() => {
            println!("{c}");
            let n = c.to_digit(10).unwrap_or(0) as usize;
            if n == 0 || n > candidates.len() {
                return fail(session, "ow: selection out of range");
            }
            launch_spec(session, &candidates[n - 1], &path, false)
        }
        _ => {
            println!();
            exit::SUCCESS
        }
    }
}

/// `mm info FILE` / `mm open FILE` / `mm edit`.
pub fn mime_cmd(session: &mut Session, args: &[String]) -> i32 {
    match args.get(1).map(String::as_str) {
        Some("info") => {
            let Some(raw) = args.get(2) else {
                return usage(session, "mm info FILE");
            };
            let cwd = session.cwd().to_path_buf();
            let path = arg_to_path(raw, &cwd);
            if !path.exists() {
                return fail(session, format!("mm: {}: no such file", path.display()));
            }
            let mime = opener::mime_type(&path);
            let opener = load_opener(session);
            let app = opener
                .resolve(&path, mime.as_deref(), opener::gui_session())
                .ok();
            println!("file: {}", path.display());
            println!("mime: {}", mime.as_deref().unwrap_or("unknown"));
            println!("app:  {}", app.as_deref().unwrap_or("none"));
            exit::SUCCESS
        }
        Some("open") => {
            let mut fwd = vec!["o".to_string()];
            fwd.extend(args[2..].iter().cloned());
            open_cmd(session, &fwd, false)
        }
        Some("edit") => {
            let file = session.paths.mimelist_file();
            super::misc::edit_file(session, &file)
        }
        _ => usage(session, "mm [info | open | edit] ..."),
    }
}

/// Open a file in `$EDITOR`/`$VISUAL` (shared by `edit`, `br`, `bm edit`).
pub fn editor_line(file: &Path) -> Option<String> {
    let editor = std::env::var("VISUAL")
        .or_else(|_| std::env::var("EDITOR"))
        .ok()
        .filter(|e| !e.is_empty())?;
    Some(format!(
        "{editor} {}",
        crate::expand::helpers::shell_quote_path(&file.to_string_lossy())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::{ColorScheme, ConfigPaths, Options};

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
    fn open_missing_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = session_at(tmp.path());
        assert_eq!(open_cmd(&mut s, &["o".into(), "ghost".into()], false), 1);
    }

    #[test]
    fn open_dir_changes_directory() {
        let _g = crate::testutil::cwd_lock();
        let tmp = tempfile::tempdir().unwrap();
        let sub = tmp.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let mut s = session_at(tmp.path());
        assert_eq!(open_cmd(&mut s, &["o".into(), "sub".into()], false), 0);
        assert_eq!(s.cwd(), std::fs::canonicalize(&sub).unwrap().as_path());
    }

    #[test]
    fn explicit_app_runs_directly() {
        let tmp = tempfile::tempdir().unwrap();
        let f = tmp.path().join("x.txt");
        std::fs::write(&f, "data").unwrap();
        let mut s = session_at(tmp.path());
        // `true` ignores its argument and exits zero.
        let code = open_cmd(
            &mut s,
            &["o".into(), "x.txt".into(), "true".into()],
            false,
        );
        assert_eq!(code, 0);
    }
}
