//! The jumper commands: `j`, `jc`, `jp`, `jl`, `je`/`jo`.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use core_state::Session;

use super::{fail, usage};
use crate::exec::exit;
use crate::expand::helpers::unescape;

pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// `j [SUBSTR...]`: cd to the highest-ranked match. `jp` restricts to
/// parents of the CWD, `jc` to children.
pub fn jump_cmd(session: &mut Session, cmd: &str, args: &[String]) -> i32 {
    let query: Vec<String> = args[1..].iter().map(|a| unescape(a)).collect();
    if query.is_empty() && cmd == "j" {
        return jump_list(session);
    }
    let cwd = session.cwd().to_path_buf();
    let ctx = session.rank_context();
    let now = now_secs();
    let best = {
        let filter = |p: &Path| match cmd {
            "jp" => cwd.starts_with(p) && p != cwd,
            "jc" => p.starts_with(&cwd) && p != cwd,
            _ => true,
        };
        session
            .jumpdb
            .best_match(&query, now, &ctx, filter)
            .map(|(p, _)| p.clone())
    };
    match best {
        Some(path) => super::nav::change_dir(session, &path, true),
        None => fail(session, format!("{cmd}: no match in the jump database")),
    }
}

/// `jl`: the ranked database.
pub fn jump_list(session: &mut Session) -> i32 {
    let ctx = session.rank_context();
    let now = now_secs();
    let ranked = session.jumpdb.ranked(now, &ctx);
    if ranked.is_empty() {
        println!("jump database is empty");
        return exit::SUCCESS;
    }
    let lines: Vec<String> = ranked
        .iter()
        .map(|(p, e, rank)| format!("{rank:>8} {:>5} {}", e.visits, p.display()))
        .collect();
    println!("{:>8} {:>5} path", "rank", "visits");
    for l in lines {
        println!("{l}");
    }
    exit::SUCCESS
}

/// `je`/`jo`: open the database in the editor and reload it.
pub fn jump_edit(session: &mut Session) -> i32 {
    if session.paths.stealth {
        return usage(session, "je: unavailable in stealth mode");
    }
    let file = session.paths.jump_file();
    if session.jumpdb.save(&file, now_secs()).is_err() {
        return fail(session, "je: cannot write the jump database");
    }
    let code = super::misc::edit_file(session, &file);
    if code != exit::SUCCESS {
        return code;
    }
    let ctx = session.rank_context();
    let mut fresh = core_state::JumpDb::default();
    let purge = session.opts.purge_jumpdb;
    match fresh.load(&file, purge, &ctx) {
        Ok(()) => {
            session.jumpdb = fresh;
            exit::SUCCESS
        }
        Err(e) => fail(session, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::{ColorScheme, ConfigPaths, Options};
    use core_state::RankContext;
    use std::path::PathBuf;

    fn session_at(dir: &Path) -> Session {
        let canon = std::fs::canonicalize(dir).unwrap();
        let paths = ConfigPaths::resolve(Some(canon.join("cfg")), None, true).unwrap();
        Session::new(paths, Options::default(), ColorScheme::default(), canon)
    }

    #[test]
    fn jump_cd_to_best_match() {
        let _g = crate::testutil::cwd_lock();
        let tmp = tempfile::tempdir().unwrap();
        let projects = tmp.path().join("projects");
        std::fs::create_dir(&projects).unwrap();
        let canon = std::fs::canonicalize(&projects).unwrap();
        let mut s = session_at(tmp.path());
        s.jumpdb
            .record_visit(&canon, now_secs(), &RankContext::default(), 100_000, 10);
        let code = jump_cmd(&mut s, "j", &["j".to_string(), "proj".to_string()]);
        assert_eq!(code, 0);
        assert_eq!(s.cwd(), canon.as_path());
        // Jumping through `j` records a regular visit.
        assert_eq!(s.pending_visit.as_deref(), Some(canon.as_path()));
    }

    #[test]
    fn jp_restricts_to_parents() {
        let _g = crate::testutil::cwd_lock();
        let tmp = tempfile::tempdir().unwrap();
        let deep = tmp.path().join("a/b");
        std::fs::create_dir_all(&deep).unwrap();
        let canon_root = std::fs::canonicalize(tmp.path()).unwrap();
        let canon_deep = std::fs::canonicalize(&deep).unwrap();
        let mut s = session_at(&deep);
        let ctx = RankContext::default();
        s.jumpdb.record_visit(&canon_root, now_secs(), &ctx, 100_000, 10);
        let unrelated = PathBuf::from("/somewhere/else");
        s.jumpdb.record_visit(&unrelated, now_secs(), &ctx, 100_000, 10);
        let code = jump_cmd(&mut s, "jp", &["jp".to_string()]);
        assert_eq!(code, 0);
        assert_eq!(s.cwd(), canon_root.as_path());
        assert_ne!(s.cwd(), canon_deep.as_path());
    }

    #[test]
    fn no_match_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = session_at(tmp.path());
        let code = jump_cmd(&mut s, "j", &["j".to_string(), "zzz".to_string()]);
        assert_eq!(code, 1);
    }
}
