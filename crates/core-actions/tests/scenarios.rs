//! End-to-end scenarios over expand + dispatch on a live session.

use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use core_actions::expand::{expand_line, Expanded};
use core_actions::{dispatch, ExpandError};
use core_config::{ColorScheme, ConfigPaths, Options};
use core_state::Session;

// Several scenarios chdir; the process CWD is shared.
static CWD_LOCK: Mutex<()> = Mutex::new(());

fn lock() -> MutexGuard<'static, ()> {
    CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

fn session_at(dir: &Path) -> Session {
    let canon = fs::canonicalize(dir).unwrap();
    let paths = ConfigPaths::resolve(Some(canon.join("cfg")), None, true).unwrap();
    Session::new(paths, Options::default(), ColorScheme::default(), canon)
}

fn run(session: &mut Session, line: &str) -> i32 {
    let expanded = expand_line(line, session).unwrap();
    dispatch(expanded, session).code
}

fn refresh(session: &mut Session) {
    core_render::refresh(session).unwrap();
}

#[test]
fn selection_plus_move_consumes_the_box() {
    let _g = lock();
    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("dest");
    fs::create_dir(&dest).unwrap();
    fs::write(tmp.path().join("a.txt"), "a").unwrap();
    fs::write(tmp.path().join("b.txt"), "b").unwrap();
    let mut s = session_at(tmp.path());
    refresh(&mut s);

    assert_eq!(run(&mut s, "s a.txt b.txt"), 0);
    assert_eq!(s.selbox.len(), 2);

    let code = run(&mut s, &format!("m sel {}", dest.display()));
    assert_eq!(code, 0);
    assert!(dest.join("a.txt").exists());
    assert!(dest.join("b.txt").exists());
    assert!(s.selbox.is_empty(), "a consumed selection deselects all");

    refresh(&mut s);
    assert!(s.entry_by_name("a.txt").is_none());
    assert!(s.entry_by_name("b.txt").is_none());
}

#[test]
fn auto_cd_on_bare_directory_name() {
    let _g = lock();
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir(tmp.path().join("docs")).unwrap();
    let mut s = session_at(tmp.path());
    refresh(&mut s);

    let hist_before = s.dirhist.len();
    assert_eq!(run(&mut s, "docs"), 0);
    assert!(s.cwd().ends_with("docs"));
    assert_eq!(s.dirhist.len(), hist_before + 1);
}

#[test]
fn eln_auto_cd_through_expansion() {
    let _g = lock();
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir(tmp.path().join("only")).unwrap();
    let mut s = session_at(tmp.path());
    refresh(&mut s);
    // "1" expands to "only/" and then auto-cds.
    assert_eq!(run(&mut s, "1"), 0);
    assert!(s.cwd().ends_with("only"));
}

#[test]
fn tag_then_expand_through_input() {
    let _g = lock();
    let tmp = tempfile::tempdir().unwrap();
    let secret = tmp.path().join("secret.conf");
    fs::write(&secret, "x").unwrap();
    let mut s = session_at(tmp.path());
    refresh(&mut s);

    assert_eq!(run(&mut s, "tag add secret.conf :secret"), 0);
    let canon = fs::canonicalize(&secret).unwrap();
    // One symlink, named after the encoded absolute path, pointing home.
    let files = s.tags.files("secret").unwrap();
    assert_eq!(files, vec![canon.clone()]);

    let Expanded::Args(a) = expand_line("p t:secret", &s).unwrap() else {
        panic!("expected args");
    };
    assert_eq!(a.args[1], canon.to_string_lossy());

    assert_eq!(run(&mut s, "tag untag secret.conf :secret"), 0);
    assert!(s.tags.exists("secret"));
    assert_eq!(s.tags.count("secret"), 0);
}

#[test]
fn cd_b_f_round_trip() {
    let _g = lock();
    let tmp = tempfile::tempdir().unwrap();
    let sub = tmp.path().join("x");
    fs::create_dir(&sub).unwrap();
    let mut s = session_at(tmp.path());
    let start = s.cwd().to_path_buf();
    s.dirhist.push(start.clone());

    assert_eq!(run(&mut s, &format!("cd {}", sub.display())), 0);
    let there = s.cwd().to_path_buf();
    assert_eq!(run(&mut s, "b"), 0);
    assert_eq!(s.cwd(), start.as_path());
    assert_eq!(run(&mut s, "f"), 0);
    assert_eq!(s.cwd(), there.as_path());
}

#[test]
fn expanded_vectors_hold_no_empty_strings() {
    let _g = lock();
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("f1"), "x").unwrap();
    fs::write(tmp.path().join("f2"), "x").unwrap();
    let mut s = session_at(tmp.path());
    refresh(&mut s);
    for line in ["p 1-2", "s f1 f2", "o 1", "cd ..", "echo plain words"] {
        match expand_line(line, &s).unwrap() {
            Expanded::Args(a) => {
                assert!(!a.args.is_empty(), "{line}: empty vector");
                for arg in &a.args {
                    assert!(!arg.is_empty(), "{line}: empty element");
                }
            }
            other => panic!("{line}: unexpected {other:?}"),
        }
    }
}

#[test]
fn failed_expansion_leaves_state_untouched() {
    let _g = lock();
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("a"), "x").unwrap();
    let mut s = session_at(tmp.path());
    refresh(&mut s);
    let cwd = s.cwd().to_path_buf();
    let sel_before = s.selbox.len();

    assert!(matches!(
        expand_line("s 99", &s),
        Err(ExpandError::Expansion { .. })
    ));
    assert!(matches!(
        expand_line("m sel /tmp", &s),
        Err(ExpandError::Expansion { .. })
    ));
    assert_eq!(s.cwd(), cwd.as_path());
    assert_eq!(s.selbox.len(), sel_before);
}

#[test]
fn chained_internal_commands_respect_and() {
    let _g = lock();
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session_at(tmp.path());
    refresh(&mut s);
    // First segment fails; && suppresses the second.
    let code = run(&mut s, "cd /no/such/dir-xyz && md created");
    assert_ne!(code, 0);
    assert!(!tmp.path().join("created").exists());
    // With ';' the second runs regardless.
    let code = run(&mut s, "cd /no/such/dir-xyz ; md created");
    assert_eq!(code, 0);
    assert!(tmp.path().join("created").exists());
}

#[test]
fn user_variable_assignment_and_use() {
    let _g = lock();
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("deep");
    fs::create_dir(&target).unwrap();
    let mut s = session_at(tmp.path());
    assert_eq!(run(&mut s, &format!("d={}", target.display())), 0);
    assert_eq!(run(&mut s, "cd $d"), 0);
    assert_eq!(s.cwd(), fs::canonicalize(&target).unwrap().as_path());
}
