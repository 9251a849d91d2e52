use std::fs;
use std::path::Path;

use core_config::{ColorScheme, ConfigPaths, Options};
use core_state::{Bookmark, EntryType, FileEntry, Session};

use super::*;
use crate::ExpandError;

fn session_at(dir: &Path) -> Session {
    let paths = ConfigPaths::resolve(Some(dir.join("cfg")), None, true).unwrap();
    Session::new(
        paths,
        Options::default(),
        ColorScheme::default(),
        dir.to_path_buf(),
    )
}

fn with_entries(session: &mut Session, names: &[(&str, bool)]) {
    for (name, is_dir) in names {
        let mut e = FileEntry::named(name);
        if *is_dir {
            e.ftype = EntryType::Dir;
        }
        session.entries.push(e);
    }
}

fn args_of(exp: Expanded) -> Vec<String> {
    match exp {
        Expanded::Args(a) => a.args,
        other => panic!("expected Args, got {other:?}"),
    }
}

#[test]
fn fused_parameter_splits() {
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session_at(tmp.path());
    s.opts.show_hidden = false;
    with_entries(&mut s, &[("a", false), ("b", false), ("c", false)]);
    let args = args_of(expand_line("p3", &s).unwrap());
    assert_eq!(args, vec!["p", "c"]);
}

#[test]
fn fused_split_requires_internal_command() {
    let tmp = tempfile::tempdir().unwrap();
    let s = session_at(tmp.path());
    // `xyz3` is not an internal command: stays a single token.
    let args = args_of(expand_line("xyz3", &s).unwrap());
    assert_eq!(args, vec!["xyz3"]);
}

#[test]
fn leading_semicolon_goes_to_shell_verbatim() {
    let tmp = tempfile::tempdir().unwrap();
    let s = session_at(tmp.path());
    assert_eq!(
        expand_line(";ls -l 'unclosed", &s).unwrap(),
        Expanded::Shell {
            line: "ls -l 'unclosed".to_string()
        }
    );
    assert!(matches!(
        expand_line(":df -h", &s).unwrap(),
        Expanded::Shell { .. }
    ));
}

#[test]
fn shell_constructs_bypass_the_pipeline() {
    let tmp = tempfile::tempdir().unwrap();
    let s = session_at(tmp.path());
    assert!(matches!(
        expand_line("for f in *; do echo $f; done", &s).unwrap(),
        Expanded::Shell { .. }
    ));
}

#[test]
fn assignment_detected() {
    let tmp = tempfile::tempdir().unwrap();
    let s = session_at(tmp.path());
    assert_eq!(
        expand_line("NAME='some value'", &s).unwrap(),
        Expanded::Assign {
            name: "NAME".to_string(),
            value: "some value".to_string()
        }
    );
    // Digit-led or spaced '=' is not an assignment.
    assert!(!matches!(
        expand_line("9x=1", &s).unwrap(),
        Expanded::Assign { .. }
    ));
}

#[test]
fn chain_with_internal_command_is_split() {
    let tmp = tempfile::tempdir().unwrap();
    let s = session_at(tmp.path());
    let Expanded::Chain { segments } = expand_line("cd /tmp && ls", &s).unwrap() else {
        panic!("expected chain");
    };
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].line, "cd /tmp");
    assert!(!segments[0].and_prev);
    assert_eq!(segments[1].line, "ls");
    assert!(segments[1].and_prev);
}

#[test]
fn fully_external_chain_goes_to_shell() {
    let tmp = tempfile::tempdir().unwrap();
    let s = session_at(tmp.path());
    assert!(matches!(
        expand_line("date; uptime", &s).unwrap(),
        Expanded::Shell { .. }
    ));
}

#[test]
fn background_marker_as_token_and_suffix() {
    let tmp = tempfile::tempdir().unwrap();
    let s = session_at(tmp.path());
    let Expanded::Args(a) = expand_line("xterm &", &s).unwrap() else {
        panic!()
    };
    assert!(a.background);
    assert_eq!(a.args, vec!["xterm"]);
    let Expanded::Args(a) = expand_line("xterm&", &s).unwrap() else {
        panic!()
    };
    assert!(a.background);
}

#[test]
fn eln_expansion_appends_slash_for_dirs() {
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session_at(tmp.path());
    with_entries(&mut s, &[("docs", true), ("a.txt", false)]);
    let args = args_of(expand_line("o 1", &s).unwrap());
    assert_eq!(args, vec!["o", "docs/"]);
    let args = args_of(expand_line("o 2", &s).unwrap());
    assert_eq!(args, vec!["o", "a.txt"]);
}

#[test]
fn eln_out_of_range_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session_at(tmp.path());
    with_entries(&mut s, &[("a", false)]);
    assert!(matches!(
        expand_line("o 5", &s),
        Err(ExpandError::Expansion { .. })
    ));
}

#[test]
fn eln_not_expanded_for_literal_int_commands() {
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session_at(tmp.path());
    with_entries(&mut s, &[("a", false), ("b", false)]);
    let args = args_of(expand_line("ws 2", &s).unwrap());
    assert_eq!(args, vec!["ws", "2"]);
    let args = args_of(expand_line("st 1", &s).unwrap());
    assert_eq!(args, vec!["st", "1"]);
}

#[test]
fn range_expands_to_eln_names() {
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session_at(tmp.path());
    with_entries(
        &mut s,
        &[
            ("file1", false),
            ("file2", false),
            ("file3", false),
            ("file4", false),
            ("file5", false),
        ],
    );
    let args = args_of(expand_line("p 2-4", &s).unwrap());
    assert_eq!(args, vec!["p", "file2", "file3", "file4"]);
}

#[test]
fn bad_ranges_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session_at(tmp.path());
    with_entries(&mut s, &[("a", false), ("b", false)]);
    assert!(expand_line("p 1-1", &s).is_err());
    assert!(expand_line("p 2-1", &s).is_err());
    assert!(expand_line("p 1-9", &s).is_err());
}

#[test]
fn sel_expands_in_argument_position() {
    let tmp = tempfile::tempdir().unwrap();
    let f1 = tmp.path().join("one.txt");
    let f2 = tmp.path().join("two.txt");
    fs::write(&f1, "x").unwrap();
    fs::write(&f2, "x").unwrap();
    let mut s = session_at(tmp.path());
    s.selbox.add(f1.clone());
    s.selbox.add(f2.clone());
    let Expanded::Args(a) = expand_line("m sel /dest", &s).unwrap() else {
        panic!()
    };
    assert!(a.used_sel);
    assert_eq!(
        a.args,
        vec![
            "m".to_string(),
            f1.to_string_lossy().to_string(),
            f2.to_string_lossy().to_string(),
            "/dest".to_string()
        ]
    );
}

#[test]
fn sel_with_empty_selection_rejects_the_line() {
    let tmp = tempfile::tempdir().unwrap();
    let s = session_at(tmp.path());
    assert!(matches!(
        expand_line("m sel /dest", &s),
        Err(ExpandError::Expansion { .. })
    ));
}

#[test]
fn sel_as_command_is_not_expanded() {
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session_at(tmp.path());
    with_entries(&mut s, &[("a", false)]);
    let args = args_of(expand_line("sel a", &s).unwrap());
    assert_eq!(args[0], "sel");
}

#[test]
fn bookmark_name_expands_unless_shadowed() {
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session_at(tmp.path());
    s.bookmarks.add(Bookmark {
        shortcut: None,
        name: Some("work".to_string()),
        path: "/home/u/work".to_string(),
    });
    let args = args_of(expand_line("cd work", &s).unwrap());
    assert_eq!(args, vec!["cd", "/home/u/work"]);
    // A CWD entry with the same name wins.
    with_entries(&mut s, &[("work", true)]);
    let args = args_of(expand_line("cd work", &s).unwrap());
    assert_eq!(args, vec!["cd", "work"]);
}

#[test]
fn pinned_comma_placeholder() {
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session_at(tmp.path());
    s.pinned = Some("/pinned/dir".into());
    let args = args_of(expand_line("cd ,", &s).unwrap());
    assert_eq!(args, vec!["cd", "/pinned/dir"]);
}

#[test]
fn user_vars_shadow_environment() {
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session_at(tmp.path());
    s.user_vars
        .insert("proj".to_string(), "/my/project".to_string());
    let args = args_of(expand_line("cd $proj", &s).unwrap());
    assert_eq!(args, vec!["cd", "/my/project"]);
    // HOME is always present in the environment.
    let args = args_of(expand_line("cd $HOME", &s).unwrap());
    assert_eq!(args[1], std::env::var("HOME").unwrap());
}

#[test]
fn undefined_variable_rejects_internal_lines() {
    let tmp = tempfile::tempdir().unwrap();
    let s = session_at(tmp.path());
    assert!(matches!(
        expand_line("cd $no_such_var_xyz", &s),
        Err(ExpandError::Expansion { .. })
    ));
}

#[test]
fn tag_expression_expands_to_tagged_files() {
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session_at(tmp.path());
    let f = tmp.path().join("secret.txt");
    fs::write(&f, "x").unwrap();
    s.tags.tag_file(&f, "secret").unwrap();
    let args = args_of(expand_line("o t:secret", &s).unwrap());
    assert_eq!(args.len(), 2);
    assert!(args[1].ends_with("secret.txt"), "got {:?}", args[1]);
}

#[test]
fn missing_tag_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let s = session_at(tmp.path());
    assert!(matches!(
        expand_line("o t:nope", &s),
        Err(ExpandError::Expansion { .. })
    ));
}

#[test]
fn glob_expands_for_internal_commands() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("fa.txt"), "x").unwrap();
    fs::write(tmp.path().join("fb.txt"), "x").unwrap();
    fs::write(tmp.path().join("other.rs"), "x").unwrap();
    let s = session_at(tmp.path());
    let pattern = tmp.path().join("f*.txt");
    let args = args_of(expand_line(&format!("s {}", pattern.display()), &s).unwrap());
    assert_eq!(args.len(), 3);
    assert!(args[1].ends_with("fa.txt"));
    assert!(args[2].ends_with("fb.txt"));
}

#[test]
fn glob_skipped_for_external_commands() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("fa.txt"), "x").unwrap();
    let s = session_at(tmp.path());
    let pattern = tmp.path().join("f*.txt");
    let line = format!("vim {}", pattern.display());
    let args = args_of(expand_line(&line, &s).unwrap());
    assert_eq!(args[1], pattern.display().to_string());
}

#[test]
fn brace_expansion_without_glob_chars() {
    let tmp = tempfile::tempdir().unwrap();
    let s = session_at(tmp.path());
    let args = args_of(expand_line("md new/{a,b}", &s).unwrap());
    assert_eq!(args, vec!["md", "new/a", "new/b"]);
}

#[test]
fn regex_matches_cwd_names_and_dedupes() {
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session_at(tmp.path());
    with_entries(
        &mut s,
        &[("alpha.rs", false), ("beta.rs", false), ("notes.txt", false)],
    );
    let args = args_of(expand_line(r"s .*\.rs$ .*\.rs$", &s).unwrap());
    assert_eq!(args, vec!["s", "alpha.rs", "beta.rs"]);
}

#[test]
fn quote_mismatch_is_fatal_for_the_line() {
    let tmp = tempfile::tempdir().unwrap();
    let s = session_at(tmp.path());
    assert_eq!(
        expand_line("o 'unclosed", &s),
        Err(ExpandError::QuoteMismatch)
    );
}

#[test]
fn empty_line_expands_to_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let s = session_at(tmp.path());
    assert_eq!(expand_line("   ", &s).unwrap(), Expanded::Empty);
}

#[test]
fn quoted_tokens_are_not_expanded() {
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session_at(tmp.path());
    with_entries(&mut s, &[("9", false)]);
    // A quoted "9" stays literal even though ELN 9 would be out of range.
    let args = args_of(expand_line("o '9'", &s).unwrap());
    assert_eq!(args, vec!["o", "9"]);
}

#[test]
fn dot_and_dotdot_become_absolute() {
    let tmp = tempfile::tempdir().unwrap();
    let sub = tmp.path().join("sub");
    fs::create_dir(&sub).unwrap();
    let s = session_at(&sub);
    let args = args_of(expand_line("s ..", &s).unwrap());
    let expected = fs::canonicalize(tmp.path()).unwrap();
    assert_eq!(args[1], expected.to_string_lossy());
}
