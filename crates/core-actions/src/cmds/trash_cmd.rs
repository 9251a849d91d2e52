//! `t`/`trash` and `u`/`untrash`.

use core_state::Session;

use super::{fail, usage};
use crate::exec::exit;
use crate::expand::arg_to_path;
use crate::trash::Trash;

/// `t FILE...` moves operands to the trash; `t ls` lists; `t clear`/`t
/// empty` empties.
pub fn trash_cmd(session: &mut Session, args: &[String]) -> i32 {
    let trash = Trash::new(&session.paths.trash_dir);
    match args.get(1).map(String::as_str) {
        None | Some("ls") => {
            let listed = trash.list();
            if listed.is_empty() {
                println!("trash is empty");
                return exit::SUCCESS;
            }
            for (i, tf) in listed.iter().enumerate() {
                println!(
                    "{:>3} {} ({}, deleted {})",
                    i + 1,
                    tf.name,
                    tf.original.display(),
                    tf.deleted_at
                );
            }
            exit::SUCCESS
        }
        Some("clear") | Some("empty") => match trash.empty() {
            Ok(n) => {
                println!("{n} file(s) removed from the trash");
                exit::SUCCESS
            }
            Err(e) => fail(session, e.to_string()),
        },
        Some(_) => {
            let cwd = session.cwd().to_path_buf();
            let mut trashed = 0usize;
            for arg in &args[1..] {
                let path = arg_to_path(arg, &cwd);
                match trash.trash(&path) {
                    Ok(_) => trashed += 1,
                    Err(e) => return fail(session, format!("t: {e}")),
                }
            }
            println!("{trashed} file(s) trashed");
            session.needs_refresh = true;
            exit::SUCCESS
        }
    }
}

/// `u` with no arguments presents the trashed files; `u NAME...` restores by
/// name, `u *` restores everything.
pub fn untrash_cmd(session: &mut Session, args: &[String]) -> i32 {
    let trash = Trash::new(&session.paths.trash_dir);
    let listed = trash.list();
    if listed.is_empty() {
        println!("trash is empty");
        return exit::SUCCESS;
    }

    let names: Vec<String> = if args.len() < 2 {
        // Numbered menu, one line of indices read from the terminal.
        for (i, tf) in listed.iter().enumerate() {
            println!("{:>3} {} ({})", i + 1, tf.name, tf.original.display());
        }
        print!("restore (1-{}, a = all, q): ", listed.len());
        use std::io::{BufRead, Write};
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return exit::FAILURE;
        }
        let choice = line.trim();
        if choice.is_empty() || choice == "q" {
            return exit::SUCCESS;
        }
        if choice == "a" {
            listed.iter().map(|t| t.name.clone()).collect()
        } else {
            let mut picked = Vec::new();
            for tok in choice.split_whitespace() {
                match tok.parse::<usize>() {
                    Ok(n) if n >= 1 && n <= listed.len() => {
                        picked.push(listed[n - 1].name.clone());
                    }
                    _ => return usage(session, "u [NAME... | *]"),
                }
            }
            picked
        }
    } else if args[1] == "*" || args[1] == "a" || args[1] == "all" {
        listed.iter().map(|t| t.name.clone()).collect()
    } else {
        args[1..].to_vec()
    };

    let mut restored = 0usize;
    for name in names {
        match trash.restore(&name) {
            Ok(_) => restored += 1,
            Err(e) => return fail(session, format!("u: {e}")),
        }
    }
    println!("{restored} file(s) restored");
    session.needs_refresh = true;
    exit::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::{ColorScheme, ConfigPaths, Options};
    use std::fs;
    use std::path::Path;

    fn session_at(dir: &Path) -> Session {
        let paths = ConfigPaths::resolve(Some(dir.join("cfg")), None, true).unwrap();
        let mut s = Session::new(
            paths,
            Options::default(),
            ColorScheme::default(),
            dir.to_path_buf(),
        );
        // Keep test trash inside the fixture.
        s.paths.trash_dir = dir.join("Trash");
        s
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn trash_then_untrash_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        let f = tmp.path().join("a.txt");
        fs::write(&f, "x").unwrap();
        let mut s = session_at(tmp.path());
        assert_eq!(trash_cmd(&mut s, &strings(&["t", "a.txt"])), 0);
        assert!(!f.exists());
        assert_eq!(untrash_cmd(&mut s, &strings(&["u", "a.txt"])), 0);
        assert!(f.exists());
    }

    #[test]
    fn untrash_all_with_star() {
        let tmp = tempfile::tempdir().unwrap();
        for n in ["a", "b"] {
            fs::write(tmp.path().join(n), "x").unwrap();
        }
        let mut s = session_at(tmp.path());
        assert_eq!(trash_cmd(&mut s, &strings(&["t", "a", "b"])), 0);
        assert_eq!(untrash_cmd(&mut s, &strings(&["u", "*"])), 0);
        assert!(tmp.path().join("a").exists());
        assert!(tmp.path().join("b").exists());
    }

    #[test]
    fn missing_operand_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = session_at(tmp.path());
        assert_eq!(trash_cmd(&mut s, &strings(&["t", "ghost"])), 1);
    }
}
