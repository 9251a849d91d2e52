//! Small expansion helpers: fastback, tilde, and shell escaping.

use std::path::{Path, PathBuf};

use shell_quote::{Bash, Quote};

/// Characters that must be backslash-escaped for a word to survive `/bin/sh`.
const SHELL_SPECIALS: &str = " \t\n\"'$`&;|(){}<>*?[]!#~";

/// Backslash-escape shell specials (the token-vector word form).
pub fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if SHELL_SPECIALS.contains(c) || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Strip the backslash escapes of [`escape_str`] to recover the real value.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Strong quoting for a whole path interpolated into a `sh -c` line.
pub fn shell_quote_path(s: &str) -> String {
    if !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'/' | b'-'))
    {
        return s.to_string();
    }
    <Bash as Quote<String>>::quote(s)
}

/// `...` -> two levels up, `....` -> three, and the `...N` digit form.
/// Returns an absolute path anchored at `cwd`, stopping at the root.
pub fn fastback(token: &str, cwd: &Path) -> Option<PathBuf> {
    let rest = token.strip_prefix("...")?;
    let levels = if rest.is_empty() {
        2
    } else if rest.chars().all(|c| c == '.') {
        2 + rest.len()
    } else if let Ok(n) = rest.parse::<usize>() {
        n
    } else {
        return None;
    };
    let mut path = cwd.to_path_buf();
    for _ in 0..levels {
        if !path.pop() {
            break;
        }
    }
    if path.as_os_str().is_empty() {
        path = PathBuf::from("/");
    }
    Some(path)
}

/// `~` and `~user` expansion. `~user` resolves through `/etc/passwd`.
pub fn tilde_expand(token: &str, home: &Path) -> Option<String> {
    let rest = token.strip_prefix('~')?;
    if rest.is_empty() {
        return Some(home.to_string_lossy().to_string());
    }
    if let Some(path) = rest.strip_prefix('/') {
        return Some(format!("{}/{}", home.to_string_lossy(), path));
    }
    let (user, tail) = match rest.split_once('/') {
        Some((u, t)) => (u, Some(t)),
        None => (rest, None),
    };
    let user_home = passwd_home(user)?;
    Some(match tail {
        Some(t) => format!("{user_home}/{t}"),
        None => user_home,
    })
}

fn passwd_home(user: &str) -> Option<String> {
    let passwd = std::fs::read_to_string("/etc/passwd").ok()?;
    for line in passwd.lines() {
        let mut fields = line.split(':');
        if fields.next() == Some(user) {
            return fields.nth(4).map(str::to_string);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_unescape_round_trip() {
        for s in ["plain", "a file", "we$ird;(name)", "tab\there"] {
            assert_eq!(unescape(&escape_str(s)), s);
        }
        assert_eq!(escape_str("a b"), r"a\ b");
        assert_eq!(escape_str("plain"), "plain");
    }

    #[test]
    fn quote_path_leaves_plain_words() {
        assert_eq!(shell_quote_path("/abs/path.txt"), "/abs/path.txt");
        assert_ne!(shell_quote_path("a file"), "a file");
    }

    #[test]
    fn fastback_dot_and_digit_forms() {
        let cwd = Path::new("/a/b/c/d");
        assert_eq!(fastback("...", cwd), Some(PathBuf::from("/a/b")));
        assert_eq!(fastback("....", cwd), Some(PathBuf::from("/a")));
        assert_eq!(fastback("...3", cwd), Some(PathBuf::from("/a")));
        assert_eq!(fastback("...9", cwd), Some(PathBuf::from("/")));
        assert_eq!(fastback("..", cwd), None);
        assert_eq!(fastback("...x", cwd), None);
    }

    #[test]
    fn tilde_bare_and_subpath() {
        let home = Path::new("/home/u");
        assert_eq!(tilde_expand("~", home), Some("/home/u".to_string()));
        assert_eq!(tilde_expand("~/x", home), Some("/home/u/x".to_string()));
        assert_eq!(tilde_expand("no-tilde", home), None);
    }

    #[test]
    fn tilde_user_from_passwd() {
        let home = Path::new("/home/u");
        // root exists on any Unix test host.
        let r = tilde_expand("~root", home);
        if let Some(p) = r {
            assert!(p.starts_with('/'));
        }
        assert_eq!(tilde_expand("~no-such-user-xyz", home), None);
    }
}
