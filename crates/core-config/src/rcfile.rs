//! The `clifmrc` line grammar.
//!
//! `#` and blank lines are ignored. Plain `KEY=VALUE` pairs go to
//! [`Options::set_key`]. Three multi-line constructs are collected for the
//! session to install:
//!
//! ```text
//! alias NAME='CMD'
//! promptcmd CMD
//! autocmd GLOB OPT1=VAL,OPT2=VAL,!CMD
//! ```

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::options::{Options, PartialOptions};
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct AutocmdSpec {
    pub pattern: String,
    pub opts: PartialOptions,
    pub cmd: Option<String>,
}

#[derive(Debug, Default)]
pub struct RcData {
    pub aliases: Vec<(String, String)>,
    pub prompt_cmds: Vec<String>,
    pub autocmds: Vec<AutocmdSpec>,
}

/// Strip one level of single quotes, if balanced.
fn unquote(v: &str) -> &str {
    let v = v.trim();
    if v.len() >= 2 && v.starts_with('\'') && v.ends_with('\'') {
        &v[1..v.len() - 1]
    } else {
        v
    }
}

pub fn parse_str(content: &str, opts: &mut Options) -> RcData {
    let mut data = RcData::default();
    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("alias ") {
            match rest.split_once('=') {
                Some((name, cmd)) if !name.trim().is_empty() => {
                    data.aliases
                        .push((name.trim().to_string(), unquote(cmd).to_string()));
                }
                _ => warn!(target: "config.rc", line = lineno + 1, "malformed alias"),
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("promptcmd ") {
            data.prompt_cmds.push(rest.trim().to_string());
            continue;
        }
        if let Some(rest) = line.strip_prefix("autocmd ") {
            match parse_autocmd(rest) {
                Some(spec) => data.autocmds.push(spec),
                None => warn!(target: "config.rc", line = lineno + 1, "malformed autocmd"),
            }
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => opts.set_key(key.trim(), unquote(value)),
            None => warn!(target: "config.rc", line = lineno + 1, "expected KEY=VALUE"),
        }
    }
    data
}

/// Load and parse `clifmrc`. A missing file is not an error (defaults apply).
pub fn load(path: &Path, opts: &mut Options) -> Result<RcData, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(parse_str(&content, opts)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RcData::default()),
        Err(e) => Err(ConfigError::io(path, e)),
    }
}

fn parse_autocmd(rest: &str) -> Option<AutocmdSpec> {
    let (pattern, body) = rest.trim().split_once(char::is_whitespace)?;
    let mut opts = PartialOptions::default();
    let mut cmd = None;
    for frag in body.split(',') {
        let frag = frag.trim();
        if frag.is_empty() {
            continue;
        }
        if let Some(c) = frag.strip_prefix('!') {
            cmd = Some(c.to_string());
            continue;
        }
        match frag.split_once('=') {
            Some((k, v)) => {
                if !opts.set_key(k.trim(), v.trim()) {
                    return None;
                }
            }
            None => return None,
        }
    }
    if opts.is_empty() && cmd.is_none() {
        return None;
    }
    Some(AutocmdSpec {
        pattern: pattern.to_string(),
        opts,
        cmd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SortKey;

    #[test]
    fn key_values_and_comments() {
        let mut o = Options::default();
        let src = "# comment\n\nShowHiddenFiles=true\nSort='size'\n";
        parse_str(src, &mut o);
        assert!(o.show_hidden);
        assert_eq!(o.sort, SortKey::Size);
    }

    #[test]
    fn alias_and_promptcmd() {
        let mut o = Options::default();
        let src = "alias ll='ls -l'\npromptcmd echo hi\n";
        let data = parse_str(src, &mut o);
        assert_eq!(data.aliases, vec![("ll".to_string(), "ls -l".to_string())]);
        assert_eq!(data.prompt_cmds, vec!["echo hi".to_string()]);
    }

    #[test]
    fn autocmd_with_options_and_command() {
        let mut o = Options::default();
        let src = "autocmd /tmp/* LongViewMode=true,Sort=size,!echo entered\n";
        let data = parse_str(src, &mut o);
        assert_eq!(data.autocmds.len(), 1);
        let a = &data.autocmds[0];
        assert_eq!(a.pattern, "/tmp/*");
        assert_eq!(a.opts.long_view, Some(true));
        assert_eq!(a.opts.sort, Some(SortKey::Size));
        assert_eq!(a.cmd.as_deref(), Some("echo entered"));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let mut o = Options::default();
        let src = "garbage\nalias =broken\nautocmd onlypattern\n";
        let data = parse_str(src, &mut o);
        assert!(data.aliases.is_empty());
        assert!(data.autocmds.is_empty());
        assert_eq!(o, Options::default());
    }

    #[test]
    fn missing_rc_is_defaults() {
        let mut o = Options::default();
        let tmp = tempfile::tempdir().unwrap();
        let data = load(&tmp.path().join("clifmrc"), &mut o).unwrap();
        assert!(data.aliases.is_empty());
        assert_eq!(o, Options::default());
    }
}
