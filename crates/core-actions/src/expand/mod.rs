//! The input expansion pipeline.
//!
//! One input line becomes a dispatchable argument vector through ordered
//! stages: fused-parameter split, shell escape, chain/conditional detection,
//! variable assignment, tokenisation, the background marker, the builtin
//! expansions (file URI, dot paths, fastback, pinned dir, bookmarks, ranges,
//! `sel`, ELNs, user and environment variables, stdin-dir links, tags,
//! tilde), then — for internal commands only — glob/brace expansion, command
//! substitution, and a final regex pass against CWD entry names.
//!
//! The pipeline is transactional: it only reads the session and either
//! returns a complete vector or an error; no state is touched on failure.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use core_state::Session;
use tracing::trace;

pub mod braces;
pub mod helpers;
pub mod tokenize;

use crate::{is_internal, takes_elns, ExpandError};
use braces::expand_braces;
use helpers::{escape_str, fastback, tilde_expand, unescape};
use tokenize::{tokenize, Token};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSegment {
    pub line: String,
    /// Run only when the previous segment exited zero (`&&`).
    pub and_prev: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgsLine {
    pub args: Vec<String>,
    pub background: bool,
    /// The selection box was spliced into this line.
    pub used_sel: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expanded {
    /// Nothing to do.
    Empty,
    /// Forward to `/bin/sh` verbatim, skipping every remaining stage.
    Shell { line: String },
    /// `NAME=VALUE` user variable assignment.
    Assign { name: String, value: String },
    /// Chained/conditional commands; each re-enters the pipeline.
    Chain { segments: Vec<ChainSegment> },
    Args(ArgsLine),
}

/// Working token: expansion results are literal (exempt from glob/regex).
#[derive(Debug, Clone)]
struct WTok {
    text: String,
    quoted: bool,
    literal: bool,
}

impl WTok {
    fn from(t: Token) -> Self {
        Self {
            text: t.text,
            quoted: t.quoted,
            literal: false,
        }
    }

    fn lit(text: String) -> Self {
        Self {
            text,
            quoted: false,
            literal: true,
        }
    }
}

pub fn expand_line(input: &str, session: &Session) -> Result<Expanded, ExpandError> {
    let line = input.trim();
    if line.is_empty() {
        return Ok(Expanded::Empty);
    }

    // 1) Fused parameter: `p3` -> `p 3`.
    let fused;
    let line = match split_fused(line) {
        Some(s) => {
            fused = s;
            fused.as_str()
        }
        None => line,
    };

    // 2) Shell escape: `;cmd`, `:cmd`, or shell constructs go out verbatim.
    if let Some(rest) = line.strip_prefix(';').or_else(|| line.strip_prefix(':')) {
        return Ok(Expanded::Shell {
            line: rest.trim_start().to_string(),
        });
    }
    if looks_like_shell_construct(line) {
        return Ok(Expanded::Shell {
            line: line.to_string(),
        });
    }

    // 3) Chained commands: only worth intercepting when an internal command
    //    participates; a fully external chain belongs to the shell.
    if let Some(segments) = split_chain(line) {
        let any_internal = segments.iter().any(|seg| {
            let head = seg.line.split_whitespace().next().unwrap_or("");
            is_internal(head) || parse_assignment(&seg.line).is_some()
        });
        if any_internal {
            return Ok(Expanded::Chain { segments });
        }
        return Ok(Expanded::Shell {
            line: line.to_string(),
        });
    }

    // 4) Variable assignment.
    if let Some((name, value)) = parse_assignment(line) {
        return Ok(Expanded::Assign { name, value });
    }

    // 5) Tokenise.
    let tokens = tokenize(line)?;
    if tokens.is_empty() {
        return Ok(Expanded::Empty);
    }
    let mut toks: Vec<WTok> = tokens.into_iter().map(WTok::from).collect();

    // 6) Background marker: a trailing `&` token or suffix.
    let mut background = false;
    if let Some(last) = toks.last_mut() {
        if last.text == "&" {
            background = true;
            toks.pop();
        } else if last.text.ends_with('&') && !last.text.ends_with("\\&") {
            background = true;
            last.text.pop();
        }
    }
    if toks.is_empty() {
        return Ok(Expanded::Empty);
    }

    // Trash-as-rm: a lone `r` head becomes `t`.
    if session.opts.tr_as_rm && toks[0].text == "r" {
        toks[0].text = "t".to_string();
    }

    let cmd = toks[0].text.clone();
    let internal = is_internal(&cmd);

    // 7a-e + m) Per-token rewrites.
    stage_simple(&mut toks, session);
    // 7f) Ranges.
    let mut toks = stage_ranges(toks, session)?;
    // 7g) The selection keyword.
    let used_sel = stage_sel(&mut toks, session)?;
    // 7h-k) ELNs, user vars, environment, stdin-dir links.
    stage_values(&mut toks, session, &cmd, internal)?;
    // 7l) Tag expressions.
    let mut toks = stage_tags(toks, session)?;

    if internal {
        // 8) Glob / brace.
        toks = stage_glob(toks);
        // 9) Command substitution.
        toks = stage_subst(toks);
        // 10) Regex against CWD names.
        toks = stage_regex(toks, session);
    }

    let args: Vec<String> = toks.into_iter().map(|t| t.text).collect();
    if args.is_empty() {
        return Ok(Expanded::Empty);
    }
    trace!(target: "expand", ?args, background, used_sel, "line expanded");
    Ok(Expanded::Args(ArgsLine {
        args,
        background,
        used_sel,
    }))
}

/// `p3` -> `p 3` when the alpha prefix is an internal command.
fn split_fused(line: &str) -> Option<String> {
    let first = line.split_whitespace().next()?;
    let split_at = first.find(|c: char| c.is_ascii_digit())?;
    let (alpha, digits) = first.split_at(split_at);
    if alpha.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !is_internal(alpha) {
        return None;
    }
    Some(format!("{alpha} {digits}{}", &line[first.len()..]))
}

/// Shell function definitions, loops, subshells: let `/bin/sh` have them.
fn looks_like_shell_construct(line: &str) -> bool {
    if line.starts_with('(') {
        return true;
    }
    let first = line.split_whitespace().next().unwrap_or("");
    if matches!(first, "if" | "while" | "for" | "case" | "until") {
        return true;
    }
    first.ends_with("()") || line.contains("() {")
}

/// `NAME=VALUE` with no whitespace before `=` and a non-digit first char.
fn parse_assignment(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    let eq = line.find('=')?;
    if eq == 0 {
        return None;
    }
    let name = &line[..eq];
    if name.chars().next()?.is_ascii_digit() {
        return None;
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return None;
    }
    let value = line[eq + 1..].trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    Some((name.to_string(), value.to_string()))
}

/// Split on top-level `;` and `&&`. Returns None when the line has neither.
fn split_chain(line: &str) -> Option<Vec<ChainSegment>> {
    let bytes = line.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0usize;
    let mut and_prev = false;
    let mut i = 0usize;
    let mut in_single = false;
    let mut in_double = false;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\\' => i += 1,
            b'\'' if !in_double => in_single = !in_single,
            b'"' if !in_single => in_double = !in_double,
            b';' if !in_single && !in_double && i > 0 => {
                segments.push(ChainSegment {
                    line: line[start..i].trim().to_string(),
                    and_prev,
                });
                and_prev = false;
                start = i + 1;
            }
            b'&' if !in_single && !in_double && i + 1 < bytes.len() && bytes[i + 1] == b'&' => {
                segments.push(ChainSegment {
                    line: line[start..i].trim().to_string(),
                    and_prev,
                });
                and_prev = true;
                start = i + 2;
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    if segments.is_empty() {
        return None;
    }
    let tail = line[start..].trim();
    if !tail.is_empty() {
        segments.push(ChainSegment {
            line: tail.to_string(),
            and_prev,
        });
    }
    segments.retain(|s| !s.line.is_empty());
    if segments.len() < 2 {
        return None;
    }
    Some(segments)
}

/// Stages 7a-e and 7m: URI strip, dot paths, fastback, pinned dir, bookmark
/// names, tilde.
fn stage_simple(toks: &mut [WTok], session: &Session) {
    let cwd = session.cwd().to_path_buf();
    for tok in toks.iter_mut() {
        if tok.quoted {
            continue;
        }
        if let Some(rest) = tok.text.strip_prefix("file://") {
            tok.text = rest.to_string();
        }
        if tok.text == "." || tok.text == ".." {
            if let Ok(abs) = std::fs::canonicalize(cwd.join(&tok.text)) {
                tok.text = abs.to_string_lossy().to_string();
                tok.literal = true;
            }
            continue;
        }
        if tok.text.starts_with("...") {
            if let Some(p) = fastback(&tok.text, &cwd) {
                tok.text = p.to_string_lossy().to_string();
                tok.literal = true;
                continue;
            }
        }
        if tok.text == "," {
            if let Some(pinned) = &session.pinned {
                tok.text = pinned.to_string_lossy().to_string();
                tok.literal = true;
                continue;
            }
        }
        if session.opts.expand_bookmarks {
            if let Some(bm) = session.bookmarks.by_name(&tok.text) {
                // A CWD entry with the same name shadows the bookmark.
                if session.entry_by_name(&tok.text).is_none() {
                    tok.text = bm.path.clone();
                    tok.literal = true;
                    continue;
                }
            }
        }
        if tok.text.starts_with('~') {
            if let Some(expanded) = tilde_expand(&tok.text, &session.paths.home) {
                tok.text = expanded;
                tok.literal = true;
            }
        }
    }
}

/// Token shaped like `N-M` (digits, one dash).
fn parse_range(text: &str) -> Option<(usize, usize)> {
    let (a, b) = text.split_once('-')?;
    if a.is_empty() || b.is_empty() {
        return None;
    }
    if !a.bytes().all(|c| c.is_ascii_digit()) || !b.bytes().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((a.parse().ok()?, b.parse().ok()?))
}

/// Stage 7f: expand `N-M` into the enumerated ELN sequence. The range must
/// be strictly increasing and inside the listing.
fn stage_ranges(toks: Vec<WTok>, session: &Session) -> Result<Vec<WTok>, ExpandError> {
    let files = session.entries.len();
    let mut out = Vec::with_capacity(toks.len());
    for (i, tok) in toks.into_iter().enumerate() {
        if i == 0 || tok.quoted {
            out.push(tok);
            continue;
        }
        let Some((lo, hi)) = parse_range(&tok.text) else {
            out.push(tok);
            continue;
        };
        if hi <= lo {
            return Err(ExpandError::at(&tok.text, "range bounds must be increasing"));
        }
        if lo == 0 || hi > files {
            return Err(ExpandError::at(
                &tok.text,
                format!("range out of bounds (1-{files})"),
            ));
        }
        for n in lo..=hi {
            out.push(WTok::lit(n.to_string()));
        }
    }
    Ok(out)
}

/// Stage 7g: the `sel` keyword, argument position only.
fn stage_sel(toks: &mut Vec<WTok>, session: &Session) -> Result<bool, ExpandError> {
    let Some(pos) = toks
        .iter()
        .position(|t| !t.quoted && t.text == "sel")
        .filter(|&p| p > 0)
    else {
        return Ok(false);
    };
    if session.selbox.is_empty() {
        return Err(ExpandError::at("sel", "no selected files"));
    }
    let spliced: Vec<WTok> = session
        .selbox
        .iter()
        .map(|p| WTok::lit(escape_str(&p.to_string_lossy())))
        .collect();
    toks.splice(pos..=pos, spliced);
    Ok(true)
}

/// Stages 7h-k: ELNs, user variables, environment variables, stdin-dir
/// symlink resolution.
fn stage_values(
    toks: &mut [WTok],
    session: &Session,
    cmd: &str,
    internal: bool,
) -> Result<(), ExpandError> {
    let files = session.entries.len();
    let eln_ok = takes_elns(cmd);
    let in_stdin_dir = session
        .stdin_dir
        .as_deref()
        .is_some_and(|d| d == session.cwd());

    for tok in toks.iter_mut() {
        if tok.quoted || tok.literal {
            continue;
        }
        // ELN -> entry name (dirs gain a trailing slash).
        if eln_ok && !tok.text.is_empty() && tok.text.bytes().all(|b| b.is_ascii_digit()) {
            match tok.text.parse::<usize>() {
                Ok(n) if n >= 1 && n <= files => {
                    let entry = &session.entries[n - 1];
                    let mut name = escape_str(&entry.name);
                    if entry.is_dir() && !name.ends_with('/') {
                        name.push('/');
                    }
                    tok.text = name;
                    tok.literal = true;
                    continue;
                }
                _ if internal => {
                    return Err(ExpandError::at(
                        &tok.text,
                        format!("no such ELN (listing has {files} files)"),
                    ));
                }
                _ => {}
            }
        }
        // $name: user variables take precedence over the environment.
        if let Some(name) = tok.text.strip_prefix('$') {
            if !name.is_empty() && !name.starts_with('(') && !name.starts_with('{') {
                if let Some(value) = session.user_vars.get(name) {
                    tok.text = value.clone();
                    tok.literal = true;
                    continue;
                }
                if let Ok(value) = std::env::var(name) {
                    tok.text = value;
                    tok.literal = true;
                    continue;
                }
                if internal {
                    return Err(ExpandError::at(&tok.text, "undefined variable"));
                }
            }
        }
        // Inside the stdin virtual dir every name is a symlink to elsewhere.
        if in_stdin_dir {
            let path = session.cwd().join(unescape(&tok.text));
            if path
                .symlink_metadata()
                .map(|m| m.file_type().is_symlink())
                .unwrap_or(false)
            {
                if let Ok(target) = std::fs::canonicalize(&path) {
                    tok.text = escape_str(&target.to_string_lossy());
                    tok.literal = true;
                }
            }
        }
    }
    Ok(())
}

/// Stage 7l: `t:TAG` expands to every file carrying the tag.
fn stage_tags(toks: Vec<WTok>, session: &Session) -> Result<Vec<WTok>, ExpandError> {
    let mut out = Vec::with_capacity(toks.len());
    for (i, tok) in toks.into_iter().enumerate() {
        let is_tag = i > 0 && !tok.quoted && !tok.literal && tok.text.starts_with("t:");
        if !is_tag {
            out.push(tok);
            continue;
        }
        let tag = tok.text[2..].to_string();
        let files = session
            .tags
            .files(&tag)
            .map_err(|_| ExpandError::at(&tok.text, "no such tag"))?;
        if files.is_empty() {
            return Err(ExpandError::at(&tok.text, "tag has no files"));
        }
        for f in files {
            out.push(WTok::lit(escape_str(&f.to_string_lossy())));
        }
    }
    Ok(out)
}

/// Stage 8: brace expansion plus pathname globbing (internal commands only).
/// Patterns resolve against the process CWD, which tracks the session CWD.
fn stage_glob(toks: Vec<WTok>) -> Vec<WTok> {
    let mut out = Vec::with_capacity(toks.len());
    for (i, tok) in toks.into_iter().enumerate() {
        if i == 0 || tok.quoted || tok.literal {
            out.push(tok);
            continue;
        }
        let alternatives = expand_braces(&tok.text);
        let braced = alternatives.len() > 1;
        let mut produced = Vec::new();
        for alt in &alternatives {
            if alt.contains(['*', '?', '[']) {
                let mut matches: Vec<String> = glob::glob(alt)
                    .map(|paths| {
                        paths
                            .flatten()
                            .map(|p| escape_str(&p.to_string_lossy()))
                            .collect()
                    })
                    .unwrap_or_default();
                matches.sort();
                if matches.is_empty() {
                    // Unmatched patterns survive literally.
                    produced.push(WTok {
                        text: alt.clone(),
                        quoted: false,
                        literal: false,
                    });
                } else {
                    produced.extend(matches.into_iter().map(WTok::lit));
                }
            } else if braced {
                produced.push(WTok::lit(alt.clone()));
            } else {
                produced.push(tok.clone());
            }
        }
        out.extend(produced);
    }
    out
}

/// Stage 9: `$(…)`/backtick tokens go through one `sh` word expansion.
fn stage_subst(toks: Vec<WTok>) -> Vec<WTok> {
    let mut out = Vec::with_capacity(toks.len());
    for tok in toks {
        if tok.quoted || tok.literal || !(tok.text.contains("$(") || tok.text.contains('`')) {
            out.push(tok);
            continue;
        }
        match crate::exec::word_expand(&tok.text) {
            Some(words) => out.extend(words.into_iter().map(|w| WTok::lit(escape_str(&w)))),
            None => out.push(tok),
        }
    }
    out
}

fn has_regex_meta(s: &str) -> bool {
    s.contains(['^', '$', '|', '+']) || s.contains(".*") || s.contains("[")
}

/// Stage 10: tokens that compile as an ERE are matched against CWD entry
/// names; matches replace the token, duplicates suppressed.
fn stage_regex(toks: Vec<WTok>, session: &Session) -> Vec<WTok> {
    let mut out: Vec<WTok> = Vec::with_capacity(toks.len());
    let mut seen: HashSet<String> = HashSet::new();
    for (i, tok) in toks.into_iter().enumerate() {
        if i == 0 || tok.quoted || tok.literal || !has_regex_meta(&tok.text) {
            out.push(tok);
            continue;
        }
        // A token naming an existing file is a path, not a pattern.
        if Path::new(&unescape(&tok.text)).exists() {
            out.push(tok);
            continue;
        }
        let Ok(re) = regex::Regex::new(&tok.text) else {
            out.push(tok);
            continue;
        };
        let matches: Vec<String> = session
            .entries
            .iter()
            .filter(|e| re.is_match(&e.name))
            .map(|e| escape_str(&e.name))
            .collect();
        if matches.is_empty() {
            out.push(tok);
            continue;
        }
        for m in matches {
            if seen.insert(m.clone()) {
                out.push(WTok::lit(m));
            }
        }
    }
    out
}

/// Resolve one argument back to a filesystem path (internal handlers).
pub fn arg_to_path(arg: &str, cwd: &Path) -> PathBuf {
    let clean = unescape(arg);
    let p = PathBuf::from(&clean);
    if p.is_absolute() {
        p
    } else {
        cwd.join(p)
    }
}

#[cfg(test)]
mod tests;
