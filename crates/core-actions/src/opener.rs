//! The opener: resolve a file to an application through the ordered rule
//! file (`mimelist.clifm`).
//!
//! Rule grammar, one per line:
//!
//! ```text
//! [X:|!X:][N:]REGEX=APP[;APP...]
//! ```
//!
//! `X:` restricts the rule to GUI environments, `!X:` to non-GUI ones.
//! `N:` matches the right-hand regex against the file's basename instead of
//! its MIME type. Applications are probed left to right; the first whose
//! executable resolves wins. The literal `ad` selects the built-in archiver.
//! Application strings may carry `%f` (file placeholder), a trailing `&`
//! (background), `!E`/`!O` (discard stderr/stdout), and `$VAR` expansions.

use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::{debug, warn};

use crate::exec;
use crate::expand::helpers::shell_quote_path;

#[derive(Debug)]
pub struct Rule {
    /// None: both environments. Some(true): GUI only. Some(false): console.
    pub gui: Option<bool>,
    /// Match the basename instead of the MIME type.
    pub name_based: bool,
    pub regex: Regex,
    pub apps: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Opener {
    rules: Vec<Rule>,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenerError {
    #[error("no application handles {0}")]
    NoHandler(String),
}

fn parse_rule(line: &str) -> Option<Rule> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (gui, rest) = if let Some(r) = line.strip_prefix("X:") {
        (Some(true), r)
    } else if let Some(r) = line.strip_prefix("!X:") {
        (Some(false), r)
    } else {
        (None, line)
    };
    let (name_based, rest) = match rest.strip_prefix("N:") {
        Some(r) => (true, r),
        None => (false, rest),
    };
    let (pattern, apps) = rest.split_once('=')?;
    let regex = match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!(target: "opener", pattern, error = %e, "invalid opener rule regex");
            return None;
        }
    };
    let apps: Vec<String> = apps
        .split(';')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();
    if apps.is_empty() {
        return None;
    }
    Some(Rule {
        gui,
        name_based,
        regex,
        apps,
    })
}

/// MIME type via `file -b --mime-type` (portable; no libmagic binding
/// needed).
pub fn mime_type(path: &Path) -> Option<String> {
    let out = exec::capture(
        &format!("file -b --mime-type {}", shell_quote_path(&path.to_string_lossy())),
        Path::new("/"),
    )?;
    let mime = out.trim().to_string();
    if mime.is_empty() { None } else { Some(mime) }
}

pub fn gui_session() -> bool {
    std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some()
}

/// First token of an application string, with placeholders removed.
fn app_binary(spec: &str) -> Option<String> {
    let word = spec.split_whitespace().next()?;
    if word.starts_with('%') || word.starts_with('!') || word == "&" {
        return None;
    }
    if let Some(var) = word.strip_prefix('$') {
        return std::env::var(var).ok().map(|v| {
            v.split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string()
        });
    }
    Some(word.to_string())
}

fn app_resolves(spec: &str) -> bool {
    if spec == "ad" {
        return true;
    }
    match app_binary(spec) {
        Some(bin) if bin.contains('/') => Path::new(&bin).is_file(),
        Some(bin) if !bin.is_empty() => which::which(&bin).is_ok(),
        _ => false,
    }
}

impl Opener {
    pub fn load(path: &Path) -> Self {
        let rules = match fs::read_to_string(path) {
            Ok(content) => content.lines().filter_map(parse_rule).collect(),
            Err(_) => Vec::new(),
        };
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every matching application spec for a file, rule order preserved
    /// (feeds the `ow` menu).
    pub fn candidates(&self, file: &Path, mime: Option<&str>, gui: bool) -> Vec<String> {
        let basename = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut out = Vec::new();
        for rule in &self.rules {
            if let Some(rule_gui) = rule.gui {
                if rule_gui != gui {
                    continue;
                }
            }
            let subject = if rule.name_based {
                Some(basename.as_str())
            } else {
                mime
            };
            let Some(subject) = subject else { continue };
            if !rule.regex.is_match(subject) {
                continue;
            }
            for app in &rule.apps {
                if app_resolves(app) && !out.contains(app) {
                    out.push(app.clone());
                }
            }
        }
        out
    }

    /// The first resolvable application, per the rule order.
    pub fn resolve(
        &self,
        file: &Path,
        mime: Option<&str>,
        gui: bool,
    ) -> Result<String, OpenerError> {
        self.candidates(file, mime, gui)
            .into_iter()
            .next()
            .ok_or_else(|| OpenerError::NoHandler(file.display().to_string()))
    }
}

/// A parsed application spec ready to run.
#[derive(Debug, PartialEq, Eq)]
pub struct Launch {
    pub line: String,
    pub background: bool,
}

/// Turn an application spec plus a file into a shell line, handling `%f`,
/// `&`, `!E`, `!O`, and `$VAR`.
pub fn build_launch(spec: &str, file: &Path) -> Launch {
    let quoted = shell_quote_path(&file.to_string_lossy());
    let mut background = false;
    let mut discard_stdout = false;
    let mut discard_stderr = false;
    let mut words = Vec::new();
    let mut has_placeholder = false;
    for word in spec.split_whitespace() {
        match word {
            "&" => background = true,
            "!E" => discard_stderr = true,
            "!O" => discard_stdout = true,
            "%f" => {
                has_placeholder = true;
                words.push(quoted.clone());
            }
            _ => {
                if word.contains("%f") {
                    has_placeholder = true;
                    words.push(word.replace("%f", &quoted));
                } else {
                    words.push(word.to_string());
                }
            }
        }
    }
    if !has_placeholder {
        words.push(quoted);
    }
    let mut line = words.join(" ");
    if discard_stdout {
        line.push_str(" >/dev/null");
    }
    if discard_stderr {
        line.push_str(" 2>/dev/null");
    }
    debug!(target: "opener", spec, line = %line, background, "launch line built");
    Launch { line, background }
}
