//! Input expansion, command dispatch, and the handlers behind every internal
//! command.
//!
//! The pipeline is transactional: it reads the session, builds a fresh
//! argument vector, and either returns it whole or fails without touching
//! any state. Dispatch routes the first token to a closed set of handlers or
//! hands the line to `/bin/sh`.

pub mod cmds;
pub mod dispatch;
pub mod exec;
pub mod expand;
pub mod opener;
pub mod trash;

pub use dispatch::{dispatch, DispatchResult, Quit};
pub use expand::{expand_line, ChainSegment, Expanded};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExpandError {
    #[error("unclosed quote or substitution delimiter")]
    QuoteMismatch,
    #[error("{token}: {reason}")]
    Expansion { token: String, reason: String },
}

impl ExpandError {
    pub fn at(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Expansion {
            token: token.into(),
            reason: reason.into(),
        }
    }
}

/// Internal command names, ordered by dispatch frequency. The set drives
/// `is_internal`, fused-parameter splitting, and the auto-cd guard.
pub const INTERNAL_CMDS: &[&str] = &[
    "cd", "o", "open", "b", "back", "f", "forth", "bm", "bookmarks", "s", "sel", "sb", "ds",
    "desel", "t", "tr", "trash", "u", "untrash", "br", "bulk", "c", "m", "r", "l", "md", "mkdir",
    "tag", "j", "jc", "jp", "jl", "je", "jo", "pf", "prof", "profile", "ws", "mm", "mime", "ac",
    "ad", "ow", "p", "pr", "pp", "prop", "mp", "net", "st", "sort", "pg", "pager", "cs",
    "colorschemes", "ext", "log", "msg", "messages", "alias", "history", "pin", "unpin", "mf",
    "opener", "bd", "edit", "reload", "rl", "sel-all", "desel-all", "autocd", "auto-open", "q",
    "quit", "exit", "Q",
];

pub fn is_internal(cmd: &str) -> bool {
    INTERNAL_CMDS.contains(&cmd)
}

/// Commands whose integer arguments are literals, never ELNs.
pub const NO_ELN_CMDS: &[&str] = &[
    "pf", "prof", "profile", "ws", "mf", "st", "sort", "jo", "je", "j", "jc", "jp", "jl", "bm",
    "bookmarks", "pg", "pager", "cs", "history", "alias", "u", "untrash",
];

pub fn takes_elns(cmd: &str) -> bool {
    !NO_ELN_CMDS.contains(&cmd)
}
