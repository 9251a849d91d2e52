//! Autocmds: directory-pattern-triggered option overlays and commands.
//!
//! On every CWD change: restore the previous overlay (if any), then walk the
//! rule list top to bottom; the first matching pattern applies its partial
//! options (saving a revert record) and/or yields its command for the caller
//! to execute. Hook files (`.clifm.in` on entry, `.clifm.out` on exit) are
//! discovered here too; the hook runs before the autocmd command.

use std::path::{Path, PathBuf};

use core_config::{AutocmdSpec, Options, PartialOptions};
use tracing::debug;
use wildmatch::WildMatch;

pub const HOOK_IN: &str = ".clifm.in";
pub const HOOK_OUT: &str = ".clifm.out";

/// Commands the caller must run after a directory change, in order.
#[derive(Debug, Default, PartialEq)]
pub struct CwdChangeActions {
    /// `<prev>/.clifm.out`, when present.
    pub out_hook: Option<PathBuf>,
    /// `<new>/.clifm.in`, when present.
    pub in_hook: Option<PathBuf>,
    /// The matching autocmd's command, when present.
    pub cmd: Option<String>,
}

#[derive(Debug, Default)]
pub struct AutocmdSet {
    rules: Vec<AutocmdSpec>,
    revert: Option<PartialOptions>,
}

impl AutocmdSet {
    pub fn install(&mut self, rules: Vec<AutocmdSpec>) {
        self.rules = rules;
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply the autocmd machinery for a CWD change from `prev` to `new`.
    pub fn on_cwd_change(
        &mut self,
        prev: Option<&Path>,
        new: &Path,
        opts: &mut Options,
    ) -> CwdChangeActions {
        let mut actions = CwdChangeActions::default();

        if let Some(revert) = self.revert.take() {
            opts.apply_partial(&revert);
        }

        if let Some(prev) = prev {
            let out = prev.join(HOOK_OUT);
            if out.is_file() {
                actions.out_hook = Some(out);
            }
        }
        let in_hook = new.join(HOOK_IN);
        if in_hook.is_file() {
            actions.in_hook = Some(in_hook);
        }

        let cwd = new.to_string_lossy();
        if let Some(rule) = self
            .rules
            .iter()
            .find(|r| WildMatch::new(&r.pattern).matches(&cwd))
        {
            debug!(target: "autocmds", pattern = %rule.pattern, cwd = %cwd, "autocmd matched");
            if !rule.opts.is_empty() {
                self.revert = Some(opts.apply_partial(&rule.opts));
            }
            actions.cmd = rule.cmd.clone();
        }
        actions
    }

    /// Whether an overlay is currently active (for `msg`-style inspection).
    pub fn overlay_active(&self) -> bool {
        self.revert.is_some()
    }
}
