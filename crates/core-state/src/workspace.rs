//! Workspaces: up to eight independent (path, name, settings-snapshot) slots.
//!
//! Invariant: the current slot is always populated, and after any successful
//! navigation its path equals the process CWD (enforced by the `cd` handler,
//! asserted here only in tests).

use std::path::PathBuf;

use core_config::{Options, OptionsSnapshot};

use crate::StateError;

pub const MAX_WORKSPACES: usize = 8;

#[derive(Debug, Clone)]
pub struct Workspace {
    pub path: PathBuf,
    pub name: Option<String>,
    /// Present only while private workspace settings are enabled.
    pub settings: Option<OptionsSnapshot>,
}

#[derive(Debug)]
pub struct Workspaces {
    slots: [Option<Workspace>; MAX_WORKSPACES],
    cur: usize,
}

impl Workspaces {
    pub fn new(initial: PathBuf) -> Self {
        let mut slots: [Option<Workspace>; MAX_WORKSPACES] = Default::default();
        slots[0] = Some(Workspace {
            path: initial,
            name: None,
            settings: None,
        });
        Self { slots, cur: 0 }
    }

    pub fn current(&self) -> &Workspace {
        self.slots[self.cur]
            .as_ref()
            .expect("current workspace slot is always populated")
    }

    pub fn current_mut(&mut self) -> &mut Workspace {
        self.slots[self.cur]
            .as_mut()
            .expect("current workspace slot is always populated")
    }

    /// 1-based number of the current workspace (for the `\S` prompt escape).
    pub fn current_num(&self) -> usize {
        self.cur + 1
    }

    pub fn get(&self, num: usize) -> Option<&Workspace> {
        if num == 0 || num > MAX_WORKSPACES {
            return None;
        }
        self.slots[num - 1].as_ref()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.slots
            .iter()
            .flatten()
            .map(|w| w.path.clone())
            .collect()
    }

    /// Switch to workspace `num` (1-based). An empty target slot inherits the
    /// previous workspace's CWD. With private settings enabled the outgoing
    /// options are snapshotted into the old slot and the incoming snapshot
    /// (if any) is restored.
    pub fn switch(&mut self, num: usize, opts: &mut Options) -> Result<&Workspace, StateError> {
        if num == 0 || num > MAX_WORKSPACES {
            return Err(StateError::BadWorkspace);
        }
        let idx = num - 1;
        let prev_path = self.current().path.clone();
        if opts.private_ws_settings {
            self.current_mut().settings = Some(opts.snapshot());
        }
        if self.slots[idx].is_none() {
            self.slots[idx] = Some(Workspace {
                path: prev_path,
                name: None,
                settings: None,
            });
        }
        self.cur = idx;
        if opts.private_ws_settings {
            if let Some(snap) = self.current().settings.clone() {
                opts.restore(&snap);
            }
        }
        Ok(self.current())
    }

    pub fn set_current_path(&mut self, path: PathBuf) {
        self.current_mut().path = path;
    }
}
