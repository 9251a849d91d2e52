//! Session-lifetime state.
//!
//! A single [`Session`] value owns every subsystem the REPL mutates:
//! workspaces, directory history, the current file-entry vector, the
//! selection box, the jumper database, the tag graph, bookmarks, the string
//! maps read from the profile, autocmds, and the message list. Handlers
//! receive `&mut Session`; nothing here is global.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use core_config::{ColorScheme, ConfigPaths, Options};

pub mod autocmds;
pub mod bookmarks;
pub mod entries;
pub mod history;
pub mod jumper;
pub mod messages;
pub mod selection;
pub mod tags;
pub mod workspace;

pub use autocmds::AutocmdSet;
pub use bookmarks::{Bookmark, Bookmarks};
pub use entries::{EntryType, FileEntry};
pub use history::DirHistory;
pub use jumper::{JumpDb, JumpEntry, RankContext};
pub use messages::{MsgLevel, Messages};
pub use selection::SelectionBox;
pub use tags::TagGraph;
pub use workspace::{Workspace, Workspaces, MAX_WORKSPACES};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("workspace number must be 1..={max}", max = MAX_WORKSPACES)]
    BadWorkspace,
    #[error("tag name {0:?} is not valid")]
    BadTagName(String),
    #[error("tag {0:?} does not exist")]
    NoSuchTag(String),
    #[error("no such bookmark: {0}")]
    NoSuchBookmark(String),
}

impl StateError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub struct Session {
    pub paths: ConfigPaths,
    pub opts: Options,
    pub colors: ColorScheme,
    pub workspaces: Workspaces,
    pub dirhist: DirHistory,
    /// Rebuilt by every listing refresh; never mutated in place.
    pub entries: Vec<FileEntry>,
    pub selbox: SelectionBox,
    pub jumpdb: JumpDb,
    pub tags: TagGraph,
    pub bookmarks: Bookmarks,
    pub aliases: HashMap<String, String>,
    pub user_vars: HashMap<String, String>,
    pub prompt_cmds: Vec<String>,
    /// Action name -> executable under the plugins directory.
    pub actions: HashMap<String, String>,
    pub autocmds: AutocmdSet,
    pub msgs: Messages,
    pub cmd_history: Vec<String>,
    pub pinned: Option<PathBuf>,
    /// `CLIFM_VIRTUAL_DIR`, the stdin virtual directory.
    pub stdin_dir: Option<PathBuf>,
    pub last_exit: i32,
    /// Entries whose `stat` failed during the last refresh.
    pub unstat_count: usize,
    /// Set by the dispatcher when the listing must be rebuilt.
    pub needs_refresh: bool,
    /// A `cd` that should be recorded by the jumper (history moves are not).
    pub pending_visit: Option<PathBuf>,
    /// `reload`/`edit` asked for a config reload at the next loop turn.
    pub reload_requested: bool,
}

impl Session {
    pub fn new(paths: ConfigPaths, opts: Options, colors: ColorScheme, cwd: PathBuf) -> Self {
        let tags = TagGraph::new(paths.tags_dir());
        let selfile = paths.selbox_file(opts.share_selbox);
        Self {
            paths,
            opts,
            colors,
            workspaces: Workspaces::new(cwd),
            dirhist: DirHistory::default(),
            entries: Vec::new(),
            selbox: SelectionBox::new(selfile),
            jumpdb: JumpDb::default(),
            tags,
            bookmarks: Bookmarks::default(),
            aliases: HashMap::new(),
            user_vars: HashMap::new(),
            prompt_cmds: Vec::new(),
            actions: HashMap::new(),
            autocmds: AutocmdSet::default(),
            msgs: Messages::default(),
            cmd_history: Vec::new(),
            pinned: None,
            stdin_dir: None,
            last_exit: 0,
            unstat_count: 0,
            needs_refresh: false,
            pending_visit: None,
            reload_requested: false,
        }
    }

    pub fn cwd(&self) -> &Path {
        self.workspaces.current().path.as_path()
    }

    /// Entry lookup by 1-based ELN.
    pub fn entry_by_eln(&self, eln: usize) -> Option<&FileEntry> {
        if eln == 0 {
            return None;
        }
        self.entries.get(eln - 1)
    }

    pub fn entry_by_name(&self, name: &str) -> Option<&FileEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Rank-bonus context for jumper queries, derived from the live session.
    pub fn rank_context(&self) -> RankContext {
        RankContext {
            bookmarks: self
                .bookmarks
                .iter()
                .map(|b| PathBuf::from(&b.path))
                .collect(),
            pinned: self.pinned.clone(),
            workspaces: self.workspaces.paths(),
        }
    }
}
