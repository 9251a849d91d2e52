//! The session option set.
//!
//! `Options` is the fully-resolved, always-valid view the rest of the program
//! reads. `PartialOptions` is the sparse overlay used by autocmds (every field
//! optional, application returns the revert overlay). `OptionsSnapshot` is the
//! per-workspace subset swapped in and out when private workspace settings are
//! enabled.

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Atime,
    Btime,
    Ctime,
    Mtime,
    Version,
    Extension,
    Inode,
    Owner,
    Group,
}

impl SortKey {
    /// Numeric codes accepted by `st` and the `-z` command line flag.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Name,
            1 => Self::Size,
            2 => Self::Atime,
            3 => Self::Btime,
            4 => Self::Ctime,
            5 => Self::Mtime,
            6 => Self::Version,
            7 => Self::Extension,
            8 => Self::Inode,
            9 => Self::Owner,
            10 => Self::Group,
            _ => return None,
        })
    }

    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(n) = s.parse::<u8>() {
            return Self::from_code(n);
        }
        Some(match s {
            "name" => Self::Name,
            "size" => Self::Size,
            "atime" => Self::Atime,
            "btime" => Self::Btime,
            "ctime" => Self::Ctime,
            "mtime" => Self::Mtime,
            "version" => Self::Version,
            "extension" | "ext" => Self::Extension,
            "inode" => Self::Inode,
            "owner" => Self::Owner,
            "group" => Self::Group,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Size => "size",
            Self::Atime => "atime",
            Self::Btime => "btime",
            Self::Ctime => "ctime",
            Self::Mtime => "mtime",
            Self::Version => "version",
            Self::Extension => "extension",
            Self::Inode => "inode",
            Self::Owner => "owner",
            Self::Group => "group",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingMode {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermsStyle {
    #[default]
    Symbolic,
    Numeric,
}

/// The resolved option set. Field defaults match the generated `clifmrc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub show_hidden: bool,
    pub long_view: bool,
    pub dirs_first: bool,
    pub pager: bool,
    pub sort: SortKey,
    pub sort_reverse: bool,
    pub listing_mode: ListingMode,
    pub light_mode: bool,
    pub unicode: bool,
    pub autocd: bool,
    pub auto_open: bool,
    pub classify: bool,
    pub clear_screen: bool,
    pub colorize: bool,
    pub color_scheme: String,
    pub max_name_len: Option<usize>,
    pub max_files: Option<usize>,
    pub only_dirs: bool,
    pub files_counter: bool,
    pub print_selfiles: bool,
    pub tr_as_rm: bool,
    pub secure_cmds: bool,
    pub ext_cmd_ok: bool,
    pub purge_jumpdb: bool,
    pub min_jump_rank: i64,
    pub max_jump_total: i64,
    pub private_ws_settings: bool,
    pub share_selbox: bool,
    pub desktop_notifications: bool,
    pub long_view_perms: PermsStyle,
    pub long_view_ids: bool,
    pub human_size: bool,
    pub filter: Option<String>,
    pub prompt: String,
    pub warning_prompt: bool,
    pub cd_on_quit: bool,
    pub expand_bookmarks: bool,
    pub opener: Option<String>,
}

pub const DEFAULT_PROMPT: &str =
    "\\[\\e[0m\\]\\z \\[\\e[0;36m\\]\\S\\[\\e[0m\\] \\[\\e[1;34m\\]\\w\\[\\e[0m\\] \\$ ";

impl Default for Options {
    fn default() -> Self {
        Self {
            show_hidden: false,
            long_view: false,
            dirs_first: true,
            pager: false,
            sort: SortKey::Name,
            sort_reverse: false,
            listing_mode: ListingMode::Vertical,
            light_mode: false,
            unicode: true,
            autocd: true,
            auto_open: true,
            classify: true,
            clear_screen: true,
            colorize: true,
            color_scheme: "default".to_string(),
            max_name_len: Some(20),
            max_files: None,
            only_dirs: false,
            files_counter: true,
            print_selfiles: false,
            tr_as_rm: false,
            secure_cmds: false,
            ext_cmd_ok: true,
            purge_jumpdb: false,
            min_jump_rank: 10,
            max_jump_total: 100_000,
            private_ws_settings: false,
            share_selbox: false,
            desktop_notifications: false,
            long_view_perms: PermsStyle::Symbolic,
            long_view_ids: false,
            human_size: true,
            filter: None,
            prompt: DEFAULT_PROMPT.to_string(),
            warning_prompt: true,
            cd_on_quit: false,
            expand_bookmarks: true,
            opener: None,
        }
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Values like `20` or `unset`.
fn parse_opt_usize(v: &str) -> Option<Option<usize>> {
    if v.eq_ignore_ascii_case("unset") || v.eq_ignore_ascii_case("none") {
        return Some(None);
    }
    v.parse::<usize>().ok().map(Some)
}

impl Options {
    /// Apply one `KEY=VALUE` pair from `clifmrc`. Unknown keys and corrupt
    /// values are logged and ignored; the session continues with defaults.
    pub fn set_key(&mut self, key: &str, value: &str) {
        let ok = self.try_set(key, value);
        if !ok {
            warn!(target: "config", key, value, "ignoring corrupt or unknown config entry");
        }
    }

    fn try_set(&mut self, key: &str, value: &str) -> bool {
        macro_rules! set_bool {
            ($field:ident) => {
                match parse_bool(value) {
                    Some(b) => {
                        self.$field = b;
                        true
                    }
                    None => false,
                }
            };
        }
        match key {
            "ShowHiddenFiles" => set_bool!(show_hidden),
            "LongViewMode" => set_bool!(long_view),
            "ListDirsFirst" => set_bool!(dirs_first),
            "Pager" => set_bool!(pager),
            "Sort" => match SortKey::parse(value) {
                Some(k) => {
                    self.sort = k;
                    true
                }
                None => false,
            },
            "SortReverse" => set_bool!(sort_reverse),
            "ListingMode" => match value {
                "vertical" | "0" => {
                    self.listing_mode = ListingMode::Vertical;
                    true
                }
                "horizontal" | "1" => {
                    self.listing_mode = ListingMode::Horizontal;
                    true
                }
                _ => false,
            },
            "LightMode" => set_bool!(light_mode),
            "Unicode" => set_bool!(unicode),
            "Autocd" => set_bool!(autocd),
            "AutoOpen" => set_bool!(auto_open),
            "Classify" => set_bool!(classify),
            "ClearScreen" => set_bool!(clear_screen),
            "Colors" => set_bool!(colorize),
            "ColorScheme" => {
                self.color_scheme = value.to_string();
                true
            }
            "MaxFilenameLen" => match parse_opt_usize(value) {
                Some(v) => {
                    self.max_name_len = v;
                    true
                }
                None => false,
            },
            "MaxFiles" => match parse_opt_usize(value) {
                Some(v) => {
                    self.max_files = v;
                    true
                }
                None => false,
            },
            "OnlyDirs" => set_bool!(only_dirs),
            "FilesCounter" => set_bool!(files_counter),
            "PrintSelfiles" => set_bool!(print_selfiles),
            "TrashAsRm" => set_bool!(tr_as_rm),
            "SecureCmds" => set_bool!(secure_cmds),
            "ExternalCommands" => set_bool!(ext_cmd_ok),
            "PurgeJumpDB" => set_bool!(purge_jumpdb),
            "MinJumpRank" => match value.parse::<i64>() {
                Ok(n) => {
                    self.min_jump_rank = n;
                    true
                }
                Err(_) => false,
            },
            "MaxJumpTotalRank" => match value.parse::<i64>() {
                Ok(n) => {
                    self.max_jump_total = n;
                    true
                }
                Err(_) => false,
            },
            "PrivateWorkspaceSettings" => set_bool!(private_ws_settings),
            "ShareSelbox" => set_bool!(share_selbox),
            "DesktopNotifications" => set_bool!(desktop_notifications),
            "PropFields" => match value {
                "symbolic" => {
                    self.long_view_perms = PermsStyle::Symbolic;
                    true
                }
                "numeric" => {
                    self.long_view_perms = PermsStyle::Numeric;
                    true
                }
                _ => false,
            },
            "PrintIds" => set_bool!(long_view_ids),
            "HumanSize" => set_bool!(human_size),
            "Filter" => {
                self.filter = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
                true
            }
            "Prompt" => {
                self.prompt = value.to_string();
                true
            }
            "WarningPrompt" => set_bool!(warning_prompt),
            "CdOnQuit" => set_bool!(cd_on_quit),
            "ExpandBookmarks" => set_bool!(expand_bookmarks),
            "Opener" => {
                self.opener = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
                true
            }
            _ => false,
        }
    }

    pub fn snapshot(&self) -> OptionsSnapshot {
        OptionsSnapshot {
            sort: self.sort,
            sort_reverse: self.sort_reverse,
            listing_mode: self.listing_mode,
            show_hidden: self.show_hidden,
            long_view: self.long_view,
            max_name_len: self.max_name_len,
            pager: self.pager,
            only_dirs: self.only_dirs,
            color_scheme: self.color_scheme.clone(),
        }
    }

    pub fn restore(&mut self, snap: &OptionsSnapshot) {
        self.sort = snap.sort;
        self.sort_reverse = snap.sort_reverse;
        self.listing_mode = snap.listing_mode;
        self.show_hidden = snap.show_hidden;
        self.long_view = snap.long_view;
        self.max_name_len = snap.max_name_len;
        self.pager = snap.pager;
        self.only_dirs = snap.only_dirs;
        self.color_scheme = snap.color_scheme.clone();
    }

    /// Apply a sparse overlay, returning the overlay that reverts it.
    pub fn apply_partial(&mut self, p: &PartialOptions) -> PartialOptions {
        let mut revert = PartialOptions::default();
        if let Some(v) = p.show_hidden {
            revert.show_hidden = Some(self.show_hidden);
            self.show_hidden = v;
        }
        if let Some(v) = p.long_view {
            revert.long_view = Some(self.long_view);
            self.long_view = v;
        }
        if let Some(v) = p.pager {
            revert.pager = Some(self.pager);
            self.pager = v;
        }
        if let Some(v) = p.sort {
            revert.sort = Some(self.sort);
            self.sort = v;
        }
        if let Some(v) = p.sort_reverse {
            revert.sort_reverse = Some(self.sort_reverse);
            self.sort_reverse = v;
        }
        if let Some(v) = p.light_mode {
            revert.light_mode = Some(self.light_mode);
            self.light_mode = v;
        }
        if let Some(v) = p.only_dirs {
            revert.only_dirs = Some(self.only_dirs);
            self.only_dirs = v;
        }
        if let Some(v) = p.dirs_first {
            revert.dirs_first = Some(self.dirs_first);
            self.dirs_first = v;
        }
        if let Some(v) = p.max_name_len {
            revert.max_name_len = Some(self.max_name_len);
            self.max_name_len = v;
        }
        if let Some(v) = p.max_files {
            revert.max_files = Some(self.max_files);
            self.max_files = v;
        }
        if let Some(ref v) = p.color_scheme {
            revert.color_scheme = Some(self.color_scheme.clone());
            self.color_scheme = v.clone();
        }
        revert
    }
}

/// Per-workspace private settings (swapped on `ws N`).
#[derive(Debug, Clone, PartialEq)]
pub struct OptionsSnapshot {
    pub sort: SortKey,
    pub sort_reverse: bool,
    pub listing_mode: ListingMode,
    pub show_hidden: bool,
    pub long_view: bool,
    pub max_name_len: Option<usize>,
    pub pager: bool,
    pub only_dirs: bool,
    pub color_scheme: String,
}

/// Sparse option overlay used by autocmds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialOptions {
    pub show_hidden: Option<bool>,
    pub long_view: Option<bool>,
    pub pager: Option<bool>,
    pub sort: Option<SortKey>,
    pub sort_reverse: Option<bool>,
    pub light_mode: Option<bool>,
    pub only_dirs: Option<bool>,
    pub dirs_first: Option<bool>,
    pub max_name_len: Option<Option<usize>>,
    pub max_files: Option<Option<usize>>,
    pub color_scheme: Option<String>,
}

impl PartialOptions {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Parse one `OPT=VAL` fragment of an `autocmd` line.
    pub fn set_key(&mut self, key: &str, value: &str) -> bool {
        match key {
            "ShowHiddenFiles" | "hidden" => match parse_bool(value) {
                Some(b) => {
                    self.show_hidden = Some(b);
                    true
                }
                None => false,
            },
            "LongViewMode" | "long" => match parse_bool(value) {
                Some(b) => {
                    self.long_view = Some(b);
                    true
                }
                None => false,
            },
            "Pager" | "pager" => match parse_bool(value) {
                Some(b) => {
                    self.pager = Some(b);
                    true
                }
                None => false,
            },
            "Sort" | "sort" => match SortKey::parse(value) {
                Some(k) => {
                    self.sort = Some(k);
                    true
                }
                None => false,
            },
            "SortReverse" => match parse_bool(value) {
                Some(b) => {
                    self.sort_reverse = Some(b);
                    true
                }
                None => false,
            },
            "LightMode" | "light" => match parse_bool(value) {
                Some(b) => {
                    self.light_mode = Some(b);
                    true
                }
                None => false,
            },
            "OnlyDirs" => match parse_bool(value) {
                Some(b) => {
                    self.only_dirs = Some(b);
                    true
                }
                None => false,
            },
            "ListDirsFirst" => match parse_bool(value) {
                Some(b) => {
                    self.dirs_first = Some(b);
                    true
                }
                None => false,
            },
            "MaxFilenameLen" => match parse_opt_usize(value) {
                Some(v) => {
                    self.max_name_len = Some(v);
                    true
                }
                None => false,
            },
            "MaxFiles" => match parse_opt_usize(value) {
                Some(v) => {
                    self.max_files = Some(v);
                    true
                }
                None => false,
            },
            "ColorScheme" => {
                self.color_scheme = Some(value.to_string());
                true
            }
            _ => false,
        }
    }
}
