//! XDG-style path resolution and the per-profile file tree.
//!
//! Layout:
//!
//! ```text
//! $XDG_CONFIG_HOME/clifm/
//!   keybindings.clifm
//!   colors/
//!   plugins/
//!   tags/
//!   profiles/<name>/
//!     clifmrc  bookmarks.clifm  history.clifm  dirhist.clifm  log.clifm
//!     mimelist.clifm  profile.clifm  actions.clifm  nets.clifm  selbox.clifm
//! ```
//!
//! In stealth mode nothing is created, read, or written; callers must check
//! `stealth` before touching any returned path.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::ConfigError;

pub const PROGRAM_NAME: &str = "clifm";
pub const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub profile: String,
    pub stealth: bool,
    /// `~/.local/share/Trash` (FreeDesktop trash spec).
    pub trash_dir: PathBuf,
    pub home: PathBuf,
}

impl ConfigPaths {
    /// Resolve the configuration tree. `data_dir` overrides the XDG base
    /// (`--data-dir`); `profile` defaults to "default".
    pub fn resolve(
        data_dir: Option<PathBuf>,
        profile: Option<String>,
        stealth: bool,
    ) -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHome)?;
        let profile = profile.unwrap_or_else(|| DEFAULT_PROFILE.to_string());
        if profile.is_empty() || profile.contains('/') || profile.contains('\0') {
            return Err(ConfigError::BadProfile(profile));
        }
        let base = match data_dir {
            Some(d) => d,
            None => dirs::config_dir().unwrap_or_else(|| home.join(".config")),
        };
        let trash_dir = dirs::data_local_dir()
            .unwrap_or_else(|| home.join(".local/share"))
            .join("Trash");
        Ok(Self {
            config_dir: base.join(PROGRAM_NAME),
            profile,
            stealth,
            trash_dir,
            home,
        })
    }

    pub fn profile_dir(&self) -> PathBuf {
        self.config_dir.join("profiles").join(&self.profile)
    }

    pub fn rc_file(&self) -> PathBuf {
        self.profile_dir().join("clifmrc")
    }

    pub fn bookmarks_file(&self) -> PathBuf {
        self.profile_dir().join("bookmarks.clifm")
    }

    pub fn history_file(&self) -> PathBuf {
        self.profile_dir().join("history.clifm")
    }

    pub fn dirhist_file(&self) -> PathBuf {
        self.profile_dir().join("dirhist.clifm")
    }

    pub fn log_file(&self) -> PathBuf {
        self.profile_dir().join("log.clifm")
    }

    pub fn mimelist_file(&self) -> PathBuf {
        self.profile_dir().join("mimelist.clifm")
    }

    pub fn profile_file(&self) -> PathBuf {
        self.profile_dir().join("profile.clifm")
    }

    pub fn actions_file(&self) -> PathBuf {
        self.profile_dir().join("actions.clifm")
    }

    pub fn nets_file(&self) -> PathBuf {
        self.profile_dir().join("nets.clifm")
    }

    pub fn jump_file(&self) -> PathBuf {
        self.profile_dir().join("jump.clifm")
    }

    /// Selection box: one shared file across profiles, or per-profile.
    pub fn selbox_file(&self, shared: bool) -> PathBuf {
        if shared {
            self.config_dir.join("selbox.clifm")
        } else {
            self.profile_dir().join("selbox.clifm")
        }
    }

    pub fn keybindings_file(&self) -> PathBuf {
        self.config_dir.join("keybindings.clifm")
    }

    pub fn colors_dir(&self) -> PathBuf {
        self.config_dir.join("colors")
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.config_dir.join("plugins")
    }

    pub fn tags_dir(&self) -> PathBuf {
        self.config_dir.join("tags")
    }

    pub fn profiles_root(&self) -> PathBuf {
        self.config_dir.join("profiles")
    }

    /// Create the directory tree and seed missing files with commented
    /// defaults. No-op in stealth mode.
    pub fn ensure_tree(&self) -> Result<(), ConfigError> {
        if self.stealth {
            debug!(target: "config.paths", "stealth mode: skipping config tree creation");
            return Ok(());
        }
        for dir in [
            self.profile_dir(),
            self.colors_dir(),
            self.plugins_dir(),
            self.tags_dir(),
        ] {
            fs::create_dir_all(&dir).map_err(|e| ConfigError::io(&dir, e))?;
        }
        seed(&self.rc_file(), default_rc())?;
        seed(&self.mimelist_file(), default_mimelist())?;
        seed(&self.bookmarks_file(), default_bookmarks())?;
        seed(&self.profile_file(), "# Commands in this file run once at startup.\n")?;
        seed(&self.actions_file(), "# action_name=plugin_file\n")?;
        seed(&self.nets_file(), "# name=mount_command\n")?;
        seed(
            &self.keybindings_file(),
            "# keybindings.clifm: KEY=COMMAND, one per line.\n",
        )?;
        Ok(())
    }

    /// True when another live instance appears to own this profile. Purely
    /// advisory: the spec mandates no locking, only a logged note.
    pub fn note_concurrent_instance(&self) {
        if self.stealth {
            return;
        }
        let marker = self.profile_dir().join(".pid");
        if let Ok(s) = fs::read_to_string(&marker) {
            if let Ok(pid) = s.trim().parse::<u32>() {
                if Path::new(&format!("/proc/{pid}")).exists() {
                    info!(
                        target: "config.paths",
                        pid,
                        profile = %self.profile,
                        "another instance appears to be running under this profile"
                    );
                }
            }
        }
        let _ = fs::write(&marker, std::process::id().to_string());
    }
}

fn seed(path: &Path, content: &str) -> Result<(), ConfigError> {
    if path.exists() {
        return Ok(());
    }
    fs::write(path, content).map_err(|e| ConfigError::io(path, e))?;
    info!(target: "config.paths", path = %path.display(), "generated default file");
    Ok(())
}

fn default_rc() -> &'static str {
    "\
# clifmrc: one KEY=VALUE per line. Lines starting with '#' are ignored.
# Values are true/false, integers, or (optionally single-quoted) strings.

ShowHiddenFiles=false
LongViewMode=false
ListDirsFirst=true
Pager=false
Sort=name
SortReverse=false
ListingMode=vertical
LightMode=false
Unicode=true
Autocd=true
AutoOpen=true
Classify=true
ClearScreen=true
Colors=true
ColorScheme=default
MaxFilenameLen=20
MaxFiles=unset
FilesCounter=true
PrintSelfiles=false
TrashAsRm=false
ExternalCommands=true
PurgeJumpDB=false
MinJumpRank=10
MaxJumpTotalRank=100000
PrivateWorkspaceSettings=false
ShareSelbox=false
DesktopNotifications=false
PropFields=symbolic
HumanSize=true
WarningPrompt=true
ExpandBookmarks=true

# alias NAME='CMD'
# promptcmd CMD
# autocmd GLOB OPT1=VAL,OPT2=VAL,!CMD
"
}

fn default_mimelist() -> &'static str {
    "\
# mimelist.clifm: [X|!X|]:[N:NAME-REGEX|MIME-REGEX]=APP[;APP...]
# Probed top to bottom; the first resolvable application wins.
# 'ad' selects the built-in archiver.

X:^text/.*=$EDITOR;nano;vi
!X:^text/.*=$EDITOR;nano;vi
X:^image/.*=xdg-open
X:^video/.*=xdg-open
X:^audio/.*=xdg-open
N:.*\\.(zip|tar|gz|bz2|xz|zst|7z|iso)$=ad
.*=xdg-open
"
}

fn default_bookmarks() -> &'static str {
    "\
# bookmarks.clifm: [shortcut]name:path  |  name:path  |  /path
"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths_in(tmp: &Path) -> ConfigPaths {
        ConfigPaths::resolve(Some(tmp.to_path_buf()), None, false).unwrap()
    }

    #[test]
    fn profile_tree_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let p = paths_in(tmp.path());
        assert_eq!(p.rc_file(), tmp.path().join("clifm/profiles/default/clifmrc"));
        assert_eq!(
            p.selbox_file(false),
            tmp.path().join("clifm/profiles/default/selbox.clifm")
        );
        assert_eq!(p.selbox_file(true), tmp.path().join("clifm/selbox.clifm"));
        assert_eq!(p.tags_dir(), tmp.path().join("clifm/tags"));
    }

    #[test]
    fn ensure_tree_seeds_defaults_once() {
        let tmp = tempfile::tempdir().unwrap();
        let p = paths_in(tmp.path());
        p.ensure_tree().unwrap();
        assert!(p.rc_file().exists());
        let marker = "MaxFilenameLen=99\n";
        fs::write(p.rc_file(), marker).unwrap();
        p.ensure_tree().unwrap();
        assert_eq!(fs::read_to_string(p.rc_file()).unwrap(), marker);
    }

    #[test]
    fn stealth_creates_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let p = ConfigPaths::resolve(Some(tmp.path().to_path_buf()), None, true).unwrap();
        p.ensure_tree().unwrap();
        assert!(!p.config_dir.exists());
    }

    #[test]
    fn bad_profile_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ConfigPaths::resolve(
            Some(tmp.path().to_path_buf()),
            Some("a/b".to_string()),
            false,
        );
        assert!(matches!(err, Err(ConfigError::BadProfile(_))));
    }
}
