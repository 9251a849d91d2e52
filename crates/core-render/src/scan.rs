//! Directory scan: build the session's file-entry vector.
//!
//! Two stat policies: the full path pulls `lstat` metadata per entry plus a
//! child count for directories; light mode takes only the `d_type` from the
//! directory stream and skips enrichment entirely. Entries are always built
//! fresh; the previous vector is dropped wholesale.

use std::fs::{self, DirEntry, Metadata};
use std::os::unix::fs::MetadataExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use core_config::{ColorKey, Options, SortKey};
use core_state::{EntryType, FileEntry, Session};
use regex::Regex;
use tracing::{debug, warn};

use crate::trim::display_width;
use crate::ListError;

const S_ISUID: u32 = 0o4000;
const S_ISGID: u32 = 0o2000;
const S_ISVTX: u32 = 0o1000;

/// Compiled listing filter: `Filter=RE` includes matches, `Filter=!RE`
/// excludes them.
struct NameFilter {
    re: Regex,
    invert: bool,
}

impl NameFilter {
    fn compile(spec: &str) -> Option<Self> {
        let (invert, pat) = match spec.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, spec),
        };
        match Regex::new(pat) {
            Ok(re) => Some(Self { re, invert }),
            Err(e) => {
                warn!(target: "listing", filter = spec, error = %e, "invalid filter regex");
                None
            }
        }
    }

    fn keeps(&self, name: &str) -> bool {
        self.re.is_match(name) != self.invert
    }
}

/// Rebuild `session.entries` from the current workspace directory.
pub fn refresh(session: &mut Session) -> Result<(), ListError> {
    let cwd = session.cwd().to_path_buf();
    let rd = fs::read_dir(&cwd).map_err(|e| ListError::OpenDir {
        path: cwd.clone(),
        source: e,
    })?;

    let opts = session.opts.clone();
    let filter = opts.filter.as_deref().and_then(NameFilter::compile);

    let mut entries = Vec::new();
    let mut unstat = 0usize;
    for dent in rd {
        let Ok(dent) = dent else {
            unstat += 1;
            continue;
        };
        let name = dent.file_name().to_string_lossy().into_owned();
        if !opts.show_hidden && name.starts_with('.') {
            continue;
        }
        if let Some(f) = &filter {
            if !f.keeps(&name) {
                continue;
            }
        }
        let entry = if opts.light_mode {
            light_entry(&dent, name, &opts)
        } else {
            match full_entry(&dent, name, &opts, session) {
                Ok(e) => e,
                Err(e) => {
                    unstat += 1;
                    e
                }
            }
        };
        if opts.only_dirs && !entry.is_dir() {
            continue;
        }
        entries.push(entry);
    }

    crate::sort::sort_entries(&mut entries, &opts);
    debug!(
        target: "listing",
        dir = %cwd.display(),
        files = entries.len(),
        unstat,
        "listing refreshed"
    );
    session.entries = entries;
    session.unstat_count = unstat;
    session.needs_refresh = false;
    Ok(())
}

fn light_entry(dent: &DirEntry, name: String, opts: &Options) -> FileEntry {
    let ftype = dent
        .file_type()
        .map(|t| {
            if t.is_dir() {
                EntryType::Dir
            } else if t.is_symlink() {
                EntryType::Link
            } else {
                EntryType::Regular
            }
        })
        .unwrap_or_default();
    let mut e = FileEntry::named(&name);
    e.disp_width = display_width(&name, opts.unicode);
    e.name = name;
    e.ftype = ftype;
    e.color = match ftype {
        EntryType::Dir => ColorKey::Dir,
        EntryType::Link => ColorKey::Link,
        _ => ColorKey::Regular,
    };
    e
}

/// Build a fully-populated entry. On stat failure the entry survives with
/// `type=unknown` and is counted in the unstat statistic by the caller.
fn full_entry(
    dent: &DirEntry,
    name: String,
    opts: &Options,
    session: &Session,
) -> Result<FileEntry, FileEntry> {
    let path = dent.path();
    let meta = match fs::symlink_metadata(&path) {
        Ok(m) => m,
        Err(_) => {
            let mut e = FileEntry::named(&name);
            e.disp_width = display_width(&name, opts.unicode);
            e.ftype = EntryType::Unknown;
            e.color = ColorKey::Unknown;
            return Err(e);
        }
    };

    let mode = meta.mode();
    let ftype = classify_type(&meta, &path);
    let exec = meta.is_file() && mode & 0o111 != 0;
    let children = if ftype == EntryType::Dir && opts.files_counter {
        fs::read_dir(&path).map(|rd| rd.count()).ok()
    } else {
        None
    };
    let readable = match ftype {
        EntryType::Dir => children.is_some() || fs::read_dir(&path).is_ok(),
        _ => mode & 0o444 != 0,
    };

    let (color, ext_color) = classify_color(&meta, ftype, &path, &name, children, exec, session);

    Ok(FileEntry {
        disp_width: display_width(&name, opts.unicode),
        ftype,
        mode,
        ino: meta.ino(),
        dev: meta.dev(),
        nlink: meta.nlink(),
        uid: meta.uid(),
        gid: meta.gid(),
        size: meta.size(),
        time: sort_time(&meta, opts.sort),
        color,
        ext_color,
        exec,
        readable,
        children,
        selected: session.selbox.contains_id(meta.dev(), meta.ino()),
        pad: 0,
        name,
    })
}

fn classify_type(meta: &Metadata, path: &Path) -> EntryType {
    use std::os::unix::fs::FileTypeExt;
    let ft = meta.file_type();
    if ft.is_symlink() {
        return if fs::metadata(path).is_ok() {
            EntryType::Link
        } else {
            EntryType::BrokenLink
        };
    }
    if ft.is_dir() {
        EntryType::Dir
    } else if ft.is_socket() {
        EntryType::Socket
    } else if ft.is_fifo() {
        EntryType::Fifo
    } else if ft.is_block_device() {
        EntryType::BlockDev
    } else if ft.is_char_device() {
        EntryType::CharDev
    } else if ft.is_file() {
        EntryType::Regular
    } else {
        EntryType::Unknown
    }
}

/// Color precedence: broken-symlink → symlink-to-dir → directory variants →
/// empty-directory → suid/sgid → executable → empty-regular →
/// multi-hardlink → per-extension → regular.
fn classify_color(
    meta: &Metadata,
    ftype: EntryType,
    path: &Path,
    name: &str,
    children: Option<usize>,
    exec: bool,
    session: &Session,
) -> (ColorKey, Option<String>) {
    let mode = meta.permissions().mode();
    match ftype {
        EntryType::BrokenLink => (ColorKey::BrokenLink, None),
        EntryType::Link => {
            let to_dir = fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false);
            (
                if to_dir {
                    ColorKey::LinkDir
                } else {
                    ColorKey::Link
                },
                None,
            )
        }
        EntryType::Dir => {
            let sticky = mode & S_ISVTX != 0;
            let ow = mode & 0o002 != 0;
            let key = match (sticky, ow) {
                (true, true) => ColorKey::StickyOtherWritableDir,
                (false, true) => ColorKey::OtherWritableDir,
                (true, false) => ColorKey::StickyDir,
                (false, false) => {
                    if children == Some(0) {
                        ColorKey::EmptyDir
                    } else {
                        ColorKey::Dir
                    }
                }
            };
            (key, None)
        }
        EntryType::Socket => (ColorKey::Socket, None),
        EntryType::Fifo => (ColorKey::Fifo, None),
        EntryType::BlockDev => (ColorKey::BlockDev, None),
        EntryType::CharDev => (ColorKey::CharDev, None),
        EntryType::Unknown => (ColorKey::Unknown, None),
        EntryType::Regular => {
            if mode & S_ISUID != 0 {
                (ColorKey::Suid, None)
            } else if mode & S_ISGID != 0 {
                (ColorKey::Sgid, None)
            } else if exec {
                (ColorKey::Exec, None)
            } else if meta.size() == 0 {
                (ColorKey::EmptyFile, None)
            } else if meta.nlink() > 1 {
                (ColorKey::MultiHardlink, None)
            } else {
                let ext_color = name
                    .rsplit_once('.')
                    .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
                    .and_then(|(_, ext)| session.colors.ext_sgr(ext))
                    .map(str::to_string);
                (ColorKey::Regular, ext_color)
            }
        }
    }
}

fn sort_time(meta: &Metadata, sort: SortKey) -> i64 {
    match sort {
        SortKey::Atime => meta.atime(),
        SortKey::Ctime => meta.ctime(),
        SortKey::Btime => meta
            .created()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            // No birth time on this filesystem: fall back to ctime.
            .unwrap_or_else(|| meta.ctime()),
        _ => meta.mtime(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::{ColorScheme, ConfigPaths};
    use std::os::unix::fs::symlink;

    fn session_at(dir: &Path) -> Session {
        let paths = ConfigPaths::resolve(Some(dir.join("cfg")), None, true).unwrap();
        Session::new(
            paths,
            Options::default(),
            ColorScheme::default(),
            dir.to_path_buf(),
        )
    }

    #[test]
    fn counts_match_directory_contents() {
        let tmp = tempfile::tempdir().unwrap();
        for n in ["a", "b", "c"] {
            fs::write(tmp.path().join(n), "x").unwrap();
        }
        fs::write(tmp.path().join(".hidden"), "x").unwrap();
        let mut s = session_at(tmp.path());
        refresh(&mut s).unwrap();
        assert_eq!(s.entries.len(), 3);
        s.opts.show_hidden = true;
        refresh(&mut s).unwrap();
        assert_eq!(s.entries.len(), 4);
    }

    #[test]
    fn empty_directory_lists_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = session_at(tmp.path());
        refresh(&mut s).unwrap();
        assert!(s.entries.is_empty());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = session_at(&tmp.path().join("gone"));
        assert!(matches!(refresh(&mut s), Err(ListError::OpenDir { .. })));
    }

    #[test]
    fn broken_symlink_classified() {
        let tmp = tempfile::tempdir().unwrap();
        symlink("/definitely/gone", tmp.path().join("dangling")).unwrap();
        let mut s = session_at(tmp.path());
        refresh(&mut s).unwrap();
        let e = s.entry_by_name("dangling").unwrap();
        assert_eq!(e.ftype, EntryType::BrokenLink);
        assert_eq!(e.color, ColorKey::BrokenLink);
    }

    #[test]
    fn empty_dir_and_empty_file_colors() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("emptydir")).unwrap();
        fs::write(tmp.path().join("emptyfile"), "").unwrap();
        let mut s = session_at(tmp.path());
        refresh(&mut s).unwrap();
        assert_eq!(
            s.entry_by_name("emptydir").unwrap().color,
            ColorKey::EmptyDir
        );
        assert_eq!(
            s.entry_by_name("emptyfile").unwrap().color,
            ColorKey::EmptyFile
        );
    }

    #[test]
    fn filter_includes_and_inverts() {
        let tmp = tempfile::tempdir().unwrap();
        for n in ["one.rs", "two.rs", "three.txt"] {
            fs::write(tmp.path().join(n), "x").unwrap();
        }
        let mut s = session_at(tmp.path());
        s.opts.filter = Some(r"\.rs$".to_string());
        refresh(&mut s).unwrap();
        assert_eq!(s.entries.len(), 2);
        s.opts.filter = Some(r"!\.rs$".to_string());
        refresh(&mut s).unwrap();
        assert_eq!(s.entries.len(), 1);
        assert_eq!(s.entries[0].name, "three.txt");
    }

    #[test]
    fn only_dirs_and_selection_flag() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("d")).unwrap();
        fs::write(tmp.path().join("f"), "x").unwrap();
        let mut s = session_at(tmp.path());
        s.selbox.add(tmp.path().join("f"));
        refresh(&mut s).unwrap();
        assert!(s.entry_by_name("f").unwrap().selected);
        assert!(!s.entry_by_name("d").unwrap().selected);
        s.opts.only_dirs = true;
        refresh(&mut s).unwrap();
        assert_eq!(s.entries.len(), 1);
        assert!(s.entries[0].is_dir());
    }

    #[test]
    fn light_mode_skips_enrichment() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("d")).unwrap();
        let mut s = session_at(tmp.path());
        s.opts.light_mode = true;
        refresh(&mut s).unwrap();
        let e = s.entry_by_name("d").unwrap();
        assert_eq!(e.ftype, EntryType::Dir);
        assert_eq!(e.ino, 0);
        assert!(e.children.is_none());
    }
}
