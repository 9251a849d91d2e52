//! File entries: the transient records behind each listed name.
//!
//! Entry vectors are rebuilt on every refresh and never updated in place.
//! The selection flag is derived at build time from a (device, inode) lookup
//! against the selection box.

use core_config::ColorKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum EntryType {
    Dir,
    Regular,
    Link,
    BrokenLink,
    Socket,
    Fifo,
    BlockDev,
    CharDev,
    #[default]
    Unknown,
}

impl EntryType {
    /// `ls -F`-style classification suffix.
    pub fn indicator(&self, exec: bool) -> Option<char> {
        match self {
            Self::Dir => Some('/'),
            Self::Link | Self::BrokenLink => Some('@'),
            Self::Socket => Some('='),
            Self::Fifo => Some('|'),
            Self::Regular if exec => Some('*'),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: String,
    /// Display width in terminal columns (wide-char aware when Unicode is
    /// enabled, substituted-byte length otherwise).
    pub disp_width: usize,
    pub ftype: EntryType,
    pub mode: u32,
    pub ino: u64,
    pub dev: u64,
    pub nlink: u64,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    /// Seconds of whichever timestamp the active sort key selects.
    pub time: i64,
    pub color: ColorKey,
    /// Owned per-extension SGR override; base colors are table references.
    pub ext_color: Option<String>,
    pub exec: bool,
    pub readable: bool,
    /// Child count for directories (skipped in light mode).
    pub children: Option<usize>,
    pub selected: bool,
    pub pad: usize,
}

impl FileEntry {
    /// A minimal entry for tests and light mode.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            disp_width: name.chars().count(),
            ftype: EntryType::default(),
            mode: 0,
            ino: 0,
            dev: 0,
            nlink: 0,
            uid: 0,
            gid: 0,
            size: 0,
            time: 0,
            color: ColorKey::Regular,
            ext_color: None,
            exec: false,
            readable: true,
            children: None,
            selected: false,
            pad: 0,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.ftype == EntryType::Dir
    }

    pub fn extension(&self) -> Option<&str> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_skips_dotfiles() {
        assert_eq!(FileEntry::named(".bashrc").extension(), None);
        assert_eq!(FileEntry::named("a.tar.gz").extension(), Some("gz"));
        assert_eq!(FileEntry::named("noext").extension(), None);
    }

    #[test]
    fn indicators() {
        let mut e = FileEntry::named("x");
        e.ftype = EntryType::Dir;
        assert_eq!(e.ftype.indicator(false), Some('/'));
        e.ftype = EntryType::Regular;
        assert_eq!(e.ftype.indicator(true), Some('*'));
        assert_eq!(e.ftype.indicator(false), None);
    }
}
