//! Bookmarks: named, optionally-shortcut directory aliases.
//!
//! File format, one per line: `[shortcut]name:path`, `name:path`, or a bare
//! `/path`. Saving regenerates the same format, so save-then-load is a fixed
//! point.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use tracing::warn;

use crate::StateError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub shortcut: Option<String>,
    pub name: Option<String>,
    pub path: String,
}

impl Bookmark {
    fn to_line(&self) -> String {
        match (&self.shortcut, &self.name) {
            (Some(s), Some(n)) => format!("[{s}]{n}:{}", self.path),
            (None, Some(n)) => format!("{n}:{}", self.path),
            _ => self.path.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Bookmarks {
    list: Vec<Bookmark>,
    /// mtime of the backing file at last load, for editor round-trips.
    loaded_mtime: Option<SystemTime>,
}

fn parse_line(line: &str) -> Option<Bookmark> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    if line.starts_with('/') && !line.contains(':') {
        return Some(Bookmark {
            shortcut: None,
            name: None,
            path: line.to_string(),
        });
    }
    let (shortcut, rest) = if let Some(r) = line.strip_prefix('[') {
        let (s, rest) = r.split_once(']')?;
        (Some(s.to_string()), rest)
    } else {
        (None, line)
    };
    let (name, path) = rest.split_once(':')?;
    if path.is_empty() {
        return None;
    }
    Some(Bookmark {
        shortcut,
        name: if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        },
        path: path.to_string(),
    })
}

impl Bookmarks {
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bookmark> {
        self.list.iter()
    }

    /// Lookup by shortcut, name, or 1-based numeric index.
    pub fn lookup(&self, key: &str) -> Option<&Bookmark> {
        if let Ok(n) = key.parse::<usize>() {
            if n >= 1 {
                return self.list.get(n - 1);
            }
        }
        self.list
            .iter()
            .find(|b| b.shortcut.as_deref() == Some(key) || b.name.as_deref() == Some(key))
    }

    pub fn by_name(&self, name: &str) -> Option<&Bookmark> {
        self.list.iter().find(|b| b.name.as_deref() == Some(name))
    }

    pub fn add(&mut self, bm: Bookmark) -> bool {
        let dup = self.list.iter().any(|b| {
            b.path == bm.path
                || (bm.name.is_some() && b.name == bm.name)
                || (bm.shortcut.is_some() && b.shortcut == bm.shortcut)
        });
        if dup {
            return false;
        }
        self.list.push(bm);
        true
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.list.len();
        let target = self.lookup(key).cloned();
        match target {
            Some(t) => {
                self.list.retain(|b| b != &t);
                before != self.list.len()
            }
            None => false,
        }
    }

    pub fn load(&mut self, path: &Path) -> Result<(), StateError> {
        self.list.clear();
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StateError::io(path, e)),
        };
        for (lineno, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match parse_line(line) {
                Some(bm) => self.list.push(bm),
                None => {
                    warn!(target: "bookmarks", line = lineno + 1, "malformed bookmark line")
                }
            }
        }
        self.loaded_mtime = fs::metadata(path).and_then(|m| m.modified()).ok();
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let mut out =
            String::from("# bookmarks.clifm: [shortcut]name:path  |  name:path  |  /path\n");
        for bm in &self.list {
            out.push_str(&bm.to_line());
            out.push('\n');
        }
        fs::write(path, out).map_err(|e| StateError::io(path, e))
    }

    /// Reload after an editor round-trip, but only when the file changed.
    pub fn reload_if_modified(&mut self, path: &Path) -> Result<bool, StateError> {
        let mtime = fs::metadata(path).and_then(|m| m.modified()).ok();
        if mtime == self.loaded_mtime {
            return Ok(false);
        }
        self.load(path)?;
        Ok(true)
    }
}
