//! Per-session directory history with a branch-truncating cursor.
//!
//! `b`/`f` move the cursor without recording jumper visits; an unrelated `cd`
//! truncates everything after the cursor and appends. The cursor always
//! addresses the current entry.

use std::fs;
use std::path::{Path, PathBuf};

use crate::StateError;

#[derive(Debug, Default)]
pub struct DirHistory {
    list: Vec<PathBuf>,
    cursor: usize,
}

impl DirHistory {
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn current(&self) -> Option<&Path> {
        self.list.get(self.cursor).map(PathBuf::as_path)
    }

    /// Record a new visit. Consecutive duplicates are collapsed; a visit
    /// while rewound drops the abandoned tail first.
    pub fn push(&mut self, path: PathBuf) {
        if self.current() == Some(path.as_path()) {
            return;
        }
        if !self.list.is_empty() {
            self.list.truncate(self.cursor + 1);
        }
        self.list.push(path);
        self.cursor = self.list.len() - 1;
    }

    pub fn back(&mut self) -> Option<&Path> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    pub fn forth(&mut self) -> Option<&Path> {
        if self.cursor + 1 >= self.list.len() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.list.iter()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn load(&mut self, path: &Path) -> Result<(), StateError> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StateError::io(path, e)),
        };
        for line in content.lines() {
            let line = line.trim();
            if !line.is_empty() {
                self.list.push(PathBuf::from(line));
            }
        }
        if !self.list.is_empty() {
            self.cursor = self.list.len() - 1;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let mut out = String::new();
        for p in &self.list {
            out.push_str(&p.to_string_lossy());
            out.push('\n');
        }
        fs::write(path, out).map_err(|e| StateError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_and_forth_round_trip() {
        let mut h = DirHistory::default();
        h.push(PathBuf::from("/a"));
        h.push(PathBuf::from("/b"));
        assert_eq!(h.back(), Some(Path::new("/a")));
        assert_eq!(h.forth(), Some(Path::new("/b")));
        assert_eq!(h.forth(), None);
    }

    #[test]
    fn push_after_back_truncates_tail() {
        let mut h = DirHistory::default();
        h.push(PathBuf::from("/a"));
        h.push(PathBuf::from("/b"));
        h.push(PathBuf::from("/c"));
        h.back();
        h.back();
        h.push(PathBuf::from("/d"));
        let all: Vec<_> = h.iter().cloned().collect();
        assert_eq!(all, vec![PathBuf::from("/a"), PathBuf::from("/d")]);
        assert_eq!(h.forth(), None);
    }

    #[test]
    fn consecutive_duplicates_collapse() {
        let mut h = DirHistory::default();
        h.push(PathBuf::from("/a"));
        h.push(PathBuf::from("/a"));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn persistence_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("dirhist.clifm");
        let mut h = DirHistory::default();
        h.push(PathBuf::from("/a"));
        h.push(PathBuf::from("/b"));
        h.save(&file).unwrap();
        let mut h2 = DirHistory::default();
        h2.load(&file).unwrap();
        assert_eq!(h2.len(), 2);
        assert_eq!(h2.current(), Some(Path::new("/b")));
    }
}
