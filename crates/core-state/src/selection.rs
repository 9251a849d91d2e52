//! The selection box: a persistent, cross-operation set of absolute paths.
//!
//! Alongside each path a (device, inode) pair is kept so listing refreshes
//! can mark selected entries without path comparison. Every mutation is
//! followed by a full-file rewrite of `selbox.clifm` by the caller.

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::StateError;

#[derive(Debug)]
pub struct SelectionBox {
    paths: Vec<PathBuf>,
    ids: Vec<(u64, u64)>,
    file: PathBuf,
}

impl SelectionBox {
    pub fn new(file: PathBuf) -> Self {
        Self {
            paths: Vec::new(),
            ids: Vec::new(),
            file,
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn contains_id(&self, dev: u64, ino: u64) -> bool {
        self.ids.contains(&(dev, ino))
    }

    /// Add a path. Returns false (a no-op) when already present or when the
    /// path cannot be stat'ed.
    pub fn add(&mut self, path: PathBuf) -> bool {
        if self.contains(&path) {
            return false;
        }
        let Ok(meta) = fs::symlink_metadata(&path) else {
            return false;
        };
        self.ids.push((meta.dev(), meta.ino()));
        self.paths.push(path);
        true
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        match self.paths.iter().position(|p| p == path) {
            Some(i) => {
                self.paths.remove(i);
                self.ids.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.paths.clear();
        self.ids.clear();
    }

    /// Load `selbox.clifm`, silently dropping entries that no longer stat.
    pub fn load(&mut self) -> Result<(), StateError> {
        let content = match fs::read_to_string(&self.file) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StateError::io(&self.file, e)),
        };
        let mut dropped = 0usize;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if !self.add(PathBuf::from(line)) {
                dropped += 1;
            }
        }
        if dropped > 0 {
            debug!(target: "selection", dropped, "dropped stale selection entries at load");
        }
        Ok(())
    }

    /// Full-file rewrite.
    pub fn save(&self) -> Result<(), StateError> {
        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent).map_err(|e| StateError::io(parent, e))?;
        }
        let mut out = String::new();
        for p in &self.paths {
            out.push_str(&p.to_string_lossy());
            out.push('\n');
        }
        fs::write(&self.file, out).map_err(|e| StateError::io(&self.file, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_set_semantics() {
        let tmp = tempfile::tempdir().unwrap();
        let f = tmp.path().join("a.txt");
        fs::write(&f, "x").unwrap();
        let mut sel = SelectionBox::new(tmp.path().join("selbox.clifm"));
        assert!(sel.add(f.clone()));
        assert!(!sel.add(f.clone()));
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn add_then_remove_is_identity() {
        let tmp = tempfile::tempdir().unwrap();
        let f = tmp.path().join("a.txt");
        fs::write(&f, "x").unwrap();
        let mut sel = SelectionBox::new(tmp.path().join("selbox.clifm"));
        sel.add(f.clone());
        assert!(sel.remove(&f));
        assert!(sel.is_empty());
        assert!(!sel.remove(&f));
    }

    #[test]
    fn ids_track_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let f = tmp.path().join("a.txt");
        fs::write(&f, "x").unwrap();
        let meta = fs::symlink_metadata(&f).unwrap();
        let mut sel = SelectionBox::new(tmp.path().join("selbox.clifm"));
        sel.add(f.clone());
        assert!(sel.contains_id(meta.dev(), meta.ino()));
        sel.remove(&f);
        assert!(!sel.contains_id(meta.dev(), meta.ino()));
    }

    #[test]
    fn load_drops_missing_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let real = tmp.path().join("real.txt");
        fs::write(&real, "x").unwrap();
        let selfile = tmp.path().join("selbox.clifm");
        fs::write(
            &selfile,
            format!("{}\n/definitely/gone\n", real.display()),
        )
        .unwrap();
        let mut sel = SelectionBox::new(selfile);
        sel.load().unwrap();
        assert_eq!(sel.len(), 1);
        assert!(sel.contains(&real));
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let f = tmp.path().join("a.txt");
        fs::write(&f, "x").unwrap();
        let selfile = tmp.path().join("selbox.clifm");
        let mut sel = SelectionBox::new(selfile.clone());
        sel.add(f.clone());
        sel.save().unwrap();
        let mut sel2 = SelectionBox::new(selfile);
        sel2.load().unwrap();
        assert!(sel2.contains(&f));
    }
}
