//! The tag graph: a symlink-encoded many-to-many tag/file relation.
//!
//! Layout: `tags_dir/<tag>/<encoded>` where `<encoded>` is the tagged file's
//! absolute path with `/` replaced by `:`, and the link target is that
//! absolute path. A tag is just a directory; an empty one is a valid tag.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use crate::StateError;

#[derive(Debug)]
pub struct TagGraph {
    dir: PathBuf,
}

/// `/some/file` -> `:some:file`
pub fn encode_path(path: &Path) -> String {
    path.to_string_lossy().replace('/', ":")
}

fn valid_tag(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\0')
}

impl TagGraph {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn tag_dir(&self, tag: &str) -> Result<PathBuf, StateError> {
        if !valid_tag(tag) {
            return Err(StateError::BadTagName(tag.to_string()));
        }
        Ok(self.dir.join(tag))
    }

    pub fn exists(&self, tag: &str) -> bool {
        valid_tag(tag) && self.dir.join(tag).is_dir()
    }

    /// All tag names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut tags: Vec<String> = match fs::read_dir(&self.dir) {
            Ok(rd) => rd
                .flatten()
                .filter(|e| e.path().is_dir())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect(),
            Err(_) => Vec::new(),
        };
        tags.sort();
        tags
    }

    /// Create an (empty) tag directory.
    pub fn create(&self, tag: &str) -> Result<(), StateError> {
        let dir = self.tag_dir(tag)?;
        fs::create_dir_all(&dir).map_err(|e| StateError::io(&dir, e))
    }

    /// Tag one file: create `tags_dir/<tag>/<encoded>` -> absolute path.
    /// Tagging an already-tagged file is a no-op.
    pub fn tag_file(&self, file: &Path, tag: &str) -> Result<(), StateError> {
        self.create(tag)?;
        let target = fs::canonicalize(file).map_err(|e| StateError::io(file, e))?;
        let link = self.dir.join(tag).join(encode_path(&target));
        if link.symlink_metadata().is_ok() {
            return Ok(());
        }
        symlink(&target, &link).map_err(|e| StateError::io(&link, e))
    }

    /// Remove one (file, tag) association. The tag directory persists even
    /// when it becomes empty.
    pub fn untag_file(&self, file: &Path, tag: &str) -> Result<(), StateError> {
        let dir = self.tag_dir(tag)?;
        if !dir.is_dir() {
            return Err(StateError::NoSuchTag(tag.to_string()));
        }
        let target = fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
        let link = dir.join(encode_path(&target));
        fs::remove_file(&link).map_err(|e| StateError::io(&link, e))
    }

    /// Files tagged as `tag`, dereferenced to their targets.
    pub fn files(&self, tag: &str) -> Result<Vec<PathBuf>, StateError> {
        let dir = self.tag_dir(tag)?;
        if !dir.is_dir() {
            return Err(StateError::NoSuchTag(tag.to_string()));
        }
        let rd = fs::read_dir(&dir).map_err(|e| StateError::io(&dir, e))?;
        let mut files: Vec<PathBuf> = rd
            .flatten()
            .filter_map(|e| fs::read_link(e.path()).ok())
            .collect();
        files.sort();
        Ok(files)
    }

    pub fn count(&self, tag: &str) -> usize {
        self.dir
            .join(tag)
            .read_dir()
            .map(|rd| rd.count())
            .unwrap_or(0)
    }

    /// Remove a tag and every association under it.
    pub fn delete(&self, tag: &str) -> Result<(), StateError> {
        let dir = self.tag_dir(tag)?;
        if !dir.is_dir() {
            return Err(StateError::NoSuchTag(tag.to_string()));
        }
        fs::remove_dir_all(&dir).map_err(|e| StateError::io(&dir, e))
    }

    pub fn rename(&self, old: &str, new: &str) -> Result<(), StateError> {
        let from = self.tag_dir(old)?;
        let to = self.tag_dir(new)?;
        if !from.is_dir() {
            return Err(StateError::NoSuchTag(old.to_string()));
        }
        fs::rename(&from, &to).map_err(|e| StateError::io(&from, e))
    }

    /// Move every association from `src` into `dst`, then remove `src`.
    pub fn merge(&self, src: &str, dst: &str) -> Result<(), StateError> {
        let from = self.tag_dir(src)?;
        if !from.is_dir() {
            return Err(StateError::NoSuchTag(src.to_string()));
        }
        self.create(dst)?;
        let to = self.dir.join(dst);
        let rd = fs::read_dir(&from).map_err(|e| StateError::io(&from, e))?;
        for entry in rd.flatten() {
            let dest = to.join(entry.file_name());
            if dest.symlink_metadata().is_ok() {
                // Same association already present in dst.
                fs::remove_file(entry.path()).map_err(|e| StateError::io(entry.path(), e))?;
            } else {
                fs::rename(entry.path(), &dest).map_err(|e| StateError::io(entry.path(), e))?;
            }
        }
        fs::remove_dir(&from).map_err(|e| StateError::io(&from, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (tempfile::TempDir, TagGraph, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let graph = TagGraph::new(tmp.path().join("tags"));
        let file = tmp.path().join("doc.txt");
        fs::write(&file, "x").unwrap();
        (tmp, graph, file)
    }

    #[test]
    fn tag_creates_encoded_symlink() {
        let (_tmp, graph, file) = fixture();
        graph.tag_file(&file, "work").unwrap();
        let target = fs::canonicalize(&file).unwrap();
        let link = graph.dir().join("work").join(encode_path(&target));
        assert_eq!(fs::read_link(&link).unwrap(), target);
        // Exactly one association.
        assert_eq!(graph.count("work"), 1);
        // Idempotent.
        graph.tag_file(&file, "work").unwrap();
        assert_eq!(graph.count("work"), 1);
    }

    #[test]
    fn untag_keeps_empty_tag_dir() {
        let (_tmp, graph, file) = fixture();
        graph.tag_file(&file, "work").unwrap();
        graph.untag_file(&file, "work").unwrap();
        assert_eq!(graph.count("work"), 0);
        assert!(graph.exists("work"));
    }

    #[test]
    fn files_dereference_targets() {
        let (_tmp, graph, file) = fixture();
        graph.tag_file(&file, "work").unwrap();
        let files = graph.files("work").unwrap();
        assert_eq!(files, vec![fs::canonicalize(&file).unwrap()]);
    }

    #[test]
    fn rename_and_merge() {
        let (tmp, graph, file) = fixture();
        let other = tmp.path().join("other.txt");
        fs::write(&other, "y").unwrap();
        graph.tag_file(&file, "a").unwrap();
        graph.tag_file(&other, "b").unwrap();
        graph.rename("a", "c").unwrap();
        assert!(!graph.exists("a"));
        assert_eq!(graph.count("c"), 1);
        graph.merge("c", "b").unwrap();
        assert!(!graph.exists("c"));
        assert_eq!(graph.count("b"), 2);
    }

    #[test]
    fn invalid_names_rejected() {
        let (_tmp, graph, file) = fixture();
        assert!(matches!(
            graph.tag_file(&file, "a/b"),
            Err(StateError::BadTagName(_))
        ));
        assert!(matches!(
            graph.create(""),
            Err(StateError::BadTagName(_))
        ));
    }

    #[test]
    fn missing_tag_errors() {
        let (_tmp, graph, _file) = fixture();
        assert!(matches!(
            graph.files("nope"),
            Err(StateError::NoSuchTag(_))
        ));
        assert!(matches!(
            graph.delete("nope"),
            Err(StateError::NoSuchTag(_))
        ));
    }
}
