//! The FreeDesktop trash layout: `~/.local/share/Trash/{files,info}`.
//!
//! Trashing moves the file into `files/` under a collision-free name and
//! writes an `info/<name>.trashinfo` sidecar holding the original absolute
//! path and the deletion date. Restore reverses the pair.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum TrashError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0}: not in the trash")]
    NotFound(String),
    #[error("{0}: original path already exists")]
    Collision(PathBuf),
}

fn io_err(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> TrashError {
    let path = path.into();
    move |source| TrashError::Io { path, source }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashedFile {
    /// Name inside `files/`.
    pub name: String,
    pub original: PathBuf,
    pub deleted_at: String,
}

#[derive(Debug, Clone)]
pub struct Trash {
    files: PathBuf,
    info: PathBuf,
}

impl Trash {
    pub fn new(trash_dir: &Path) -> Self {
        Self {
            files: trash_dir.join("files"),
            info: trash_dir.join("info"),
        }
    }

    fn ensure(&self) -> Result<(), TrashError> {
        fs::create_dir_all(&self.files).map_err(io_err(&self.files))?;
        fs::create_dir_all(&self.info).map_err(io_err(&self.info))
    }

    pub fn is_empty(&self) -> bool {
        self.files
            .read_dir()
            .map(|mut rd| rd.next().is_none())
            .unwrap_or(true)
    }

    /// Pick a free name in `files/`: the basename, then `name.N`.
    fn free_name(&self, base: &str) -> String {
        if !self.files.join(base).exists() {
            return base.to_string();
        }
        let mut n = 1usize;
        loop {
            let candidate = format!("{base}.{n}");
            if !self.files.join(&candidate).exists() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Move one file into the trash.
    pub fn trash(&self, path: &Path) -> Result<String, TrashError> {
        self.ensure()?;
        let abs = fs::canonicalize(path).map_err(io_err(path))?;
        let base = abs
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());
        let name = self.free_name(&base);
        let dest = self.files.join(&name);
        fs::rename(&abs, &dest).map_err(io_err(&abs))?;
        let info = format!(
            "[Trash Info]\nPath={}\nDeletionDate={}\n",
            abs.display(),
            Local::now().format("%Y-%m-%dT%H:%M:%S")
        );
        let info_path = self.info.join(format!("{name}.trashinfo"));
        if let Err(e) = fs::write(&info_path, info) {
            // Roll the move back rather than leave an orphan.
            let _ = fs::rename(&dest, &abs);
            return Err(TrashError::Io {
                path: info_path,
                source: e,
            });
        }
        debug!(target: "trash", file = %abs.display(), name = %name, "trashed");
        Ok(name)
    }

    pub fn list(&self) -> Vec<TrashedFile> {
        let mut out = Vec::new();
        let Ok(rd) = self.files.read_dir() else {
            return out;
        };
        for entry in rd.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            let (original, deleted_at) = self.read_info(&name);
            out.push(TrashedFile {
                name,
                original,
                deleted_at,
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    fn read_info(&self, name: &str) -> (PathBuf, String) {
        let mut original = PathBuf::new();
        let mut date = String::new();
        if let Ok(content) = fs::read_to_string(self.info.join(format!("{name}.trashinfo"))) {
            for line in content.lines() {
                if let Some(p) = line.strip_prefix("Path=") {
                    original = PathBuf::from(p);
                } else if let Some(d) = line.strip_prefix("DeletionDate=") {
                    date = d.to_string();
                }
            }
        }
        (original, date)
    }

    /// Restore one trashed file to its original path.
    pub fn restore(&self, name: &str) -> Result<PathBuf, TrashError> {
        let src = self.files.join(name);
        if !src.exists() {
            return Err(TrashError::NotFound(name.to_string()));
        }
        let (original, _) = self.read_info(name);
        if original.as_os_str().is_empty() {
            return Err(TrashError::NotFound(name.to_string()));
        }
        if original.exists() {
            return Err(TrashError::Collision(original));
        }
        if let Some(parent) = original.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        fs::rename(&src, &original).map_err(io_err(&src))?;
        let _ = fs::remove_file(self.info.join(format!("{name}.trashinfo")));
        debug!(target: "trash", name, to = %original.display(), "restored");
        Ok(original)
    }

    /// Drop everything.
    pub fn empty(&self) -> Result<usize, TrashError> {
        let mut removed = 0usize;
        for tf in self.list() {
            let file = self.files.join(&tf.name);
            let result = if file.is_dir() {
                fs::remove_dir_all(&file)
            } else {
                fs::remove_file(&file)
            };
            match result {
                Ok(()) => {
                    removed += 1;
                    let _ = fs::remove_file(self.info.join(format!("{}.trashinfo", tf.name)));
                }
                Err(e) => warn!(target: "trash", name = %tf.name, error = %e, "cannot remove"),
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (tempfile::TempDir, Trash, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let trash = Trash::new(&tmp.path().join("Trash"));
        let f = tmp.path().join("doc.txt");
        fs::write(&f, "content").unwrap();
        (tmp, trash, f)
    }

    #[test]
    fn trash_moves_file_and_writes_info() {
        let (_tmp, trash, f) = fixture();
        let name = trash.trash(&f).unwrap();
        assert_eq!(name, "doc.txt");
        assert!(!f.exists());
        assert!(!trash.is_empty());
        let listed = trash.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].original, fs::canonicalize(f.parent().unwrap()).unwrap().join("doc.txt"));
        assert!(!listed[0].deleted_at.is_empty());
    }

    #[test]
    fn name_collisions_get_suffixes() {
        let (tmp, trash, f) = fixture();
        trash.trash(&f).unwrap();
        fs::write(tmp.path().join("doc.txt"), "again").unwrap();
        let name = trash.trash(&tmp.path().join("doc.txt")).unwrap();
        assert_eq!(name, "doc.txt.1");
    }

    #[test]
    fn restore_round_trip() {
        let (_tmp, trash, f) = fixture();
        let name = trash.trash(&f).unwrap();
        let back = trash.restore(&name).unwrap();
        assert!(back.exists());
        assert_eq!(fs::read_to_string(&back).unwrap(), "content");
        assert!(trash.is_empty());
    }

    #[test]
    fn restore_refuses_collision() {
        let (tmp, trash, f) = fixture();
        let name = trash.trash(&f).unwrap();
        fs::write(tmp.path().join("doc.txt"), "new").unwrap();
        assert!(matches!(
            trash.restore(&name),
            Err(TrashError::Collision(_))
        ));
    }

    #[test]
    fn empty_clears_everything() {
        let (tmp, trash, f) = fixture();
        trash.trash(&f).unwrap();
        fs::write(tmp.path().join("b.txt"), "x").unwrap();
        trash.trash(&tmp.path().join("b.txt")).unwrap();
        assert_eq!(trash.empty().unwrap(), 2);
        assert!(trash.is_empty());
    }
}
