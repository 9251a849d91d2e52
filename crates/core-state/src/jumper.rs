//! The jumper: a frecency index over visited directories.
//!
//! Records store raw observations (visit count, first/last timestamps); the
//! rank is always derived, so decay scales the stored visit counts rather
//! than a cached rank. Persistence is line-oriented:
//! `visits:last_visit:first_visit:path`, with one `@N` total-rank snapshot.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::StateError;

pub const BASE_POINTS: i64 = 100;
pub const BONUS_BASENAME: i64 = 300;
pub const BONUS_BOOKMARK: i64 = 500;
pub const BONUS_PINNED: i64 = 1000;
pub const BONUS_WORKSPACE: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpEntry {
    pub visits: u64,
    pub first_visit: i64,
    pub last_visit: i64,
    /// Protected from the min-rank purge (bookmarked/pinned/workspace dirs).
    pub keep: bool,
}

/// Session facts that grant rank bonuses.
#[derive(Debug, Clone, Default)]
pub struct RankContext {
    pub bookmarks: Vec<PathBuf>,
    pub pinned: Option<PathBuf>,
    pub workspaces: Vec<PathBuf>,
}

impl RankContext {
    fn is_keep(&self, path: &Path) -> bool {
        self.bookmarks.iter().any(|b| b == path)
            || self.pinned.as_deref() == Some(path)
            || self.workspaces.iter().any(|w| w == path)
    }
}

#[derive(Debug, Default)]
pub struct JumpDb {
    entries: HashMap<PathBuf, JumpEntry>,
}

/// visits × 100, scaled by recency.
fn recency_rank(visits: u64, last_visit: i64, now: i64) -> i64 {
    let base = visits as i64 * BASE_POINTS;
    let age_hours = (now - last_visit).max(0) / 3600;
    if age_hours <= 1 {
        base * 4
    } else if age_hours <= 24 {
        base * 2
    } else if age_hours <= 168 {
        base / 2
    } else {
        base / 4
    }
}

impl JumpDb {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&JumpEntry> {
        self.entries.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &JumpEntry)> {
        self.entries.iter()
    }

    /// Rank of one entry, with query/session bonuses.
    pub fn rank(
        &self,
        path: &Path,
        entry: &JumpEntry,
        now: i64,
        query: &[String],
        ctx: &RankContext,
    ) -> i64 {
        let mut rank = recency_rank(entry.visits, entry.last_visit, now);
        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if !query.is_empty() && query.iter().any(|q| basename.contains(q.as_str())) {
            rank += BONUS_BASENAME;
        }
        if ctx.bookmarks.iter().any(|b| b == path) {
            rank += BONUS_BOOKMARK;
        }
        if ctx.pinned.as_deref() == Some(path) {
            rank += BONUS_PINNED;
        }
        if ctx.workspaces.iter().any(|w| w == path) {
            rank += BONUS_WORKSPACE;
        }
        rank
    }

    pub fn total_rank(&self, now: i64) -> i64 {
        self.entries
            .values()
            .map(|e| recency_rank(e.visits, e.last_visit, now))
            .sum()
    }

    /// Record a visit, then decay while the total rank exceeds `max_total`:
    /// every rank is scaled by 0.9 (via the stored visit counts) and entries
    /// falling under `min_rank` without `keep` are dropped.
    pub fn record_visit(
        &mut self,
        path: &Path,
        now: i64,
        ctx: &RankContext,
        max_total: i64,
        min_rank: i64,
    ) {
        let keep = ctx.is_keep(path);
        let e = self.entries.entry(path.to_path_buf()).or_insert(JumpEntry {
            visits: 0,
            first_visit: now,
            last_visit: now,
            keep,
        });
        e.visits += 1;
        e.last_visit = now;
        e.keep = keep;

        let mut guard = 0;
        while self.total_rank(now) >= max_total {
            let before = self.total_rank(now);
            for e in self.entries.values_mut() {
                e.visits = e.visits * 9 / 10;
            }
            self.entries.retain(|_, e| {
                e.keep || recency_rank(e.visits, e.last_visit, now) >= min_rank
            });
            let after = self.total_rank(now);
            guard += 1;
            if after >= before || guard > 64 {
                break;
            }
        }
    }

    /// Highest-rank entry whose path contains every query substring.
    pub fn best_match(
        &self,
        query: &[String],
        now: i64,
        ctx: &RankContext,
        filter: impl Fn(&Path) -> bool,
    ) -> Option<(&PathBuf, i64)> {
        self.entries
            .iter()
            .filter(|(p, _)| {
                let s = p.to_string_lossy();
                filter(p) && query.iter().all(|q| s.contains(q.as_str()))
            })
            .map(|(p, e)| (p, self.rank(p, e, now, query, ctx)))
            .max_by_key(|(_, r)| *r)
    }

    /// All entries ranked, highest first (`jl`).
    pub fn ranked(&self, now: i64, ctx: &RankContext) -> Vec<(&PathBuf, &JumpEntry, i64)> {
        let mut v: Vec<_> = self
            .entries
            .iter()
            .map(|(p, e)| (p, e, self.rank(p, e, now, &[], ctx)))
            .collect();
        v.sort_by(|a, b| b.2.cmp(&a.2));
        v
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Load `jump.clifm`. With `purge_missing`, entries whose path no longer
    /// exists are dropped on the spot. The `@N` snapshot line is tolerated
    /// anywhere.
    pub fn load(&mut self, path: &Path, purge_missing: bool, ctx: &RankContext) -> Result<(), StateError> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StateError::io(path, e)),
        };
        let mut skipped = 0usize;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('@') {
                continue;
            }
            let mut parts = line.splitn(4, ':');
            let (Some(visits), Some(last), Some(first), Some(p)) =
                (parts.next(), parts.next(), parts.next(), parts.next())
            else {
                skipped += 1;
                continue;
            };
            let (Ok(visits), Ok(last), Ok(first)) = (
                visits.parse::<u64>(),
                last.parse::<i64>(),
                first.parse::<i64>(),
            ) else {
                skipped += 1;
                continue;
            };
            let dir = PathBuf::from(p);
            if purge_missing && !dir.exists() {
                skipped += 1;
                continue;
            }
            let keep = ctx.is_keep(&dir);
            self.entries.insert(
                dir,
                JumpEntry {
                    visits,
                    first_visit: first,
                    last_visit: last,
                    keep,
                },
            );
        }
        if skipped > 0 {
            debug!(target: "jumper", skipped, "skipped jump database lines at load");
        }
        Ok(())
    }

    pub fn save(&self, path: &Path, now: i64) -> Result<(), StateError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StateError::io(parent, e))?;
        }
        let mut out = format!("@{}\n", self.total_rank(now));
        for (p, e) in &self.entries {
            out.push_str(&format!(
                "{}:{}:{}:{}\n",
                e.visits,
                e.last_visit,
                e.first_visit,
                p.to_string_lossy()
            ));
        }
        fs::write(path, out).map_err(|e| StateError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 3600;

    fn visit(db: &mut JumpDb, path: &str, now: i64) {
        db.record_visit(Path::new(path), now, &RankContext::default(), 100_000, 10);
    }

    #[test]
    fn three_visits_within_the_hour_rank_1200() {
        let mut db = JumpDb::default();
        let now = 1_000_000;
        visit(&mut db, "/home/u/projects", now - 40);
        visit(&mut db, "/home/u/projects", now - 20);
        visit(&mut db, "/home/u/projects", now);
        let e = db.get(Path::new("/home/u/projects")).unwrap();
        assert_eq!(e.visits, 3);
        let rank = db.rank(
            Path::new("/home/u/projects"),
            e,
            now,
            &[],
            &RankContext::default(),
        );
        assert_eq!(rank, 3 * 100 * 4);
    }

    #[test]
    fn recency_multipliers() {
        assert_eq!(recency_rank(1, 0, HOUR), 400);
        assert_eq!(recency_rank(1, 0, 10 * HOUR), 200);
        assert_eq!(recency_rank(1, 0, 100 * HOUR), 50);
        assert_eq!(recency_rank(1, 0, 1000 * HOUR), 25);
    }

    #[test]
    fn bonuses_stack() {
        let db = {
            let mut db = JumpDb::default();
            visit(&mut db, "/work", 0);
            db
        };
        let ctx = RankContext {
            bookmarks: vec![PathBuf::from("/work")],
            pinned: Some(PathBuf::from("/work")),
            workspaces: vec![PathBuf::from("/work")],
        };
        let e = db.get(Path::new("/work")).unwrap();
        let rank = db.rank(Path::new("/work"), e, 0, &["work".to_string()], &ctx);
        assert_eq!(rank, 400 + 300 + 500 + 1000 + 300);
    }

    #[test]
    fn total_rank_stays_bounded() {
        let mut db = JumpDb::default();
        let max_total = 100_000;
        let now = 50_000;
        for i in 0..2000 {
            let path = format!("/dir{}", i % 40);
            db.record_visit(Path::new(&path), now, &RankContext::default(), max_total, 10);
        }
        assert!(db.total_rank(now) < (max_total as f64 * 1.1) as i64);
    }

    #[test]
    fn min_rank_purge_spares_keep() {
        let mut db = JumpDb::default();
        let ctx = RankContext {
            pinned: Some(PathBuf::from("/pinned")),
            ..Default::default()
        };
        let now = 0;
        db.record_visit(Path::new("/pinned"), now, &ctx, 100_000, 10);
        // Flood with visits to a hot dir until decay kicks in.
        for _ in 0..400 {
            db.record_visit(Path::new("/hot"), now, &ctx, 10_000, 500);
        }
        assert!(db.get(Path::new("/pinned")).is_some());
    }

    #[test]
    fn best_match_requires_all_substrings() {
        let mut db = JumpDb::default();
        visit(&mut db, "/home/u/projects/rust", 0);
        visit(&mut db, "/home/u/music", 0);
        let ctx = RankContext::default();
        let hit = db
            .best_match(&["proj".to_string(), "rust".to_string()], 0, &ctx, |_| true)
            .unwrap();
        assert_eq!(hit.0, &PathBuf::from("/home/u/projects/rust"));
        assert!(db
            .best_match(&["music".to_string(), "rust".to_string()], 0, &ctx, |_| true)
            .is_none());
    }

    #[test]
    fn persistence_round_trip_with_snapshot_line() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("jump.clifm");
        let mut db = JumpDb::default();
        // Use the tempdir itself so a purge-on-load keeps it.
        let dir = tmp.path().to_path_buf();
        db.record_visit(&dir, 42, &RankContext::default(), 100_000, 10);
        db.save(&file, 42).unwrap();
        let content = fs::read_to_string(&file).unwrap();
        assert!(content.starts_with('@'));
        let mut db2 = JumpDb::default();
        db2.load(&file, true, &RankContext::default()).unwrap();
        let e = db2.get(&dir).unwrap();
        assert_eq!(e.visits, 1);
        assert_eq!(e.last_visit, 42);
    }

    #[test]
    fn purge_missing_drops_dead_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("jump.clifm");
        fs::write(&file, "5:1:1:/definitely/gone\n").unwrap();
        let mut db = JumpDb::default();
        db.load(&file, true, &RankContext::default()).unwrap();
        assert!(db.is_empty());
        let mut db2 = JumpDb::default();
        db2.load(&file, false, &RankContext::default()).unwrap();
        assert_eq!(db2.len(), 1);
    }
}
