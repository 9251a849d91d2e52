//! Entry ordering.
//!
//! The version comparator comes from `natord` (lexical-then-numeric with the
//! leading-zero tie-break). Dirs-first partitions directories ahead of
//! everything else while preserving the selected key inside each group.

use std::cmp::Ordering;

use core_config::{Options, SortKey};
use core_state::FileEntry;

fn name_cmp(a: &str, b: &str) -> Ordering {
    // Case-insensitive first, byte order as the tie-break.
    let ai = a.to_lowercase();
    let bi = b.to_lowercase();
    ai.cmp(&bi).then_with(|| a.cmp(b))
}

fn key_cmp(a: &FileEntry, b: &FileEntry, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => name_cmp(&a.name, &b.name),
        SortKey::Size => a.size.cmp(&b.size).then_with(|| name_cmp(&a.name, &b.name)),
        SortKey::Atime | SortKey::Btime | SortKey::Ctime | SortKey::Mtime => {
            a.time.cmp(&b.time).then_with(|| name_cmp(&a.name, &b.name))
        }
        SortKey::Version => natord::compare(&a.name, &b.name),
        SortKey::Extension => {
            let ea = a.extension().unwrap_or("").to_lowercase();
            let eb = b.extension().unwrap_or("").to_lowercase();
            ea.cmp(&eb).then_with(|| name_cmp(&a.name, &b.name))
        }
        SortKey::Inode => a.ino.cmp(&b.ino).then_with(|| name_cmp(&a.name, &b.name)),
        SortKey::Owner => a.uid.cmp(&b.uid).then_with(|| name_cmp(&a.name, &b.name)),
        SortKey::Group => a.gid.cmp(&b.gid).then_with(|| name_cmp(&a.name, &b.name)),
    }
}

pub fn sort_entries(entries: &mut [FileEntry], opts: &Options) {
    let key = opts.sort;
    let reverse = opts.sort_reverse;
    let dirs_first = opts.dirs_first;
    entries.sort_by(|a, b| {
        if dirs_first {
            match (a.is_dir(), b.is_dir()) {
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                _ => {}
            }
        }
        let ord = key_cmp(a, b, key);
        if reverse { ord.reverse() } else { ord }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::EntryType;

    fn file(name: &str) -> FileEntry {
        FileEntry::named(name)
    }

    fn dir(name: &str) -> FileEntry {
        let mut e = FileEntry::named(name);
        e.ftype = EntryType::Dir;
        e
    }

    fn names(entries: &[FileEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn dirs_first_preserves_key_within_groups() {
        let mut v = vec![file("b"), dir("z"), file("a"), dir("c")];
        let opts = Options::default();
        sort_entries(&mut v, &opts);
        assert_eq!(names(&v), vec!["c", "z", "a", "b"]);
    }

    #[test]
    fn version_sort_orders_digit_runs_numerically() {
        let mut v = vec![file("file10"), file("file2"), file("file1")];
        let mut opts = Options::default();
        opts.sort = SortKey::Version;
        opts.dirs_first = false;
        sort_entries(&mut v, &opts);
        assert_eq!(names(&v), vec!["file1", "file2", "file10"]);
    }

    #[test]
    fn reverse_flips_order() {
        let mut v = vec![file("a"), file("b")];
        let mut opts = Options::default();
        opts.sort_reverse = true;
        sort_entries(&mut v, &opts);
        assert_eq!(names(&v), vec!["b", "a"]);
    }

    #[test]
    fn size_sort_with_name_tiebreak() {
        let mut a = file("big");
        a.size = 100;
        let mut b = file("small");
        b.size = 1;
        let mut c = file("also1");
        c.size = 1;
        let mut v = vec![a, b, c];
        let mut opts = Options::default();
        opts.sort = SortKey::Size;
        sort_entries(&mut v, &opts);
        assert_eq!(names(&v), vec!["also1", "small", "big"]);
    }

    #[test]
    fn extension_sort_groups_by_suffix() {
        let mut v = vec![file("b.txt"), file("a.zip"), file("c.txt"), file("plain")];
        let mut opts = Options::default();
        opts.sort = SortKey::Extension;
        sort_entries(&mut v, &opts);
        assert_eq!(names(&v), vec!["plain", "b.txt", "c.txt", "a.zip"]);
    }
}
