//! Columnar layouts.
//!
//! Vertical (ls-like) flows entries down each column then right, walking the
//! implicit grid with index arithmetic; horizontal is plain row-major. Both
//! produce fully-rendered text rows so the pager can pause between them.

use core_config::ColorKey;
use core_state::{FileEntry, Session};

use crate::trim::trim_name;

fn digits(mut n: usize) -> usize {
    let mut d = 1;
    while n >= 10 {
        n /= 10;
        d += 1;
    }
    d
}

/// One rendered cell plus its display width.
struct Cell {
    text: String,
    width: usize,
}

fn render_cell(session: &Session, entry: &FileEntry, eln: usize, eln_width: usize) -> Cell {
    let opts = &session.opts;
    let colors = &session.colors;
    let max = if opts.long_view {
        0
    } else {
        opts.max_name_len.unwrap_or(0)
    };
    let (name, name_width, cut) = trim_name(&entry.name, max, opts.unicode);

    let color = match &entry.ext_color {
        Some(sgr) if colors.enabled => format!("\x1b[{sgr}m"),
        _ => colors.seq(entry.color),
    };
    let reset = colors.reset();

    let marker = if entry.selected {
        format!("{}*{}", colors.seq(ColorKey::SelMarker), reset)
    } else {
        " ".to_string()
    };

    let rendered_name = if cut {
        // The sentinel is the trailing char; recolor it with the trim color.
        let body: String = {
            let mut s = name.clone();
            s.pop();
            s
        };
        format!(
            "{color}{body}{reset}{}{}{reset}",
            colors.seq(ColorKey::Trim),
            crate::trim::TRIM_SENTINEL
        )
    } else {
        format!("{color}{name}{reset}")
    };

    let indicator = if opts.classify {
        entry.ftype.indicator(entry.exec)
    } else {
        None
    };
    let ind_str = indicator.map(|c| c.to_string()).unwrap_or_default();

    let text = format!(
        "{}{:>eln_width$}{} {marker}{rendered_name}{ind_str}",
        colors.seq(ColorKey::Eln),
        eln,
        reset,
    );
    // eln + space + marker + name + indicator
    let width = eln_width + 1 + 1 + name_width + ind_str.len();
    Cell { text, width }
}

/// Render the listing as text rows for the active columnar mode.
pub fn column_rows(session: &Session, term_cols: usize, horizontal: bool) -> Vec<String> {
    let shown = match session.opts.max_files {
        Some(max) => session.entries.len().min(max),
        None => session.entries.len(),
    };
    if shown == 0 {
        return Vec::new();
    }
    let eln_width = digits(shown);
    let cells: Vec<Cell> = session.entries[..shown]
        .iter()
        .enumerate()
        .map(|(i, e)| render_cell(session, e, i + 1, eln_width))
        .collect();

    let longest = cells.iter().map(|c| c.width).max().unwrap_or(1);
    let cols = (term_cols / (longest + 1)).max(1);
    let rows = shown.div_ceil(cols);

    let mut out = Vec::with_capacity(rows);
    for r in 0..rows {
        let mut line = String::new();
        for c in 0..cols {
            let idx = if horizontal { r * cols + c } else { c * rows + r };
            if idx >= shown {
                continue;
            }
            let cell = &cells[idx];
            line.push_str(&cell.text);
            // Pad every column but the last on the line.
            let is_last = if horizontal {
                c + 1 == cols || r * cols + c + 1 >= shown
            } else {
                c + 1 == cols || (c + 1) * rows + r >= shown
            };
            if !is_last {
                line.push_str(&" ".repeat(longest + 1 - cell.width));
            }
        }
        out.push(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::{ColorScheme, ConfigPaths, Options};

    fn session_with(names: &[&str]) -> Session {
        let tmp = std::env::temp_dir();
        let paths = ConfigPaths::resolve(Some(tmp.clone()), None, true).unwrap();
        let mut colors = ColorScheme::default();
        colors.enabled = false;
        let mut s = Session::new(paths, Options::default(), colors, tmp);
        s.opts.classify = false;
        for n in names {
            s.entries.push(FileEntry::named(n));
        }
        s
    }

    fn eln_of(line: &str) -> Vec<usize> {
        line.split_whitespace()
            .step_by(2)
            .map(|t| t.parse().unwrap())
            .collect()
    }

    #[test]
    fn vertical_walks_down_columns() {
        // 5 entries, width for 2 columns: rows = ceil(5/2) = 3.
        // Column 1 holds 1,2,3; column 2 holds 4,5.
        let s = session_with(&["a", "b", "c", "d", "e"]);
        // Each cell is 4 columns wide ("N  a"); two columns fit in 10.
        let rows = column_rows(&s, 10, false);
        assert_eq!(rows.len(), 3);
        assert_eq!(eln_of(&rows[0]), vec![1, 4]);
        assert_eq!(eln_of(&rows[1]), vec![2, 5]);
        assert_eq!(eln_of(&rows[2]), vec![3]);
    }

    #[test]
    fn horizontal_is_row_major() {
        let s = session_with(&["a", "b", "c", "d", "e"]);
        let rows = column_rows(&s, 10, true);
        assert_eq!(eln_of(&rows[0]), vec![1, 2]);
        assert_eq!(eln_of(&rows[1]), vec![3, 4]);
        assert_eq!(eln_of(&rows[2]), vec![5]);
    }

    #[test]
    fn narrow_terminal_degrades_to_one_column() {
        let s = session_with(&["alpha", "beta"]);
        let rows = column_rows(&s, 1, false);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn max_files_caps_rendered_entries() {
        let mut s = session_with(&["a", "b", "c", "d"]);
        s.opts.max_files = Some(2);
        let rows = column_rows(&s, 200, false);
        assert_eq!(rows.len(), 1);
        assert_eq!(eln_of(&rows[0]), vec![1, 2]);
    }

    #[test]
    fn empty_listing_renders_nothing() {
        let s = session_with(&[]);
        assert!(column_rows(&s, 80, false).is_empty());
    }
}
