//! Name rendering: display width and column-boundary trimming.
//!
//! With Unicode enabled, widths come from `unicode-width` and trims never
//! split a grapheme cluster. With it disabled, widths are byte counts after
//! substituting non-printable bytes with `^`. The stored name is never
//! mutated; trimming produces a display slice.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Sentinel appended to a trimmed name, rendered in the trim color.
pub const TRIM_SENTINEL: char = '~';

/// Substitute non-printable ASCII with `^` (non-Unicode path).
pub fn substitute_unprintable(name: &str) -> String {
    name.chars()
        .map(|c| if (c as u32) < 0x20 || c == '\x7f' { '^' } else { c })
        .collect()
}

pub fn display_width(name: &str, unicode: bool) -> usize {
    if unicode {
        name.width()
    } else {
        substitute_unprintable(name).len()
    }
}

/// Trim `name` to at most `max` columns, appending the sentinel when cut.
/// Returns the rendered string (without color) and its width.
pub fn trim_name(name: &str, max: usize, unicode: bool) -> (String, usize, bool) {
    let width = display_width(name, unicode);
    if max == 0 || width <= max {
        let rendered = if unicode {
            name.to_string()
        } else {
            substitute_unprintable(name)
        };
        return (rendered, width, false);
    }
    let budget = max.saturating_sub(1);
    if unicode {
        let mut out = String::new();
        let mut w = 0usize;
        for g in name.graphemes(true) {
            let gw = g.width();
            if w + gw > budget {
                break;
            }
            out.push_str(g);
            w += gw;
        }
        out.push(TRIM_SENTINEL);
        (out, w + 1, true)
    } else {
        let sub = substitute_unprintable(name);
        let mut out: String = sub.chars().take(budget).collect();
        out.push(TRIM_SENTINEL);
        let w = out.len();
        (out, w, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_trim_at_exact_width() {
        let (s, w, cut) = trim_name("12345", 5, true);
        assert_eq!(s, "12345");
        assert_eq!(w, 5);
        assert!(!cut);
    }

    #[test]
    fn trim_reserves_sentinel_column() {
        let (s, w, cut) = trim_name("123456", 5, true);
        assert_eq!(s, "1234~");
        assert_eq!(w, 5);
        assert!(cut);
    }

    #[test]
    fn wide_chars_do_not_split() {
        // Each ideograph is two columns; budget 4 leaves room for one plus
        // the sentinel.
        let (s, w, cut) = trim_name("日本語", 4, true);
        assert_eq!(s, format!("日{TRIM_SENTINEL}"));
        assert_eq!(w, 3);
        assert!(cut);
    }

    #[test]
    fn non_unicode_substitutes_control_bytes() {
        assert_eq!(substitute_unprintable("a\tb\x01"), "a^b^");
        let (s, _, _) = trim_name("a\tb", 10, false);
        assert_eq!(s, "a^b");
    }

    #[test]
    fn zero_max_means_unlimited() {
        let (s, _, cut) = trim_name("a-very-long-name", 0, true);
        assert_eq!(s, "a-very-long-name");
        assert!(!cut);
    }
}
