//! The listing pager.
//!
//! An explicit-cursor type: the renderer calls [`Pager::on_row`] after each
//! printed row and, when told to, feeds the next key press to
//! [`Pager::on_key`]. Disabling (`q`/`c`/`p`) lasts for the current listing
//! only; the session option is untouched.

use core_terminal::Key;

pub const PAGER_LABEL: &str = "--Mas--";

pub const PAGER_HELP: &str = "\
Enter/Down : advance one line
Space/PgDn : advance one page
h, ?       : this help
q, c, p    : stop paging this listing
Esc        : abort the listing
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerAction {
    /// Keep rendering rows.
    Continue,
    /// A page boundary: read one key and pass it to `on_key`.
    AwaitKey,
    /// Stop rendering the listing altogether.
    Abort,
    /// Print the inline help, then continue.
    Help,
}

#[derive(Debug)]
pub struct Pager {
    enabled: bool,
    page_rows: usize,
    printed: usize,
}

impl Pager {
    pub fn new(enabled: bool, term_rows: usize) -> Self {
        Self {
            enabled,
            // Keep the label row and one context row visible.
            page_rows: term_rows.saturating_sub(2).max(1),
            printed: 0,
        }
    }

    pub fn page_rows(&self) -> usize {
        self.page_rows
    }

    /// Account for one rendered row.
    pub fn on_row(&mut self) -> PagerAction {
        if !self.enabled {
            return PagerAction::Continue;
        }
        self.printed += 1;
        if self.printed >= self.page_rows {
            PagerAction::AwaitKey
        } else {
            PagerAction::Continue
        }
    }

    /// Interpret the key pressed at a page boundary.
    pub fn on_key(&mut self, key: Key) -> PagerAction {
        match key {
            // One more line.
            Key::Enter | Key::Down => {
                self.printed = self.page_rows.saturating_sub(1);
                PagerAction::Continue
            }
            // A whole page.
            Key::Space | Key::PageDown | Key::Char('f') => {
                self.printed = 0;
                PagerAction::Continue
            }
            Key::Char('q') | Key::Char('c') | Key::Char('p') => {
                self.enabled = false;
                PagerAction::Continue
            }
            Key::Char('h') | Key::Char('?') => {
                self.printed = self.page_rows.saturating_sub(1);
                PagerAction::Help
            }
            Key::Esc => PagerAction::Abort,
            // Repaint the current position: hold the row counter.
            _ => {
                self.printed = self.page_rows.saturating_sub(1);
                PagerAction::Continue
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_boundary_at_term_rows_minus_two() {
        // Terminal of 24 rows pauses after 22 rendered rows (scenario: two
        // columns show 44 entries per page).
        let mut p = Pager::new(true, 24);
        assert_eq!(p.page_rows(), 22);
        for _ in 0..21 {
            assert_eq!(p.on_row(), PagerAction::Continue);
        }
        assert_eq!(p.on_row(), PagerAction::AwaitKey);
    }

    #[test]
    fn space_advances_a_full_page() {
        let mut p = Pager::new(true, 24);
        for _ in 0..22 {
            p.on_row();
        }
        assert_eq!(p.on_key(Key::Space), PagerAction::Continue);
        for _ in 0..21 {
            assert_eq!(p.on_row(), PagerAction::Continue);
        }
        assert_eq!(p.on_row(), PagerAction::AwaitKey);
    }

    #[test]
    fn enter_advances_one_line() {
        let mut p = Pager::new(true, 24);
        for _ in 0..22 {
            p.on_row();
        }
        assert_eq!(p.on_key(Key::Enter), PagerAction::Continue);
        assert_eq!(p.on_row(), PagerAction::AwaitKey);
    }

    #[test]
    fn quit_disables_for_this_listing() {
        let mut p = Pager::new(true, 24);
        for _ in 0..22 {
            p.on_row();
        }
        p.on_key(Key::Char('q'));
        for _ in 0..1000 {
            assert_eq!(p.on_row(), PagerAction::Continue);
        }
    }

    #[test]
    fn disabled_pager_never_pauses() {
        let mut p = Pager::new(false, 24);
        for _ in 0..100 {
            assert_eq!(p.on_row(), PagerAction::Continue);
        }
    }

    #[test]
    fn esc_aborts() {
        let mut p = Pager::new(true, 3);
        p.on_row();
        assert_eq!(p.on_key(Key::Esc), PagerAction::Abort);
    }
}
