//! The directory listing engine and prompt renderer.
//!
//! `refresh` rebuilds the session's entry vector; `print_listing` renders it
//! (columns or long view) through the pager. Both are driven once per REPL
//! iteration after a dispatched command.

use std::io::{self, Write};
use std::path::PathBuf;

use core_state::Session;
use tracing::debug;

pub mod layout;
pub mod long;
pub mod pager;
pub mod prompt;
pub mod scan;
pub mod sort;
pub mod trim;

pub use pager::{Pager, PagerAction, PAGER_HELP, PAGER_LABEL};
pub use scan::refresh;

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("cannot open directory {path}: {source}")]
    OpenDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Render the current entry vector to stdout, honoring the pager. Returns
/// `Ok(false)` when the listing was aborted from the pager.
pub fn print_listing(session: &Session) -> io::Result<bool> {
    let (term_cols, term_rows) = core_terminal::term_size();
    let opts = &session.opts;
    let mut stdout = io::stdout();

    if opts.clear_screen {
        write!(stdout, "\x1b[2J\x1b[H")?;
    }

    let rows = if opts.long_view {
        long::long_rows(session, term_cols)
    } else {
        layout::column_rows(
            session,
            term_cols,
            opts.listing_mode == core_config::ListingMode::Horizontal,
        )
    };

    let mut pager = Pager::new(opts.pager, term_rows);
    let mut aborted = false;
    'rows: for row in &rows {
        writeln!(stdout, "{row}")?;
        if pager.on_row() == PagerAction::AwaitKey {
            loop {
                write!(stdout, "{PAGER_LABEL}")?;
                stdout.flush()?;
                let key = core_terminal::read_single_key()?;
                write!(stdout, "\r\x1b[K")?;
                match pager.on_key(key) {
                    PagerAction::Continue => break,
                    PagerAction::Abort => {
                        aborted = true;
                        break 'rows;
                    }
                    PagerAction::Help => {
                        write!(stdout, "{PAGER_HELP}")?;
                    }
                    PagerAction::AwaitKey => unreachable!("on_key never requests a key"),
                }
            }
        }
    }

    let total = session.entries.len();
    if let Some(max) = opts.max_files {
        if max < total {
            writeln!(stdout, "{max}/{total}")?;
        }
    }
    stdout.flush()?;
    debug!(target: "listing", rows = rows.len(), aborted, "listing printed");
    Ok(!aborted)
}

/// Print the selection box before the prompt (`PrintSelfiles`). The display
/// is capped at `term_rows/2 - 4` entries with a `k/N` tail.
pub fn print_selfiles(session: &Session) -> io::Result<()> {
    if !session.opts.print_selfiles || session.selbox.is_empty() {
        return Ok(());
    }
    let (_, term_rows) = core_terminal::term_size();
    let cap = (term_rows / 2).saturating_sub(4).max(1);
    let mut stdout = io::stdout();
    writeln!(stdout, "Selected files:")?;
    for p in session.selbox.iter().take(cap) {
        writeln!(stdout, "  {}", p.display())?;
    }
    let total = session.selbox.len();
    if total > cap {
        writeln!(stdout, "  {cap}/{total}")?;
    }
    stdout.flush()
}
