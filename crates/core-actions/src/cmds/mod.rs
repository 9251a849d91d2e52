//! Handlers behind the dispatcher's command table.

pub mod bm;
pub mod fileops;
pub mod jump;
pub mod misc;
pub mod nav;
pub mod open_cmd;
pub mod profile;
pub mod search;
pub mod selops;
pub mod tag_cmd;
pub mod trash_cmd;

use core_state::Session;

/// Report a handler error: immediate feedback plus the message list.
pub(crate) fn fail(session: &mut Session, msg: impl Into<String>) -> i32 {
    let msg = msg.into();
    eprintln!("clifm: {msg}");
    session.msgs.error(msg);
    crate::exec::exit::FAILURE
}

pub(crate) fn usage(session: &mut Session, msg: impl Into<String>) -> i32 {
    let msg = msg.into();
    eprintln!("clifm: usage: {msg}");
    session.msgs.warning(msg);
    crate::exec::exit::USAGE
}
