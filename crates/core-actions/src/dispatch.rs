//! The command dispatcher.
//!
//! After expansion the first token selects a handler from a flat, closed set
//! ordered hot-first; anything unmatched falls through to `/bin/sh` behind
//! the security check. Before the table, a lone token naming a CWD directory
//! auto-cds and a lone regular file auto-opens.

use std::path::Path;

use core_state::Session;
use tracing::{debug, info};

use crate::cmds;
use crate::exec::{self, exit, ChildEnv};
use crate::expand::helpers::unescape;
use crate::expand::{expand_line, ArgsLine, Expanded};
use crate::is_internal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quit {
    /// `q`: plain quit.
    Normal,
    /// `Q`: quit writing the last directory for cd-on-quit wrappers.
    CdOnQuit,
}

#[derive(Debug, Default)]
pub struct DispatchResult {
    pub code: i32,
    pub quit: Option<Quit>,
}

impl DispatchResult {
    pub fn code(code: i32) -> Self {
        Self { code, quit: None }
    }
}

pub fn child_env(session: &Session) -> ChildEnv {
    ChildEnv {
        profile: session.paths.profile.clone(),
        selfile: session
            .selbox
            .file()
            .to_string_lossy()
            .to_string(),
        oldpwd: session
            .dirhist
            .iter()
            .rev()
            .nth(1)
            .map(|p| p.to_string_lossy().to_string()),
        plugin: None,
    }
}

/// Dispatch one expanded line. Returns the exit status and an optional quit.
pub fn dispatch(expanded: Expanded, session: &mut Session) -> DispatchResult {
    match expanded {
        Expanded::Empty => DispatchResult::code(exit::SUCCESS),
        Expanded::Assign { name, value } => {
            debug!(target: "dispatch", name = %name, "user variable assigned");
            session.user_vars.insert(name, value);
            DispatchResult::code(exit::SUCCESS)
        }
        Expanded::Shell { line } => shell_fallback_line(&line, false, session),
        Expanded::Chain { segments } => {
            let mut last = DispatchResult::code(exit::SUCCESS);
            for seg in segments {
                if seg.and_prev && last.code != exit::SUCCESS {
                    break;
                }
                if last.quit.is_some() {
                    break;
                }
                last = match expand_line(&seg.line, session) {
                    Ok(exp) => dispatch(exp, session),
                    Err(e) => {
                        session.msgs.error(e.to_string());
                        eprintln!("clifm: {e}");
                        DispatchResult::code(exit::FAILURE)
                    }
                };
            }
            last
        }
        Expanded::Args(line) => dispatch_args(line, session),
    }
}

fn dispatch_args(line: ArgsLine, session: &mut Session) -> DispatchResult {
    let ArgsLine {
        args,
        background,
        used_sel,
    } = line;
    let Some(cmd) = args.first().cloned() else {
        return DispatchResult::code(exit::NULL_COMMAND);
    };

    // Quick search: a leading slash token that names no file.
    if cmd.starts_with('/') && !Path::new(&unescape(&cmd)).exists() {
        let code = cmds::search::quick_search(session, &args);
        return DispatchResult::code(code);
    }

    // Auto-cd / auto-open for a lone token naming a directory or file.
    if !is_internal(&cmd) && args.len() == 1 {
        if let Some(result) = try_auto(&cmd, session) {
            return result;
        }
    }

    let code = match cmd.as_str() {
        "cd" => cmds::nav::cd_cmd(session, &args),
        "o" | "open" => cmds::open_cmd::open_cmd(session, &args, background),
        "b" | "back" => cmds::nav::back(session),
        "f" | "forth" => cmds::nav::forth(session),
        "bm" | "bookmarks" => cmds::bm::bm_cmd(session, &args),
        "s" | "sel" => cmds::selops::sel_cmd(session, &args),
        "ds" | "desel" => cmds::selops::desel_cmd(session, &args),
        "sb" => cmds::selops::show_box(session),
        "sel-all" => cmds::selops::sel_all(session),
        "desel-all" => cmds::selops::desel_all(session),
        "t" | "tr" | "trash" => cmds::trash_cmd::trash_cmd(session, &args),
        "u" | "untrash" => cmds::trash_cmd::untrash_cmd(session, &args),
        "br" | "bulk" => cmds::fileops::bulk_rename(session, &args),
        "c" | "m" | "r" | "l" => cmds::fileops::wrapper(session, &cmd, &args, used_sel),
        "md" | "mkdir" => cmds::fileops::mkdir_cmd(session, &args),
        "tag" => cmds::tag_cmd::tag_cmd(session, &args),
        "j" | "jc" | "jp" => cmds::jump::jump_cmd(session, &cmd, &args),
        "jl" => cmds::jump::jump_list(session),
        "je" | "jo" => cmds::jump::jump_edit(session),
        "pf" | "prof" | "profile" => cmds::profile::profile_cmd(session, &args),
        "ws" => cmds::nav::ws_cmd(session, &args),
        "mm" | "mime" => cmds::open_cmd::mime_cmd(session, &args),
        "ac" | "ad" => cmds::fileops::archive_cmd(session, &cmd, &args),
        "ow" => cmds::open_cmd::open_with(session, &args),
        "p" | "pr" | "pp" | "prop" => cmds::misc::properties(session, &args),
        "mp" | "net" => cmds::misc::remotes_stub(session, &cmd),
        "st" | "sort" => cmds::misc::sort_cmd(session, &args),
        "pg" | "pager" => cmds::misc::toggle_pager(session, &args),
        "cs" | "colorschemes" => cmds::misc::color_scheme_cmd(session, &args),
        "ext" => cmds::misc::toggle_ext(session, &args),
        "log" => cmds::misc::show_log(session),
        "msg" | "messages" => cmds::misc::msg_cmd(session, &args),
        "alias" => cmds::misc::alias_cmd(session, &args),
        "history" => cmds::misc::history_cmd(session),
        "pin" => cmds::nav::pin_cmd(session, &args),
        "unpin" => cmds::nav::unpin_cmd(session),
        "mf" => cmds::misc::max_files_cmd(session, &args),
        "opener" => cmds::misc::opener_cmd(session, &args),
        "bd" => cmds::nav::bd_cmd(session, &args),
        "edit" => cmds::misc::edit_config(session),
        "rl" | "reload" => cmds::misc::reload_marker(session),
        "autocd" => cmds::misc::toggle_autocd(session, &args),
        "auto-open" => cmds::misc::toggle_auto_open(session, &args),
        "q" | "quit" | "exit" => {
            return DispatchResult {
                code: exit::SUCCESS,
                quit: Some(Quit::Normal),
            };
        }
        "Q" => {
            return DispatchResult {
                code: exit::SUCCESS,
                quit: Some(Quit::CdOnQuit),
            };
        }
        _ => {
            // Actions resolve to executables under the plugins directory.
            if let Some(plugin) = session.actions.get(&cmd).cloned() {
                return run_action(session, &cmd, &plugin, &args, background);
            }
            // Alias substitution, then the shell.
            if let Some(alias) = session.aliases.get(&cmd).cloned() {
                let rest = args[1..].join(" ");
                let full = if rest.is_empty() {
                    alias.clone()
                } else {
                    format!("{alias} {rest}")
                };
                let alias_head = alias.split_whitespace().next().unwrap_or("");
                if alias_head == cmd {
                    // Self-referential alias: substitute once, then the
                    // shell; re-entering the pipeline would never terminate.
                    let argv: Vec<String> =
                        full.split_whitespace().map(str::to_string).collect();
                    return shell_fallback(&argv, background, used_sel, session);
                }
                return match expand_line(&full, session) {
                    Ok(exp) => dispatch(exp, session),
                    Err(e) => {
                        session.msgs.error(e.to_string());
                        eprintln!("clifm: {e}");
                        DispatchResult::code(exit::FAILURE)
                    }
                };
            }
            return shell_fallback(&args, background, used_sel, session);
        }
    };
    DispatchResult::code(code)
}

/// Run a user action: an executable under the plugins directory.
fn run_action(
    session: &mut Session,
    name: &str,
    plugin: &str,
    args: &[String],
    background: bool,
) -> DispatchResult {
    let path = session.paths.plugins_dir().join(plugin);
    if !path.is_file() {
        let msg = format!("{name}: plugin {} not found", path.display());
        eprintln!("clifm: {msg}");
        session.msgs.error(msg);
        return DispatchResult::code(exit::FAILURE);
    }
    let line = format!(
        "{} {}",
        crate::expand::helpers::shell_quote_path(&path.to_string_lossy()),
        args[1..].join(" ")
    );
    let mut env = child_env(session);
    env.plugin = Some((
        name.to_string(),
        session
            .paths
            .plugins_dir()
            .join("plugins-helper")
            .to_string_lossy()
            .to_string(),
    ));
    let cwd = session.cwd().to_path_buf();
    let code = if background {
        exec::run_shell_bg(&line, &cwd, &env)
    } else {
        exec::run_shell(&line, &cwd, &env)
    };
    session.needs_refresh = true;
    DispatchResult::code(code)
}

/// Auto-cd (directories) and auto-open (regular files) for bare tokens.
fn try_auto(token: &str, session: &mut Session) -> Option<DispatchResult> {
    if !session.opts.autocd && !session.opts.auto_open {
        return None;
    }
    let clean = unescape(token);
    let path = if clean.starts_with('/') {
        Path::new(&clean).to_path_buf()
    } else {
        session.cwd().join(clean.trim_end_matches('/'))
    };
    let meta = std::fs::metadata(&path).ok()?;
    if meta.is_dir() && session.opts.autocd {
        info!(target: "dispatch", path = %path.display(), "auto-cd");
        let code = cmds::nav::change_dir(session, &path, true);
        return Some(DispatchResult::code(code));
    }
    if meta.is_file() && session.opts.auto_open {
        info!(target: "dispatch", path = %path.display(), "auto-open");
        let args = vec!["o".to_string(), token.to_string()];
        let code = cmds::open_cmd::open_cmd(session, &args, false);
        return Some(DispatchResult::code(code));
    }
    None
}

fn shell_fallback(
    args: &[String],
    background: bool,
    used_sel: bool,
    session: &mut Session,
) -> DispatchResult {
    if !session.opts.ext_cmd_ok {
        let msg = "external commands are disabled (run 'ext on')";
        session.msgs.warning(msg);
        eprintln!("clifm: {msg}");
        return DispatchResult::code(exit::USAGE);
    }
    if let Err(e) = exec::security_check(args) {
        session.msgs.error(&e);
        eprintln!("clifm: {e}");
        return DispatchResult::code(exit::USAGE);
    }
    if session.opts.secure_cmds {
        if let Err(e) = exec::sanitize_check(args) {
            session.msgs.error(&e);
            eprintln!("clifm: {e}");
            return DispatchResult::code(exit::USAGE);
        }
    }
    // The vector is kept in shell-safe word form; joining rebuilds the line.
    let line = args.join(" ");
    let result = shell_fallback_line(&line, background, session);
    if result.code == exit::SUCCESS {
        if used_sel {
            session.selbox.clear();
            let _ = session.selbox.save();
        }
        session.needs_refresh = true;
    }
    result
}

fn shell_fallback_line(line: &str, background: bool, session: &mut Session) -> DispatchResult {
    let env = child_env(session);
    let cwd = session.cwd().to_path_buf();
    let code = if background {
        exec::run_shell_bg(line, &cwd, &env)
    } else {
        exec::run_shell(line, &cwd, &env)
    };
    if code != exit::SUCCESS {
        session
            .msgs
            .warning(format!("command exited with status {code}"));
    }
    DispatchResult { code, quit: None }
}
