//! clifm entrypoint: argument parsing, logging and signal bootstrap, session
//! construction, and the REPL.
//!
//! Control flow per iteration: drain watcher → refresh + print listing →
//! prompt commands → render prompt → readline → expand → dispatch →
//! post-command (autocmds, hooks, jumper, persistence) → loop.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use nix::sys::signal::{signal, SigHandler, Signal};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use core_actions::dispatch::Quit;
use core_actions::dispatch::{child_env, dispatch};
use core_actions::exec::exit;
use core_actions::expand::expand_line;
use core_config::{rcfile, ColorScheme, ConfigPaths, Options, SortKey};
use core_events::FsWatcher;
use core_state::Session;
use core_terminal::{LineEditor, ReadOutcome};

/// The interactive terminal file manager.
#[derive(Parser, Debug, Clone)]
#[command(name = "clifm", version, about = "clifm - the command line file manager")]
struct Args {
    /// Directory to start in.
    dir: Option<PathBuf>,

    /// Do not list hidden files.
    #[arg(short = 'a')]
    hide_hidden: bool,
    /// List hidden files.
    #[arg(short = 'A')]
    show_hidden: bool,
    /// Start in long view.
    #[arg(short = 'l')]
    long_view: bool,
    /// Start in columns view.
    #[arg(short = 'L')]
    no_long_view: bool,
    /// List directories first.
    #[arg(short = 'f')]
    dirs_first: bool,
    /// Do not list directories first.
    #[arg(short = 'F')]
    no_dirs_first: bool,
    /// Enable the pager.
    #[arg(short = 'g')]
    pager: bool,
    /// Disable the pager.
    #[arg(short = 'G')]
    no_pager: bool,

    /// Starting path (same as the positional DIR).
    #[arg(short = 'p', long = "path", value_name = "PATH")]
    path: Option<PathBuf>,
    /// Profile name.
    #[arg(short = 'P', long = "profile", value_name = "PROFILE")]
    profile: Option<String>,
    /// Alternative configuration file.
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
    /// Alternative keybindings file (reserved; loaded but not remapped).
    #[arg(short = 'k', long = "keybindings", value_name = "FILE")]
    keybindings: Option<PathBuf>,
    /// Alternative bookmarks file.
    #[arg(short = 'b', long = "bookmarks", value_name = "FILE")]
    bookmarks: Option<PathBuf>,
    /// Starting workspace (1-8).
    #[arg(short = 'w', long = "workspace", value_name = "N")]
    workspace: Option<usize>,
    /// Sort method (name, size, atime, btime, ctime, mtime, version,
    /// extension, inode, owner, group, or 0-10).
    #[arg(short = 'z', long = "sort", value_name = "METHOD")]
    sort: Option<String>,
    /// Stealth mode: no persistence at all.
    #[arg(short = 'S', long = "stealth")]
    stealth: bool,

    /// Open FILE through the resource opener and exit.
    #[arg(long = "open", value_name = "FILE")]
    open: Option<PathBuf>,
    /// Preview FILE (opener in read-only mode) and exit.
    #[arg(long = "preview", value_name = "FILE")]
    preview: Option<PathBuf>,
    /// Print the directory listing and exit.
    #[arg(long = "list-and-quit")]
    list_and_quit: bool,
    /// Scrub dangerous variables from the environment.
    #[arg(long = "secure-env")]
    secure_env: bool,
    /// Keep only an allowlisted environment.
    #[arg(long = "secure-env-full")]
    secure_env_full: bool,
    /// Restrict external commands to safe characters.
    #[arg(long = "secure-cmds")]
    secure_cmds: bool,
    /// Use DIR as the configuration base directory.
    #[arg(long = "data-dir", value_name = "DIR")]
    data_dir: Option<PathBuf>,
}

impl Args {
    /// Command-line overrides win over the config file.
    fn apply(&self, opts: &mut Options) {
        if self.hide_hidden {
            opts.show_hidden = false;
        }
        if self.show_hidden {
            opts.show_hidden = true;
        }
        if self.long_view {
            opts.long_view = true;
        }
        if self.no_long_view {
            opts.long_view = false;
        }
        if self.dirs_first {
            opts.dirs_first = true;
        }
        if self.no_dirs_first {
            opts.dirs_first = false;
        }
        if self.pager {
            opts.pager = true;
        }
        if self.no_pager {
            opts.pager = false;
        }
        if self.secure_cmds {
            opts.secure_cmds = true;
        }
        if let Some(sort) = &self.sort {
            match SortKey::parse(sort) {
                Some(k) => opts.sort = k,
                None => warn!(target: "runtime", sort = %sort, "unknown sort method ignored"),
            }
        }
    }
}

fn install_signal_policy() {
    // The REPL survives Ctrl-C/Ctrl-\/Ctrl-Z aimed at foreground children;
    // children reset these to default before exec (see core-actions::exec).
    unsafe {
        let _ = signal(Signal::SIGINT, SigHandler::SigIgn);
        let _ = signal(Signal::SIGQUIT, SigHandler::SigIgn);
        let _ = signal(Signal::SIGTSTP, SigHandler::SigIgn);
    }
}

fn scrub_environment(full: bool) {
    const DANGEROUS: &[&str] = &[
        "IFS", "LD_PRELOAD", "LD_LIBRARY_PATH", "PROMPT_COMMAND", "BASH_ENV", "ENV", "CDPATH",
    ];
    const KEEP: &[&str] = &[
        "HOME", "PATH", "TERM", "USER", "SHELL", "LANG", "LC_ALL", "DISPLAY", "WAYLAND_DISPLAY",
        "EDITOR", "VISUAL", "XDG_CONFIG_HOME", "TMPDIR",
    ];
    let names: Vec<String> = std::env::vars().map(|(k, _)| k).collect();
    for name in names {
        let drop = if full {
            !KEEP.contains(&name.as_str())
        } else {
            DANGEROUS.contains(&name.as_str())
        };
        if drop {
            // Single-threaded at this point in startup.
            unsafe { std::env::remove_var(&name) };
        }
    }
}

struct Logging {
    _guard: Option<WorkerGuard>,
}

fn configure_logging(paths: &ConfigPaths) -> Logging {
    let filter = tracing_subscriber::EnvFilter::try_from_env("CLIFM_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    if paths.stealth {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
        return Logging { _guard: None };
    }
    let dir = paths.profile_dir();
    let appender = tracing_appender::rolling::never(&dir, "log.clifm");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .try_init();
    Logging {
        _guard: Some(guard),
    }
}

fn load_options(paths: &ConfigPaths, args: &Args) -> (Options, rcfile::RcData) {
    let mut opts = Options::default();
    let rc_path = args
        .config
        .clone()
        .unwrap_or_else(|| paths.rc_file());
    let data = if paths.stealth && args.config.is_none() {
        rcfile::RcData::default()
    } else {
        match rcfile::load(&rc_path, &mut opts) {
            Ok(d) => d,
            Err(e) => {
                warn!(target: "config", error = %e, "cannot read config, using defaults");
                rcfile::RcData::default()
            }
        }
    };
    args.apply(&mut opts);
    if let Ok(filter) = std::env::var("CLIFM_FILTER") {
        if !filter.is_empty() {
            opts.filter = Some(filter);
        }
    }
    (opts, data)
}

fn colors_enabled(opts: &Options) -> bool {
    if std::env::var_os("NO_COLOR").is_some() || std::env::var_os("CLIFM_NO_COLOR").is_some() {
        return false;
    }
    opts.colorize
}

fn build_session(paths: ConfigPaths, args: &Args) -> Result<Session> {
    let (opts, rc) = load_options(&paths, args);
    let colors = ColorScheme::load(&paths.colors_dir(), &opts.color_scheme, colors_enabled(&opts));

    let start_dir = args
        .dir
        .clone()
        .or_else(|| args.path.clone())
        .unwrap_or(std::env::current_dir().context("no working directory")?);
    let start_dir = std::fs::canonicalize(&start_dir)
        .with_context(|| format!("{}: cannot resolve starting directory", start_dir.display()))?;
    std::env::set_current_dir(&start_dir)
        .with_context(|| format!("{}: cannot chdir", start_dir.display()))?;

    if let Some(kb) = &args.keybindings {
        if !kb.is_file() {
            warn!(target: "config", file = %kb.display(), "keybindings file not found");
        }
    }

    let mut session = Session::new(paths, opts, colors, start_dir.clone());
    install_rc(&mut session, rc);

    if !session.paths.stealth {
        let bookmarks_file = args
            .bookmarks
            .clone()
            .unwrap_or_else(|| session.paths.bookmarks_file());
        if let Err(e) = session.bookmarks.load(&bookmarks_file) {
            warn!(target: "runtime", error = %e, "bookmarks not loaded");
        }
        if let Err(e) = session.selbox.load() {
            warn!(target: "runtime", error = %e, "selection box not loaded");
        }
        let ctx = session.rank_context();
        let purge = session.opts.purge_jumpdb;
        let jump_file = session.paths.jump_file();
        if let Err(e) = session.jumpdb.load(&jump_file, purge, &ctx) {
            warn!(target: "runtime", error = %e, "jump database not loaded");
        }
        let dirhist_file = session.paths.dirhist_file();
        if let Err(e) = session.dirhist.load(&dirhist_file) {
            warn!(target: "runtime", error = %e, "directory history not loaded");
        }
        load_actions(&mut session);
        session.paths.note_concurrent_instance();
    }
    if let Ok(vdir) = std::env::var("CLIFM_VIRTUAL_DIR") {
        if !vdir.is_empty() {
            session.stdin_dir = Some(PathBuf::from(vdir));
        }
    }

    // Starting workspace (slots inherit the starting directory).
    if let Some(n) = args.workspace {
        let mut opts = session.opts.clone();
        if session.workspaces.switch(n, &mut opts).is_err() {
            warn!(target: "runtime", workspace = n, "invalid starting workspace");
        }
        session.opts = opts;
    }
    session.dirhist.push(start_dir.clone());
    session.pending_visit = Some(start_dir);
    session.needs_refresh = true;
    Ok(session)
}

fn install_rc(session: &mut Session, rc: rcfile::RcData) {
    session.aliases = rc.aliases.into_iter().collect();
    session.prompt_cmds = rc.prompt_cmds;
    session.autocmds.install(rc.autocmds);
}

fn load_actions(session: &mut Session) {
    let file = session.paths.actions_file();
    let Ok(content) = std::fs::read_to_string(&file) else {
        return;
    };
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((name, plugin)) = line.split_once('=') {
            session
                .actions
                .insert(name.trim().to_string(), plugin.trim().to_string());
        }
    }
}

/// Run the `--open`/`--preview` one-shot and exit.
fn one_shot_open(session: &mut Session, file: &Path) -> i32 {
    let args = vec!["o".to_string(), file.to_string_lossy().to_string()];
    core_actions::cmds::open_cmd::open_cmd(session, &args, false)
}

struct Repl {
    session: Session,
    editor: LineEditor,
    watcher: FsWatcher,
    args: Args,
}

impl Repl {
    fn new(session: Session, args: Args) -> Self {
        let mut editor = LineEditor::new();
        if !session.paths.stealth {
            if let Ok(content) = std::fs::read_to_string(session.paths.history_file()) {
                editor.load_history(content.lines().map(str::to_string));
            }
        }
        Self {
            session,
            editor,
            watcher: FsWatcher::new(),
            args,
        }
    }

    fn run(&mut self) -> i32 {
        info!(target: "runtime", cwd = %self.session.cwd().display(), "session started");
        self.post_command(None);
        self.run_profile_commands();
        let mut exit_code = exit::SUCCESS;
        loop {
            if self.watcher.take_pending() {
                self.session.needs_refresh = true;
            }
            if self.session.reload_requested {
                self.reload();
            }
            if self.session.needs_refresh {
                self.refresh_and_list();
            }
            let _ = core_render::print_selfiles(&self.session);
            self.run_prompt_cmds();
            core_terminal::set_title(&core_render::prompt::title(&self.session));
            let prompt = core_render::prompt::render(&self.session);

            let line = match self.editor.read_line(&prompt) {
                Ok(ReadOutcome::Line(l)) => l,
                Ok(ReadOutcome::Interrupted) => continue,
                Ok(ReadOutcome::Eof) => break,
                Err(e) => {
                    error!(target: "runtime", error = %e, "input error");
                    exit_code = exit::FAILURE;
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            self.editor.push_history(&line);
            self.session.cmd_history.push(line.clone());
            self.append_history(&line);

            let prev_cwd = self.session.cwd().to_path_buf();
            let result = match expand_line(&line, &self.session) {
                Ok(expanded) => dispatch(expanded, &mut self.session),
                Err(e) => {
                    eprintln!("clifm: {e}");
                    self.session.msgs.error(e.to_string());
                    core_actions::DispatchResult::code(exit::FAILURE)
                }
            };
            self.session.last_exit = result.code;
            self.post_command(Some(prev_cwd));

            if let Some(quit) = result.quit {
                self.write_cd_on_quit(quit);
                break;
            }
        }
        self.shutdown();
        exit_code
    }

    /// Autocmds, hook files, the jumper, and persistence after a command.
    fn post_command(&mut self, prev_cwd: Option<PathBuf>) {
        let cwd = self.session.cwd().to_path_buf();
        let changed = prev_cwd.as_deref() != Some(cwd.as_path());
        if changed {
            let mut opts = self.session.opts.clone();
            let actions =
                self.session
                    .autocmds
                    .on_cwd_change(prev_cwd.as_deref(), &cwd, &mut opts);
            self.session.opts = opts;
            // Hook file first, autocmd command second.
            let env = child_env(&self.session);
            for hook in [actions.out_hook, actions.in_hook].into_iter().flatten() {
                let line = format!(
                    "sh {}",
                    core_actions::expand::helpers::shell_quote_path(&hook.to_string_lossy())
                );
                let _ = core_actions::exec::run_shell(&line, &cwd, &env);
            }
            if let Some(cmd) = actions.cmd {
                let _ = core_actions::exec::run_shell(&cmd, &cwd, &env);
            }
            self.watcher.arm(&cwd);
        }
        if let Some(visit) = self.session.pending_visit.take() {
            let ctx = self.session.rank_context();
            let now = jumper_now();
            let max_total = self.session.opts.max_jump_total;
            let min_rank = self.session.opts.min_jump_rank;
            self.session
                .jumpdb
                .record_visit(&visit, now, &ctx, max_total, min_rank);
            if !self.session.paths.stealth {
                let file = self.session.paths.jump_file();
                if let Err(e) = self.session.jumpdb.save(&file, now) {
                    warn!(target: "runtime", error = %e, "jump database not saved");
                }
            }
        }
    }

    fn refresh_and_list(&mut self) {
        if let Err(e) = core_render::refresh(&mut self.session) {
            eprintln!("clifm: {e}");
            self.session.msgs.error(e.to_string());
            self.session.needs_refresh = false;
            return;
        }
        if let Err(e) = core_render::print_listing(&self.session) {
            error!(target: "listing", error = %e, "listing write failed");
        }
    }

    /// Commands in `profile.clifm` run once at startup, through the full
    /// pipeline.
    fn run_profile_commands(&mut self) {
        if self.session.paths.stealth {
            return;
        }
        let Ok(content) = std::fs::read_to_string(self.session.paths.profile_file()) else {
            return;
        };
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let prev_cwd = self.session.cwd().to_path_buf();
            match expand_line(line, &self.session) {
                Ok(expanded) => {
                    let result = dispatch(expanded, &mut self.session);
                    self.session.last_exit = result.code;
                }
                Err(e) => warn!(target: "runtime", line, error = %e, "profile command rejected"),
            }
            self.post_command(Some(prev_cwd));
        }
    }

    fn run_prompt_cmds(&mut self) {
        if self.session.prompt_cmds.is_empty() {
            return;
        }
        let env = child_env(&self.session);
        let cwd = self.session.cwd().to_path_buf();
        // Prompt commands run with no_log semantics: their exit status is
        // not reported and they never touch the message list.
        for cmd in self.session.prompt_cmds.clone() {
            let _ = core_actions::exec::run_shell(&cmd, &cwd, &env);
        }
    }

    fn reload(&mut self) {
        self.session.reload_requested = false;
        let paths = self.session.paths.clone();
        if let Err(e) = paths.ensure_tree() {
            warn!(target: "config", error = %e, "profile tree not available");
        }
        let (opts, rc) = load_options(&paths, &self.args);
        let colors = ColorScheme::load(&paths.colors_dir(), &opts.color_scheme, colors_enabled(&opts));
        self.session.opts = opts;
        self.session.colors = colors;
        install_rc(&mut self.session, rc);
        self.session.needs_refresh = true;
        info!(target: "config", "configuration reloaded");
    }

    fn append_history(&self, line: &str) {
        if self.session.paths.stealth {
            return;
        }
        use std::io::Write;
        let file = self.session.paths.history_file();
        if let Ok(mut f) = std::fs::OpenOptions::new().create(true).append(true).open(file) {
            let _ = writeln!(f, "{line}");
        }
    }

    fn write_cd_on_quit(&self, quit: Quit) {
        if self.session.paths.stealth {
            return;
        }
        if quit == Quit::CdOnQuit || self.session.opts.cd_on_quit {
            let marker = self.session.paths.config_dir.join(".last");
            let _ = std::fs::write(marker, self.session.cwd().to_string_lossy().as_bytes());
        }
    }

    fn shutdown(&mut self) {
        if self.session.paths.stealth {
            return;
        }
        if let Err(e) = self.session.dirhist.save(&self.session.paths.dirhist_file()) {
            warn!(target: "runtime", error = %e, "directory history not saved");
        }
        if let Err(e) = self.session.selbox.save() {
            warn!(target: "runtime", error = %e, "selection box not saved");
        }
        info!(target: "runtime", "session ended");
    }
}

fn jumper_now() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn main() {
    let args = Args::parse();
    if args.secure_env || args.secure_env_full {
        scrub_environment(args.secure_env_full);
    }

    let paths = match ConfigPaths::resolve(args.data_dir.clone(), args.profile.clone(), args.stealth)
    {
        Ok(p) => p,
        Err(e) => {
            eprintln!("clifm: fatal: {e}");
            std::process::exit(exit::FAILURE);
        }
    };
    if let Err(e) = paths.ensure_tree() {
        eprintln!("clifm: fatal: {e}");
        std::process::exit(exit::FAILURE);
    }
    let _logging = configure_logging(&paths);
    install_signal_policy();

    let mut session = match build_session(paths, &args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("clifm: fatal: {e:#}");
            std::process::exit(exit::FAILURE);
        }
    };

    // One-shot modes.
    if let Some(file) = args.open.as_deref().or(args.preview.as_deref()) {
        let code = one_shot_open(&mut session, file);
        std::process::exit(code);
    }
    if args.list_and_quit {
        // The pager would block a non-interactive caller.
        session.opts.pager = false;
        session.opts.clear_screen = false;
        let code = match core_render::refresh(&mut session)
            .map_err(anyhow::Error::from)
            .and_then(|()| core_render::print_listing(&session).map_err(anyhow::Error::from))
        {
            Ok(_) => exit::SUCCESS,
            Err(e) => {
                eprintln!("clifm: {e}");
                exit::FAILURE
            }
        };
        std::process::exit(code);
    }

    let mut repl = Repl::new(session, args);
    let code = repl.run();
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn args_apply_overrides() {
        let args = Args::parse_from(["clifm", "-A", "-l", "-G", "-z", "size"]);
        let mut opts = Options::default();
        args.apply(&mut opts);
        assert!(opts.show_hidden);
        assert!(opts.long_view);
        assert!(!opts.pager);
        assert_eq!(opts.sort, SortKey::Size);
    }

    #[test]
    fn sort_by_number() {
        let args = Args::parse_from(["clifm", "-z", "6"]);
        let mut opts = Options::default();
        args.apply(&mut opts);
        assert_eq!(opts.sort, SortKey::Version);
    }
}
