//! External process execution.
//!
//! Foreground commands go through `/bin/sh -c` and are waited for; background
//! commands are spawned detached and never reaped here. The REPL process
//! ignores the job-control signals, so children must reset them to default
//! before exec.

use std::path::Path;
use std::process::{Command, Stdio};

use nix::sys::signal::{signal, SigHandler, Signal};
use tracing::{debug, warn};

/// Exit codes shared with the binary.
pub mod exit {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NULL_COMMAND: i32 = 79;
    pub const FORK_FAILED: i32 = 81;
    pub const CHILD_KILLED: i32 = 82;
}

/// Environment handed to every child process.
#[derive(Debug, Clone, Default)]
pub struct ChildEnv {
    pub profile: String,
    pub selfile: String,
    pub oldpwd: Option<String>,
    /// Set when the child is a user action (plugin executable).
    pub plugin: Option<(String, String)>,
}

impl ChildEnv {
    fn apply(&self, cmd: &mut Command) {
        cmd.env("CLIFM", env!("CARGO_PKG_VERSION"));
        cmd.env("CLIFM_PROFILE", &self.profile);
        cmd.env("CLIFM_SELFILE", &self.selfile);
        if let Some(oldpwd) = &self.oldpwd {
            cmd.env("OLDPWD", oldpwd);
        }
        if let Some((name, helper)) = &self.plugin {
            cmd.env("CLIFM_PLUGIN_NAME", name);
            cmd.env("CLIFM_PLUGINS_HELPER", helper);
        }
    }
}

/// Reset the signals the parent ignores back to their defaults in the child.
fn reset_child_signals(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    unsafe {
        cmd.pre_exec(|| {
            unsafe {
                let _ = signal(Signal::SIGINT, SigHandler::SigDfl);
                let _ = signal(Signal::SIGQUIT, SigHandler::SigDfl);
                let _ = signal(Signal::SIGTSTP, SigHandler::SigDfl);
            }
            Ok(())
        });
    }
}

fn sh_command(line: &str, cwd: &Path, env: &ChildEnv) -> Command {
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(line).current_dir(cwd);
    env.apply(&mut cmd);
    reset_child_signals(&mut cmd);
    cmd
}

/// Run a shell line in the foreground and wait.
pub fn run_shell(line: &str, cwd: &Path, env: &ChildEnv) -> i32 {
    if line.trim().is_empty() {
        return exit::NULL_COMMAND;
    }
    debug!(target: "dispatch.exec", line, "running shell command");
    let mut cmd = sh_command(line, cwd, env);
    match cmd.status() {
        Ok(status) => status.code().unwrap_or_else(|| {
            warn!(target: "dispatch.exec", line, "child terminated by signal");
            exit::CHILD_KILLED
        }),
        Err(e) => {
            warn!(target: "dispatch.exec", line, error = %e, "spawn failed");
            exit::FORK_FAILED
        }
    }
}

/// Spawn a shell line in the background; the child is never waited for.
pub fn run_shell_bg(line: &str, cwd: &Path, env: &ChildEnv) -> i32 {
    if line.trim().is_empty() {
        return exit::NULL_COMMAND;
    }
    debug!(target: "dispatch.exec", line, "spawning background command");
    let mut cmd = sh_command(line, cwd, env);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    match cmd.spawn() {
        Ok(_) => exit::SUCCESS,
        Err(e) => {
            warn!(target: "dispatch.exec", line, error = %e, "spawn failed");
            exit::FORK_FAILED
        }
    }
}

/// Run a line and capture stdout (for `$(…)` word expansion and MIME
/// probing). Returns None on spawn failure or non-zero exit.
pub fn capture(line: &str, cwd: &Path) -> Option<String> {
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(line).current_dir(cwd);
    reset_child_signals(&mut cmd);
    let output = cmd.output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).to_string())
}

/// POSIX-`wordexp`-style expansion of a token containing `$(…)`/backticks:
/// one shell round, whitespace-split words back.
pub fn word_expand(token: &str) -> Option<Vec<String>> {
    let out = capture(&format!("printf '%s\\n' {token}"), Path::new("."))?;
    let words: Vec<String> = out
        .lines()
        .map(str::to_string)
        .filter(|s| !s.is_empty())
        .collect();
    Some(words)
}

/// The security check applied before the shell fallback: refuse nested
/// instances and attempts to kill this very process.
pub fn security_check(args: &[String]) -> Result<(), String> {
    let own_name = std::env::current_exe()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "clifm".to_string());
    let Some(first) = args.first() else {
        return Ok(());
    };
    let base = first.rsplit('/').next().unwrap_or(first);
    if base == own_name {
        return Err(format!("{own_name}: nested instances are not allowed"));
    }
    if matches!(base, "kill" | "pkill" | "killall") {
        let own_pid = std::process::id().to_string();
        for arg in &args[1..] {
            if *arg == own_pid || *arg == own_name {
                return Err(format!("{base}: refusing to target this process"));
            }
        }
    }
    Ok(())
}

/// The `--secure-cmds` sanitiser: every argument restricted to
/// `[A-Za-z0-9_./-]` plus whitespace.
pub fn sanitize_check(args: &[String]) -> Result<(), String> {
    for arg in args {
        let ok = arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | '-' | ' '));
        if !ok {
            return Err(format!("{arg}: disallowed characters in secure mode"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exit_codes_propagate() {
        let env = ChildEnv::default();
        assert_eq!(run_shell("true", Path::new("/"), &env), 0);
        assert_eq!(run_shell("exit 3", Path::new("/"), &env), 3);
        assert_eq!(run_shell("   ", Path::new("/"), &env), exit::NULL_COMMAND);
    }

    #[test]
    fn capture_returns_stdout() {
        let out = capture("echo hello", Path::new("/")).unwrap();
        assert_eq!(out.trim(), "hello");
        assert!(capture("exit 1", Path::new("/")).is_none());
    }

    #[test]
    fn word_expand_splits_substitution_output() {
        let words = word_expand("$(echo a b)").unwrap();
        assert_eq!(words, vec!["a", "b"]);
        let words = word_expand("prefix-$(echo x)").unwrap();
        assert_eq!(words, vec!["prefix-x"]);
    }

    #[test]
    fn security_check_rejects_self_kill() {
        let pid = std::process::id().to_string();
        assert!(security_check(&strings(&["kill", "-9", &pid])).is_err());
        assert!(security_check(&strings(&["kill", "1234567"])).is_ok());
        assert!(security_check(&strings(&["ls", "-l"])).is_ok());
    }

    #[test]
    fn sanitize_check_blocks_shell_metachars() {
        assert!(sanitize_check(&strings(&["ls", "-l", "dir/file.txt"])).is_ok());
        assert!(sanitize_check(&strings(&["ls", ";rm -rf /"])).is_err());
        assert!(sanitize_check(&strings(&["echo", "$(boom)"])).is_err());
    }

    #[test]
    fn background_spawn_returns_immediately() {
        let env = ChildEnv::default();
        assert_eq!(run_shell_bg("sleep 5", Path::new("/"), &env), 0);
    }
}
