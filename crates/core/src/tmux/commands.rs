//! Low-level tmux command wrappers
//!
//! Thin subprocess wrappers for the tmux commands spool drives. Commands
//! with optional arguments use small builders; the rest are plain
//! functions.

use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result};

use crate::config::SplitKind;

/// Execute a tmux command and return the output
fn tmux(args: &[&str]) -> Result<Output> {
    Command::new("tmux")
        .args(args)
        .output()
        .context("Failed to execute tmux command")
}

/// Execute a tmux command and check if it succeeded (suppressing stderr)
fn tmux_status(args: &[&str]) -> Result<bool> {
    Ok(Command::new("tmux")
        .args(args)
        .stderr(Stdio::null())
        .status()?
        .success())
}

/// Execute a tmux command, returning an error if it fails
fn tmux_run(args: &[&str]) -> Result<()> {
    let status = Command::new("tmux").args(args).status()?;
    if !status.success() {
        anyhow::bail!("tmux command failed: {:?}", args);
    }
    Ok(())
}

/// Execute a tmux command and return its trimmed stdout, or the stderr as
/// an error
fn tmux_output(args: &[&str]) -> Result<String> {
    let output = tmux(args)?;
    if !output.status.success() {
        anyhow::bail!(
            "tmux {} failed: {}",
            args.first().unwrap_or(&""),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

// =============================================================================
// Session Commands
// =============================================================================

/// Check if we're currently inside a tmux client
pub fn in_tmux() -> bool {
    std::env::var("TMUX").is_ok()
}

/// Check if a tmux session exists
pub fn has_session(name: &str) -> bool {
    tmux_status(&["has-session", "-t", name]).unwrap_or(false)
}

/// Builder for creating new tmux sessions
#[derive(Default)]
pub struct NewSession<'a> {
    name: Option<&'a str>,
    start_dir: Option<&'a str>,
    window_name: Option<&'a str>,
}

impl<'a> NewSession<'a> {
    /// Create a new session builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session name
    pub fn name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    /// Set the starting directory
    pub fn start_directory(mut self, dir: &'a str) -> Self {
        self.start_dir = Some(dir);
        self
    }

    /// Set the initial window name
    pub fn window_name(mut self, name: &'a str) -> Self {
        self.window_name = Some(name);
        self
    }

    /// Create the session detached, returning the handle its windows are
    /// addressed through
    pub fn run(self) -> Result<String> {
        let mut args = vec!["new-session", "-d", "-P", "-F", "#{session_name}:"];

        if let Some(name) = self.name {
            args.push("-s");
            args.push(name);
        }

        if let Some(dir) = self.start_dir {
            args.push("-c");
            args.push(dir);
        }

        if let Some(name) = self.window_name {
            args.push("-n");
            args.push(name);
        }

        tmux_output(&args)
    }
}

/// Kill a tmux session
pub fn kill_session(name: &str) -> Result<()> {
    tmux_run(&["kill-session", "-t", name])
}

/// Attach the calling terminal to a session; blocks until detach
pub fn attach_session(name: &str) -> Result<()> {
    let status = Command::new("tmux")
        .args(["attach-session", "-t", name])
        .status()?;
    if !status.success() {
        anyhow::bail!("tmux attach-session failed for {}", name);
    }
    Ok(())
}

/// Redirect the already-attached client to another session
pub fn switch_client(name: &str) -> Result<()> {
    tmux_run(&["switch-client", "-t", name])
}

/// Information about a running tmux session
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Session name
    pub name: String,
    /// Number of windows
    pub windows: u32,
    /// Whether clients are attached
    pub attached: bool,
}

/// List all running tmux sessions
pub fn list_sessions() -> Result<Vec<SessionInfo>> {
    let output = tmux(&[
        "list-sessions",
        "-F",
        "#{session_name}\t#{session_windows}\t#{session_attached}",
    ])?;

    if !output.status.success() {
        // No server running
        return Ok(Vec::new());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut sessions = Vec::new();

    for line in stdout.lines() {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() >= 3 {
            sessions.push(SessionInfo {
                name: parts[0].to_string(),
                windows: parts[1].parse().unwrap_or(0),
                attached: parts[2] != "0",
            });
        }
    }

    Ok(sessions)
}

// =============================================================================
// Window Commands
// =============================================================================

/// Create a window in a session without stealing focus, returning its id
pub fn new_window(session: &str, name: &str, dir: &str) -> Result<String> {
    let mut args = vec![
        "new-window",
        "-d",
        "-P",
        "-F",
        "#{window_id}",
        "-t",
        session,
        "-n",
        name,
    ];

    if !dir.is_empty() {
        args.push("-c");
        args.push(dir);
    }

    tmux_output(&args)
}

/// Send keys to a window or pane, followed by Enter
pub fn send_keys(target: &str, keys: &str) -> Result<()> {
    tmux_run(&["send-keys", "-t", target, keys, "Enter"])
}

/// Apply a layout to a window
pub fn select_layout(target: &str, layout: &str) -> Result<()> {
    tmux_run(&["select-layout", "-t", target, layout])
}

/// Kill a single window
pub fn kill_window(target: &str) -> Result<()> {
    tmux_run(&["kill-window", "-t", target])
}

// =============================================================================
// Pane Commands
// =============================================================================

/// Builder for splitting windows
#[derive(Default)]
pub struct SplitWindow<'a> {
    target: Option<&'a str>,
    kind: Option<SplitKind>,
    start_dir: Option<&'a str>,
}

impl<'a> SplitWindow<'a> {
    /// Create a new split window builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target window
    pub fn target(mut self, target: &'a str) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the split orientation
    pub fn kind(mut self, kind: SplitKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the starting directory
    pub fn start_directory(mut self, dir: &'a str) -> Self {
        self.start_dir = Some(dir);
        self
    }

    /// Run the split-window command and return the new pane ID
    pub fn run(self) -> Result<String> {
        let mut args = vec!["split-window", "-d", "-P", "-F", "#{pane_id}"];

        if let Some(target) = self.target {
            args.push("-t");
            args.push(target);
        }

        match self.kind {
            Some(SplitKind::Horizontal) => args.push("-h"),
            Some(SplitKind::Vertical) => args.push("-v"),
            None => {}
        }

        if let Some(dir) = self.start_dir {
            args.push("-c");
            args.push(dir);
        }

        tmux_output(&args)
    }
}
