//! Tmux integration for spool sessions.
//!
//! # Submodules
//!
//! - [`commands`]: low-level tmux command wrappers (NewSession,
//!   SplitWindow, send_keys, etc.)
//! - [`Tmux`]: the production [`SessionDriver`] built on top of them
//!
//! The orchestrator never calls the wrappers directly; everything goes
//! through the driver so tests can swap in a fake.

mod commands;

use std::path::Path;

use anyhow::Result;

pub use commands::{SessionInfo, has_session, in_tmux, list_sessions};

use crate::config::SplitKind;
use crate::session::SessionDriver;
use commands::{NewSession, SplitWindow};

/// The production driver: every operation shells out to the tmux binary.
pub struct Tmux;

impl SessionDriver for Tmux {
    fn session_exists(&self, name: &str) -> bool {
        commands::has_session(name)
    }

    fn new_session(&self, name: &str, root: &Path, window_name: &str) -> Result<String> {
        let root = root.to_string_lossy();
        let mut session = NewSession::new().name(name);
        if !root.is_empty() {
            session = session.start_directory(&root);
        }
        if !window_name.is_empty() {
            session = session.window_name(window_name);
        }
        session.run()
    }

    fn new_window(&self, session: &str, name: &str, root: &Path) -> Result<String> {
        commands::new_window(session, name, &root.to_string_lossy())
    }

    fn send_keys(&self, window: &str, command: &str) -> Result<()> {
        commands::send_keys(window, command)
    }

    fn split_window(
        &self,
        window: &str,
        split: SplitKind,
        root: &Path,
        commands_list: &[String],
    ) -> Result<String> {
        let root = root.to_string_lossy();
        let mut split_window = SplitWindow::new().target(window).kind(split);
        if !root.is_empty() {
            split_window = split_window.start_directory(&root);
        }

        let pane = split_window.run()?;
        for command in commands_list {
            commands::send_keys(&pane, command)?;
        }
        Ok(pane)
    }

    fn select_layout(&self, window: &str, layout: &str) -> Result<()> {
        commands::select_layout(window, layout)
    }

    fn kill_window(&self, window: &str) -> Result<()> {
        commands::kill_window(window)
    }

    fn stop_session(&self, name: &str) -> Result<()> {
        commands::kill_session(name)
    }

    fn attach(&self, name: &str) -> Result<()> {
        commands::attach_session(name)
    }

    fn switch_client(&self, name: &str) -> Result<()> {
        commands::switch_client(name)
    }
}
