//! Shell command execution for setup and teardown hooks.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};

use crate::session::CommandRunner;

/// Runs commands through `sh -c` in a working directory.
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, dir: &Path) -> Result<String> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        // An empty dir means "inherit the process working directory".
        if !dir.as_os_str().is_empty() {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .with_context(|| format!("Failed to launch: {command}"))?;

        if !output.status.success() {
            anyhow::bail!(
                "command failed: {} - {}",
                command,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
