//! Configuration types and parsing for spool sessions
//!
//! A session config is a YAML document describing one tmux session: its
//! root directory, setup/teardown commands, and an ordered list of windows
//! with their panes. This module also owns the path-resolution rules the
//! orchestrator applies at every nesting level.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Layout applied to a window that does not name its own.
pub const EVEN_HORIZONTAL: &str = "even-horizontal";

// =============================================================================
// Session Configuration
// =============================================================================

/// One tmux session, as declared in a spool YAML file.
///
/// Window order is meaningful: the first window seeds the session-creation
/// call and later windows are created in declaration order.
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    /// Session name (the tmux session key, must be non-empty)
    pub session: String,
    /// Base directory for the whole session (may be ~-relative)
    #[serde(default)]
    pub root: String,
    /// Shell commands run once before the session is first created
    #[serde(default)]
    pub before_start: Vec<String>,
    /// Shell commands run on full teardown
    #[serde(default)]
    pub stop: Vec<String>,
    /// Windows in creation order
    #[serde(default)]
    pub windows: Vec<WindowConfig>,
}

/// A window within a session.
#[derive(Debug, Default, Deserialize)]
pub struct WindowConfig {
    /// Window name, unique within the session
    #[serde(default)]
    pub name: String,
    /// Working directory, relative to the session root unless absolute
    #[serde(default)]
    pub root: String,
    /// Excluded from a full start; only created when named explicitly
    #[serde(default)]
    pub manual: bool,
    /// Commands typed into the window after creation, in order
    #[serde(default)]
    pub commands: Vec<String>,
    /// Extra panes split off the window, in order
    #[serde(default)]
    pub panes: Vec<PaneConfig>,
    /// Layout applied after all panes exist (default: even-horizontal)
    #[serde(default)]
    pub layout: Option<String>,
}

/// A pane split off its window.
#[derive(Debug, Default, Deserialize)]
pub struct PaneConfig {
    /// Split orientation
    #[serde(rename = "type", default)]
    pub split: SplitKind,
    /// Working directory, relative to the window root unless absolute
    #[serde(default)]
    pub root: String,
    /// Commands run inside the new pane, in order
    #[serde(default)]
    pub commands: Vec<String>,
}

/// Split orientation for a new pane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitKind {
    #[default]
    Horizontal,
    Vertical,
}

// =============================================================================
// Path Resolution
// =============================================================================

/// Expand ~ to home directory in paths.
///
/// If the home directory cannot be determined the input is returned
/// unchanged rather than failing the whole operation.
pub fn expand_path(path: &str) -> String {
    path.strip_prefix("~/")
        .and_then(|stripped| dirs::home_dir().map(|home| home.join(stripped)))
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Resolve a configured directory against its parent root.
///
/// The path is ~-expanded first; an empty path resolves to exactly the
/// parent root, a relative path is joined onto it, and an absolute path
/// stands alone. The same rule applies at window and pane level.
pub fn resolve_root(path: &str, base: &Path) -> PathBuf {
    let expanded = expand_path(path);
    if expanded.is_empty() {
        return base.to_path_buf();
    }

    let expanded = PathBuf::from(expanded);
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Load a session configuration from a YAML file.
pub fn load_config(path: &Path) -> Result<SessionConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: SessionConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    if config.session.is_empty() {
        anyhow::bail!("{}: 'session' must not be empty", path.display());
    }

    Ok(config)
}

/// Generate a commented starter configuration for a new project.
pub fn generate_config(session: &str, root: &str) -> String {
    format!(
        r#"# Spool session config for {session}
session: {session}
root: {root}

# Commands run once, in the session root, before the session is first created
# before_start:
#   - docker compose up -d

# Commands run in the session root on `spool stop`
# stop:
#   - docker compose down

windows:
  - name: code
    commands:
      - $EDITOR .

  - name: shell
    # root: ./subdir          # relative to the session root
    # layout: main-vertical   # default: even-horizontal
    # panes:
    #   - type: horizontal
    #     commands:
    #       - tail -f log/dev.log

  # Manual windows are skipped by a full `spool start` unless named with -w
  # - name: deploy
  #   manual: true
  #   commands:
  #     - ./deploy.sh
"#
    )
}

// =============================================================================
// Tests
// =============================================================================
