//! Spool Core - Core library for the spool session bootstrapper
//!
//! This crate provides the core functionality for spool including:
//! - Configuration parsing and path resolution
//! - The session lifecycle orchestrator
//! - The production tmux driver and shell runner

pub mod config;
pub mod exec;
pub mod session;
pub mod tmux;

// Re-export commonly used types at crate root
pub use config::{
    PaneConfig, SessionConfig, SplitKind, WindowConfig, expand_path, load_config, resolve_root,
};
pub use exec::ShellRunner;
pub use session::{CommandRunner, Orchestrator, SessionDriver};
pub use tmux::Tmux;
