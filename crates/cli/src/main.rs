//! Spool CLI - declarative tmux session bootstrapper.
//!
//! A spool config describes one tmux session: its root directory, setup
//! and teardown commands, and an ordered list of windows with their panes.
//! `spool start` brings the live tmux state into that shape and attaches;
//! `spool stop` tears it down again.
//!
//! # Workflow
//!
//! 1. Config resolution: a project name maps to `<config-dir>/spool/<name>.yml`;
//!    with no name the CLI walks up the directory tree looking for `spool.yml`
//! 2. The `TMUX` environment variable decides whether to attach a new
//!    client or switch the one we are already inside
//! 3. The orchestrator in `spool-core` does the rest against the tmux
//!    binary; this crate only handles arguments, discovery, and output

mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use spool_core::{
    Orchestrator, ShellRunner, Tmux,
    config::{generate_config, load_config},
    tmux::{has_session, in_tmux, list_sessions},
};

use cli::{Cli, Commands};

/// Name of the per-directory config picked up without a project argument
const LOCAL_CONFIG: &str = "spool.yml";

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            project,
            windows,
            detach,
        } => start(project.as_deref(), &windows, !detach),
        Commands::Stop { project, windows } => stop(project.as_deref(), &windows),
        Commands::List => list(),
        Commands::Init { project } => init(project.as_deref()),
        Commands::Edit { project } => edit(&project),
    }
}

// =============================================================================
// Config Discovery
// =============================================================================

fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("spool"))
        .ok_or_else(|| anyhow::anyhow!("Could not find a config directory"))
}

fn project_config_path(name: &str) -> Result<PathBuf> {
    Ok(config_dir()?.join(format!("{name}.yml")))
}

/// Walk up the directory tree looking for a local spool.yml
fn find_local_config() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;
    loop {
        let candidate = current.join(LOCAL_CONFIG);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) if parent != current => current = parent.to_path_buf(),
            _ => return None,
        }
    }
}

fn resolve_config_path(project: Option<&str>) -> Result<PathBuf> {
    match project {
        Some(name) => {
            let path = project_config_path(name)?;
            if path.exists() {
                return Ok(path);
            }
            eprintln!(
                "{} No config for '{}'. Run '{}' to create one.",
                "✘".red(),
                name,
                format!("spool init {name}").blue()
            );
            std::process::exit(1);
        }
        None => match find_local_config() {
            Some(path) => Ok(path),
            None => {
                eprintln!(
                    "{} No {} found. Run '{}' to create one.",
                    "✘".red(),
                    LOCAL_CONFIG,
                    "spool init".blue()
                );
                std::process::exit(1);
            }
        },
    }
}

// =============================================================================
// Session Commands
// =============================================================================

fn start(project: Option<&str>, windows: &[String], attach: bool) -> Result<()> {
    let config_path = resolve_config_path(project)?;
    let config = load_config(&config_path)?;

    if has_session(&config.session) {
        if windows.is_empty() && attach {
            println!(
                "{}",
                format!("Attaching to existing session: {}", config.session).blue()
            );
        }
    } else {
        println!("{} {} {}", "✔".green(), "Starting".dimmed(), config.session);
    }

    let driver = Tmux;
    let runner = ShellRunner;
    Orchestrator::new(&driver, &runner).start(&config, windows, attach, in_tmux())
}

fn stop(project: Option<&str>, windows: &[String]) -> Result<()> {
    let config_path = resolve_config_path(project)?;
    let config = load_config(&config_path)?;

    let driver = Tmux;
    let runner = ShellRunner;
    Orchestrator::new(&driver, &runner).stop(&config, windows)?;

    if windows.is_empty() {
        println!("{} {} {}", "✔".green(), "Stopped".dimmed(), config.session);
    } else {
        println!(
            "{} {} {}",
            "✔".green(),
            "Killed".dimmed(),
            windows.join(", ")
        );
    }

    Ok(())
}

fn list() -> Result<()> {
    let dir = config_dir()?;
    let mut projects: Vec<(String, String)> = Vec::new();

    if let Ok(entries) = std::fs::read_dir(&dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let is_yaml = path
                .extension()
                .is_some_and(|ext| ext == "yml" || ext == "yaml");
            if !is_yaml {
                continue;
            }

            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_default();

            if let Ok(config) = load_config(&path) {
                projects.push((name, config.session));
            }
        }
    }

    if projects.is_empty() {
        println!("{}", "No projects configured".dimmed());
        return Ok(());
    }

    projects.sort();

    let sessions = list_sessions().unwrap_or_default();

    use comfy_table::{Table, presets::NOTHING};

    let mut table = Table::new();
    table.load_preset(NOTHING);

    for (name, session) in &projects {
        let running = sessions.iter().find(|s| &s.name == session);
        let status = match running {
            Some(info) if info.attached => "attached".green().to_string(),
            Some(_) => "running".yellow().to_string(),
            None => "-".dimmed().to_string(),
        };
        let windows = running
            .map(|info| {
                let label = if info.windows == 1 { "window" } else { "windows" };
                format!("{} {}", info.windows, label)
            })
            .unwrap_or_default();

        table.add_row(vec![
            name.blue().to_string(),
            session.dimmed().to_string(),
            status,
            windows.dimmed().to_string(),
        ]);
    }

    println!("{table}");

    Ok(())
}

// =============================================================================
// Config Commands
// =============================================================================

fn init(project: Option<&str>) -> Result<()> {
    use dialoguer::{Input, theme::ColorfulTheme};

    let theme = ColorfulTheme::default();

    let name: String = match project {
        Some(name) => name.to_string(),
        None => {
            // Default name from the current directory
            let default_name = std::env::current_dir()
                .ok()
                .and_then(|dir| dir.file_name().map(|n| n.to_string_lossy().to_string()))
                .unwrap_or_else(|| "project".to_string());

            Input::with_theme(&theme)
                .with_prompt("Project name")
                .default(default_name)
                .interact_text()?
        }
    };

    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)?;

    let path = dir.join(format!("{name}.yml"));
    if path.exists() {
        eprintln!("{} Config already exists: {}", "✘".red(), path.display());
        std::process::exit(1);
    }

    let root = std::env::current_dir()?;
    std::fs::write(&path, generate_config(&name, &root.to_string_lossy()))?;

    println!("{} {} {}", "✔".green(), "Created".dimmed(), path.display());
    println!();
    println!("Launch with: {}", format!("spool start {name}").blue());

    Ok(())
}

fn edit(project: &str) -> Result<()> {
    let path = project_config_path(project)?;
    if !path.exists() {
        eprintln!(
            "{} No config for '{}'. Run '{}' to create one.",
            "✘".red(),
            project,
            format!("spool init {project}").blue()
        );
        std::process::exit(1);
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    std::process::Command::new(editor).arg(&path).status()?;

    Ok(())
}
