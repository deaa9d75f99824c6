use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "spool")]
#[command(about = "Declarative tmux session bootstrapper")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a session from its config, creating whatever is missing
    Start {
        /// Project name (default: the spool.yml found from the current directory upward)
        project: Option<String>,

        /// Only start these windows, comma separated (manual windows must be named here)
        #[arg(short, long, value_delimiter = ',', value_name = "WINDOWS")]
        windows: Vec<String>,

        /// Start in the background instead of attaching
        #[arg(short, long)]
        detach: bool,
    },

    /// Stop a session, or kill specific windows of it
    Stop {
        /// Project name (default: the spool.yml found from the current directory upward)
        project: Option<String>,

        /// Only kill these windows, comma separated, leaving the session running
        #[arg(short, long, value_delimiter = ',', value_name = "WINDOWS")]
        windows: Vec<String>,
    },

    /// List configured projects and their running state
    #[command(visible_alias = "ls")]
    List,

    /// Create a starter config for a new project
    Init {
        /// Project name (prompted if not provided)
        project: Option<String>,
    },

    /// Open a project config in $EDITOR
    Edit {
        /// Project name
        project: String,
    },
}
