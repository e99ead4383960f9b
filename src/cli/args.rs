//! CLI argument definitions.
//!
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Parallax environment setup for WSL2 GPU hosts.
#[derive(Debug, Parser)]
#[command(name = "parallax-env")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file (defaults to parallax_config.txt next to the executable)
    #[arg(short, long, global = true, env = "PARALLAX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Print results only, without progress or live command output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check every environment component without changing anything
    Check(CheckArgs),

    /// Install or repair every environment component
    Install,

    /// Show or change configuration values
    Config(ConfigArgs),

    /// Run the workload inside the subsystem
    Run(PassthroughArgs),

    /// Join an existing workload as a worker node
    Join(PassthroughArgs),

    /// Start an interactive chat session
    Chat(PassthroughArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CheckArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `config` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// `config` subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// List all values
    List,

    /// Print one value
    Get {
        key: String,
    },

    /// Set one value and save
    Set {
        key: String,
        value: String,
    },

    /// Restore built-in defaults and save
    Reset {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments forwarded to the workload.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PassthroughArgs {
    /// Arguments passed through unchanged
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
