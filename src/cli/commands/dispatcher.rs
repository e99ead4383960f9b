//! Command dispatching.
//!
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use tracing::debug;

use crate::cli::args::{Cli, Commands};
use crate::config::ConfigStore;
use crate::environment::ExecutionContext;
use crate::error::Result;
use crate::shell::ShellExecutor;
use crate::ui::UserInterface;

use super::check::CheckCommand;
use super::completions::CompletionsCommand;
use super::config::ConfigCommand;
use super::install::InstallCommand;
use super::passthrough::{PassthroughCommand, Verb};

/// Trait for command implementations.
pub trait Command {
    /// Execute the command, reporting through `ui`.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,

    /// Process exit code.
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Result carrying a child's exit code.
    pub fn from_exit_code(exit_code: i32) -> Self {
        Self {
            success: exit_code == 0,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    config: ConfigStore,
}

impl CommandDispatcher {
    pub fn new(config: ConfigStore) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Route the CLI subcommand to its implementation and execute it.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let context = ExecutionContext::from_config(&self.config);
        let executor = ShellExecutor::new(context.subsystem_distro_id.clone());
        debug!("Using distro {}", executor.distro());

        match &cli.command {
            Commands::Check(args) => {
                CheckCommand::new(&context, &executor, args.clone()).execute(ui)
            }
            Commands::Install => InstallCommand::new(&context, &executor).execute(ui),
            Commands::Config(args) => ConfigCommand::new(&self.config, args.clone()).execute(ui),
            Commands::Run(args) => {
                PassthroughCommand::new(&context, &executor, Verb::Run, args.clone()).execute(ui)
            }
            Commands::Join(args) => {
                PassthroughCommand::new(&context, &executor, Verb::Join, args.clone()).execute(ui)
            }
            Commands::Chat(args) => {
                PassthroughCommand::new(&context, &executor, Verb::Chat, args.clone()).execute(ui)
            }
            Commands::Completions(args) => CompletionsCommand::new(args.clone()).execute(ui),
        }
    }
}
