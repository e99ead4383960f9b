//! `run`, `join` and `chat`: hand the command line to the workload inside
//! the subsystem and stream its output until it exits.

use std::fmt;
use std::time::Duration;

use tracing::info;

use crate::cli::args::PassthroughArgs;
use crate::environment::{stdout_sink, ExecutionContext};
use crate::error::Result;
use crate::shell::{quote_posix, CommandExecutor, ExecTarget};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::preflight::{self, Requirements};

/// Long-running sessions are expected; this only bounds a hung child.
const SESSION_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Exit code bash uses for a missing command.
const EXIT_COMMAND_NOT_FOUND: i32 = 127;

/// Workload subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Run,
    Join,
    Chat,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Run => "run",
            Verb::Join => "join",
            Verb::Chat => "chat",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relays one workload invocation.
pub struct PassthroughCommand<'a, E: CommandExecutor> {
    context: &'a ExecutionContext,
    executor: &'a E,
    verb: Verb,
    args: PassthroughArgs,
    enforce_preflight: bool,
}

impl<'a, E: CommandExecutor> PassthroughCommand<'a, E> {
    pub fn new(
        context: &'a ExecutionContext,
        executor: &'a E,
        verb: Verb,
        args: PassthroughArgs,
    ) -> Self {
        Self {
            context,
            executor,
            verb,
            args,
            enforce_preflight: preflight::enforced_by_default(),
        }
    }

    /// Override whether WSL availability is checked first.
    pub fn with_preflight(mut self, enforce: bool) -> Self {
        self.enforce_preflight = enforce;
        self
    }

    /// The shell command run inside the subsystem. Every argument is
    /// quoted.
    pub fn command_line(&self) -> String {
        let name = self.context.project_name();
        let mut command = format!(
            "{} && {}{} {}",
            self.context.venv_activation(),
            self.context.pip_proxy_env(),
            name,
            self.verb
        );
        for arg in &self.args.args {
            command.push(' ');
            command.push_str(&quote_posix(arg));
        }
        command
    }
}

impl<E: CommandExecutor> Command for PassthroughCommand<'_, E> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if self.enforce_preflight {
            if let Some(refused) =
                preflight::verify(Requirements::subsystem(), self.executor, self.context, ui)
            {
                return Ok(refused);
            }
        }

        let command = self.command_line();
        info!("Relaying: {}", command);

        let sink = stdout_sink();
        let exit_code = self.executor.run_relayed(
            &command,
            SESSION_TIMEOUT,
            ExecTarget::Subsystem,
            Box::new(move |line| sink(line)),
        );

        if exit_code == EXIT_COMMAND_NOT_FOUND {
            ui.error(&format!(
                "'{}' is not installed in the subsystem. Run 'parallax-env install' first.",
                self.context.project_name()
            ));
        }
        Ok(CommandResult::from_exit_code(exit_code))
    }
}
