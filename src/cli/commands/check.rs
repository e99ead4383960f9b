//! The `check` command.

use crate::cli::args::CheckArgs;
use crate::environment::{EnvironmentInstaller, EnvironmentReport, ExecutionContext, Verdict};
use crate::error::{EnvError, Result};
use crate::shell::CommandExecutor;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::preflight::{self, Requirements};

/// Exit code when the environment is not usable.
pub const EXIT_NOT_READY: i32 = 2;

/// Runs every component check and reports the verdict.
pub struct CheckCommand<'a, E: CommandExecutor> {
    context: &'a ExecutionContext,
    executor: &'a E,
    args: CheckArgs,
    enforce_preflight: bool,
}

impl<'a, E: CommandExecutor> CheckCommand<'a, E> {
    pub fn new(context: &'a ExecutionContext, executor: &'a E, args: CheckArgs) -> Self {
        Self {
            context,
            executor,
            args,
            enforce_preflight: preflight::enforced_by_default(),
        }
    }

    /// Override whether the administrator check runs first.
    pub fn with_preflight(mut self, enforce: bool) -> Self {
        self.enforce_preflight = enforce;
        self
    }
}

impl<E: CommandExecutor> Command for CheckCommand<'_, E> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if self.enforce_preflight {
            if let Some(refused) =
                preflight::verify(Requirements::admin(), self.executor, self.context, ui)
            {
                return Ok(refused);
            }
        }

        let installer = EnvironmentInstaller::new(self.context, self.executor);

        let env = if self.args.json {
            let env = installer.check_environment(|_| {});
            let report = EnvironmentReport::from(&env);
            let json =
                serde_json::to_string_pretty(&report).map_err(|e| EnvError::Io(e.into()))?;
            ui.message(&json);
            env
        } else {
            ui.show_header("Checking environment");
            let env = installer.check_environment(|result| ui.show_result(result));
            ui.show_verdict(env.verdict(), &env.overall_message);
            env
        };

        Ok(match env.verdict() {
            Verdict::Success | Verdict::Warning => CommandResult::success(),
            Verdict::Failed | Verdict::RebootRequired => CommandResult::failure(EXIT_NOT_READY),
        })
    }
}
