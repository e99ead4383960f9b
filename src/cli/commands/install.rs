//! The `install` command.

use crate::environment::{EnvironmentInstaller, ExecutionContext, Verdict};
use crate::error::Result;
use crate::shell::CommandExecutor;
use crate::ui::{discard_sink, UserInterface};

use super::dispatcher::{Command, CommandResult};
use super::preflight::{self, Requirements};

/// Exit code when a restart must happen before the environment is usable.
pub const EXIT_REBOOT_REQUIRED: i32 = 2;

/// Exit code when at least one component could not be installed.
pub const EXIT_INSTALL_FAILED: i32 = 3;

/// Installs every component, showing progress as it goes.
pub struct InstallCommand<'a, E: CommandExecutor> {
    context: &'a ExecutionContext,
    executor: &'a E,
    enforce_preflight: bool,
}

impl<'a, E: CommandExecutor> InstallCommand<'a, E> {
    pub fn new(context: &'a ExecutionContext, executor: &'a E) -> Self {
        Self {
            context,
            executor,
            enforce_preflight: preflight::enforced_by_default(),
        }
    }

    /// Override whether the administrator check runs first.
    pub fn with_preflight(mut self, enforce: bool) -> Self {
        self.enforce_preflight = enforce;
        self
    }
}

impl<E: CommandExecutor> Command for InstallCommand<'_, E> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if self.enforce_preflight {
            if let Some(refused) =
                preflight::verify(Requirements::admin(), self.executor, self.context, ui)
            {
                return Ok(refused);
            }
        }

        ui.show_header("Installing environment");

        let progress = ui.start_progress();
        let sink = if ui.output_mode().shows_progress() {
            progress.output_sink()
        } else {
            discard_sink()
        };

        let env = EnvironmentInstaller::new(self.context, self.executor)
            .with_output_sink(sink)
            .install_environment(|label, message, percent| {
                progress.update(label, message, percent)
            });
        progress.finish();

        for result in &env.component_results {
            ui.show_result(result);
        }
        ui.show_verdict(env.verdict(), &env.overall_message);

        Ok(match env.verdict() {
            Verdict::Success | Verdict::Warning => CommandResult::success(),
            Verdict::RebootRequired => CommandResult::failure(EXIT_REBOOT_REQUIRED),
            Verdict::Failed => CommandResult::failure(EXIT_INSTALL_FAILED),
        })
    }
}
