//! Preconditions checked before a command touches the system.
//!
//! `check` and `install` need an elevated console because they query and
//! enable Windows features. The workload commands need the configured
//! distribution to exist. Both queries go through the executor.

use std::time::Duration;

use tracing::debug;

use crate::environment::components::distro_listed;
use crate::environment::ExecutionContext;
use crate::shell::{CommandExecutor, ExecTarget};
use crate::ui::UserInterface;

use super::dispatcher::CommandResult;

/// Exit code when a precondition is not met.
pub const EXIT_ENVIRONMENT_ERROR: i32 = 2;

const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Prints `True` when the current token belongs to the Administrators group.
pub const ELEVATION_QUERY: &str = "([Security.Principal.WindowsPrincipal]\
     [Security.Principal.WindowsIdentity]::GetCurrent())\
     .IsInRole([Security.Principal.WindowsBuiltInRole]::Administrator)";

const DISTRO_LIST_QUERY: &str = "wsl --list --quiet";

/// What a command needs before it runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Requirements {
    pub admin: bool,
    pub subsystem: bool,
}

impl Requirements {
    /// Needs an elevated console.
    pub fn admin() -> Self {
        Self {
            admin: true,
            subsystem: false,
        }
    }

    /// Needs the configured distribution.
    pub fn subsystem() -> Self {
        Self {
            admin: false,
            subsystem: true,
        }
    }
}

/// Whether preconditions are enforced by default. They only mean
/// something on a Windows host.
pub fn enforced_by_default() -> bool {
    cfg!(windows)
}

/// Whether the process runs with administrator rights.
pub fn is_elevated<E: CommandExecutor>(executor: &E) -> bool {
    let output = executor.run(ELEVATION_QUERY, QUERY_TIMEOUT, ExecTarget::Host);
    output.success() && output.stdout.trim().eq_ignore_ascii_case("true")
}

/// Whether WSL answers and lists the configured distribution.
pub fn subsystem_available<E: CommandExecutor>(executor: &E, context: &ExecutionContext) -> bool {
    let output = executor.run(DISTRO_LIST_QUERY, QUERY_TIMEOUT, ExecTarget::Host);
    output.success() && distro_listed(&output.stdout, &context.subsystem_distro_id)
}

/// Check `requirements`, reporting the first unmet one. `None` means the
/// command may proceed.
pub fn verify<E: CommandExecutor>(
    requirements: Requirements,
    executor: &E,
    context: &ExecutionContext,
    ui: &mut dyn UserInterface,
) -> Option<CommandResult> {
    if requirements.admin {
        if !is_elevated(executor) {
            ui.error("Administrator privileges required for this command. Run it from an elevated console.");
            return Some(CommandResult::failure(EXIT_ENVIRONMENT_ERROR));
        }
        debug!("Running with administrator privileges");
    }

    if requirements.subsystem && !subsystem_available(executor, context) {
        ui.error("WSL environment is not available. Please run 'parallax-env install' first.");
        return Some(CommandResult::failure(EXIT_ENVIRONMENT_ERROR));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::MockExecutor;
    use crate::ui::MockUI;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new("Ubuntu-24.04")
    }

    #[test]
    fn elevated_token_passes() {
        let mut exec = MockExecutor::new();
        exec.respond("IsInRole", 0, "True\r\n");
        let mut ui = MockUI::new();

        assert_eq!(verify(Requirements::admin(), &exec, &ctx(), &mut ui), None);
        assert!(ui.errors().is_empty());
        assert_eq!(exec.calls()[0].target, ExecTarget::Host);
    }

    #[test]
    fn unelevated_token_stops_the_command() {
        let mut exec = MockExecutor::new();
        exec.respond("IsInRole", 0, "False\r\n");
        let mut ui = MockUI::new();

        let result = verify(Requirements::admin(), &exec, &ctx(), &mut ui);

        assert_eq!(result, Some(CommandResult::failure(EXIT_ENVIRONMENT_ERROR)));
        assert!(ui.errors()[0].starts_with("Administrator privileges required"));
    }

    #[test]
    fn failed_elevation_query_counts_as_unelevated() {
        let exec = MockExecutor::new();
        assert!(!is_elevated(&exec));
    }

    #[test]
    fn missing_distro_stops_the_command() {
        let mut exec = MockExecutor::new();
        exec.respond("wsl --list --quiet", 0, "docker-desktop\n");
        let mut ui = MockUI::new();

        let result = verify(Requirements::subsystem(), &exec, &ctx(), &mut ui);

        assert_eq!(result, Some(CommandResult::failure(EXIT_ENVIRONMENT_ERROR)));
        assert!(ui.errors()[0].contains("parallax-env install"));
    }

    #[test]
    fn listed_distro_passes() {
        let mut exec = MockExecutor::new();
        exec.respond("wsl --list --quiet", 0, "Ubuntu-24.04\n");
        let mut ui = MockUI::new();

        assert_eq!(verify(Requirements::subsystem(), &exec, &ctx(), &mut ui), None);
        assert!(!exec.was_called("IsInRole"));
    }

    #[test]
    fn no_requirements_run_nothing() {
        let exec = MockExecutor::new();
        let mut ui = MockUI::new();

        assert_eq!(verify(Requirements::default(), &exec, &ctx(), &mut ui), None);
        assert!(exec.calls().is_empty());
    }
}
