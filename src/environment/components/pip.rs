//! Python package manager inside the subsystem.

use std::time::Duration;

use tracing::warn;

use crate::environment::component::{log_result, log_start, Component};
use crate::environment::context::ExecutionContext;
use crate::environment::types::{failure_codes, ComponentResult, EnvironmentComponent};
use crate::shell::{quote_posix, CommandExecutor, CommandResult, ExecTarget};

const QUERY_TIMEOUT: Duration = Duration::from_secs(30);
const INSTALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Makes sure `pip` is present and current.
pub struct PipUpgrade<'a, E: CommandExecutor> {
    context: &'a ExecutionContext,
    executor: &'a E,
}

impl<'a, E: CommandExecutor> PipUpgrade<'a, E> {
    pub fn new(context: &'a ExecutionContext, executor: &'a E) -> Self {
        Self { context, executor }
    }

    fn subsystem(&self, command: &str, timeout: Duration) -> CommandResult {
        self.executor.run(command, timeout, ExecTarget::Subsystem)
    }

    /// Whether `pip --version` answers.
    pub fn is_available(&self) -> bool {
        let output = self.subsystem("pip --version", QUERY_TIMEOUT);
        output.success() && !output.stdout.trim().is_empty()
    }

    fn base_install_command(&self) -> String {
        format!(
            "DEBIAN_FRONTEND=noninteractive apt-get{} install -y python3-pip",
            self.context.apt_proxy_options()
        )
    }

    fn proxy_option(&self) -> String {
        self.context
            .proxy()
            .map(|p| format!(" --proxy {}", quote_posix(p)))
            .unwrap_or_default()
    }

    fn upgrade_command(&self) -> String {
        format!(
            "pip install{} --upgrade pip --break-system-packages --ignore-installed",
            self.proxy_option()
        )
    }

    /// Whether the index reports a newer pip. An unanswered query counts
    /// as outdated so the upgrade is still attempted.
    pub fn is_outdated(&self) -> bool {
        let output = self.subsystem(
            &format!(
                "pip list --outdated --format=freeze{} 2>/dev/null",
                self.proxy_option()
            ),
            INSTALL_TIMEOUT,
        );
        !output.success() || lists_pip(&output.stdout)
    }

    fn upgrade_existing(&self) -> ComponentResult {
        if !self.is_outdated() {
            return ComponentResult::skipped(self.kind(), "pip is available and up to date");
        }

        let upgrade = self.subsystem(&self.upgrade_command(), INSTALL_TIMEOUT);
        if upgrade.success() {
            ComponentResult::success(self.kind(), "pip upgraded successfully")
        } else {
            warn!("[ENV] pip upgrade failed, keeping the installed pip");
            ComponentResult::warning(
                self.kind(),
                format!(
                    "pip is available but could not be upgraded: {}",
                    upgrade.combined_output().trim()
                ),
            )
        }
    }

    fn failed(&self, what: &str, output: &CommandResult) -> ComponentResult {
        ComponentResult::failed(
            self.kind(),
            format!("{}: {}", what, output.combined_output().trim()),
            failure_codes::PIP,
        )
    }
}

/// Whether `pip list --outdated --format=freeze` output names pip itself.
fn lists_pip(output: &str) -> bool {
    output
        .lines()
        .filter_map(|l| l.trim().split("==").next())
        .any(|name| name.eq_ignore_ascii_case("pip"))
}

impl<E: CommandExecutor> Component for PipUpgrade<'_, E> {
    fn kind(&self) -> EnvironmentComponent {
        EnvironmentComponent::PipUpgrade
    }

    fn check(&self) -> ComponentResult {
        log_start(self.kind(), "Checking");

        let result = if self.is_available() {
            ComponentResult::skipped(self.kind(), "pip is available")
        } else {
            ComponentResult::failed(self.kind(), "pip is not installed", failure_codes::PIP)
        };

        log_result("Checking", &result);
        result
    }

    fn install(&self) -> ComponentResult {
        log_start(self.kind(), "Installing");

        let result = if self.is_available() {
            self.upgrade_existing()
        } else {
            let base = self.subsystem(&self.base_install_command(), INSTALL_TIMEOUT);
            if !base.success() {
                self.failed("Failed to install python3-pip", &base)
            } else {
                let upgrade = self.subsystem(&self.upgrade_command(), INSTALL_TIMEOUT);
                if upgrade.success() {
                    ComponentResult::success(self.kind(), "pip installed and upgraded successfully")
                } else {
                    self.failed("Failed to upgrade pip", &upgrade)
                }
            }
        };

        log_result("Installing", &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::types::ComponentStatus;
    use crate::shell::MockExecutor;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new("Ubuntu-24.04")
    }

    const PIP_VERSION: &str = "pip 24.0 from /usr/lib/python3/dist-packages/pip";

    #[test]
    fn outdated_listing_names_pip_only() {
        assert!(lists_pip("setuptools==68.1.2\npip==24.0\n"));
        assert!(!lists_pip("pipx==1.4.3\nsetuptools==68.1.2\n"));
        assert!(!lists_pip(""));
    }

    #[test]
    fn current_pip_is_skipped() {
        let context = ctx();
        let mut exec = MockExecutor::new();
        exec.respond("pip --version", 0, PIP_VERSION)
            .respond("pip list --outdated", 0, "setuptools==68.1.2\n");

        let pip = PipUpgrade::new(&context, &exec);
        assert_eq!(pip.check().status, ComponentStatus::Skipped);
        let result = pip.install();
        assert_eq!(result.status, ComponentStatus::Skipped);
        assert_eq!(result.message, "pip is available and up to date");
        assert!(!exec.was_called("--upgrade pip"));
        assert!(!exec.was_called("apt-get"));
    }

    #[test]
    fn available_but_outdated_pip_is_upgraded() {
        let context = ctx();
        let mut exec = MockExecutor::new();
        exec.respond("pip --version", 0, PIP_VERSION)
            .respond("pip list --outdated", 0, "pip==24.0\n")
            .respond("--upgrade pip", 0, "Successfully installed pip-25.0");

        let result = PipUpgrade::new(&context, &exec).install();

        assert_eq!(result.status, ComponentStatus::Success);
        assert_eq!(result.message, "pip upgraded successfully");
        assert_eq!(exec.count("--upgrade pip"), 1);
        assert!(!exec.was_called("python3-pip"));
    }

    #[test]
    fn unanswered_outdated_query_still_upgrades() {
        let context = ctx();
        let mut exec = MockExecutor::new();
        exec.respond("pip --version", 0, PIP_VERSION)
            .respond("pip list --outdated", 1, "")
            .respond("--upgrade pip", 1, "network unreachable");

        let result = PipUpgrade::new(&context, &exec).install();

        assert_eq!(exec.count("--upgrade pip"), 1);
        assert_eq!(result.status, ComponentStatus::Warning);
        assert!(result.message.contains("network unreachable"));
    }

    #[test]
    fn empty_version_output_is_missing() {
        let context = ctx();
        let mut exec = MockExecutor::new();
        exec.respond("pip --version", 0, "  \n");

        let result = PipUpgrade::new(&context, &exec).check();
        assert_eq!(result.failure_code, failure_codes::PIP);
    }

    #[test]
    fn install_then_upgrade() {
        let context = ctx().with_proxy("http://proxy:8080");
        let mut exec = MockExecutor::new();
        exec.respond("pip --version", 127, "")
            .respond("python3-pip", 0, "")
            .respond("--upgrade pip", 0, "Successfully installed pip-25.0");

        let result = PipUpgrade::new(&context, &exec).install();

        assert_eq!(result.status, ComponentStatus::Success);
        let commands = exec.commands();
        assert!(commands[1].contains("-o Acquire::http::proxy=http://proxy:8080"));
        assert!(commands[2].starts_with("pip install --proxy http://proxy:8080 --upgrade pip"));
    }

    #[test]
    fn base_install_failure_stops_before_upgrade() {
        let context = ctx();
        let mut exec = MockExecutor::new();
        exec.respond("python3-pip", 100, "E: dpkg was interrupted");

        let result = PipUpgrade::new(&context, &exec).install();

        assert_eq!(result.status, ComponentStatus::Failed);
        assert!(result.message.starts_with("Failed to install python3-pip"));
        assert!(!exec.was_called("--upgrade pip"));
    }

    #[test]
    fn upgrade_failure_fails_closed() {
        let context = ctx();
        let mut exec = MockExecutor::new();
        exec.respond("python3-pip", 0, "").respond("--upgrade pip", 1, "");

        let result = PipUpgrade::new(&context, &exec).install();
        assert_eq!(result.failure_code, failure_codes::PIP);
        assert!(result.message.starts_with("Failed to upgrade pip"));
    }
}
