//! Native build toolchain inside the subsystem.

use std::time::Duration;

use crate::environment::component::{log_result, log_start, Component};
use crate::environment::context::ExecutionContext;
use crate::environment::types::{failure_codes, ComponentResult, EnvironmentComponent};
use crate::shell::{CommandExecutor, ExecTarget};

const QUERY_TIMEOUT: Duration = Duration::from_secs(30);
const INSTALL_TIMEOUT: Duration = Duration::from_secs(1200);

/// Tools the project build needs: (display name, version query).
const REQUIRED_TOOLS: &[(&str, &str)] = &[("cargo", "cargo --version"), ("ninja", "ninja --version")];

/// Packages providing [`REQUIRED_TOOLS`] and a C toolchain.
const PACKAGES: &str = "cargo ninja-build build-essential";

/// Ensures the subsystem has the compilers the project build needs.
pub struct DevTools<'a, E: CommandExecutor> {
    context: &'a ExecutionContext,
    executor: &'a E,
}

impl<'a, E: CommandExecutor> DevTools<'a, E> {
    pub fn new(context: &'a ExecutionContext, executor: &'a E) -> Self {
        Self { context, executor }
    }

    /// Names of required tools that do not answer their version query.
    pub fn missing_tools(&self) -> Vec<&'static str> {
        REQUIRED_TOOLS
            .iter()
            .filter(|(_, query)| {
                !self
                    .executor
                    .run(query, QUERY_TIMEOUT, ExecTarget::Subsystem)
                    .success()
            })
            .map(|(name, _)| *name)
            .collect()
    }

    fn install_command(&self) -> String {
        let opts = self.context.apt_proxy_options();
        format!(
            "apt-get{opts} update && DEBIAN_FRONTEND=noninteractive apt-get{opts} install -y {PACKAGES}"
        )
    }
}

impl<E: CommandExecutor> Component for DevTools<'_, E> {
    fn kind(&self) -> EnvironmentComponent {
        EnvironmentComponent::DevTools
    }

    fn check(&self) -> ComponentResult {
        log_start(self.kind(), "Checking");

        let missing = self.missing_tools();
        let result = if missing.is_empty() {
            ComponentResult::success(self.kind(), "Development tools are available (cargo, ninja)")
        } else {
            ComponentResult::failed(
                self.kind(),
                format!("Missing development tools: {}", missing.join(", ")),
                failure_codes::DEV_TOOLS,
            )
        };

        log_result("Checking", &result);
        result
    }

    fn install(&self) -> ComponentResult {
        log_start(self.kind(), "Installing");

        let result = if self.missing_tools().is_empty() {
            ComponentResult::skipped(self.kind(), "Development tools are already installed")
        } else {
            let output =
                self.executor
                    .run(&self.install_command(), INSTALL_TIMEOUT, ExecTarget::Subsystem);
            if !output.success() {
                ComponentResult::failed(
                    self.kind(),
                    format!(
                        "Failed to install development tools: {}",
                        output.combined_output().trim()
                    ),
                    failure_codes::DEV_TOOLS,
                )
            } else {
                let missing = self.missing_tools();
                if missing.is_empty() {
                    ComponentResult::success(self.kind(), "Development tools installed successfully")
                } else {
                    ComponentResult::failed(
                        self.kind(),
                        format!(
                            "Development tools installed but verification failed: {} still missing",
                            missing.join(", ")
                        ),
                        failure_codes::DEV_TOOLS,
                    )
                }
            }
        };

        log_result("Installing", &result);
        result
    }
}
