//! Firmware virtualization support.

use std::time::Duration;

use crate::environment::component::{log_result, log_start, verify_only, Component};
use crate::environment::types::{failure_codes, ComponentResult, EnvironmentComponent};
use crate::shell::{CommandExecutor, ExecTarget};

const SYSTEMINFO_TIMEOUT: Duration = Duration::from_secs(120);
const WSL_STATUS_TIMEOUT: Duration = Duration::from_secs(30);

const FIRMWARE_ENABLED: &str = "Virtualization Enabled In Firmware: Yes";
const FIRMWARE_DISABLED: &str = "Virtualization Enabled In Firmware: No";

/// Phrases `wsl --status` prints when virtualization is off.
const DISABLED_PHRASES: &[&str] = &[
    "ensure virtualization is enabled in the BIOS",
    "WSL2 is not supported with your current machine configuration",
    "virtualization is not enabled",
];

const DISABLED_MESSAGE: &str = "BIOS virtualization is not enabled. Please restart your \
                                computer and enable virtualization in BIOS settings.";

/// What the available evidence says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtualizationState {
    Enabled,
    Disabled,
    Unknown,
}

/// Read the firmware line from `systeminfo` output.
pub fn state_from_systeminfo(output: &str) -> VirtualizationState {
    if output.contains(FIRMWARE_ENABLED) {
        VirtualizationState::Enabled
    } else if output.contains(FIRMWARE_DISABLED) {
        VirtualizationState::Disabled
    } else {
        VirtualizationState::Unknown
    }
}

/// Interpret `wsl --status` output and exit code.
pub fn state_from_wsl_status(output: &str, success: bool) -> VirtualizationState {
    let lower = output.to_lowercase();
    if DISABLED_PHRASES
        .iter()
        .any(|p| lower.contains(&p.to_lowercase()))
    {
        VirtualizationState::Disabled
    } else if success {
        VirtualizationState::Enabled
    } else {
        VirtualizationState::Unknown
    }
}

/// Checks virtualization is enabled in firmware.
///
/// An undeterminable state is reported as success with a hedge message,
/// so unreliable detection never blocks installation.
pub struct BiosVirtualization<'a, E: CommandExecutor> {
    executor: &'a E,
}

impl<'a, E: CommandExecutor> BiosVirtualization<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    fn state(&self) -> VirtualizationState {
        let info = self
            .executor
            .run("systeminfo", SYSTEMINFO_TIMEOUT, ExecTarget::Host);
        if info.success() {
            let state = state_from_systeminfo(&info.stdout);
            if state != VirtualizationState::Unknown {
                return state;
            }
        }

        let status = self
            .executor
            .run("wsl --status", WSL_STATUS_TIMEOUT, ExecTarget::Host);
        state_from_wsl_status(&status.combined_output(), status.success())
    }
}

impl<E: CommandExecutor> Component for BiosVirtualization<'_, E> {
    fn kind(&self) -> EnvironmentComponent {
        EnvironmentComponent::BiosVirtualization
    }

    fn check(&self) -> ComponentResult {
        log_start(self.kind(), "Checking");

        let result = match self.state() {
            VirtualizationState::Enabled => {
                ComponentResult::success(self.kind(), "BIOS virtualization is enabled")
            }
            VirtualizationState::Disabled => ComponentResult::failed(
                self.kind(),
                DISABLED_MESSAGE,
                failure_codes::VIRTUALIZATION_DISABLED,
            ),
            VirtualizationState::Unknown => ComponentResult::success(
                self.kind(),
                "BIOS virtualization status check completed (unable to verify definitively)",
            ),
        };

        log_result("Checking", &result);
        result
    }

    fn install(&self) -> ComponentResult {
        verify_only(self.check())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::types::ComponentStatus;
    use crate::shell::MockExecutor;

    const SYSTEMINFO_HYPERV: &str = "Hyper-V Requirements:      VM Monitor Mode Extensions: Yes\n\
                                     \x20                          Virtualization Enabled In Firmware: Yes\n";

    #[test]
    fn systeminfo_yes_is_enabled() {
        let mut exec = MockExecutor::new();
        exec.respond("systeminfo", 0, SYSTEMINFO_HYPERV);

        let result = BiosVirtualization::new(&exec).check();
        assert_eq!(result.status, ComponentStatus::Success);
        assert_eq!(result.message, "BIOS virtualization is enabled");
        assert!(!exec.was_called("wsl --status"));
    }

    #[test]
    fn systeminfo_no_is_disabled() {
        let mut exec = MockExecutor::new();
        exec.respond("systeminfo", 0, "Virtualization Enabled In Firmware: No");

        let result = BiosVirtualization::new(&exec).check();
        assert_eq!(result.status, ComponentStatus::Failed);
        assert_eq!(result.failure_code, failure_codes::VIRTUALIZATION_DISABLED);
    }

    #[test]
    fn hypervisor_present_falls_back_to_wsl_status() {
        let mut exec = MockExecutor::new();
        exec.respond(
            "systeminfo",
            0,
            "Hyper-V Requirements: A hypervisor has been detected.",
        )
        .respond("wsl --status", 0, "Default Distribution: Ubuntu-24.04\nDefault Version: 2");

        let result = BiosVirtualization::new(&exec).check();
        assert_eq!(result.status, ComponentStatus::Success);
        assert_eq!(result.message, "BIOS virtualization is enabled");
    }

    #[test]
    fn wsl_status_error_phrase_is_disabled() {
        for phrase in DISABLED_PHRASES {
            let mut exec = MockExecutor::new();
            exec.respond("systeminfo", 1, "")
                .respond("wsl --status", 0, &format!("Error: please {}.", phrase));

            let result = BiosVirtualization::new(&exec).check();
            assert_eq!(result.status, ComponentStatus::Failed, "{}", phrase);
        }
    }

    #[test]
    fn undeterminable_state_is_hedged_success() {
        let mut exec = MockExecutor::new();
        exec.respond("systeminfo", 1, "").respond("wsl --status", 1, "");

        let result = BiosVirtualization::new(&exec).check();
        assert_eq!(result.status, ComponentStatus::Success);
        assert!(result.message.contains("unable to verify definitively"));
    }

    #[test]
    fn phrase_match_is_case_insensitive() {
        assert_eq!(
            state_from_wsl_status("Please ENSURE VIRTUALIZATION IS ENABLED IN THE BIOS", false),
            VirtualizationState::Disabled
        );
    }
}
