//! NVIDIA driver and CUDA toolkit.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use crate::environment::component::{log_result, log_start, verify_only, Component};
use crate::environment::types::{failure_codes, ComponentResult, EnvironmentComponent};
use crate::shell::{CommandExecutor, ExecTarget};

const DRIVER_QUERY: &str =
    "nvidia-smi --query-gpu=driver_version --format=csv,noheader,nounits";
const TOOLKIT_QUERY: &str = "nvcc --version";
const REGISTRY_QUERY: &str =
    "reg query \"HKLM\\SOFTWARE\\NVIDIA Corporation\\Global\\Display Driver\" /v Version";

const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Reported when `nvcc` is absent. Not a warning: the runtime ships its
/// own CUDA libraries inside the subsystem.
pub const TOOLKIT_NOT_DETECTED: &str = "Not detected";

/// Toolkit minor versions the runtime is built against.
const ACCEPTED_TOOLKITS: &[(u32, u32)] = &[(12, 8), (12, 9)];

static RELEASE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"release\s+(\d+)\.(\d+)").expect("RELEASE_PATTERN must compile")
});

/// Toolkit version from `nvcc --version` output, e.g. `"12.8"`.
pub fn parse_toolkit_version(output: &str) -> Option<String> {
    let caps = RELEASE_PATTERN.captures(output)?;
    Some(format!("{}.{}", &caps[1], &caps[2]))
}

/// Whether a `major.minor[.patch]` toolkit version is accepted.
pub fn is_accepted_toolkit(version: &str) -> bool {
    let mut parts = version.split('.').map(|p| p.parse::<u32>().ok());
    match (parts.next().flatten(), parts.next().flatten()) {
        (Some(major), Some(minor)) => ACCEPTED_TOOLKITS.contains(&(major, minor)),
        _ => false,
    }
}

/// `Version` value from `reg query` output.
fn parse_registry_version(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("Version"))
        .find_map(|l| l.split("REG_SZ").nth(1))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Checks the driver is installed and the toolkit version is current.
pub struct NvidiaDriver<'a, E: CommandExecutor> {
    executor: &'a E,
}

impl<'a, E: CommandExecutor> NvidiaDriver<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    fn driver_version(&self) -> Option<String> {
        let output = self
            .executor
            .run(DRIVER_QUERY, QUERY_TIMEOUT, ExecTarget::Host);
        if !output.success() {
            return None;
        }
        output
            .stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(String::from)
    }

    fn toolkit_version(&self) -> String {
        let output = self
            .executor
            .run(TOOLKIT_QUERY, QUERY_TIMEOUT, ExecTarget::Host);
        if !output.success() {
            return TOOLKIT_NOT_DETECTED.to_string();
        }
        parse_toolkit_version(&output.stdout).unwrap_or_else(|| TOOLKIT_NOT_DETECTED.to_string())
    }

    fn registry_version(&self) -> Option<String> {
        let output = self
            .executor
            .run(REGISTRY_QUERY, QUERY_TIMEOUT, ExecTarget::Host);
        if !output.success() {
            return None;
        }
        parse_registry_version(&output.stdout)
    }
}

impl<E: CommandExecutor> Component for NvidiaDriver<'_, E> {
    fn kind(&self) -> EnvironmentComponent {
        EnvironmentComponent::NvidiaDriver
    }

    fn check(&self) -> ComponentResult {
        log_start(self.kind(), "Checking");

        let result = if let Some(driver) = self.driver_version() {
            let toolkit = self.toolkit_version();
            let message = format!("NVIDIA driver: {}, CUDA toolkit: {}", driver, toolkit);

            if toolkit != TOOLKIT_NOT_DETECTED && !is_accepted_toolkit(&toolkit) {
                ComponentResult::warning(
                    self.kind(),
                    format!(
                        "{} (WARNING: CUDA version should be 12.8.x or 12.9.x)",
                        message
                    ),
                )
            } else {
                ComponentResult::success(self.kind(), message)
            }
        } else if let Some(version) = self.registry_version() {
            ComponentResult::success(
                self.kind(),
                format!("NVIDIA driver installed (registry version: {})", version),
            )
        } else {
            ComponentResult::failed(
                self.kind(),
                "NVIDIA driver not found. Please install NVIDIA graphics driver first.",
                failure_codes::DRIVER_MISSING,
            )
        };

        log_result("Checking", &result);
        result
    }

    fn install(&self) -> ComponentResult {
        verify_only(self.check())
    }
}
