//! Host operating system version.

use std::time::Duration;

use crate::environment::component::{log_result, log_start, verify_only, Component};
use crate::environment::types::{failure_codes, ComponentResult, EnvironmentComponent};
use crate::shell::{CommandExecutor, ExecTarget};

/// CIM reports the real build number; it is not subject to the
/// compatibility shims that affect in-process version queries.
const OS_QUERY: &str = "$os = Get-CimInstance Win32_OperatingSystem; \
                        Write-Output \"$($os.Version)|$($os.OSArchitecture)\"";

const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// First build with WSL2 on every architecture (version 2004).
const MIN_BUILD_ANY_ARCH: u32 = 19041;

/// First build with WSL2 on x64 (version 1909 with backport).
const MIN_BUILD_X64: u32 = 18362;

/// Parsed host version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsInfo {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub is_64bit: bool,
}

/// WSL2 support policy.
pub fn is_supported_os(major: u32, build: u32, is_64bit: bool) -> bool {
    match major {
        m if m >= 11 => true,
        10 if build >= MIN_BUILD_ANY_ARCH => true,
        10 if build >= MIN_BUILD_X64 => is_64bit,
        _ => false,
    }
}

/// Parse `"10.0.22631|64-bit"` query output.
pub fn parse_os_info(output: &str) -> Option<OsInfo> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;
    let (version, arch) = line.split_once('|').unwrap_or((line, ""));

    let mut parts = version.trim().split('.').map(|p| p.trim().parse::<u32>());
    let major = parts.next()?.ok()?;
    let minor = parts.next()?.ok()?;
    let build = parts.next()?.ok()?;

    Some(OsInfo {
        major,
        minor,
        build,
        is_64bit: arch.contains("64"),
    })
}

/// Checks the host OS can run WSL2.
pub struct OsVersion<'a, E: CommandExecutor> {
    executor: &'a E,
}

impl<'a, E: CommandExecutor> OsVersion<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    fn classify(info: OsInfo) -> ComponentResult {
        let kind = EnvironmentComponent::OsVersion;
        let supported = is_supported_os(info.major, info.build, info.is_64bit);
        let version = format!("Windows {}.{}.{}", info.major, info.minor, info.build);

        if supported {
            ComponentResult::success(kind, format!("{} (supported)", version))
        } else {
            ComponentResult::failed(
                kind,
                format!(
                    "{} (unsupported - requires Windows 10 build {}+ on x64, build {}+ otherwise, or Windows 11)",
                    version, MIN_BUILD_X64, MIN_BUILD_ANY_ARCH
                ),
                failure_codes::OS_UNSUPPORTED,
            )
        }
    }
}

impl<E: CommandExecutor> Component for OsVersion<'_, E> {
    fn kind(&self) -> EnvironmentComponent {
        EnvironmentComponent::OsVersion
    }

    fn check(&self) -> ComponentResult {
        log_start(self.kind(), "Checking");

        let output = self.executor.run(OS_QUERY, QUERY_TIMEOUT, ExecTarget::Host);
        let result = match parse_os_info(&output.stdout).filter(|_| output.success()) {
            Some(info) => Self::classify(info),
            None => ComponentResult::failed(
                self.kind(),
                "Failed to get OS version",
                failure_codes::OS_UNSUPPORTED,
            ),
        };

        log_result("Checking", &result);
        result
    }

    fn install(&self) -> ComponentResult {
        verify_only(self.check())
    }
}
