//! Component identities, per-component results and the aggregate verdict.

use serde::Serialize;

/// Stable diagnostic codes carried by failed component results.
///
/// These identify the class of failure in logs and reports. They are not
/// process exit codes.
pub mod failure_codes {
    pub const NO_NVIDIA_GPU: i32 = 7;
    pub const GPU_BELOW_MINIMUM: i32 = 8;
    pub const OS_UNSUPPORTED: i32 = 10;
    pub const DRIVER_MISSING: i32 = 20;
    pub const VIRTUALIZATION_DISABLED: i32 = 20;
    pub const SUBSYSTEM_MISSING: i32 = 21;
    pub const DISTRO_MISSING: i32 = 22;
    pub const REBOOT_PENDING: i32 = 23;
    pub const PIP: i32 = 24;
    pub const PROJECT: i32 = 25;
    pub const DEV_TOOLS: i32 = 26;
}

/// One independently checkable and installable unit of setup.
///
/// Declaration order is install order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentComponent {
    OsVersion,
    NvidiaGpu,
    NvidiaDriver,
    BiosVirtualization,
    SubsystemKernelAndDistro,
    DevTools,
    PipUpgrade,
    ProjectDeployment,
}

impl EnvironmentComponent {
    /// Every component, in execution order.
    pub const ALL: [EnvironmentComponent; 8] = [
        EnvironmentComponent::OsVersion,
        EnvironmentComponent::NvidiaGpu,
        EnvironmentComponent::NvidiaDriver,
        EnvironmentComponent::BiosVirtualization,
        EnvironmentComponent::SubsystemKernelAndDistro,
        EnvironmentComponent::DevTools,
        EnvironmentComponent::PipUpgrade,
        EnvironmentComponent::ProjectDeployment,
    ];

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            EnvironmentComponent::OsVersion => "OS Version",
            EnvironmentComponent::NvidiaGpu => "NVIDIA GPU Hardware",
            EnvironmentComponent::NvidiaDriver => "NVIDIA Driver",
            EnvironmentComponent::BiosVirtualization => "BIOS Virtualization",
            EnvironmentComponent::SubsystemKernelAndDistro => "WSL Kernel & Distro",
            EnvironmentComponent::DevTools => "Development Tools",
            EnvironmentComponent::PipUpgrade => "pip Upgrade",
            EnvironmentComponent::ProjectDeployment => "Project Deployment",
        }
    }

    /// Components that must be usable before this one can be installed.
    pub fn prerequisites(&self) -> &'static [EnvironmentComponent] {
        use EnvironmentComponent::*;
        match self {
            SubsystemKernelAndDistro => &[OsVersion, BiosVirtualization],
            DevTools | PipUpgrade => &[SubsystemKernelAndDistro],
            ProjectDeployment => &[SubsystemKernelAndDistro, PipUpgrade],
            OsVersion | NvidiaGpu | NvidiaDriver | BiosVirtualization => &[],
        }
    }
}

impl std::fmt::Display for EnvironmentComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome class of a check or install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    /// Satisfied, or the install just completed.
    Success,

    /// Already satisfied, nothing was done; or unreachable because a
    /// prerequisite is unusable.
    Skipped,

    /// Not satisfied.
    Failed,

    /// Usable, with something the operator should know about.
    Warning,

    /// Work has started. Only reported through progress callbacks.
    InProgress,
}

impl std::fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ComponentStatus::Success => "success",
            ComponentStatus::Skipped => "skipped",
            ComponentStatus::Failed => "failed",
            ComponentStatus::Warning => "warning",
            ComponentStatus::InProgress => "in progress",
        };
        write!(f, "{}", s)
    }
}

/// Result of one component's check or install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentResult {
    pub component: EnvironmentComponent,
    pub status: ComponentStatus,
    pub message: String,

    /// Diagnostic code; meaningful only when `status` is `Failed`.
    pub failure_code: i32,

    /// The host must restart before this component can make progress.
    pub reboot_required: bool,
}

impl ComponentResult {
    fn new(component: EnvironmentComponent, status: ComponentStatus, message: String) -> Self {
        Self {
            component,
            status,
            message,
            failure_code: 0,
            reboot_required: false,
        }
    }

    pub fn success(component: EnvironmentComponent, message: impl Into<String>) -> Self {
        Self::new(component, ComponentStatus::Success, message.into())
    }

    pub fn skipped(component: EnvironmentComponent, message: impl Into<String>) -> Self {
        Self::new(component, ComponentStatus::Skipped, message.into())
    }

    pub fn warning(component: EnvironmentComponent, message: impl Into<String>) -> Self {
        Self::new(component, ComponentStatus::Warning, message.into())
    }

    pub fn failed(
        component: EnvironmentComponent,
        message: impl Into<String>,
        failure_code: i32,
    ) -> Self {
        Self {
            failure_code,
            ..Self::new(component, ComponentStatus::Failed, message.into())
        }
    }

    /// A failed result that can only be resolved by restarting the host.
    pub fn reboot_required(component: EnvironmentComponent, message: impl Into<String>) -> Self {
        Self {
            reboot_required: true,
            ..Self::failed(component, message, failure_codes::REBOOT_PENDING)
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == ComponentStatus::Failed
    }

    /// Whether components depending on this one may proceed.
    pub fn is_usable(&self) -> bool {
        !self.is_failed() && !self.reboot_required
    }
}

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Success,
    Warning,
    Failed,
    RebootRequired,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::Success => "success",
            Verdict::Warning => "warning",
            Verdict::Failed => "failed",
            Verdict::RebootRequired => "reboot required",
        };
        write!(f, "{}", s)
    }
}

/// Aggregate of one check or install run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvironmentResult {
    /// Results in execution order.
    pub component_results: Vec<ComponentResult>,

    /// Set once any component needs a restart; never cleared within a run.
    pub reboot_required: bool,

    pub overall_message: String,
}

impl EnvironmentResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a component result.
    pub fn push(&mut self, result: ComponentResult) {
        self.reboot_required |= result.reboot_required;
        self.component_results.push(result);
    }

    /// Aggregate verdict: reboot beats failure beats warning.
    pub fn verdict(&self) -> Verdict {
        if self.reboot_required {
            Verdict::RebootRequired
        } else if self.component_results.iter().any(|r| r.is_failed()) {
            Verdict::Failed
        } else if self
            .component_results
            .iter()
            .any(|r| r.status == ComponentStatus::Warning)
        {
            Verdict::Warning
        } else {
            Verdict::Success
        }
    }

    /// Result recorded for `component`, if it ran.
    pub fn result_for(&self, component: EnvironmentComponent) -> Option<&ComponentResult> {
        self.component_results
            .iter()
            .find(|r| r.component == component)
    }

    pub fn failed_count(&self) -> usize {
        self.count(ComponentStatus::Failed)
    }

    pub fn warning_count(&self) -> usize {
        self.count(ComponentStatus::Warning)
    }

    fn count(&self, status: ComponentStatus) -> usize {
        self.component_results
            .iter()
            .filter(|r| r.status == status)
            .count()
    }

    /// Set `overall_message` from the verdict.
    pub fn summarize(&mut self) {
        self.overall_message = match self.verdict() {
            Verdict::RebootRequired => {
                "A system restart is required. Restart the computer and run the command again."
                    .to_string()
            }
            Verdict::Failed => format!(
                "{} component(s) failed; fix the reported problems and run again",
                self.failed_count()
            ),
            Verdict::Warning => format!(
                "Environment is usable with {} warning(s)",
                self.warning_count()
            ),
            Verdict::Success => "All components are ready".to_string(),
        };
    }
}

/// Serialized form of a run, verdict included.
#[derive(Debug, Serialize)]
pub struct EnvironmentReport<'a> {
    pub verdict: Verdict,
    #[serde(flatten)]
    pub result: &'a EnvironmentResult,
}

impl<'a> From<&'a EnvironmentResult> for EnvironmentReport<'a> {
    fn from(result: &'a EnvironmentResult) -> Self {
        Self {
            verdict: result.verdict(),
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EnvironmentComponent::*;

    fn result_with(statuses: &[(EnvironmentComponent, ComponentStatus)]) -> EnvironmentResult {
        let mut env = EnvironmentResult::new();
        for (component, status) in statuses {
            let r = match status {
                ComponentStatus::Failed => ComponentResult::failed(*component, "x", 1),
                ComponentStatus::Warning => ComponentResult::warning(*component, "x"),
                ComponentStatus::Skipped => ComponentResult::skipped(*component, "x"),
                _ => ComponentResult::success(*component, "x"),
            };
            env.push(r);
        }
        env
    }

    #[test]
    fn all_is_in_declaration_order() {
        let mut sorted = EnvironmentComponent::ALL;
        sorted.sort();
        assert_eq!(sorted, EnvironmentComponent::ALL);
    }

    #[test]
    fn prerequisites_always_precede() {
        for component in EnvironmentComponent::ALL {
            for prereq in component.prerequisites() {
                assert!(prereq < &component, "{} must precede {}", prereq, component);
            }
        }
    }

    #[test]
    fn display_uses_names() {
        assert_eq!(SubsystemKernelAndDistro.to_string(), "WSL Kernel & Distro");
        assert_eq!(PipUpgrade.to_string(), "pip Upgrade");
    }

    #[test]
    fn failure_code_only_set_on_failure() {
        assert_eq!(ComponentResult::success(OsVersion, "ok").failure_code, 0);
        assert_eq!(ComponentResult::warning(OsVersion, "w").failure_code, 0);
        assert_eq!(ComponentResult::failed(OsVersion, "bad", 10).failure_code, 10);
    }

    #[test]
    fn verdict_success_when_all_ok() {
        let env = result_with(&[
            (OsVersion, ComponentStatus::Success),
            (PipUpgrade, ComponentStatus::Skipped),
        ]);
        assert_eq!(env.verdict(), Verdict::Success);
    }

    #[test]
    fn verdict_warning_without_failures() {
        let env = result_with(&[
            (OsVersion, ComponentStatus::Success),
            (NvidiaDriver, ComponentStatus::Warning),
        ]);
        assert_eq!(env.verdict(), Verdict::Warning);
    }

    #[test]
    fn verdict_failed_beats_warning() {
        let env = result_with(&[
            (NvidiaDriver, ComponentStatus::Warning),
            (NvidiaGpu, ComponentStatus::Failed),
        ]);
        assert_eq!(env.verdict(), Verdict::Failed);
    }

    #[test]
    fn verdict_reboot_beats_everything() {
        let mut env = result_with(&[
            (NvidiaGpu, ComponentStatus::Failed),
            (NvidiaDriver, ComponentStatus::Warning),
        ]);
        env.push(ComponentResult::reboot_required(
            SubsystemKernelAndDistro,
            "restart",
        ));
        env.push(ComponentResult::failed(ProjectDeployment, "x", 25));
        assert_eq!(env.verdict(), Verdict::RebootRequired);
    }

    #[test]
    fn reboot_flag_is_monotonic() {
        let mut env = EnvironmentResult::new();
        env.push(ComponentResult::reboot_required(
            SubsystemKernelAndDistro,
            "restart",
        ));
        env.push(ComponentResult::success(DevTools, "ok"));
        assert!(env.reboot_required);
    }

    #[test]
    fn reboot_result_is_not_usable() {
        let r = ComponentResult::reboot_required(SubsystemKernelAndDistro, "restart");
        assert!(!r.is_usable());
        assert_eq!(r.failure_code, failure_codes::REBOOT_PENDING);
        assert!(ComponentResult::warning(NvidiaDriver, "w").is_usable());
    }

    #[test]
    fn summarize_describes_verdict() {
        let mut env = result_with(&[
            (NvidiaGpu, ComponentStatus::Failed),
            (DevTools, ComponentStatus::Failed),
        ]);
        env.summarize();
        assert!(env.overall_message.starts_with("2 component(s) failed"));
    }

    #[test]
    fn report_serializes_verdict_and_results() {
        let mut env = result_with(&[(NvidiaDriver, ComponentStatus::Warning)]);
        env.summarize();
        let json = serde_json::to_value(EnvironmentReport::from(&env)).unwrap();

        assert_eq!(json["verdict"], "warning");
        assert_eq!(json["component_results"][0]["component"], "nvidia_driver");
        assert_eq!(json["component_results"][0]["status"], "warning");
        assert_eq!(json["reboot_required"], false);
    }
}
