//! The component contract and the closed set of concrete components.

use tracing::{error, info, warn};

use super::components::{
    BiosVirtualization, DevTools, NvidiaDriver, NvidiaGpu, OsVersion, PipUpgrade,
    ProjectDeployment, SubsystemKernelAndDistro,
};
use super::context::ExecutionContext;
use super::sequence::OutputSink;
use super::types::{ComponentResult, ComponentStatus, EnvironmentComponent};
use crate::shell::CommandExecutor;

/// An independently checkable and installable unit of setup.
///
/// `check` never mutates the host and may be called any number of times.
/// `install` is idempotent: when the component is already satisfied it
/// returns `Skipped` without running anything that changes the system.
pub trait Component {
    fn kind(&self) -> EnvironmentComponent;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn check(&self) -> ComponentResult;

    fn install(&self) -> ComponentResult;
}

/// Install for components that can only be verified, never remediated:
/// a satisfied check becomes `Skipped`. Warnings and failures are returned
/// as is so they still count toward the verdict.
pub(crate) fn verify_only(check: ComponentResult) -> ComponentResult {
    match check.status {
        ComponentStatus::Success | ComponentStatus::Skipped => {
            ComponentResult {
                status: ComponentStatus::Skipped,
                ..check
            }
        }
        _ => check,
    }
}

pub(crate) fn log_start(component: EnvironmentComponent, operation: &str) {
    info!("[ENV] {} {}", operation, component.name());
}

pub(crate) fn log_result(operation: &str, result: &ComponentResult) {
    match result.status {
        ComponentStatus::Failed => error!(
            "[ENV] {} {} failed (code {}): {}",
            operation,
            result.component.name(),
            result.failure_code,
            result.message
        ),
        ComponentStatus::Warning => warn!(
            "[ENV] {} {}: {}",
            operation,
            result.component.name(),
            result.message
        ),
        _ => info!(
            "[ENV] {} {} {}: {}",
            operation,
            result.component.name(),
            result.status,
            result.message
        ),
    }
}

/// Every concrete component, dispatched statically.
pub enum AnyComponent<'a, E: CommandExecutor> {
    OsVersion(OsVersion<'a, E>),
    NvidiaGpu(NvidiaGpu<'a, E>),
    NvidiaDriver(NvidiaDriver<'a, E>),
    BiosVirtualization(BiosVirtualization<'a, E>),
    SubsystemKernelAndDistro(SubsystemKernelAndDistro<'a, E>),
    DevTools(DevTools<'a, E>),
    PipUpgrade(PipUpgrade<'a, E>),
    ProjectDeployment(ProjectDeployment<'a, E>),
}

impl<'a, E: CommandExecutor> AnyComponent<'a, E> {
    /// Build the component for `kind`.
    pub fn build(
        kind: EnvironmentComponent,
        context: &'a ExecutionContext,
        executor: &'a E,
        output: &OutputSink,
    ) -> Self {
        match kind {
            EnvironmentComponent::OsVersion => Self::OsVersion(OsVersion::new(executor)),
            EnvironmentComponent::NvidiaGpu => Self::NvidiaGpu(NvidiaGpu::new(executor)),
            EnvironmentComponent::NvidiaDriver => {
                Self::NvidiaDriver(NvidiaDriver::new(executor))
            }
            EnvironmentComponent::BiosVirtualization => {
                Self::BiosVirtualization(BiosVirtualization::new(executor))
            }
            EnvironmentComponent::SubsystemKernelAndDistro => {
                Self::SubsystemKernelAndDistro(SubsystemKernelAndDistro::new(context, executor))
            }
            EnvironmentComponent::DevTools => Self::DevTools(DevTools::new(context, executor)),
            EnvironmentComponent::PipUpgrade => {
                Self::PipUpgrade(PipUpgrade::new(context, executor))
            }
            EnvironmentComponent::ProjectDeployment => Self::ProjectDeployment(
                ProjectDeployment::new(context, executor).with_output(output.clone()),
            ),
        }
    }

    /// The fixed, ordered component list.
    pub fn all(context: &'a ExecutionContext, executor: &'a E, output: &OutputSink) -> Vec<Self> {
        EnvironmentComponent::ALL
            .iter()
            .map(|kind| Self::build(*kind, context, executor, output))
            .collect()
    }
}

macro_rules! dispatch {
    ($self:ident, $c:ident => $call:expr) => {
        match $self {
            AnyComponent::OsVersion($c) => $call,
            AnyComponent::NvidiaGpu($c) => $call,
            AnyComponent::NvidiaDriver($c) => $call,
            AnyComponent::BiosVirtualization($c) => $call,
            AnyComponent::SubsystemKernelAndDistro($c) => $call,
            AnyComponent::DevTools($c) => $call,
            AnyComponent::PipUpgrade($c) => $call,
            AnyComponent::ProjectDeployment($c) => $call,
        }
    };
}

impl<E: CommandExecutor> Component for AnyComponent<'_, E> {
    fn kind(&self) -> EnvironmentComponent {
        dispatch!(self, c => c.kind())
    }

    fn check(&self) -> ComponentResult {
        dispatch!(self, c => c.check())
    }

    fn install(&self) -> ComponentResult {
        dispatch!(self, c => c.install())
    }
}
