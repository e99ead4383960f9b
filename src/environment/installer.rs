//! Check and install orchestration over the ordered component list.

use std::collections::HashSet;

use tracing::{info, warn};

use super::component::{AnyComponent, Component};
use super::context::ExecutionContext;
use super::sequence::{stdout_sink, OutputSink};
use super::types::{ComponentResult, EnvironmentComponent, EnvironmentResult};
use crate::shell::CommandExecutor;

/// Label of the final progress event.
pub const COMPLETE_LABEL: &str = "Complete";

/// Runs components in order against one context and executor.
///
/// The installer itself never touches the system: every external effect
/// comes from a component's own `install`.
pub struct EnvironmentInstaller<'a, E: CommandExecutor> {
    context: &'a ExecutionContext,
    executor: &'a E,
    output: OutputSink,
}

impl<'a, E: CommandExecutor> EnvironmentInstaller<'a, E> {
    pub fn new(context: &'a ExecutionContext, executor: &'a E) -> Self {
        Self {
            context,
            executor,
            output: stdout_sink(),
        }
    }

    /// Route relayed install output, e.g. above a progress bar.
    pub fn with_output_sink(mut self, output: OutputSink) -> Self {
        self.output = output;
        self
    }

    fn components(&self) -> Vec<AnyComponent<'a, E>> {
        AnyComponent::all(self.context, self.executor, &self.output)
    }

    /// Check every component, reporting each result as soon as it exists.
    pub fn check_environment<F>(&self, mut on_result: F) -> EnvironmentResult
    where
        F: FnMut(&ComponentResult),
    {
        let mut env = EnvironmentResult::new();

        for component in self.components() {
            let result = component.check();
            on_result(&result);
            env.push(result);
        }

        env.summarize();
        info!("[ENV] Check finished: {}", env.overall_message);
        env
    }

    /// Install every component in order.
    ///
    /// A component whose prerequisite failed or needs a restart is not
    /// attempted; it is reported as skipped and blocks its own dependents
    /// in turn. `on_progress` receives `(label, message, percent)` with a
    /// non-decreasing percent that reaches 100 only with the final event.
    pub fn install_environment<F>(&self, mut on_progress: F) -> EnvironmentResult
    where
        F: FnMut(&str, &str, u8),
    {
        let components = self.components();
        let total = components.len();
        let mut env = EnvironmentResult::new();
        let mut blocked: HashSet<EnvironmentComponent> = HashSet::new();

        for (index, component) in components.iter().enumerate() {
            let kind = component.kind();
            on_progress(
                kind.name(),
                &format!("Installing {}...", kind.name()),
                percent(index, total),
            );

            let unmet = kind
                .prerequisites()
                .iter()
                .find(|p| blocked.contains(*p));

            let result = match unmet {
                Some(prerequisite) => {
                    warn!(
                        "[ENV] Skipping {}: {} is not available",
                        kind.name(),
                        prerequisite.name()
                    );
                    ComponentResult::skipped(
                        kind,
                        format!("Skipped: requires {}", prerequisite.name()),
                    )
                }
                None => component.install(),
            };

            if unmet.is_some() || !result.is_usable() {
                blocked.insert(kind);
            }

            on_progress(
                kind.name(),
                &result.message,
                percent(index + 1, total).min(99),
            );
            env.push(result);
        }

        env.summarize();
        info!("[ENV] Install finished: {}", env.overall_message);
        on_progress(COMPLETE_LABEL, &env.overall_message, 100);
        env
    }
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (done * 100 / total).min(100) as u8
}
