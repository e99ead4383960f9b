//! Ordered command sequences that stop at the first failing step.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::types::{ComponentResult, EnvironmentComponent};
use crate::shell::{CommandExecutor, ExecTarget, OutputLine};

/// Destination for relayed output lines. Shared so that every relayed
/// step can hand the executor its own callback.
pub type OutputSink = Arc<dyn Fn(OutputLine) + Send + Sync>;

/// Sink that prints relayed lines to the terminal as they arrive.
pub fn stdout_sink() -> OutputSink {
    Arc::new(|line| match line {
        OutputLine::Stdout(text) => println!("{}", text),
        OutputLine::Stderr(text) => eprintln!("{}", text),
    })
}

/// One named command in a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceStep {
    pub name: String,
    pub command: String,
    pub timeout: Duration,

    /// Stream this step's output through the interactive relay.
    pub use_relay: bool,
}

impl SequenceStep {
    pub fn new(name: impl Into<String>, command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            timeout,
            use_relay: false,
        }
    }

    /// Route this step through the interactive relay.
    pub fn relayed(mut self) -> Self {
        self.use_relay = true;
        self
    }
}

/// Runs steps in order on one target.
pub struct CommandSequence<'a, E: CommandExecutor> {
    executor: &'a E,
    target: ExecTarget,
    output: OutputSink,
    steps: Vec<SequenceStep>,
}

impl<'a, E: CommandExecutor> CommandSequence<'a, E> {
    pub fn new(executor: &'a E, target: ExecTarget, output: OutputSink) -> Self {
        Self {
            executor,
            target,
            output,
            steps: Vec::new(),
        }
    }

    pub fn push(&mut self, step: SequenceStep) -> &mut Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[SequenceStep] {
        &self.steps
    }

    /// Execute every step in order.
    ///
    /// The first non-zero exit stops the sequence; later steps never run
    /// and the failure names the step and its command.
    pub fn run(&self, component: EnvironmentComponent, failure_code: i32) -> ComponentResult {
        for (index, step) in self.steps.iter().enumerate() {
            info!(
                "[ENV] {} step {}/{}: {}",
                component.name(),
                index + 1,
                self.steps.len(),
                step.name
            );

            let exit_code = if step.use_relay {
                let sink = Arc::clone(&self.output);
                self.executor.run_relayed(
                    &step.command,
                    step.timeout,
                    self.target,
                    Box::new(move |line| sink(line)),
                )
            } else {
                self.executor
                    .run(&step.command, step.timeout, self.target)
                    .exit_code
            };

            if exit_code != 0 {
                error!(
                    "[ENV] Step '{}' exited with {}: {}",
                    step.name, exit_code, step.command
                );
                return ComponentResult::failed(
                    component,
                    format!("Failed at step '{}': {}", step.name, step.command),
                    failure_code,
                );
            }
        }

        ComponentResult::success(component, "Command sequence completed successfully")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::types::ComponentStatus;
    use crate::shell::{MockExecutor, TIMEOUT_EXIT_CODE};
    use std::sync::Mutex;

    const T: Duration = Duration::from_secs(30);
    const COMPONENT: EnvironmentComponent = EnvironmentComponent::ProjectDeployment;

    fn quiet() -> OutputSink {
        Arc::new(|_| {})
    }

    #[test]
    fn all_steps_succeed() {
        let mut exec = MockExecutor::new();
        exec.respond("step", 0, "");

        let mut seq = CommandSequence::new(&exec, ExecTarget::Subsystem, quiet());
        seq.push(SequenceStep::new("one", "step 1", T))
            .push(SequenceStep::new("two", "step 2", T));

        let result = seq.run(COMPONENT, 25);
        assert_eq!(result.status, ComponentStatus::Success);
        assert_eq!(exec.commands(), vec!["step 1", "step 2"]);
    }

    #[test]
    fn stops_at_first_failure() {
        let mut exec = MockExecutor::new();
        exec.respond("step", 0, "").respond("step 2", 1, "");

        let mut seq = CommandSequence::new(&exec, ExecTarget::Subsystem, quiet());
        seq.push(SequenceStep::new("first", "step 1", T))
            .push(SequenceStep::new("second", "step 2", T))
            .push(SequenceStep::new("third", "step 3", T))
            .push(SequenceStep::new("fourth", "step 4", T));

        let result = seq.run(COMPONENT, 25);

        assert_eq!(result.status, ComponentStatus::Failed);
        assert_eq!(result.failure_code, 25);
        assert_eq!(result.message, "Failed at step 'second': step 2");
        assert_eq!(exec.commands(), vec!["step 1", "step 2"]);
        assert!(!exec.was_called("step 3"));
        assert!(!exec.was_called("step 4"));
    }

    #[test]
    fn timeout_counts_as_failure() {
        let mut exec = MockExecutor::new();
        exec.respond("slow", TIMEOUT_EXIT_CODE, "");

        let mut seq = CommandSequence::new(&exec, ExecTarget::Subsystem, quiet());
        seq.push(SequenceStep::new("clone", "slow clone", T));

        assert_eq!(seq.run(COMPONENT, 25).status, ComponentStatus::Failed);
    }

    #[test]
    fn spawn_failure_counts_as_failure() {
        let mut exec = MockExecutor::new();
        exec.fail_spawn("missing");

        let mut seq = CommandSequence::new(&exec, ExecTarget::Host, quiet());
        seq.push(SequenceStep::new("run", "missing tool", T));

        let result = seq.run(COMPONENT, 25);
        assert!(result.message.contains("'run'"));
    }

    #[test]
    fn relayed_steps_stream_to_sink() {
        let mut exec = MockExecutor::new();
        exec.respond("pip install", 0, "Collecting torch\nSuccessfully installed");

        let lines = Arc::new(Mutex::new(Vec::new()));
        let lines_clone = Arc::clone(&lines);
        let sink: OutputSink = Arc::new(move |l| lines_clone.lock().unwrap().push(l));

        let mut seq = CommandSequence::new(&exec, ExecTarget::Subsystem, sink);
        seq.push(SequenceStep::new("install", "pip install -e .", T).relayed())
            .push(SequenceStep::new("plain", "pip list", T));

        seq.run(COMPONENT, 25);

        assert_eq!(lines.lock().unwrap().len(), 2);
        assert_eq!(exec.relayed_commands(), vec!["pip install -e ."]);
    }

    #[test]
    fn empty_sequence_succeeds() {
        let exec = MockExecutor::new();
        let seq = CommandSequence::new(&exec, ExecTarget::Subsystem, quiet());
        assert_eq!(seq.run(COMPONENT, 25).status, ComponentStatus::Success);
        assert!(exec.calls().is_empty());
    }
}
