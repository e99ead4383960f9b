//! Mock command executor for testing.
//!
//! `MockExecutor` implements [`CommandExecutor`] without spawning anything.
//! Responses are scripted by command substring and every call is recorded
//! for later assertion.
//!
//! # Example
//!
//! ```
//! use parallax_env::shell::{CommandExecutor, ExecTarget, MockExecutor};
//! use std::time::Duration;
//!
//! let mut exec = MockExecutor::new();
//! exec.respond("pip --version", 0, "pip 24.0");
//!
//! let result = exec.run("pip --version", Duration::from_secs(30), ExecTarget::Subsystem);
//! assert!(result.success());
//! assert!(exec.was_called("pip --version"));
//! assert!(!exec.was_called("apt-get"));
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use crate::error::{EnvError, Result};

use super::command::{CommandExecutor, CommandResult, OutputCallback, OutputLine};
use super::platform::ExecTarget;

/// Exit code returned for commands no rule matches.
pub const UNMATCHED_EXIT_CODE: i32 = 127;

/// One recorded executor invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub command: String,
    pub target: ExecTarget,
    pub relayed: bool,
    pub timeout: Duration,
}

#[derive(Debug)]
enum Response {
    Results(VecDeque<CommandResult>),
    SpawnFailure,
}

#[derive(Debug)]
struct Rule {
    pattern: String,
    target: Option<ExecTarget>,
    response: Response,
}

/// Scripted executor for tests.
///
/// When several rules match a command, the longest pattern wins; among
/// equally long patterns the most recently added one wins. A rule built
/// from a sequence yields its results in order and then keeps repeating
/// the last one.
#[derive(Debug, Default)]
pub struct MockExecutor {
    rules: RefCell<Vec<Rule>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl MockExecutor {
    /// Create an executor with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands containing `pattern` on any target.
    pub fn respond(&mut self, pattern: &str, exit_code: i32, stdout: &str) -> &mut Self {
        self.respond_with(pattern, CommandResult::new(exit_code, stdout, ""))
    }

    /// Answer commands containing `pattern` on one target only.
    pub fn respond_on(
        &mut self,
        target: ExecTarget,
        pattern: &str,
        exit_code: i32,
        stdout: &str,
    ) -> &mut Self {
        self.push_rule(
            pattern,
            Some(target),
            Response::Results(VecDeque::from([CommandResult::new(exit_code, stdout, "")])),
        )
    }

    /// Answer commands containing `pattern` with a full result.
    pub fn respond_with(&mut self, pattern: &str, result: CommandResult) -> &mut Self {
        self.push_rule(pattern, None, Response::Results(VecDeque::from([result])))
    }

    /// Answer successive matching calls with successive results.
    pub fn respond_sequence(&mut self, pattern: &str, results: Vec<CommandResult>) -> &mut Self {
        self.push_rule(pattern, None, Response::Results(results.into()))
    }

    /// Make commands containing `pattern` fail to spawn.
    pub fn fail_spawn(&mut self, pattern: &str) -> &mut Self {
        self.push_rule(pattern, None, Response::SpawnFailure)
    }

    fn push_rule(
        &mut self,
        pattern: &str,
        target: Option<ExecTarget>,
        response: Response,
    ) -> &mut Self {
        self.rules.get_mut().push(Rule {
            pattern: pattern.to_string(),
            target,
            response,
        });
        self
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    /// Command text of all recorded calls, in order.
    pub fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.command.clone()).collect()
    }

    /// Command text of calls that went through the relay.
    pub fn relayed_commands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.relayed)
            .map(|c| c.command.clone())
            .collect()
    }

    /// Whether any recorded command contains `pattern`.
    pub fn was_called(&self, pattern: &str) -> bool {
        self.count(pattern) > 0
    }

    /// Number of recorded commands containing `pattern`.
    pub fn count(&self, pattern: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.command.contains(pattern))
            .count()
    }

    /// Forget recorded calls, keeping the scripted rules.
    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, command: &str, target: ExecTarget, relayed: bool, timeout: Duration) {
        self.calls.borrow_mut().push(RecordedCall {
            command: command.to_string(),
            target,
            relayed,
            timeout,
        });
    }

    fn lookup(&self, command: &str, target: ExecTarget) -> Result<CommandResult> {
        let mut rules = self.rules.borrow_mut();

        let best = rules
            .iter()
            .enumerate()
            .filter(|(_, r)| command.contains(&r.pattern))
            .filter(|(_, r)| r.target.map_or(true, |t| t == target))
            .max_by_key(|(i, r)| (r.pattern.len(), *i))
            .map(|(i, _)| i);

        let Some(index) = best else {
            return Ok(CommandResult::new(
                UNMATCHED_EXIT_CODE,
                "",
                format!("mock: no response scripted for '{}'", command),
            ));
        };

        match &mut rules[index].response {
            Response::SpawnFailure => Err(EnvError::Spawn {
                command: command.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock spawn failure"),
            }),
            Response::Results(queue) => {
                let result = if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                };
                Ok(result.unwrap_or_else(|| CommandResult::new(0, "", "")))
            }
        }
    }
}

impl CommandExecutor for MockExecutor {
    fn execute(
        &self,
        command: &str,
        timeout: Duration,
        target: ExecTarget,
    ) -> Result<CommandResult> {
        self.record(command, target, false, timeout);
        self.lookup(command, target)
    }

    fn relay(
        &self,
        command: &str,
        timeout: Duration,
        target: ExecTarget,
        on_output: OutputCallback,
    ) -> Result<i32> {
        self.record(command, target, true, timeout);
        let result = self.lookup(command, target)?;
        for line in result.stdout.lines() {
            on_output(OutputLine::Stdout(line.to_string()));
        }
        for line in result.stderr.lines() {
            on_output(OutputLine::Stderr(line.to_string()));
        }
        Ok(result.exit_code)
    }
}
