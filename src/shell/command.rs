//! Shell command execution.
//!
//! [`CommandExecutor`] is the seam every component talks through. The
//! production [`ShellExecutor`] spawns real processes; tests use
//! [`MockExecutor`](super::mock::MockExecutor).

use crate::error::{EnvError, Result};
use crate::shell::encoding::decode_output;
use crate::shell::platform::{self, ExecTarget};
use crate::shell::relay;
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Exit code reported when a command exceeded its timeout and was killed.
pub const TIMEOUT_EXIT_CODE: i32 = -1;

/// Exit code reported when a command could not be spawned at all.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = -2;

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Process exit code, or one of the negative sentinels.
    pub exit_code: i32,

    /// Standard output, decoded to UTF-8.
    pub stdout: String,

    /// Standard error, decoded to UTF-8.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,
}

impl CommandResult {
    /// Create a result from its parts.
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration: Duration::ZERO,
        }
    }

    /// Result standing in for a process that never started.
    pub fn spawn_failure(message: impl Into<String>) -> Self {
        Self::new(SPAWN_FAILURE_EXIT_CODE, String::new(), message)
    }

    /// Whether the command exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Whether the command was killed for exceeding its timeout.
    pub fn timed_out(&self) -> bool {
        self.exit_code == TIMEOUT_EXIT_CODE
    }

    /// Stdout followed by stderr.
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Output line from command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Callback for streaming output.
pub type OutputCallback = Box<dyn Fn(OutputLine) + Send>;

/// Runs external commands on the host or inside the subsystem.
pub trait CommandExecutor {
    /// Run a command to completion, capturing its output.
    ///
    /// Returns `Err` only when the process cannot be spawned. Non-zero
    /// exits and timeouts come back as a [`CommandResult`].
    fn execute(&self, command: &str, timeout: Duration, target: ExecTarget)
        -> Result<CommandResult>;

    /// Run a long command, streaming each output line to `on_output` as it
    /// is produced and forwarding interrupts to the child.
    fn relay(
        &self,
        command: &str,
        timeout: Duration,
        target: ExecTarget,
        on_output: OutputCallback,
    ) -> Result<i32>;

    /// Like [`execute`](Self::execute), folding a spawn failure into
    /// [`SPAWN_FAILURE_EXIT_CODE`].
    fn run(&self, command: &str, timeout: Duration, target: ExecTarget) -> CommandResult {
        match self.execute(command, timeout, target) {
            Ok(result) => result,
            Err(e) => {
                warn!("{}", e);
                CommandResult::spawn_failure(e.to_string())
            }
        }
    }

    /// Like [`relay`](Self::relay), folding a spawn failure into
    /// [`SPAWN_FAILURE_EXIT_CODE`].
    fn run_relayed(
        &self,
        command: &str,
        timeout: Duration,
        target: ExecTarget,
        on_output: OutputCallback,
    ) -> i32 {
        match self.relay(command, timeout, target, on_output) {
            Ok(code) => code,
            Err(e) => {
                warn!("{}", e);
                SPAWN_FAILURE_EXIT_CODE
            }
        }
    }
}

/// Executor that spawns real processes.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    distro: String,
}

impl ShellExecutor {
    /// Create an executor whose subsystem commands target `distro`.
    pub fn new(distro: impl Into<String>) -> Self {
        Self {
            distro: distro.into(),
        }
    }

    /// The WSL distribution subsystem commands run in.
    pub fn distro(&self) -> &str {
        &self.distro
    }

    fn build(&self, command: &str, target: ExecTarget) -> Command {
        match target {
            ExecTarget::Host => platform::host_command(command),
            ExecTarget::Subsystem => platform::subsystem_command(&self.distro, command),
        }
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute(
        &self,
        command: &str,
        timeout: Duration,
        target: ExecTarget,
    ) -> Result<CommandResult> {
        let start = Instant::now();
        debug!("exec [{}] ({}s): {}", target, timeout.as_secs(), command);

        let mut cmd = self.build(command, target);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        platform::isolate_process_group(&mut cmd);

        let mut child = cmd.spawn().map_err(|source| EnvError::Spawn {
            command: command.to_string(),
            source,
        })?;

        let stdout_handle = spawn_pipe_reader(child.stdout.take());
        let stderr_handle = spawn_pipe_reader(child.stderr.take());

        let exit_code = match child.wait_timeout(timeout)? {
            Some(status) => platform::exit_code_of(status),
            None => {
                warn!(
                    "Command timed out after {}s, terminating: {}",
                    timeout.as_secs(),
                    command
                );
                platform::kill_process_tree(&mut child);
                let _ = child.wait();
                TIMEOUT_EXIT_CODE
            }
        };

        let stdout = collect_pipe(stdout_handle);
        let stderr = collect_pipe(stderr_handle);

        debug!("exec [{}] exited {}", target, exit_code);

        Ok(CommandResult {
            exit_code,
            stdout,
            stderr,
            duration: start.elapsed(),
        })
    }

    fn relay(
        &self,
        command: &str,
        timeout: Duration,
        target: ExecTarget,
        on_output: OutputCallback,
    ) -> Result<i32> {
        debug!("relay [{}] ({}s): {}", target, timeout.as_secs(), command);
        let cmd = self.build(command, target);
        relay::relay_process(cmd, command, timeout, on_output)
    }
}

fn spawn_pipe_reader<R>(pipe: Option<R>) -> Option<thread::JoinHandle<io::Result<Vec<u8>>>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut stream| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn collect_pipe(handle: Option<thread::JoinHandle<io::Result<Vec<u8>>>>) -> String {
    match handle.map(|h| h.join()) {
        Some(Ok(Ok(bytes))) => decode_output(&bytes),
        _ => String::new(),
    }
}
