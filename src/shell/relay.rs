//! Interactive process relay.
//!
//! Streams a long-running child's output line by line while it runs and
//! forwards Ctrl+C to that child only. Other executor calls are never
//! affected because the forwarder exists only for the relay's lifetime.

use crate::error::{EnvError, Result};
use crate::shell::command::{OutputCallback, OutputLine, TIMEOUT_EXIT_CODE};
use crate::shell::platform;
use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use wait_timeout::ChildExt;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Spawn `cmd`, relay its output to `on_output`, and return its exit code.
///
/// The child is killed and [`TIMEOUT_EXIT_CODE`] returned if it outlives
/// `timeout`.
pub fn relay_process(
    mut cmd: Command,
    command_text: &str,
    timeout: Duration,
    on_output: OutputCallback,
) -> Result<i32> {
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    platform::isolate_process_group(&mut cmd);

    let mut child = cmd.spawn().map_err(|source| EnvError::Spawn {
        command: command_text.to_string(),
        source,
    })?;

    let _forwarder = InterruptForwarder::install(child.id());

    let (tx, rx) = mpsc::channel();
    let tx_stdout = tx.clone();
    let tx_stderr = tx;

    if let Some(stdout) = child.stdout.take() {
        thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.split(b'\n').map_while(std::result::Result::ok) {
                let _ = tx_stdout.send(OutputLine::Stdout(clean_line(&line)));
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        thread::spawn(move || {
            let reader = BufReader::new(stderr);
            for line in reader.split(b'\n').map_while(std::result::Result::ok) {
                let _ = tx_stderr.send(OutputLine::Stderr(clean_line(&line)));
            }
        });
    }

    let deadline = Instant::now() + timeout;

    loop {
        if Instant::now() >= deadline {
            warn!("Relayed command timed out, terminating: {}", command_text);
            platform::kill_process_tree(&mut child);
            let _ = child.wait();
            return Ok(TIMEOUT_EXIT_CODE);
        }

        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => on_output(line),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Both streams closed; the child is exiting or has detached its pipes.
    let remaining = deadline.saturating_duration_since(Instant::now());
    let code = match child.wait_timeout(remaining)? {
        Some(status) => platform::exit_code_of(status),
        None => {
            warn!("Relayed command timed out, terminating: {}", command_text);
            platform::kill_process_tree(&mut child);
            let _ = child.wait();
            TIMEOUT_EXIT_CODE
        }
    };

    info!("Relayed command exited with {}", code);
    Ok(code)
}

/// Strip the trailing carriage return and decode one output line.
fn clean_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    crate::shell::encoding::decode_output(raw)
}

#[cfg(unix)]
mod interrupt {
    use std::sync::atomic::{AtomicI32, Ordering};

    static RELAYED_GROUP: AtomicI32 = AtomicI32::new(0);

    extern "C" fn forward_interrupt(_signal: libc::c_int) {
        let pgid = RELAYED_GROUP.load(Ordering::SeqCst);
        if pgid > 0 {
            // SAFETY: kill(2) is async-signal-safe.
            unsafe {
                libc::kill(-pgid, libc::SIGINT);
            }
        }
    }

    /// Routes SIGINT to the relayed child's process group while alive.
    pub struct InterruptForwarder {
        previous: libc::sighandler_t,
    }

    impl InterruptForwarder {
        pub fn install(pid: u32) -> Self {
            RELAYED_GROUP.store(i32::try_from(pid).unwrap_or(0), Ordering::SeqCst);
            let handler = forward_interrupt as extern "C" fn(libc::c_int) as libc::sighandler_t;
            // SAFETY: the handler only performs an atomic load and kill(2).
            let previous = unsafe { libc::signal(libc::SIGINT, handler) };
            Self { previous }
        }
    }

    impl Drop for InterruptForwarder {
        fn drop(&mut self) {
            // SAFETY: restores the disposition that was active before install.
            unsafe {
                libc::signal(libc::SIGINT, self.previous);
            }
            RELAYED_GROUP.store(0, Ordering::SeqCst);
        }
    }
}

#[cfg(not(unix))]
mod interrupt {
    /// The Windows console delivers Ctrl+C to every attached process,
    /// including the relayed child, so nothing needs forwarding.
    pub struct InterruptForwarder;

    impl InterruptForwarder {
        pub fn install(_pid: u32) -> Self {
            Self
        }
    }
}

use interrupt::InterruptForwarder;

/// Relay tests swap the process-wide SIGINT handler, so they run one at a
/// time.
#[cfg(all(test, unix))]
pub(crate) fn serialize_relays() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", script]);
        cmd
    }

    fn collector() -> (Arc<Mutex<Vec<OutputLine>>>, OutputCallback) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let clone = Arc::clone(&lines);
        (lines, Box::new(move |l| clone.lock().unwrap().push(l)))
    }

    fn stdout_lines(lines: &Mutex<Vec<OutputLine>>) -> Vec<String> {
        lines
            .lock()
            .unwrap()
            .iter()
            .filter_map(|l| match l {
                OutputLine::Stdout(s) => Some(s.clone()),
                OutputLine::Stderr(_) => None,
            })
            .collect()
    }

    #[test]
    fn relays_lines_in_order() {
        let _serial = serialize_relays();
        let (lines, cb) = collector();
        let code = relay_process(
            sh("echo a; echo b; echo c"),
            "echo",
            Duration::from_secs(10),
            cb,
        )
        .unwrap();

        assert_eq!(code, 0);
        assert_eq!(stdout_lines(&lines), vec!["a", "b", "c"]);
    }

    #[test]
    fn interrupt_reaches_the_relayed_child() {
        let _serial = serialize_relays();
        let lines = Arc::new(Mutex::new(Vec::new()));
        let clone = Arc::clone(&lines);
        let on_output: OutputCallback = Box::new(move |line| {
            let ready = line == OutputLine::Stdout("ready".to_string());
            clone.lock().unwrap().push(line);
            if ready {
                // SAFETY: signals this test process; the relay's handler is installed.
                unsafe {
                    libc::kill(libc::getpid(), libc::SIGINT);
                }
            }
        });

        let code = relay_process(
            sh("trap 'echo got-int; exit 9' INT; echo ready; while :; do sleep 0.1; done"),
            "trap",
            Duration::from_secs(10),
            on_output,
        )
        .unwrap();

        assert_eq!(code, 9);
        assert_eq!(stdout_lines(&lines), vec!["ready", "got-int"]);
    }

    #[test]
    fn relay_times_out() {
        let _serial = serialize_relays();
        let (_lines, cb) = collector();
        let start = Instant::now();
        let code = relay_process(sh("sleep 5"), "sleep", Duration::from_millis(300), cb).unwrap();

        assert_eq!(code, TIMEOUT_EXIT_CODE);
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn relay_reports_spawn_failure() {
        let _serial = serialize_relays();
        let (_lines, cb) = collector();
        let cmd = Command::new("/nonexistent/definitely-not-a-binary");
        let result = relay_process(cmd, "missing", Duration::from_secs(1), cb);
        assert!(matches!(result, Err(EnvError::Spawn { .. })));
    }

    #[test]
    fn clean_line_strips_carriage_return() {
        assert_eq!(clean_line(b"progress 50%\r"), "progress 50%");
    }
}
