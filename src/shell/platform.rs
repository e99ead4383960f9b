//! Platform-specific command construction.
//!
//! Host commands go through PowerShell on Windows and `sh` elsewhere.
//! Subsystem commands are handed to `wsl` as a single `bash -lc` argument,
//! so the caller's text reaches bash untouched.

use std::process::{Child, Command};

/// Where a command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecTarget {
    /// The host shell.
    Host,
    /// Inside the WSL distribution.
    Subsystem,
}

impl std::fmt::Display for ExecTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecTarget::Host => write!(f, "host"),
            ExecTarget::Subsystem => write!(f, "subsystem"),
        }
    }
}

/// Build a host-shell command.
///
/// On Windows the console output encoding is forced to UTF-8 before the
/// caller's script runs, so tools that honour it need no re-encoding.
pub fn host_command(command: &str) -> Command {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("powershell.exe");
        cmd.args(["-NoProfile", "-NonInteractive", "-ExecutionPolicy", "Bypass"]);
        cmd.arg("-Command");
        cmd.arg(format!(
            "[Console]::OutputEncoding = [System.Text.Encoding]::UTF8; {}",
            command
        ));
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c");
        cmd.arg(command);
        cmd
    }
}

/// Build a command that runs inside the given WSL distribution as root.
pub fn subsystem_command(distro: &str, command: &str) -> Command {
    let mut cmd = Command::new(wsl_executable());
    cmd.args(subsystem_args(distro, command));
    cmd
}

/// Arguments passed to `wsl` for a subsystem command.
pub fn subsystem_args(distro: &str, command: &str) -> Vec<String> {
    vec![
        "-d".to_string(),
        distro.to_string(),
        "-u".to_string(),
        "root".to_string(),
        "--".to_string(),
        "bash".to_string(),
        "-lc".to_string(),
        command.to_string(),
    ]
}

fn wsl_executable() -> &'static str {
    if cfg!(target_os = "windows") {
        "wsl.exe"
    } else {
        "wsl"
    }
}

/// Quote an argument for a POSIX shell.
///
/// Safe words pass through unchanged; everything else is wrapped in
/// single quotes with embedded quotes spliced as `'\''`.
pub fn quote_posix(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    let safe = arg
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+%".contains(c));
    if safe {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', "'\\''"))
}

/// Quote an argument for PowerShell.
///
/// Safe words pass through unchanged; everything else becomes a verbatim
/// single-quoted string. PowerShell accepts the typographic single quotes
/// as delimiters too, so each of them is doubled like `'`.
pub fn quote_powershell(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    let safe = arg
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_./:\\".contains(c));
    if safe {
        return arg.to_string();
    }
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('\'');
    for c in arg.chars() {
        if matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}') {
            quoted.push(c);
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Put the child in its own process group so it can be signalled as a unit.
#[cfg(unix)]
pub fn isolate_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
pub fn isolate_process_group(_cmd: &mut Command) {}

/// Forcibly terminate a child and everything it spawned.
pub fn kill_process_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = i32::try_from(child.id()) {
            // SAFETY: kill(2) with a negative pid signals the process group
            // created by isolate_process_group; it has no memory effects.
            unsafe {
                libc::kill(-pgid, libc::SIGKILL);
            }
        }
    }

    #[cfg(windows)]
    {
        let _ = Command::new("taskkill")
            .args(["/T", "/F", "/PID", &child.id().to_string()])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status();
    }

    let _ = child.kill();
}

/// Exit code of a finished process.
///
/// Processes killed by a signal report `128 + signal`, matching shells.
pub fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsystem_args_pass_command_as_single_argument() {
        let args = subsystem_args("Ubuntu-24.04", "cd ~/prakasa && git pull");
        assert_eq!(args[0], "-d");
        assert_eq!(args[1], "Ubuntu-24.04");
        assert_eq!(args[3], "root");
        assert_eq!(args.last().unwrap(), "cd ~/prakasa && git pull");
        assert_eq!(args[args.len() - 2], "-lc");
    }

    #[test]
    fn quote_posix_leaves_safe_words() {
        assert_eq!(quote_posix("Qwen/Qwen3-0.6B"), "Qwen/Qwen3-0.6B");
        assert_eq!(quote_posix("--host=0.0.0.0"), "--host=0.0.0.0");
    }

    #[test]
    fn quote_posix_wraps_spaces_and_quotes() {
        assert_eq!(quote_posix("hello world"), "'hello world'");
        assert_eq!(quote_posix("it's"), "'it'\\''s'");
        assert_eq!(quote_posix(""), "''");
        assert_eq!(quote_posix("$(rm -rf /)"), "'$(rm -rf /)'");
    }

    #[test]
    fn quote_powershell_doubles_single_quotes() {
        assert_eq!(quote_powershell("wsl_update_x64.msi"), "wsl_update_x64.msi");
        assert_eq!(quote_powershell("C:\\Temp\\x.msi"), "C:\\Temp\\x.msi");
        assert_eq!(quote_powershell("it's"), "'it''s'");
        assert_eq!(quote_powershell("it\u{2019}s"), "'it\u{2019}\u{2019}s'");
        assert_eq!(quote_powershell(""), "''");
        assert_eq!(quote_powershell("$(Stop-Computer)"), "'$(Stop-Computer)'");
        assert_eq!(
            quote_powershell("http://u:p'w@h:8080"),
            "'http://u:p''w@h:8080'"
        );
    }

    #[test]
    fn exec_target_display() {
        assert_eq!(ExecTarget::Host.to_string(), "host");
        assert_eq!(ExecTarget::Subsystem.to_string(), "subsystem");
    }

    #[test]
    #[cfg(unix)]
    fn host_command_uses_sh() {
        let cmd = host_command("echo hi");
        assert_eq!(cmd.get_program(), "sh");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, vec!["-c", "echo hi"]);
    }

    #[test]
    #[cfg(unix)]
    fn exit_code_of_reports_plain_exit() {
        let status = Command::new("sh").args(["-c", "exit 7"]).status().unwrap();
        assert_eq!(exit_code_of(status), 7);
    }
}
