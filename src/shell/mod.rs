//! Shell command execution on the host and inside the subsystem.

pub mod command;
pub mod encoding;
pub mod mock;
pub mod platform;
pub mod relay;

pub use command::{
    CommandExecutor, CommandResult, OutputCallback, OutputLine, ShellExecutor,
    SPAWN_FAILURE_EXIT_CODE, TIMEOUT_EXIT_CODE,
};
pub use encoding::decode_output;
pub use mock::{MockExecutor, RecordedCall};
pub use platform::{quote_posix, quote_powershell, ExecTarget};
