//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait and is routed by
//! [`CommandDispatcher`]. Commands that touch the system are generic over
//! the [`CommandExecutor`](crate::shell::CommandExecutor) so they can be
//! driven by a mock in tests.

pub mod check;
pub mod completions;
pub mod config;
pub mod dispatcher;
pub mod install;
pub mod passthrough;
pub mod preflight;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
