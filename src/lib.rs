//! Parallax environment setup.
//!
//! Prepares a Windows host to run a GPU workload inside WSL2: checks the
//! OS, GPU, driver and firmware, installs the subsystem and its toolchain,
//! deploys the project, and relays the workload's own commands.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Persisted key/value configuration
//! - [`environment`] - Components, sequences and the installer
//! - [`error`] - Error types and result aliases
//! - [`shell`] - Command execution, output relay and the test executor
//! - [`ui`] - Terminal output, prompts and progress
//!
//! # Example
//!
//! ```
//! use parallax_env::environment::{EnvironmentInstaller, ExecutionContext, Verdict};
//! use parallax_env::shell::MockExecutor;
//!
//! let context = ExecutionContext::new("Ubuntu-24.04");
//! let executor = MockExecutor::new();
//!
//! let env = EnvironmentInstaller::new(&context, &executor).check_environment(|_| {});
//! assert_eq!(env.component_results.len(), 8);
//! assert_eq!(env.verdict(), Verdict::Failed);
//! ```

pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod shell;
pub mod ui;

pub use error::{EnvError, Result};
