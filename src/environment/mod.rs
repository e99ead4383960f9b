//! Environment orchestration.
//!
//! The host is prepared by a fixed, ordered list of components, each of
//! which can be checked without side effects and installed idempotently:
//!
//! 1. OS version, GPU hardware, driver and virtualization (verify only)
//! 2. WSL kernel and the Linux distribution
//! 3. Build tools and pip inside the distribution
//! 4. The project checkout and its virtual environment
//!
//! [`EnvironmentInstaller`] runs them and aggregates the results into an
//! [`EnvironmentResult`].

pub mod component;
pub mod components;
pub mod context;
pub mod installer;
pub mod sequence;
pub mod types;

pub use component::{AnyComponent, Component};
pub use context::ExecutionContext;
pub use installer::{EnvironmentInstaller, COMPLETE_LABEL};
pub use sequence::{stdout_sink, CommandSequence, OutputSink, SequenceStep};
pub use types::{
    failure_codes, ComponentResult, ComponentStatus, EnvironmentComponent, EnvironmentReport,
    EnvironmentResult, Verdict,
};
