//! Concrete environment components, in install order.

pub mod dev_tools;
pub mod driver;
pub mod gpu;
pub mod os_version;
pub mod pip;
pub mod project;
pub mod subsystem;
pub mod virtualization;

pub use dev_tools::DevTools;
pub use driver::{is_accepted_toolkit, parse_toolkit_version, NvidiaDriver};
pub use gpu::{is_blackwell_series, meets_minimum_requirement, parse_rtx_model, NvidiaGpu, RtxModel};
pub use os_version::{is_supported_os, parse_os_info, OsInfo, OsVersion};
pub use pip::PipUpgrade;
pub use project::{DeployMode, ProjectDeployment};
pub use subsystem::{distro_listed, SubsystemKernelAndDistro, SubsystemState};
pub use virtualization::{BiosVirtualization, VirtualizationState};
