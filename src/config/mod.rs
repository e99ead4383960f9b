//! Persisted key/value configuration.
//!
//! - Key names and built-in defaults in [`keys`]
//! - File parsing and rendering in [`format`]
//! - The synchronized store in [`store`]
//!
//! # Example
//!
//! ```
//! use parallax_env::config::{ConfigStore, KEY_WSL_LINUX_DISTRO};
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let store = ConfigStore::load(temp.path().join("parallax_config.txt")).unwrap();
//!
//! assert_eq!(store.get_config_value(KEY_WSL_LINUX_DISTRO, ""), "Ubuntu-24.04");
//! store.set_config_value(KEY_WSL_LINUX_DISTRO, "Ubuntu-22.04").unwrap();
//! store.save().unwrap();
//! ```

pub mod format;
pub mod keys;
pub mod store;

pub use format::{escape_value, parse_config, render_config, unescape_value};
pub use keys::{
    default_for, is_valid_key, KEY_PRAKASA_GIT_BRANCH, KEY_PRAKASA_GIT_REPO_URL, KEY_PROXY_URL,
    KEY_WSL_INSTALLER_URL, KEY_WSL_KERNEL_URL, KEY_WSL_LINUX_DISTRO, VALID_KEYS,
};
pub use store::{ConfigStore, DEFAULT_CONFIG_FILE};
