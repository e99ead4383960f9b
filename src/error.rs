//! Error types for environment orchestration.
//!
//! This module defines [`EnvError`], the error type used by the executor
//! and configuration layers, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Components never return `EnvError`; they fold failures into a
//!   [`ComponentResult`](crate::environment::ComponentResult)
//! - The command executor only errors when a process cannot be spawned
//! - Configuration errors carry the offending key

use thiserror::Error;

/// Core error type for parallax-env operations.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The external process could not be started at all.
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Key is not one of the known configuration keys.
    #[error("Unknown configuration key: {key}")]
    InvalidConfigKey { key: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for parallax-env operations.
pub type Result<T> = std::result::Result<T, EnvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_error_displays_command() {
        let err = EnvError::Spawn {
            command: "nvidia-smi".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("nvidia-smi"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn invalid_key_displays_key() {
        let err = EnvError::InvalidConfigKey {
            key: "bogus".into(),
        };
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: EnvError = io_err.into();
        assert!(matches!(err, EnvError::Io(_)));
    }
}
