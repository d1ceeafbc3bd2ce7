//! Error types for control system operations.

use thiserror::Error;

use crate::config::ConfigError;

/// Result type for control system operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors raised while building control components.
///
/// Per-tick faults (sensor, actuator, sink) never surface here; the loop
/// recovers from them locally.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Controller configuration rejected at startup.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
