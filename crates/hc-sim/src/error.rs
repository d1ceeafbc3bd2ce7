//! Error types for simulation operations.

use thiserror::Error;

/// Errors raised while setting up a simulation run.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<hc_controls::ControlError> for SimError {
    fn from(e: hc_controls::ControlError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<hc_core::HcError> for SimError {
    fn from(e: hc_core::HcError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}
