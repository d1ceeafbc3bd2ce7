//! Error types for the hc-app service layer.

use std::path::PathBuf;

/// Application error wrapping the backend crates with file-path context.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to read config file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config file: {path}")]
    ConfigFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config validation failed: {0}")]
    Validation(String),

    #[error("Control error: {0}")]
    Control(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hc-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<hc_controls::ConfigError> for AppError {
    fn from(err: hc_controls::ConfigError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<hc_controls::ControlError> for AppError {
    fn from(err: hc_controls::ControlError) -> Self {
        match err {
            hc_controls::ControlError::Config(e) => e.into(),
            other => AppError::Control(other.to_string()),
        }
    }
}

impl From<hc_sim::SimError> for AppError {
    fn from(err: hc_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<hc_results::ResultsError> for AppError {
    fn from(err: hc_results::ResultsError) -> Self {
        match err {
            hc_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}
