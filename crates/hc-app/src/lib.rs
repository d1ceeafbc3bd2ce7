//! Shared application service layer for humictl.
//!
//! Centralizes what the CLI (and any future frontend) needs: config file
//! handling, the bounded-latency sensor wrapper, the wall-clock runtime, and
//! simulation runs persisted to the run store.

pub mod config_service;
pub mod error;
pub mod runtime;
pub mod sim_service;
pub mod timed_sensor;

pub use config_service::{
    config_name, default_config_yaml, load_config, save_config, validate_config,
};
pub use error::{AppError, AppResult};
pub use runtime::{RealtimeOptions, RealtimeReport, run_realtime};
pub use sim_service::{SimulationRequest, SimulationResponse, ensure_simulation, list_runs, load_run};
pub use timed_sensor::TimedSensor;

/// Version stamped into run manifests and hashed into run ids.
pub const CONTROLLER_VERSION: &str = env!("CARGO_PKG_VERSION");
