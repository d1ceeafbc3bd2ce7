//! Closed-loop simulation for the humidity controller.
//!
//! Provides:
//! - A lumped chamber model driven by relay states
//! - In-memory sensor and actuator ports with fault injection
//! - A fixed-period runner that integrates the chamber between relay edges

pub mod chamber;
pub mod error;
pub mod ports;
pub mod sim;

pub use chamber::{Chamber, ChamberParams};
pub use error::{SimError, SimResult};
pub use ports::{SimActuators, SimSensor, Switch};
pub use sim::{SensorFaultWindow, SimOptions, SimRun, WriteFailure, run_sim};
