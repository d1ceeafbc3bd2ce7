//! Hardware-facing capabilities consumed by the control loop.
//!
//! The loop never talks to a driver directly. A sensor driver implements
//! [`SensorPort`], a relay/GPIO driver implements [`ActuatorPort`]; the
//! simulation crate provides in-memory versions of both.

use thiserror::Error;

use crate::signal::ActuatorId;

/// Raw humidity/temperature reading as returned by a sensor driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub humidity_pct: f64,
    pub temperature_c: f64,
}

impl Reading {
    pub fn new(humidity_pct: f64, temperature_c: f64) -> Self {
        Self {
            humidity_pct,
            temperature_c,
        }
    }
}

/// Transient sensor failures. All are retried on the next tick.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SensorError {
    #[error("Sensor read timed out")]
    Timeout,

    #[error("Sensor checksum mismatch")]
    ChecksumFailure,

    #[error("Sensor not responding")]
    NotResponding,

    #[error("Implausible sensor reading: {what}")]
    InvalidReading { what: String },
}

/// Failure to drive a binary output.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActuatorError {
    #[error("Write to {actuator} failed: {reason}")]
    WriteFailed { actuator: ActuatorId, reason: String },
}

/// Acquire one humidity + temperature sample.
///
/// Implementations may block; callers that need a bound wrap the port (see the
/// timed sensor in the application crate).
pub trait SensorPort {
    fn read(&mut self) -> Result<Reading, SensorError>;
}

/// Set a named binary output. A successful write takes effect within one
/// control period.
pub trait ActuatorPort {
    fn set(&mut self, actuator: ActuatorId, on: bool) -> Result<(), ActuatorError>;
}

impl<T: SensorPort + ?Sized> SensorPort for &mut T {
    fn read(&mut self) -> Result<Reading, SensorError> {
        (**self).read()
    }
}

impl<T: SensorPort + ?Sized> SensorPort for Box<T> {
    fn read(&mut self) -> Result<Reading, SensorError> {
        (**self).read()
    }
}

impl<T: ActuatorPort + ?Sized> ActuatorPort for &mut T {
    fn set(&mut self, actuator: ActuatorId, on: bool) -> Result<(), ActuatorError> {
        (**self).set(actuator, on)
    }
}

impl<T: ActuatorPort + ?Sized> ActuatorPort for Box<T> {
    fn set(&mut self, actuator: ActuatorId, on: bool) -> Result<(), ActuatorError> {
        (**self).set(actuator, on)
    }
}
