//! Humidity control core for humictl.
//!
//! This crate holds everything that runs inside the control task: the sensor and
//! actuator port traits, the trajectory estimator, the PI law, the duty-cycle
//! scheduler that turns a continuous demand into relay edges, the arbitration
//! between humidifier and ventilator, and the [`ControlLoop`] that owns all of it.
//!
//! # Architecture
//!
//! One tick per sampling period, always in the same order:
//! - read a sample (or count a failure)
//! - predict the humidity one horizon ahead
//! - compute a PI demand per actuator
//! - arbitrate between the two demands
//! - open a pulse window per actuator and write the resulting edges
//! - hand a [`TickRecord`] to the record sink
//!
//! Intra-period OFF edges are delivered by calling [`ControlLoop::service`] at
//! the instants returned by [`ControlLoop::next_transition`].
//!
//! # Design Principles
//!
//! - **Single owner**: all mutable control state lives in one `ControlLoop`
//! - **Ports at the edges**: hardware is reached only through [`SensorPort`] and [`ActuatorPort`]
//! - **Fail-safe**: missing data never turns an actuator on; sustained loss forces everything off

pub mod config;
pub mod control_loop;
pub mod controller;
pub mod coordination;
pub mod error;
pub mod estimator;
pub mod ports;
pub mod record;
pub mod sample;
pub mod sampled;
pub mod scheduler;
pub mod signal;

pub use config::{ConfigError, ControllerConfig};
pub use control_loop::{ControlLoop, TickOutcome};
pub use controller::{ControlAction, PIController, PIControllerState};
pub use coordination::{Arbitration, CoordinationPolicy, Resolution};
pub use error::{ControlError, ControlResult};
pub use estimator::{Prediction, TrajectoryEstimator};
pub use ports::{ActuatorError, ActuatorPort, Reading, SensorError, SensorPort};
pub use record::{ActuatorFault, MemorySink, NullSink, RecordSink, SinkError, TickRecord};
pub use sample::{ActuatorActivity, Sample, SampleHistory};
pub use sampled::{SampleClock, SampleConfig};
pub use scheduler::{ActuatorCommand, ActuatorState, DutyCycleScheduler};
pub use signal::{ActuatorId, ControlSignal};
