//! In-memory sensor and relay bank.

use std::collections::VecDeque;

use hc_controls::{ActuatorError, ActuatorId, ActuatorPort, Reading, SensorError, SensorPort};

/// Sensor fed by the simulation driver.
///
/// Queued faults are returned before any reading, one per read.
#[derive(Debug, Clone, Default)]
pub struct SimSensor {
    next: Option<Reading>,
    faults: VecDeque<SensorError>,
    reads: usize,
}

impl SimSensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_next(&mut self, reading: Reading) {
        self.next = Some(reading);
    }

    pub fn inject(&mut self, error: SensorError) {
        self.faults.push_back(error);
    }

    pub fn pending_faults(&self) -> usize {
        self.faults.len()
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl SensorPort for SimSensor {
    fn read(&mut self) -> Result<Reading, SensorError> {
        self.reads += 1;
        if let Some(error) = self.faults.pop_front() {
            return Err(error);
        }
        self.next.ok_or(SensorError::NotResponding)
    }
}

/// A physical relay change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Switch {
    pub actuator: ActuatorId,
    pub on: bool,
    pub at: f64,
}

/// Two relays with a switch trace and injectable write failures.
#[derive(Debug, Clone, Default)]
pub struct SimActuators {
    state: [bool; 2],
    fail_writes: [u32; 2],
    clock: f64,
    writes: usize,
    trace: Vec<Switch>,
}

impl SimActuators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time stamped on subsequent switches.
    pub fn set_clock(&mut self, t: f64) {
        self.clock = t;
    }

    /// Make the next `count` writes to `actuator` fail.
    pub fn fail_next(&mut self, actuator: ActuatorId, count: u32) {
        self.fail_writes[slot(actuator)] += count;
    }

    pub fn is_on(&self, actuator: ActuatorId) -> bool {
        self.state[slot(actuator)]
    }

    /// Successful writes, including those that did not change state.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn trace(&self) -> &[Switch] {
        &self.trace
    }

    pub fn switches(&self, actuator: ActuatorId) -> impl Iterator<Item = &Switch> {
        self.trace.iter().filter(move |s| s.actuator == actuator)
    }
}

impl ActuatorPort for SimActuators {
    fn set(&mut self, actuator: ActuatorId, on: bool) -> Result<(), ActuatorError> {
        let idx = slot(actuator);
        if self.fail_writes[idx] > 0 {
            self.fail_writes[idx] -= 1;
            return Err(ActuatorError::WriteFailed {
                actuator,
                reason: "injected relay fault".to_string(),
            });
        }
        self.writes += 1;
        if self.state[idx] != on {
            self.state[idx] = on;
            self.trace.push(Switch {
                actuator,
                on,
                at: self.clock,
            });
        }
        Ok(())
    }
}

fn slot(actuator: ActuatorId) -> usize {
    match actuator {
        ActuatorId::Humidifier => 0,
        ActuatorId::Ventilator => 1,
    }
}
