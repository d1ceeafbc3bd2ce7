//! Per-tick records handed to the logging collaborator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coordination::Arbitration;
use crate::signal::ActuatorId;

/// Summary of one successful tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub timestamp: f64,
    pub humidity: f64,
    pub temperature: f64,
    pub humidifier_on: bool,
    pub ventilator_on: bool,
    pub demand_humidifier: f64,
    pub demand_ventilator: f64,
    pub predicted_humidity: f64,
    pub confidence: f64,
    pub arbitration: Arbitration,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actuator_faults: Vec<ActuatorFault>,
}

/// A failed actuator write observed since the previous record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorFault {
    pub actuator: ActuatorId,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encode(String),
}

/// Destination for tick records. Failures are reported, never fatal.
pub trait RecordSink {
    fn record(&mut self, record: &TickRecord) -> Result<(), SinkError>;
}

impl<T: RecordSink + ?Sized> RecordSink for &mut T {
    fn record(&mut self, record: &TickRecord) -> Result<(), SinkError> {
        (**self).record(record)
    }
}

impl<T: RecordSink + ?Sized> RecordSink for Box<T> {
    fn record(&mut self, record: &TickRecord) -> Result<(), SinkError> {
        (**self).record(record)
    }
}

/// Keeps every record in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub records: Vec<TickRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for MemorySink {
    fn record(&mut self, record: &TickRecord) -> Result<(), SinkError> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RecordSink for NullSink {
    fn record(&mut self, _record: &TickRecord) -> Result<(), SinkError> {
        Ok(())
    }
}
