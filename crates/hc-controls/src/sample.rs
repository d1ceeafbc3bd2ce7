//! Sensor samples and the bounded history the estimator fits trends over.

use std::collections::VecDeque;

use hc_core::units::{Ratio, Temperature, degc, percent};
use hc_core::{HcError, ensure_finite, ensure_in_range};
use serde::{Deserialize, Serialize};

use crate::ports::Reading;

/// One timestamped humidity/temperature measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds on the loop's monotonic time base.
    pub timestamp: f64,
    pub humidity_pct: f64,
    pub temperature_c: f64,
}

impl Sample {
    pub fn new(timestamp: f64, humidity_pct: f64, temperature_c: f64) -> Self {
        Self {
            timestamp,
            humidity_pct,
            temperature_c,
        }
    }

    /// Stamp a raw reading after checking it is physically plausible.
    pub fn from_reading(timestamp: f64, reading: Reading) -> Result<Self, HcError> {
        ensure_finite(timestamp, "sample timestamp")?;
        let humidity_pct = ensure_in_range(reading.humidity_pct, 0.0, 100.0, "relative humidity")?;
        let temperature_c = ensure_in_range(reading.temperature_c, -40.0, 125.0, "temperature")?;
        Ok(Self::new(timestamp, humidity_pct, temperature_c))
    }

    pub fn humidity(&self) -> Ratio {
        percent(self.humidity_pct)
    }

    pub fn temperature(&self) -> Temperature {
        degc(self.temperature_c)
    }
}

/// Fraction of an interval each actuator spent ON.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActuatorActivity {
    pub humidifier: f64,
    pub ventilator: f64,
}

impl ActuatorActivity {
    pub fn new(humidifier: f64, ventilator: f64) -> Self {
        Self {
            humidifier: hc_core::clamp_unit(humidifier),
            ventilator: hc_core::clamp_unit(ventilator),
        }
    }

    /// Signed drive on the chamber: positive humidifies, negative vents.
    pub fn net(&self) -> f64 {
        self.humidifier - self.ventilator
    }
}

/// Sample paired with the actuator activity of the interval that led to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    pub sample: Sample,
    pub activity: ActuatorActivity,
}

/// Fixed-capacity FIFO of recent samples. The oldest entry is evicted first.
#[derive(Debug, Clone)]
pub struct SampleHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl SampleHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: Sample, activity: ActuatorActivity) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry { sample, activity });
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> + Clone {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: f64, h: f64) -> Sample {
        Sample::new(t, h, 20.0)
    }

    #[test]
    fn history_evicts_oldest() {
        let mut history = SampleHistory::new(3);
        for i in 0..5 {
            history.push(sample(i as f64, 50.0 + i as f64), ActuatorActivity::default());
        }
        assert_eq!(history.len(), 3);
        let stamps: Vec<f64> = history.iter().map(|e| e.sample.timestamp).collect();
        assert_eq!(stamps, vec![2.0, 3.0, 4.0]);
        assert_eq!(history.latest().unwrap().sample.humidity_pct, 54.0);
    }

    #[test]
    fn from_reading_rejects_implausible_values() {
        assert!(Sample::from_reading(0.0, Reading::new(101.0, 20.0)).is_err());
        assert!(Sample::from_reading(0.0, Reading::new(f64::NAN, 20.0)).is_err());
        assert!(Sample::from_reading(0.0, Reading::new(50.0, 300.0)).is_err());
        let ok = Sample::from_reading(3.0, Reading::new(88.5, 21.0)).unwrap();
        assert_eq!(ok.timestamp, 3.0);
        assert_eq!(ok.humidity_pct, 88.5);
    }

    #[test]
    fn typed_accessors() {
        let s = sample(0.0, 40.0);
        assert!((hc_core::as_percent(s.humidity()) - 40.0).abs() < 1e-9);
        assert!((hc_core::as_degc(s.temperature()) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn activity_net_drive() {
        let a = ActuatorActivity::new(0.75, 0.25);
        assert_eq!(a.net(), 0.5);
        assert_eq!(ActuatorActivity::new(2.0, -1.0).net(), 1.0);
    }
}
