//! Sampling cadence for the control loop.
//!
//! The loop ticks once per period. [`SampleClock`] tracks the next deadline on
//! the loop's own time base; the runner asks it how long to sleep and advances
//! it after each tick. Late ticks do not accumulate: a runner that falls more
//! than a period behind skips ahead instead of bursting.

use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::error::{ControlError, ControlResult};

/// Sampling period of the control task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Sample period in seconds.
    pub dt: f64,
}

impl SampleConfig {
    /// Create a sample configuration.
    ///
    /// # Arguments
    ///
    /// * `dt` - Sample period in seconds (must be positive)
    pub fn new(dt: f64) -> ControlResult<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "sample period must be positive",
            });
        }
        Ok(Self { dt })
    }

    pub fn from_config(config: &ControllerConfig) -> ControlResult<Self> {
        Self::new(config.sampling_period_seconds)
    }

    /// Sample frequency in Hz.
    pub fn frequency(&self) -> f64 {
        1.0 / self.dt
    }
}

/// Tracks when the next tick is due.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleClock {
    pub config: SampleConfig,
    /// Time of the next scheduled tick.
    pub next_sample_time: f64,
}

impl SampleClock {
    /// Clock whose first tick is due immediately at `initial_time`.
    pub fn new(config: SampleConfig, initial_time: f64) -> Self {
        Self {
            config,
            next_sample_time: initial_time,
        }
    }

    pub fn should_sample(&self, current_time: f64) -> bool {
        current_time >= self.next_sample_time
    }

    /// Move the deadline one period forward, skipping periods already missed
    /// at `current_time`.
    pub fn advance(&mut self, current_time: f64) {
        self.next_sample_time += self.config.dt;
        if self.next_sample_time <= current_time {
            let missed = ((current_time - self.next_sample_time) / self.config.dt).floor() + 1.0;
            self.next_sample_time += missed * self.config.dt;
        }
    }

    pub fn reset(&mut self, current_time: f64) {
        self.next_sample_time = current_time + self.config.dt;
    }

    pub fn time_until_sample(&self, current_time: f64) -> f64 {
        (self.next_sample_time - current_time).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_creation() {
        let config = SampleConfig::new(0.5).unwrap();
        assert_eq!(config.dt, 0.5);
        assert!((config.frequency() - 2.0).abs() < 1e-10);
        assert!(SampleConfig::new(0.0).is_err());
        assert!(SampleConfig::new(f64::NAN).is_err());
    }

    #[test]
    fn first_tick_is_immediate() {
        let clock = SampleClock::new(SampleConfig::new(30.0).unwrap(), 10.0);
        assert!(clock.should_sample(10.0));
        assert_eq!(clock.time_until_sample(10.0), 0.0);
    }

    #[test]
    fn advance_keeps_cadence() {
        let mut clock = SampleClock::new(SampleConfig::new(1.0).unwrap(), 0.0);
        clock.advance(0.2);
        assert!(!clock.should_sample(0.9));
        assert!(clock.should_sample(1.0));
        assert!((clock.time_until_sample(0.25) - 0.75).abs() < 1e-10);
    }

    #[test]
    fn overrun_skips_missed_ticks() {
        let mut clock = SampleClock::new(SampleConfig::new(1.0).unwrap(), 0.0);
        clock.advance(3.5);
        assert_eq!(clock.next_sample_time, 4.0);
        clock.advance(4.0);
        assert_eq!(clock.next_sample_time, 5.0);
    }

    #[test]
    fn reset_restarts_from_now() {
        let mut clock = SampleClock::new(SampleConfig::new(2.0).unwrap(), 0.0);
        clock.reset(7.0);
        assert_eq!(clock.next_sample_time, 9.0);
    }
}
