//! Controller configuration and startup validation.
//!
//! The configuration is read once at startup and never mutated afterwards. Every
//! option has a default so a config file only needs to name what it changes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a configuration is refused at startup.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be finite (got {value})")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} = {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be at least {min} (got {value})")]
    TooSmall {
        field: &'static str,
        value: u64,
        min: u64,
    },

    #[error("{field} must be {relation} {other}")]
    Ordering {
        field: &'static str,
        relation: &'static str,
        other: &'static str,
    },
}

/// Controller configuration.
///
/// Durations are seconds, humidities are percent RH. Gains are per percent of
/// error (`kp`) and per percent-second of accumulated error (`ki`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// Humidity setpoint.
    pub target_humidity_pct: f64,
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Bound on the integral accumulator magnitude.
    pub integral_clamp: f64,
    /// Minimum time an actuator stays ON once switched ON.
    pub min_on_seconds: f64,
    /// Minimum time an actuator stays OFF once switched OFF.
    pub min_off_seconds: f64,
    /// Control period.
    pub sampling_period_seconds: f64,
    /// Number of samples kept for trend estimation.
    pub estimator_window: usize,
    /// How far ahead the estimator predicts.
    pub prediction_horizon_seconds: f64,
    /// Above this predicted humidity the ventilator wins arbitration.
    pub emergency_ventilation_ceiling_pct: f64,
    /// Demands at or below this fraction are treated as zero.
    pub hysteresis_threshold: f64,
    /// Consecutive sensor failures before every actuator is forced off.
    pub max_consecutive_failures: u32,
    /// Samples required before the estimator extrapolates.
    pub min_trend_samples: usize,
    /// Whether a ventilator is wired.
    pub ventilator_enabled: bool,
    /// Ventilation engages only above `target + deadband`.
    pub ventilator_deadband_pct: f64,
    /// Upper bound on a single sensor read.
    pub sensor_timeout_seconds: f64,
    /// Settle delay before the first read after power-up.
    pub warmup_seconds: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            target_humidity_pct: 95.0,
            kp: 0.5,
            ki: 0.002,
            integral_clamp: 200.0,
            min_on_seconds: 5.0,
            min_off_seconds: 5.0,
            sampling_period_seconds: 30.0,
            estimator_window: 6,
            prediction_horizon_seconds: 30.0,
            emergency_ventilation_ceiling_pct: 99.0,
            hysteresis_threshold: 0.02,
            max_consecutive_failures: 5,
            min_trend_samples: 3,
            ventilator_enabled: true,
            ventilator_deadband_pct: 2.0,
            sensor_timeout_seconds: 2.0,
            warmup_seconds: 10.0,
        }
    }
}

impl ControllerConfig {
    /// Setpoint used by the ventilator channel.
    pub fn ventilator_setpoint_pct(&self) -> f64 {
        self.target_humidity_pct + self.ventilator_deadband_pct
    }

    /// Check every option. Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        finite("target_humidity_pct", self.target_humidity_pct)?;
        if self.target_humidity_pct <= 0.0 || self.target_humidity_pct > 100.0 {
            return Err(ConfigError::OutOfRange {
                field: "target_humidity_pct",
                value: self.target_humidity_pct,
                min: 0.0,
                max: 100.0,
            });
        }

        non_negative("kp", self.kp)?;
        non_negative("ki", self.ki)?;
        non_negative("integral_clamp", self.integral_clamp)?;
        positive("min_on_seconds", self.min_on_seconds)?;
        non_negative("min_off_seconds", self.min_off_seconds)?;
        positive("sampling_period_seconds", self.sampling_period_seconds)?;
        non_negative("prediction_horizon_seconds", self.prediction_horizon_seconds)?;
        non_negative("ventilator_deadband_pct", self.ventilator_deadband_pct)?;
        positive("sensor_timeout_seconds", self.sensor_timeout_seconds)?;
        non_negative("warmup_seconds", self.warmup_seconds)?;

        if self.estimator_window < 2 {
            return Err(ConfigError::TooSmall {
                field: "estimator_window",
                value: self.estimator_window as u64,
                min: 2,
            });
        }
        if self.min_trend_samples < 2 {
            return Err(ConfigError::TooSmall {
                field: "min_trend_samples",
                value: self.min_trend_samples as u64,
                min: 2,
            });
        }
        if self.min_trend_samples > self.estimator_window {
            return Err(ConfigError::Ordering {
                field: "min_trend_samples",
                relation: "at most",
                other: "estimator_window",
            });
        }
        if self.max_consecutive_failures == 0 {
            return Err(ConfigError::TooSmall {
                field: "max_consecutive_failures",
                value: 0,
                min: 1,
            });
        }

        finite(
            "emergency_ventilation_ceiling_pct",
            self.emergency_ventilation_ceiling_pct,
        )?;
        if self.emergency_ventilation_ceiling_pct > 100.0 {
            return Err(ConfigError::OutOfRange {
                field: "emergency_ventilation_ceiling_pct",
                value: self.emergency_ventilation_ceiling_pct,
                min: 0.0,
                max: 100.0,
            });
        }
        if self.emergency_ventilation_ceiling_pct <= self.target_humidity_pct {
            return Err(ConfigError::Ordering {
                field: "emergency_ventilation_ceiling_pct",
                relation: "greater than",
                other: "target_humidity_pct",
            });
        }

        finite("hysteresis_threshold", self.hysteresis_threshold)?;
        if !(0.0..0.5).contains(&self.hysteresis_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "hysteresis_threshold",
                value: self.hysteresis_threshold,
                min: 0.0,
                max: 0.5,
            });
        }

        if self.sensor_timeout_seconds > self.sampling_period_seconds {
            return Err(ConfigError::Ordering {
                field: "sensor_timeout_seconds",
                relation: "at most",
                other: "sampling_period_seconds",
            });
        }

        Ok(())
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

fn positive(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if finite(field, value)? <= 0.0 {
        return Err(ConfigError::NonPositive { field, value });
    }
    Ok(value)
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if finite(field, value)? < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(value)
}
