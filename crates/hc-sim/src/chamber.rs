//! Lumped humidity chamber.
//!
//! Humidity changes at a constant rate that depends only on which relays are
//! closed: the humidifier adds moisture, the ventilator removes it and the
//! enclosure leaks at a constant drift. Humidity is bounded to `[0, 100]`.

use hc_controls::Reading;
use hc_core::units::{Ratio, Temperature, Time, as_seconds, degc, percent};
use hc_core::ensure_in_range;

use crate::error::{SimError, SimResult};

/// Chamber rates in percent RH per second.
#[derive(Clone, Debug, PartialEq)]
pub struct ChamberParams {
    /// Rise while the humidifier is ON.
    pub humidify_rate: f64,
    /// Fall while the ventilator is ON.
    pub ventilate_rate: f64,
    /// Signed drift with both relays open (negative dries).
    pub drift_rate: f64,
    /// Constant air temperature reported by the sensor.
    pub temperature_c: f64,
}

impl Default for ChamberParams {
    fn default() -> Self {
        Self {
            humidify_rate: 2.0,
            ventilate_rate: 1.0,
            drift_rate: -0.1,
            temperature_c: 21.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Chamber {
    params: ChamberParams,
    humidity_pct: f64,
}

impl Chamber {
    pub fn new(params: ChamberParams, initial_humidity_pct: f64) -> SimResult<Self> {
        if !params.humidify_rate.is_finite() || params.humidify_rate < 0.0 {
            return Err(SimError::InvalidArg {
                what: "humidify_rate must be non-negative",
            });
        }
        if !params.ventilate_rate.is_finite() || params.ventilate_rate < 0.0 {
            return Err(SimError::InvalidArg {
                what: "ventilate_rate must be non-negative",
            });
        }
        if !params.drift_rate.is_finite() {
            return Err(SimError::InvalidArg {
                what: "drift_rate must be finite",
            });
        }
        ensure_in_range(params.temperature_c, -40.0, 125.0, "chamber temperature")?;
        let humidity_pct = ensure_in_range(initial_humidity_pct, 0.0, 100.0, "initial humidity")?;
        Ok(Self {
            params,
            humidity_pct,
        })
    }

    pub fn params(&self) -> &ChamberParams {
        &self.params
    }

    pub fn humidity_pct(&self) -> f64 {
        self.humidity_pct
    }

    pub fn humidity(&self) -> Ratio {
        percent(self.humidity_pct)
    }

    pub fn temperature(&self) -> Temperature {
        degc(self.params.temperature_c)
    }

    /// What an ideal sensor would report right now.
    pub fn reading(&self) -> Reading {
        Reading::new(self.humidity_pct, self.params.temperature_c)
    }

    /// Net rate of change for a relay combination.
    pub fn rate(&self, humidifier_on: bool, ventilator_on: bool) -> f64 {
        let mut rate = self.params.drift_rate;
        if humidifier_on {
            rate += self.params.humidify_rate;
        }
        if ventilator_on {
            rate -= self.params.ventilate_rate;
        }
        rate
    }

    /// Hold the relay states for `dt` and integrate.
    pub fn advance(&mut self, dt: Time, humidifier_on: bool, ventilator_on: bool) {
        let dt_s = as_seconds(dt);
        if dt_s <= 0.0 {
            return;
        }
        self.humidity_pct = (self.humidity_pct + self.rate(humidifier_on, ventilator_on) * dt_s)
            .clamp(0.0, 100.0);
    }
}
