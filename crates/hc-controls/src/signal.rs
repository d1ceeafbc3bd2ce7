//! Actuator names and per-tick control signals.

use std::fmt;

use hc_core::clamp_unit;
use serde::{Deserialize, Serialize};

/// Name of a physical binary output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorId {
    Humidifier,
    Ventilator,
}

impl ActuatorId {
    pub const ALL: [ActuatorId; 2] = [ActuatorId::Humidifier, ActuatorId::Ventilator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Humidifier => "humidifier",
            Self::Ventilator => "ventilator",
        }
    }
}

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Demand for one actuator, produced fresh each tick.
///
/// `demand` is the fraction of the coming period the actuator should be ON and
/// is always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlSignal {
    pub actuator: ActuatorId,
    pub demand: f64,
}

impl ControlSignal {
    /// Create a signal, clamping `demand` into `[0, 1]`.
    pub fn new(actuator: ActuatorId, demand: f64) -> Self {
        Self {
            actuator,
            demand: clamp_unit(demand),
        }
    }

    /// Signal with zero demand.
    pub fn idle(actuator: ActuatorId) -> Self {
        Self {
            actuator,
            demand: 0.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.demand > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demand_is_clamped() {
        assert_eq!(ControlSignal::new(ActuatorId::Humidifier, 1.7).demand, 1.0);
        assert_eq!(ControlSignal::new(ActuatorId::Humidifier, -0.2).demand, 0.0);
        assert_eq!(ControlSignal::new(ActuatorId::Humidifier, f64::NAN).demand, 0.0);
    }

    #[test]
    fn actuator_names() {
        assert_eq!(ActuatorId::Humidifier.to_string(), "humidifier");
        assert_eq!(ActuatorId::Ventilator.as_str(), "ventilator");
    }
}
