//! Arbitration between humidifier and ventilator.
//!
//! The two actuators work against each other, so at most one of them may carry
//! a non-zero demand after arbitration. The humidifier normally wins; the
//! ventilator wins only when the predicted humidity is above the emergency
//! ceiling.

use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::signal::{ActuatorId, ControlSignal};

/// Which rule, if any, suppressed a demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arbitration {
    /// No conflict.
    #[default]
    None,
    /// Both asked, the ventilator was zeroed.
    HumidifierPriority,
    /// Both asked above the ceiling, the humidifier was zeroed.
    EmergencyVentilation,
}

/// Arbitrated demands for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub humidifier: ControlSignal,
    pub ventilator: ControlSignal,
    pub arbitration: Arbitration,
}

impl Resolution {
    pub fn signal(&self, actuator: ActuatorId) -> ControlSignal {
        match actuator {
            ActuatorId::Humidifier => self.humidifier,
            ActuatorId::Ventilator => self.ventilator,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinationPolicy {
    pub emergency_ceiling_pct: f64,
    pub ventilator_enabled: bool,
}

impl CoordinationPolicy {
    pub fn new(emergency_ceiling_pct: f64, ventilator_enabled: bool) -> Self {
        Self {
            emergency_ceiling_pct,
            ventilator_enabled,
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(
            config.emergency_ventilation_ceiling_pct,
            config.ventilator_enabled,
        )
    }

    /// Resolve conflicting demands against the predicted humidity.
    pub fn resolve(
        &self,
        humidifier: f64,
        ventilator: f64,
        predicted_humidity_pct: f64,
    ) -> Resolution {
        let humidifier = ControlSignal::new(ActuatorId::Humidifier, humidifier);
        let ventilator = if self.ventilator_enabled {
            ControlSignal::new(ActuatorId::Ventilator, ventilator)
        } else {
            ControlSignal::idle(ActuatorId::Ventilator)
        };

        if !(humidifier.is_active() && ventilator.is_active()) {
            return Resolution {
                humidifier,
                ventilator,
                arbitration: Arbitration::None,
            };
        }

        if predicted_humidity_pct > self.emergency_ceiling_pct {
            Resolution {
                humidifier: ControlSignal::idle(ActuatorId::Humidifier),
                ventilator,
                arbitration: Arbitration::EmergencyVentilation,
            }
        } else {
            Resolution {
                humidifier,
                ventilator: ControlSignal::idle(ActuatorId::Ventilator),
                arbitration: Arbitration::HumidifierPriority,
            }
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn never_both_active(
            h in -1.0_f64..2.0,
            v in -1.0_f64..2.0,
            predicted in 0.0_f64..100.0,
        ) {
            let r = policy().resolve(h, v, predicted);
            prop_assert!(!(r.humidifier.is_active() && r.ventilator.is_active()));
            prop_assert!((0.0..=1.0).contains(&r.humidifier.demand));
            prop_assert!((0.0..=1.0).contains(&r.ventilator.demand));
        }
    }

    fn policy() -> CoordinationPolicy {
        CoordinationPolicy::new(99.0, true)
    }
}
