//! PI controller producing actuator demand.
//!
//! The controller is split into an immutable configuration ([`PIController`])
//! and a small state ([`PIControllerState`]) owned by the caller, one per
//! actuator. Every update returns the next state alongside the output.
//!
//! Includes:
//! - Output clamping to `[out_min, out_max]` (`[0, 1]` for demand)
//! - Integral clamping to `[-integral_limit, integral_limit]`
//! - Clamp-and-freeze anti-windup
//! - Direct or reverse action

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Which way the error drives the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    /// Output rises when the process variable is below setpoint (humidifier).
    Direct,
    /// Output rises when the process variable is above setpoint (ventilator).
    Reverse,
}

impl ControlAction {
    pub fn error(&self, pv: f64, sp: f64) -> f64 {
        match self {
            Self::Direct => sp - pv,
            Self::Reverse => pv - sp,
        }
    }
}

/// PI controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PIController {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Integral windup limit.
    pub integral_limit: f64,
    /// Minimum output value.
    pub out_min: f64,
    /// Maximum output value.
    pub out_max: f64,
    /// Error sign convention.
    pub action: ControlAction,
}

impl PIController {
    /// Create a PI controller with demand output bounds `[0, 1]`.
    ///
    /// # Arguments
    ///
    /// * `kp` - Proportional gain (non-negative)
    /// * `ki` - Integral gain (non-negative)
    /// * `integral_limit` - Bound on the accumulator magnitude (non-negative)
    /// * `action` - Direct or reverse acting
    pub fn new(kp: f64, ki: f64, integral_limit: f64, action: ControlAction) -> ControlResult<Self> {
        if !kp.is_finite() || kp < 0.0 {
            return Err(ControlError::InvalidArg {
                what: "kp must be non-negative",
            });
        }
        if !ki.is_finite() || ki < 0.0 {
            return Err(ControlError::InvalidArg {
                what: "ki must be non-negative",
            });
        }
        if !integral_limit.is_finite() || integral_limit < 0.0 {
            return Err(ControlError::InvalidArg {
                what: "integral_limit must be non-negative",
            });
        }
        Ok(Self {
            kp,
            ki,
            integral_limit,
            out_min: 0.0,
            out_max: 1.0,
            action,
        })
    }

    /// Override output limits.
    pub fn with_output_limits(mut self, out_min: f64, out_max: f64) -> ControlResult<Self> {
        if out_min.is_nan() || out_max.is_nan() || out_min >= out_max {
            return Err(ControlError::InvalidArg {
                what: "out_min must be less than out_max",
            });
        }
        self.out_min = out_min;
        self.out_max = out_max;
        Ok(self)
    }

    /// Compute controller output given process variable and setpoint.
    ///
    /// # Arguments
    ///
    /// * `state` - Controller state (contains integral)
    /// * `pv` - Process variable (predicted humidity)
    /// * `sp` - Setpoint
    /// * `dt` - Time since last update (seconds)
    ///
    /// # Returns
    ///
    /// Updated state and output value. A non-finite `pv` or a non-positive
    /// `dt` leaves the state untouched and returns `out_min`.
    pub fn update(
        &self,
        state: &PIControllerState,
        pv: f64,
        sp: f64,
        dt: f64,
    ) -> (PIControllerState, f64) {
        if !pv.is_finite() || !sp.is_finite() || dt.is_nan() || dt <= 0.0 {
            return (state.clone(), self.out_min);
        }

        let error = self.action.error(pv, sp);
        let limit = self.integral_limit;

        let tentative = (state.integral + error * dt).clamp(-limit, limit);
        let output_raw = self.kp * error + self.ki * tentative;
        let output = output_raw.clamp(self.out_min, self.out_max);

        // Freeze only while saturated and the error pushes further past the bound
        let winding_up = (output_raw > self.out_max && error > 0.0)
            || (output_raw < self.out_min && error < 0.0);
        let integral = if winding_up {
            state.integral.clamp(-limit, limit)
        } else {
            tentative
        };

        (PIControllerState { integral }, output)
    }
}

/// PI controller state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PIControllerState {
    /// Integral accumulator.
    pub integral: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn humidifier() -> PIController {
        PIController::new(0.5, 0.05, 20.0, ControlAction::Direct).unwrap()
    }

    #[test]
    fn proportional_only() {
        let pi = PIController::new(0.1, 0.0, 10.0, ControlAction::Direct).unwrap();
        let (_, output) = pi.update(&PIControllerState::default(), 90.0, 95.0, 1.0);
        assert!((output - 0.5).abs() < 1e-12);
    }

    #[test]
    fn reverse_action_inverts_error() {
        let pi = PIController::new(0.1, 0.0, 10.0, ControlAction::Reverse).unwrap();
        let (_, too_dry) = pi.update(&PIControllerState::default(), 90.0, 95.0, 1.0);
        let (_, too_humid) = pi.update(&PIControllerState::default(), 99.0, 95.0, 1.0);
        assert_eq!(too_dry, 0.0);
        assert!((too_humid - 0.4).abs() < 1e-12);
    }

    #[test]
    fn integral_action_accumulates() {
        let pi = humidifier();
        let mut state = PIControllerState::default();
        for _ in 0..10 {
            let (next, _) = pi.update(&state, 94.9, 95.0, 1.0);
            state = next;
        }
        assert!((state.integral - 1.0).abs() < 1e-9);
    }

    #[test]
    fn integral_is_clamped() {
        let pi = PIController::new(0.0, 0.01, 5.0, ControlAction::Direct).unwrap();
        let mut state = PIControllerState::default();
        for _ in 0..100 {
            let (next, output) = pi.update(&state, 94.0, 95.0, 1.0);
            assert!(output <= 1.0);
            state = next;
        }
        assert_eq!(state.integral, 5.0);
    }

    #[test]
    fn saturation_freezes_integral() {
        let pi = humidifier();
        let state = PIControllerState { integral: 3.0 };
        // Error 10% -> P alone is 5.0, saturated high with positive error
        let (next, output) = pi.update(&state, 85.0, 95.0, 1.0);
        assert_eq!(output, 1.0);
        assert_eq!(next.integral, 3.0);
    }

    #[test]
    fn saturated_low_freezes_negative_accumulation() {
        let pi = humidifier();
        let state = PIControllerState { integral: 1.0 };
        let (next, output) = pi.update(&state, 99.0, 95.0, 1.0);
        assert_eq!(output, 0.0);
        assert_eq!(next.integral, 1.0);
    }

    #[test]
    fn desaturates_immediately_on_reversal() {
        let pi = humidifier();
        let mut state = PIControllerState::default();
        for _ in 0..50 {
            state = pi.update(&state, 80.0, 95.0, 1.0).0;
        }
        // Overshoot by 1%: output must drop to zero on the first tick
        let (_, output) = pi.update(&state, 96.0, 95.0, 1.0);
        assert_eq!(output, 0.0);
    }

    #[test]
    fn bad_inputs_hold_state() {
        let pi = humidifier();
        let state = PIControllerState { integral: 2.0 };
        let (next, output) = pi.update(&state, f64::NAN, 95.0, 1.0);
        assert_eq!(next, state);
        assert_eq!(output, 0.0);
        let (next, _) = pi.update(&state, 90.0, 95.0, 0.0);
        assert_eq!(next, state);
    }

    #[test]
    fn invalid_controller_params() {
        assert!(PIController::new(-1.0, 0.1, 1.0, ControlAction::Direct).is_err());
        assert!(PIController::new(1.0, -0.1, 1.0, ControlAction::Direct).is_err());
        assert!(PIController::new(1.0, 0.1, -1.0, ControlAction::Direct).is_err());
        assert!(
            humidifier().with_output_limits(1.0, 0.0).is_err(),
            "inverted limits must be rejected"
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn demand_and_integral_stay_bounded(
            kp in 0.0_f64..5.0,
            ki in 0.0_f64..1.0,
            limit in 0.0_f64..50.0,
            readings in prop::collection::vec(0.0_f64..100.0, 1..60),
        ) {
            let pi = PIController::new(kp, ki, limit, ControlAction::Direct).unwrap();
            let mut state = PIControllerState::default();
            for pv in readings {
                let (next, output) = pi.update(&state, pv, 95.0, 1.0);
                prop_assert!((0.0..=1.0).contains(&output));
                prop_assert!(next.integral.abs() <= limit + 1e-12);
                state = next;
            }
        }

        #[test]
        fn constant_dry_error_converges_below_one(pv in 50.0_f64..94.0) {
            let pi = PIController::new(0.5, 0.05, 20.0, ControlAction::Direct).unwrap();
            let mut state = PIControllerState::default();
            let mut outputs = Vec::new();
            for _ in 0..200 {
                let (next, output) = pi.update(&state, pv, 95.0, 1.0);
                outputs.push(output);
                state = next;
            }
            let tail = &outputs[outputs.len() - 10..];
            prop_assert!(tail.iter().all(|o| *o > 0.0 && *o <= 1.0));
            prop_assert!(tail.windows(2).all(|w| (w[0] - w[1]).abs() < 1e-12));
        }

        #[test]
        fn saturated_integral_never_grows(
            start in 0.0_f64..10.0,
            errors in prop::collection::vec(5.0_f64..40.0, 1..30),
        ) {
            let pi = PIController::new(0.5, 0.05, 20.0, ControlAction::Direct).unwrap();
            let mut state = PIControllerState { integral: start };
            for e in errors {
                let (next, output) = pi.update(&state, 95.0 - e, 95.0, 1.0);
                prop_assert_eq!(output, 1.0);
                prop_assert!(next.integral <= state.integral);
                state = next;
            }
        }
    }
}
