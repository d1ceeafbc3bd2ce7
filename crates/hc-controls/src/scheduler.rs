//! Time-proportioning scheduler for one binary actuator.
//!
//! Each successful control tick opens a pulse window `[start, start + period)`
//! with a demand in `[0, 1]`. Within the window the actuator is held ON for
//! roughly `demand * period` and then switched OFF, subject to the minimum ON
//! and minimum OFF dwell times. Edges that fall inside a window are delivered by
//! [`DutyCycleScheduler::poll`], which the runner calls at
//! [`DutyCycleScheduler::next_transition`].
//!
//! Dwell rules:
//! - an actuator switched ON is not switched OFF before `min_on` elapses
//! - an actuator switched OFF is not switched ON before `min_off` elapses
//! - [`DutyCycleScheduler::force_off`] is the only path that ignores `min_on`

use hc_core::{TIME_EPS, clamp_unit};
use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::error::{ControlError, ControlResult};
use crate::signal::ActuatorId;

/// Believed state of one physical output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorState {
    pub actuator: ActuatorId,
    pub is_on: bool,
    /// Time of the last switch. `None` until the first edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<f64>,
}

impl ActuatorState {
    pub fn off(actuator: ActuatorId) -> Self {
        Self {
            actuator,
            is_on: false,
            since: None,
        }
    }

    /// Seconds spent in the current state. Infinite before the first edge.
    pub fn time_in_state(&self, now: f64) -> f64 {
        self.since.map_or(f64::INFINITY, |since| now - since)
    }
}

/// An edge to write to the actuator port.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    pub actuator: ActuatorId,
    pub on: bool,
    pub at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Transition {
    at: f64,
    on: bool,
}

/// Converts a continuous demand into ON/OFF edges for a single actuator.
#[derive(Debug, Clone)]
pub struct DutyCycleScheduler {
    state: ActuatorState,
    period: f64,
    min_on: f64,
    min_off: f64,
    threshold: f64,
    window_start: f64,
    demand: f64,
    pulse_delivered: bool,
    pending: Option<Transition>,
    on_accumulated: f64,
}

impl DutyCycleScheduler {
    /// Create a scheduler for an actuator that starts OFF.
    ///
    /// # Arguments
    ///
    /// * `period` - Pulse window length in seconds (positive)
    /// * `min_on` - Minimum ON dwell in seconds (positive)
    /// * `min_off` - Minimum OFF dwell in seconds (non-negative)
    /// * `threshold` - Demands at or below this are treated as zero; demands at
    ///   or above `1 - threshold` hold the actuator ON continuously
    pub fn new(
        actuator: ActuatorId,
        period: f64,
        min_on: f64,
        min_off: f64,
        threshold: f64,
    ) -> ControlResult<Self> {
        if !period.is_finite() || period <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "period must be positive",
            });
        }
        if !min_on.is_finite() || min_on <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "min_on must be positive",
            });
        }
        if !min_off.is_finite() || min_off < 0.0 {
            return Err(ControlError::InvalidArg {
                what: "min_off must be non-negative",
            });
        }
        if !(0.0..0.5).contains(&threshold) {
            return Err(ControlError::InvalidArg {
                what: "threshold must be within [0, 0.5)",
            });
        }
        Ok(Self {
            state: ActuatorState::off(actuator),
            period,
            min_on,
            min_off,
            threshold,
            window_start: 0.0,
            demand: 0.0,
            pulse_delivered: false,
            pending: None,
            on_accumulated: 0.0,
        })
    }

    pub fn from_config(actuator: ActuatorId, config: &ControllerConfig) -> ControlResult<Self> {
        Self::new(
            actuator,
            config.sampling_period_seconds,
            config.min_on_seconds,
            config.min_off_seconds,
            config.hysteresis_threshold,
        )
    }

    pub fn actuator(&self) -> ActuatorId {
        self.state.actuator
    }

    pub fn state(&self) -> &ActuatorState {
        &self.state
    }

    pub fn is_on(&self) -> bool {
        self.state.is_on
    }

    /// Demand of the current window.
    pub fn demand(&self) -> f64 {
        self.demand
    }

    /// When the next planned edge is due, if any.
    pub fn next_transition(&self) -> Option<f64> {
        self.pending.map(|t| t.at)
    }

    /// Total seconds spent ON up to `now`.
    pub fn on_time_until(&self, now: f64) -> f64 {
        match (self.state.is_on, self.state.since) {
            (true, Some(since)) => self.on_accumulated + (now - since).max(0.0),
            _ => self.on_accumulated,
        }
    }

    /// Open a new pulse window at `now` and apply any edge due immediately.
    pub fn begin_period(&mut self, now: f64, demand: f64) -> Option<ActuatorCommand> {
        self.window_start = now;
        self.demand = clamp_unit(demand);
        self.pulse_delivered = false;
        self.pending = self.plan(now);
        self.poll(now)
    }

    /// Apply the planned edge if it is due.
    pub fn poll(&mut self, now: f64) -> Option<ActuatorCommand> {
        let due = self.pending.filter(|t| now >= t.at - TIME_EPS)?;
        let command = self.switch(now, due.on);
        self.pending = self.plan(now);
        Some(command)
    }

    /// Keep the current output without fresh data: pending ON edges are
    /// dropped, pending OFF edges still run.
    pub fn hold(&mut self, now: f64) -> Option<ActuatorCommand> {
        if self.pending.is_some_and(|t| t.on) {
            self.pending = None;
        }
        self.poll(now)
    }

    /// Safety shutdown. Switches OFF immediately, ignoring `min_on`.
    pub fn force_off(&mut self, now: f64) -> Option<ActuatorCommand> {
        self.pending = None;
        self.demand = 0.0;
        if self.state.is_on {
            Some(self.switch(now, false))
        } else {
            None
        }
    }

    fn switch(&mut self, now: f64, on: bool) -> ActuatorCommand {
        if !on {
            if let Some(since) = self.state.since {
                self.on_accumulated += (now - since).max(0.0);
            }
            self.pulse_delivered = true;
        }
        self.state.is_on = on;
        self.state.since = Some(now);
        ActuatorCommand {
            actuator: self.state.actuator,
            on,
            at: now,
        }
    }

    fn plan(&self, now: f64) -> Option<Transition> {
        if self.state.is_on {
            if self.demand >= 1.0 - self.threshold {
                return None;
            }
            let since = self.state.since.unwrap_or(now);
            let target = if self.demand <= self.threshold {
                now
            } else {
                self.window_start.max(since) + self.demand * self.period
            };
            Some(Transition {
                at: target.max(since + self.min_on),
                on: false,
            })
        } else {
            if self.demand <= self.threshold || self.pulse_delivered {
                return None;
            }
            let at = self
                .state
                .since
                .map_or(now, |since| now.max(since + self.min_off));
            if at >= self.window_start + self.period {
                return None;
            }
            Some(Transition { at, on: true })
        }
    }
}
