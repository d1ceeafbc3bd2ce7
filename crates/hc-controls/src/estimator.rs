//! Humidity trajectory estimation.
//!
//! Predicts the humidity one horizon ahead assuming the actuators keep doing
//! what they have been doing. The trend is the least-squares slope of humidity
//! against time over the buffered samples; the extrapolation is scaled by a
//! confidence that grows as the buffer fills and drops when the latest interval
//! was driven very differently from the rest of the window.
//!
//! With too little history the estimator passes the latest sample through
//! unchanged with zero confidence.

use hc_core::TIME_EPS;
use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::error::{ControlError, ControlResult};
use crate::sample::{ActuatorActivity, HistoryEntry, Sample, SampleHistory};

/// Activity change (in net drive) beyond which the trend is considered stale.
const REGIME_CHANGE: f64 = 0.5;

/// Estimator output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted humidity at `now + horizon`.
    pub humidity_pct: f64,
    /// 0 for a naive passthrough, 1 for a full-window trend.
    pub confidence: f64,
    /// Fitted trend.
    pub slope_pct_per_s: f64,
}

impl Prediction {
    pub fn passthrough(humidity_pct: f64) -> Self {
        Self {
            humidity_pct,
            confidence: 0.0,
            slope_pct_per_s: 0.0,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        self.confidence == 0.0
    }
}

/// Bounded-memory trend estimator.
#[derive(Debug, Clone)]
pub struct TrajectoryEstimator {
    history: SampleHistory,
    min_samples: usize,
    horizon_s: f64,
}

impl TrajectoryEstimator {
    /// Create an estimator.
    ///
    /// # Arguments
    ///
    /// * `window` - Ring buffer capacity (at least 2)
    /// * `min_samples` - Samples required before extrapolating (2..=window)
    /// * `horizon_s` - Prediction horizon in seconds (non-negative)
    pub fn new(window: usize, min_samples: usize, horizon_s: f64) -> ControlResult<Self> {
        if window < 2 {
            return Err(ControlError::InvalidArg {
                what: "estimator window must hold at least 2 samples",
            });
        }
        if min_samples < 2 || min_samples > window {
            return Err(ControlError::InvalidArg {
                what: "min_samples must be within 2..=window",
            });
        }
        if !horizon_s.is_finite() || horizon_s < 0.0 {
            return Err(ControlError::InvalidArg {
                what: "horizon must be non-negative",
            });
        }
        Ok(Self {
            history: SampleHistory::new(window),
            min_samples,
            horizon_s,
        })
    }

    pub fn from_config(config: &ControllerConfig) -> ControlResult<Self> {
        Self::new(
            config.estimator_window,
            config.min_trend_samples,
            config.prediction_horizon_seconds,
        )
    }

    /// Record a sample and return the prediction that includes it.
    pub fn observe(&mut self, sample: Sample, activity: ActuatorActivity) -> Prediction {
        self.history.push(sample, activity);
        self.predict().unwrap_or_else(|| Prediction::passthrough(sample.humidity_pct))
    }

    /// Predict from the current history. `None` only when no sample was seen.
    pub fn predict(&self) -> Option<Prediction> {
        let latest = self.history.latest()?;
        let n = self.history.len();
        if n < self.min_samples {
            return Some(Prediction::passthrough(latest.sample.humidity_pct));
        }

        let slope = trend_slope(self.history.iter());
        let fill = (n - 1) as f64 / (self.history.capacity() - 1) as f64;
        let mut confidence = fill.min(1.0);

        let mean_drive =
            self.history.iter().map(|e| e.activity.net()).sum::<f64>() / n as f64;
        if (latest.activity.net() - mean_drive).abs() > REGIME_CHANGE {
            confidence *= 0.5;
        }

        let humidity_pct = (latest.sample.humidity_pct + confidence * slope * self.horizon_s)
            .clamp(0.0, 100.0);

        Some(Prediction {
            humidity_pct,
            confidence,
            slope_pct_per_s: slope,
        })
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.history.latest().map(|e| &e.sample)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn horizon_s(&self) -> f64 {
        self.horizon_s
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

/// Least-squares slope of humidity over time. Zero when all stamps coincide.
fn trend_slope<'a>(entries: impl Iterator<Item = &'a HistoryEntry> + Clone) -> f64 {
    let (n, sum_t, sum_h) = entries.clone().fold((0.0, 0.0, 0.0), |(n, st, sh), e| {
        (n + 1.0, st + e.sample.timestamp, sh + e.sample.humidity_pct)
    });
    if n < 2.0 {
        return 0.0;
    }
    let mean_t = sum_t / n;
    let mean_h = sum_h / n;

    let (sxx, sxy) = entries.fold((0.0, 0.0), |(sxx, sxy), e| {
        let dt = e.sample.timestamp - mean_t;
        (sxx + dt * dt, sxy + dt * (e.sample.humidity_pct - mean_h))
    });
    if sxx <= TIME_EPS {
        0.0
    } else {
        sxy / sxx
    }
}
