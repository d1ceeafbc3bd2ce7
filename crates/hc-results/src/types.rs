//! Result data types.

use chrono::{SecondsFormat, Utc};
use hc_controls::TickRecord;
use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    /// Name of the config the run was started from.
    pub config_name: String,
    /// RFC 3339 creation time.
    pub timestamp: String,
    pub mode: RunMode,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
}

impl RunManifest {
    /// Manifest stamped with the current UTC time.
    pub fn new(run_id: RunId, config_name: impl Into<String>, mode: RunMode, version: impl Into<String>) -> Self {
        Self {
            run_id,
            config_name: config_name.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            mode,
            version: version.into(),
            summary: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RunMode {
    Simulation {
        ticks: usize,
        initial_humidity_pct: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sensor_fault: Option<FaultWindow>,
    },
    Realtime,
}

/// Ticks on which sensor reads were made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaultWindow {
    pub from_tick: usize,
    pub count: usize,
}

/// Aggregate figures written into the manifest when a run ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: usize,
    pub controlled_ticks: usize,
    pub sensor_faults: usize,
    pub actuator_faults: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_humidity_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_abs_error_pct: Option<f64>,
}

impl RunSummary {
    /// Summarise the controlled records of a run that spanned `ticks` ticks.
    pub fn from_records(records: &[TickRecord], ticks: usize, target_pct: f64) -> Self {
        let controlled_ticks = records.len();
        let mean_abs_error_pct = (controlled_ticks > 0).then(|| {
            records
                .iter()
                .map(|r| (r.humidity - target_pct).abs())
                .sum::<f64>()
                / controlled_ticks as f64
        });
        Self {
            ticks,
            controlled_ticks,
            sensor_faults: ticks.saturating_sub(controlled_ticks),
            actuator_faults: records.iter().map(|r| r.actuator_faults.len()).sum(),
            final_humidity_pct: records.last().map(|r| r.humidity),
            mean_abs_error_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hc_controls::Arbitration;

    fn record(humidity: f64) -> TickRecord {
        TickRecord {
            timestamp: 0.0,
            humidity,
            temperature: 20.0,
            humidifier_on: false,
            ventilator_on: false,
            demand_humidifier: 0.0,
            demand_ventilator: 0.0,
            predicted_humidity: humidity,
            confidence: 0.0,
            arbitration: Arbitration::None,
            actuator_faults: Vec::new(),
        }
    }

    #[test]
    fn summary_counts_missing_ticks_as_sensor_faults() {
        let summary = RunSummary::from_records(&[record(94.0), record(96.0)], 5, 95.0);
        assert_eq!(summary.controlled_ticks, 2);
        assert_eq!(summary.sensor_faults, 3);
        assert_eq!(summary.final_humidity_pct, Some(96.0));
        assert_eq!(summary.mean_abs_error_pct, Some(1.0));
    }

    #[test]
    fn empty_run_has_no_error_figure() {
        let summary = RunSummary::from_records(&[], 0, 95.0);
        assert_eq!(summary.mean_abs_error_pct, None);
        assert_eq!(summary.final_humidity_pct, None);
    }

    #[test]
    fn manifest_timestamp_is_rfc3339() {
        let manifest = RunManifest::new("abc".to_string(), "chamber", RunMode::Realtime, "0.1.0");
        assert!(chrono::DateTime::parse_from_rfc3339(&manifest.timestamp).is_ok());
    }
}
