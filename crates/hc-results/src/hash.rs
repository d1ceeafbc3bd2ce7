//! Content-based hashing for run IDs.

use hc_controls::ControllerConfig;
use sha2::{Digest, Sha256};

use crate::types::RunMode;

/// Hex SHA-256 over the config, the run mode and the controller version.
/// Identical inputs map to the same run.
pub fn compute_run_id(config: &ControllerConfig, mode: &RunMode, version: &str) -> String {
    let mut hasher = Sha256::new();

    let config_json = serde_json::to_string(config).unwrap_or_default();
    hasher.update(config_json.as_bytes());

    let mode_json = serde_json::to_string(mode).unwrap_or_default();
    hasher.update(mode_json.as_bytes());

    hasher.update(version.as_bytes());

    format!("{:x}", hasher.finalize())
}
