//! Controller config loading, saving and validation.
//!
//! Files ending in `.json` are read and written as JSON; everything else is
//! YAML.

use std::path::Path;

use hc_controls::ControllerConfig;

use crate::error::{AppError, AppResult};

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Load a config file and validate it.
pub fn load_config(path: &Path) -> AppResult<ControllerConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::ConfigFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: ControllerConfig = if is_json(path) {
        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config JSON: {}", e)))?
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config YAML: {}", e)))?
    };

    validate_config(&config)?;
    Ok(config)
}

/// Save a config file in the format its extension names.
pub fn save_config(path: &Path, config: &ControllerConfig) -> AppResult<()> {
    let content = if is_json(path) {
        serde_json::to_string_pretty(config)
            .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?
    } else {
        serde_yaml::to_string(config)
            .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?
    };

    std::fs::write(path, content).map_err(|e| AppError::ConfigFileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

pub fn validate_config(config: &ControllerConfig) -> AppResult<()> {
    config.validate()?;
    Ok(())
}

/// The default config rendered as YAML, every option spelled out.
pub fn default_config_yaml() -> AppResult<String> {
    serde_yaml::to_string(&ControllerConfig::default())
        .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))
}

/// Label used for runs started from `path`: the file stem.
pub fn config_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config".to_string())
}
