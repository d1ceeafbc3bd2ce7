//! Run storage API.
//!
//! Layout: `<root>/<run_id>/manifest.json` plus `<root>/<run_id>/timeseries.jsonl`
//! with one [`TickRecord`] per line.

use std::fs;
use std::path::{Path, PathBuf};

use hc_controls::TickRecord;

use crate::types::RunManifest;
use crate::{ResultsError, ResultsResult};

pub(crate) const MANIFEST_FILE: &str = "manifest.json";
pub(crate) const TIMESERIES_FILE: &str = "timeseries.jsonl";

#[derive(Debug, Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store kept next to a config file, under `.humictl/runs`.
    pub fn for_config(config_path: &Path) -> ResultsResult<Self> {
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "config path has no parent directory".to_string(),
            })?;
        Self::new(config_dir.join(".humictl").join("runs"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub(crate) fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(MANIFEST_FILE).exists()
    }

    pub fn save_manifest(&self, manifest: &RunManifest) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;
        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join(MANIFEST_FILE), manifest_json)?;
        Ok(())
    }

    pub fn save_run(&self, manifest: &RunManifest, records: &[TickRecord]) -> ResultsResult<()> {
        self.save_manifest(manifest)?;

        let mut timeseries_content = String::new();
        for record in records {
            timeseries_content.push_str(&serde_json::to_string(record)?);
            timeseries_content.push('\n');
        }
        fs::write(
            self.run_dir(&manifest.run_id).join(TIMESERIES_FILE),
            timeseries_content,
        )?;

        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let manifest_path = self.run_dir(run_id).join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let content = fs::read_to_string(manifest_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_timeseries(&self, run_id: &str) -> ResultsResult<Vec<TickRecord>> {
        let timeseries_path = self.run_dir(run_id).join(TIMESERIES_FILE);
        if !timeseries_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(timeseries_path)?;
        let mut records = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            records.push(serde_json::from_str(line)?);
        }
        Ok(records)
    }

    /// Every run with a readable manifest, oldest first.
    pub fn list_runs(&self) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();
        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id) {
                    runs.push(manifest);
                }
            }
        }

        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.run_id.cmp(&b.run_id)));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
