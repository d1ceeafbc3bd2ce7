//! Streaming record sink backed by a [`RunStore`] directory.

use std::fs::File;
use std::io::{BufWriter, Write};

use hc_controls::{RecordSink, SinkError, TickRecord};

use crate::ResultsResult;
use crate::store::{RunStore, TIMESERIES_FILE};
use crate::types::{RunManifest, RunSummary};

/// Appends each tick record to `timeseries.jsonl` as it arrives.
///
/// The manifest is written up front so an interrupted run is still listed; the
/// summary is added by [`RunRecorder::finish`].
pub struct RunRecorder {
    store: RunStore,
    manifest: RunManifest,
    writer: BufWriter<File>,
    written: usize,
}

impl RunRecorder {
    pub fn create(store: RunStore, manifest: RunManifest) -> ResultsResult<Self> {
        store.save_manifest(&manifest)?;
        let file = File::create(store.run_dir(&manifest.run_id).join(TIMESERIES_FILE))?;
        Ok(Self {
            store,
            manifest,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn manifest(&self) -> &RunManifest {
        &self.manifest
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush the timeseries and rewrite the manifest with `summary`.
    pub fn finish(mut self, summary: RunSummary) -> ResultsResult<RunManifest> {
        self.writer.flush()?;
        self.manifest.summary = Some(summary);
        self.store.save_manifest(&self.manifest)?;
        Ok(self.manifest)
    }
}

impl RecordSink for RunRecorder {
    fn record(&mut self, record: &TickRecord) -> Result<(), SinkError> {
        let line = serde_json::to_string(record).map_err(|e| SinkError::Encode(e.to_string()))?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }
}
