//! Simulation runs and their persistence.

use std::time::Instant;

use hc_controls::{ControllerConfig, MemorySink, TickRecord};
use hc_results::{
    FaultWindow, RunManifest, RunMode, RunRecorder, RunStore, RunSummary, compute_run_id,
};
use hc_sim::{ChamberParams, SimOptions, run_sim};
use tracing::info;

use crate::error::AppResult;

/// Request to run (or reload) a closed-loop simulation.
pub struct SimulationRequest<'a> {
    pub config: &'a ControllerConfig,
    /// Label stored in the manifest.
    pub config_name: &'a str,
    pub options: SimOptions,
    /// Where to persist the run. `None` keeps everything in memory.
    pub store: Option<&'a RunStore>,
    pub use_cache: bool,
    pub version: &'a str,
}

#[derive(Debug, Clone)]
pub struct SimulationResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub records: Vec<TickRecord>,
    pub loaded_from_cache: bool,
    pub elapsed_s: f64,
}

impl SimulationResponse {
    pub fn summary(&self) -> Option<&RunSummary> {
        self.manifest.summary.as_ref()
    }
}

fn run_mode(options: &SimOptions) -> RunMode {
    RunMode::Simulation {
        ticks: options.ticks,
        initial_humidity_pct: options.initial_humidity_pct,
        sensor_fault: options.sensor_fault.map(|w| FaultWindow {
            from_tick: w.from_tick,
            count: w.count,
        }),
    }
}

/// Only runs fully described by their manifest may be served from the store.
fn cacheable(options: &SimOptions) -> bool {
    options.chamber == ChamberParams::default() && options.write_failures.is_empty()
}

/// Execute a simulation, or load it from the store when an identical run exists.
pub fn ensure_simulation(request: &SimulationRequest) -> AppResult<SimulationResponse> {
    let started = Instant::now();
    request.config.validate()?;

    let mode = run_mode(&request.options);
    let run_id = compute_run_id(request.config, &mode, request.version);

    if let Some(store) = request.store
        && request.use_cache
        && cacheable(&request.options)
        && store.has_run(&run_id)
    {
        let manifest = store.load_manifest(&run_id)?;
        if manifest.summary.is_some() {
            info!(run_id = %run_id, "loaded simulation from cache");
            let records = store.load_timeseries(&run_id)?;
            return Ok(SimulationResponse {
                run_id,
                manifest,
                records,
                loaded_from_cache: true,
                elapsed_s: started.elapsed().as_secs_f64(),
            });
        }
    }

    let manifest = RunManifest::new(run_id.clone(), request.config_name, mode, request.version);
    let target = request.config.target_humidity_pct;
    let ticks = request.options.ticks;

    let (manifest, records) = match request.store {
        Some(store) => {
            let recorder = RunRecorder::create(store.clone(), manifest)?;
            let (run, recorder) = run_sim(request.config, &request.options, recorder)?;
            let records: Vec<TickRecord> = run.records().cloned().collect();
            let manifest = recorder.finish(RunSummary::from_records(&records, ticks, target))?;
            (manifest, records)
        }
        None => {
            let (_, sink) = run_sim(request.config, &request.options, MemorySink::new())?;
            let mut manifest = manifest;
            manifest.summary = Some(RunSummary::from_records(&sink.records, ticks, target));
            (manifest, sink.records)
        }
    };

    info!(run_id = %run_id, records = records.len(), "simulation complete");
    Ok(SimulationResponse {
        run_id,
        manifest,
        records,
        loaded_from_cache: false,
        elapsed_s: started.elapsed().as_secs_f64(),
    })
}

pub fn list_runs(store: &RunStore) -> AppResult<Vec<RunManifest>> {
    Ok(store.list_runs()?)
}

pub fn load_run(store: &RunStore, run_id: &str) -> AppResult<(RunManifest, Vec<TickRecord>)> {
    let manifest = store.load_manifest(run_id)?;
    let records = store.load_timeseries(run_id)?;
    Ok((manifest, records))
}
