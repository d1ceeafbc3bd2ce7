//! Wall-clock driver for a [`ControlLoop`].
//!
//! Ticks are paced by a [`SampleClock`] on a monotonic time base that starts
//! when the runner starts; intra-period relay edges are serviced as they fall
//! due. Each tick outcome is handed to an optional status channel, which is the
//! only way state leaves the control thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use hc_controls::{
    ActuatorPort, ControlLoop, RecordSink, SampleClock, SampleConfig, SensorPort, TickOutcome,
};
use tracing::{debug, info};

use crate::error::AppResult;

/// Longest uninterrupted sleep, so a stop request is noticed promptly.
const MAX_SLEEP: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Default)]
pub struct RealtimeOptions {
    /// Delay before the first read.
    pub warmup: Duration,
    /// Stop after this many ticks.
    pub max_ticks: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RealtimeReport {
    pub ticks: usize,
    pub sensor_faults: usize,
    pub actuator_faults: usize,
    pub elapsed_s: f64,
}

/// Run `control` until `stop` is set or the tick budget is spent, then switch
/// every actuator OFF.
pub fn run_realtime<S, A, K>(
    control: &mut ControlLoop<S, A, K>,
    opts: &RealtimeOptions,
    stop: &AtomicBool,
    status: Option<&Sender<TickOutcome>>,
) -> AppResult<RealtimeReport>
where
    S: SensorPort,
    A: ActuatorPort,
    K: RecordSink,
{
    let origin = Instant::now();
    let now = || origin.elapsed().as_secs_f64();
    let mut report = RealtimeReport::default();

    info!(warmup_s = opts.warmup.as_secs_f64(), "waiting for sensor warmup");
    let warmup_end = origin + opts.warmup;
    while Instant::now() < warmup_end && !stop.load(Ordering::Relaxed) {
        thread::sleep(warmup_end.saturating_duration_since(Instant::now()).min(MAX_SLEEP));
    }

    let mut clock = SampleClock::new(SampleConfig::from_config(control.config())?, now());
    info!(
        period_s = clock.config.dt,
        target = control.config().target_humidity_pct,
        "control loop started"
    );

    let mut status = status;
    while !stop.load(Ordering::Relaxed) {
        if opts.max_ticks.is_some_and(|max| report.ticks >= max) {
            break;
        }

        let t = now();
        if clock.should_sample(t) {
            let outcome = control.tick(t);
            clock.advance(t);
            report.ticks += 1;
            // Fault-tick failures resurface in the next record or at shutdown
            match outcome.record() {
                Some(record) => report.actuator_faults += record.actuator_faults.len(),
                None => report.sensor_faults += 1,
            }
            if let Some(tx) = status
                && tx.send(outcome).is_err()
            {
                debug!("status receiver dropped");
                status = None;
            }
            continue;
        }

        let next_edge = control.next_transition();
        if next_edge.is_some_and(|at| t >= at) {
            control.service(t);
            continue;
        }

        let wake = next_edge.map_or(clock.next_sample_time, |at| at.min(clock.next_sample_time));
        let wait = Duration::from_secs_f64((wake - t).max(0.0)).min(MAX_SLEEP);
        thread::sleep(wait);
    }

    report.actuator_faults += control.shutdown(now()).len();
    report.elapsed_s = now();
    info!(
        ticks = report.ticks,
        sensor_faults = report.sensor_faults,
        actuator_faults = report.actuator_faults,
        "control loop stopped"
    );
    Ok(report)
}
