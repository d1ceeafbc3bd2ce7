//! Closed-loop simulation runner.

use hc_controls::{
    ActuatorId, ControlLoop, ControllerConfig, RecordSink, SensorError, TickOutcome,
};
use hc_core::units::s;
use tracing::{debug, info};

use crate::chamber::{Chamber, ChamberParams};
use crate::error::{SimError, SimResult};
use crate::ports::{SimActuators, SimSensor, Switch};

/// Consecutive ticks whose sensor read times out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorFaultWindow {
    pub from_tick: usize,
    pub count: usize,
}

impl SensorFaultWindow {
    pub fn contains(&self, tick: usize) -> bool {
        tick >= self.from_tick && tick < self.from_tick + self.count
    }
}

/// Relay write failures armed at the start of a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WriteFailure {
    pub tick: usize,
    pub actuator: ActuatorId,
    pub count: u32,
}

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Number of control ticks.
    pub ticks: usize,
    /// Chamber humidity at t = 0.
    pub initial_humidity_pct: f64,
    pub chamber: ChamberParams,
    pub sensor_fault: Option<SensorFaultWindow>,
    pub write_failures: Vec<WriteFailure>,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            ticks: 100,
            initial_humidity_pct: 80.0,
            chamber: ChamberParams::default(),
            sensor_fault: None,
            write_failures: Vec::new(),
        }
    }
}

/// Everything observed during a run.
#[derive(Clone, Debug)]
pub struct SimRun {
    /// Chamber humidity at the start of each tick.
    pub humidity: Vec<f64>,
    pub outcomes: Vec<TickOutcome>,
    /// Physical relay changes.
    pub switches: Vec<Switch>,
    /// Chamber humidity after the last period.
    pub final_humidity_pct: f64,
}

impl SimRun {
    pub fn records(&self) -> impl Iterator<Item = &hc_controls::TickRecord> {
        self.outcomes.iter().filter_map(TickOutcome::record)
    }
}

/// Run the control loop against a simulated chamber for `opts.ticks` periods.
///
/// Between ticks the chamber is integrated piecewise, stopping at every relay
/// edge the loop schedules inside the period.
pub fn run_sim<K: RecordSink>(
    config: &ControllerConfig,
    opts: &SimOptions,
    sink: K,
) -> SimResult<(SimRun, K)> {
    if opts.ticks == 0 {
        return Err(SimError::InvalidArg {
            what: "ticks must be positive",
        });
    }
    let mut chamber = Chamber::new(opts.chamber.clone(), opts.initial_humidity_pct)?;
    let mut cl = ControlLoop::new(config.clone(), SimSensor::new(), SimActuators::new(), sink)?;
    let period = config.sampling_period_seconds;

    info!(
        ticks = opts.ticks,
        initial = opts.initial_humidity_pct,
        target = config.target_humidity_pct,
        "simulation started"
    );

    let mut humidity = Vec::with_capacity(opts.ticks);
    let mut outcomes = Vec::with_capacity(opts.ticks);

    for tick in 0..opts.ticks {
        let t = tick as f64 * period;

        if opts.sensor_fault.is_some_and(|w| w.contains(tick)) {
            cl.sensor_mut().inject(SensorError::Timeout);
        }
        for failure in opts.write_failures.iter().filter(|f| f.tick == tick) {
            cl.actuators_mut().fail_next(failure.actuator, failure.count);
        }

        cl.sensor_mut().set_next(chamber.reading());
        cl.actuators_mut().set_clock(t);
        humidity.push(chamber.humidity_pct());
        outcomes.push(cl.tick(t));

        let end = t + period;
        let mut now = t;
        while let Some(at) = cl.next_transition().filter(|at| *at < end) {
            let at = at.max(now);
            advance(&mut chamber, cl.actuators(), at - now);
            now = at;
            cl.actuators_mut().set_clock(now);
            if cl.service(now).is_empty() {
                break;
            }
        }
        advance(&mut chamber, cl.actuators(), end - now);
        debug!(tick, humidity = chamber.humidity_pct(), "period integrated");
    }

    let final_humidity_pct = chamber.humidity_pct();
    info!(final_humidity = final_humidity_pct, "simulation finished");

    let (_, actuators, sink) = cl.into_parts();
    Ok((
        SimRun {
            humidity,
            outcomes,
            switches: actuators.trace().to_vec(),
            final_humidity_pct,
        },
        sink,
    ))
}

fn advance(chamber: &mut Chamber, relays: &SimActuators, dt: f64) {
    chamber.advance(
        s(dt),
        relays.is_on(ActuatorId::Humidifier),
        relays.is_on(ActuatorId::Ventilator),
    );
}
