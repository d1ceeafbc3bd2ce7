//! The control loop: one owner for every piece of mutable control state.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::ControllerConfig;
use crate::controller::{ControlAction, PIController, PIControllerState};
use crate::coordination::{CoordinationPolicy, Resolution};
use crate::error::ControlResult;
use crate::estimator::{Prediction, TrajectoryEstimator};
use crate::ports::{ActuatorPort, SensorError, SensorPort};
use crate::record::{ActuatorFault, RecordSink, TickRecord};
use crate::sample::{ActuatorActivity, Sample};
use crate::scheduler::{ActuatorCommand, ActuatorState, DutyCycleScheduler};
use crate::signal::ActuatorId;

/// What a tick did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TickOutcome {
    /// A sample was read and a fresh decision applied. The record carries
    /// every actuator fault not yet handed to the sink.
    Controlled(TickRecord),
    /// The sensor read failed; actuators were held or forced off. Lists the
    /// writes that failed during this tick.
    SensorFault {
        timestamp: f64,
        error: String,
        consecutive: u32,
        failsafe: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        actuator_faults: Vec<ActuatorFault>,
    },
}

impl TickOutcome {
    pub fn record(&self) -> Option<&TickRecord> {
        match self {
            Self::Controlled(record) => Some(record),
            Self::SensorFault { .. } => None,
        }
    }

    pub fn timestamp(&self) -> f64 {
        match self {
            Self::Controlled(record) => record.timestamp,
            Self::SensorFault { timestamp, .. } => *timestamp,
        }
    }

    pub fn actuator_faults(&self) -> &[ActuatorFault] {
        match self {
            Self::Controlled(record) => &record.actuator_faults,
            Self::SensorFault {
                actuator_faults, ..
            } => actuator_faults,
        }
    }
}

#[derive(Debug, Clone)]
struct Channel {
    pi: PIController,
    pi_state: PIControllerState,
    setpoint: f64,
    scheduler: DutyCycleScheduler,
    /// Last write failed; re-assert the believed state next tick.
    resync: bool,
}

impl Channel {
    fn new(
        actuator: ActuatorId,
        action: ControlAction,
        setpoint: f64,
        config: &ControllerConfig,
    ) -> ControlResult<Self> {
        Ok(Self {
            pi: PIController::new(config.kp, config.ki, config.integral_clamp, action)?,
            pi_state: PIControllerState::default(),
            setpoint,
            scheduler: DutyCycleScheduler::from_config(actuator, config)?,
            resync: true,
        })
    }
}

/// Last successful sample time and cumulative ON time per actuator at that
/// instant.
#[derive(Debug, Clone, Copy)]
struct ActivityMark {
    timestamp: f64,
    on_time: [f64; 2],
}

/// Humidity control loop over a sensor, a bank of actuators and a record sink.
///
/// The runner calls [`ControlLoop::tick`] once per sampling period and
/// [`ControlLoop::service`] whenever [`ControlLoop::next_transition`] falls due.
pub struct ControlLoop<S, A, K> {
    config: ControllerConfig,
    sensor: S,
    actuators: A,
    sink: K,
    estimator: TrajectoryEstimator,
    policy: CoordinationPolicy,
    /// Indexed in [`ActuatorId::ALL`] order.
    channels: [Channel; 2],
    consecutive_failures: u32,
    failsafe: bool,
    last_update: Option<f64>,
    last_mark: Option<ActivityMark>,
    pending_faults: Vec<ActuatorFault>,
}

impl<S, A, K> ControlLoop<S, A, K>
where
    S: SensorPort,
    A: ActuatorPort,
    K: RecordSink,
{
    /// Validate `config` and assemble the loop. Every actuator is believed OFF
    /// and is asserted OFF on the first tick.
    pub fn new(config: ControllerConfig, sensor: S, actuators: A, sink: K) -> ControlResult<Self> {
        config.validate()?;
        let channels = [
            Channel::new(
                ActuatorId::Humidifier,
                ControlAction::Direct,
                config.target_humidity_pct,
                &config,
            )?,
            Channel::new(
                ActuatorId::Ventilator,
                ControlAction::Reverse,
                config.ventilator_setpoint_pct(),
                &config,
            )?,
        ];
        Ok(Self {
            estimator: TrajectoryEstimator::from_config(&config)?,
            policy: CoordinationPolicy::from_config(&config),
            channels,
            config,
            sensor,
            actuators,
            sink,
            consecutive_failures: 0,
            failsafe: false,
            last_update: None,
            last_mark: None,
            pending_faults: Vec::new(),
        })
    }

    /// Run one control period starting at `now` (seconds, monotonic).
    pub fn tick(&mut self, now: f64) -> TickOutcome {
        let carried = std::mem::take(&mut self.pending_faults);
        let mut faults = Vec::new();
        self.resync(&mut faults);

        let sample = self
            .sensor
            .read()
            .and_then(|reading| {
                Sample::from_reading(now, reading).map_err(|err| SensorError::InvalidReading {
                    what: err.to_string(),
                })
            });

        match sample {
            Ok(sample) => {
                let mut unreported = carried;
                unreported.append(&mut faults);
                TickOutcome::Controlled(self.control(now, sample, unreported))
            }
            Err(err) => {
                let outcome = self.sensor_fault(now, err, faults);
                // Fault ticks are not recorded; the next record reports these
                self.pending_faults = carried;
                self.pending_faults.extend_from_slice(outcome.actuator_faults());
                outcome
            }
        }
    }

    /// Apply intra-period edges that are due at `now`.
    pub fn service(&mut self, now: f64) -> Vec<ActuatorCommand> {
        let mut applied = Vec::new();
        for channel in &mut self.channels {
            if let Some(command) = channel.scheduler.poll(now) {
                write(&mut self.actuators, channel, command, &mut self.pending_faults);
                applied.push(command);
            }
        }
        applied
    }

    /// Switch every actuator OFF before the loop is dropped. Returns the writes
    /// that failed.
    pub fn shutdown(&mut self, now: f64) -> Vec<ActuatorFault> {
        let mut faults = std::mem::take(&mut self.pending_faults);
        for channel in &mut self.channels {
            let command = channel.scheduler.force_off(now).unwrap_or(ActuatorCommand {
                actuator: channel.scheduler.actuator(),
                on: false,
                at: now,
            });
            write(&mut self.actuators, channel, command, &mut faults);
        }
        info!(t = now, failed_writes = faults.len(), "control loop shut down");
        faults
    }

    /// Earliest planned edge across all actuators.
    pub fn next_transition(&self) -> Option<f64> {
        self.channels
            .iter()
            .filter_map(|c| c.scheduler.next_transition())
            .min_by(f64::total_cmp)
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn actuator_state(&self, actuator: ActuatorId) -> &ActuatorState {
        self.channel(actuator).scheduler.state()
    }

    /// Cumulative ON time of `actuator` up to `now`.
    pub fn on_time(&self, actuator: ActuatorId, now: f64) -> f64 {
        self.channel(actuator).scheduler.on_time_until(now)
    }

    pub fn integral(&self, actuator: ActuatorId) -> f64 {
        self.channel(actuator).pi_state.integral
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn is_failsafe(&self) -> bool {
        self.failsafe
    }

    pub fn prediction(&self) -> Option<Prediction> {
        self.estimator.predict()
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn actuators(&self) -> &A {
        &self.actuators
    }

    pub fn actuators_mut(&mut self) -> &mut A {
        &mut self.actuators
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn into_parts(self) -> (S, A, K) {
        (self.sensor, self.actuators, self.sink)
    }

    fn channel(&self, actuator: ActuatorId) -> &Channel {
        &self.channels[slot(actuator)]
    }

    fn resync(&mut self, faults: &mut Vec<ActuatorFault>) {
        for channel in self.channels.iter_mut().filter(|c| c.resync) {
            let state = channel.scheduler.state();
            let command = ActuatorCommand {
                actuator: state.actuator,
                on: state.is_on,
                at: state.since.unwrap_or(0.0),
            };
            write(&mut self.actuators, channel, command, faults);
        }
    }

    fn control(&mut self, now: f64, sample: Sample, mut faults: Vec<ActuatorFault>) -> TickRecord {
        if self.consecutive_failures > 0 {
            info!(
                failures = self.consecutive_failures,
                failsafe = self.failsafe,
                "sensor recovered"
            );
        }
        self.consecutive_failures = 0;
        self.failsafe = false;

        let activity = self.activity_since_last(now);
        let prediction = self.estimator.observe(sample, activity);

        let dt = match self.last_update {
            Some(last) if now > last => now - last,
            _ => self.config.sampling_period_seconds,
        };
        self.last_update = Some(now);

        let mut demands = [0.0; 2];
        for (demand, channel) in demands.iter_mut().zip(self.channels.iter_mut()) {
            if channel.scheduler.actuator() == ActuatorId::Ventilator && !self.config.ventilator_enabled
            {
                continue;
            }
            let (state, output) =
                channel
                    .pi
                    .update(&channel.pi_state, prediction.humidity_pct, channel.setpoint, dt);
            channel.pi_state = state;
            *demand = output;
        }

        let resolution: Resolution = self.policy.resolve(
            demands[slot(ActuatorId::Humidifier)],
            demands[slot(ActuatorId::Ventilator)],
            prediction.humidity_pct,
        );

        for channel in &mut self.channels {
            let signal = resolution.signal(channel.scheduler.actuator());
            if let Some(command) = channel.scheduler.begin_period(now, signal.demand) {
                write(&mut self.actuators, channel, command, &mut faults);
            }
        }

        self.last_mark = Some(ActivityMark {
            timestamp: now,
            on_time: self.on_times(now),
        });

        let record = TickRecord {
            timestamp: now,
            humidity: sample.humidity_pct,
            temperature: sample.temperature_c,
            humidifier_on: self.channel(ActuatorId::Humidifier).scheduler.is_on(),
            ventilator_on: self.channel(ActuatorId::Ventilator).scheduler.is_on(),
            demand_humidifier: resolution.humidifier.demand,
            demand_ventilator: resolution.ventilator.demand,
            predicted_humidity: prediction.humidity_pct,
            confidence: prediction.confidence,
            arbitration: resolution.arbitration,
            actuator_faults: faults,
        };

        debug!(
            t = now,
            humidity = record.humidity,
            predicted = record.predicted_humidity,
            confidence = record.confidence,
            demand_humidifier = record.demand_humidifier,
            demand_ventilator = record.demand_ventilator,
            arbitration = ?record.arbitration,
            "tick"
        );

        if let Err(err) = self.sink.record(&record) {
            warn!(error = %err, "failed to record tick");
        }
        record
    }

    fn sensor_fault(
        &mut self,
        now: f64,
        err: SensorError,
        mut faults: Vec<ActuatorFault>,
    ) -> TickOutcome {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        warn!(
            t = now,
            error = %err,
            consecutive = self.consecutive_failures,
            "sensor read failed"
        );

        if self.consecutive_failures >= self.config.max_consecutive_failures {
            if !self.failsafe {
                error!(
                    consecutive = self.consecutive_failures,
                    "sensor lost, forcing all actuators off"
                );
                self.failsafe = true;
                for channel in &mut self.channels {
                    channel.pi_state = PIControllerState::default();
                }
                // Nothing measured before the outage feeds the restarted control
                self.last_update = None;
                self.last_mark = None;
                self.estimator.reset();
            }
            for channel in &mut self.channels {
                if let Some(command) = channel.scheduler.force_off(now) {
                    write(&mut self.actuators, channel, command, &mut faults);
                }
            }
        } else {
            for channel in &mut self.channels {
                if let Some(command) = channel.scheduler.hold(now) {
                    write(&mut self.actuators, channel, command, &mut faults);
                }
            }
        }

        TickOutcome::SensorFault {
            timestamp: now,
            error: err.to_string(),
            consecutive: self.consecutive_failures,
            failsafe: self.failsafe,
            actuator_faults: faults,
        }
    }

    fn on_times(&self, now: f64) -> [f64; 2] {
        [
            self.channels[0].scheduler.on_time_until(now),
            self.channels[1].scheduler.on_time_until(now),
        ]
    }

    /// ON fraction of each actuator since the previous successful sample.
    fn activity_since_last(&self, now: f64) -> ActuatorActivity {
        let Some(mark) = self.last_mark else {
            return ActuatorActivity::default();
        };
        let elapsed = now - mark.timestamp;
        if elapsed <= 0.0 {
            return ActuatorActivity::default();
        }
        let on = self.on_times(now);
        ActuatorActivity::new(
            (on[0] - mark.on_time[0]) / elapsed,
            (on[1] - mark.on_time[1]) / elapsed,
        )
    }
}

fn slot(actuator: ActuatorId) -> usize {
    match actuator {
        ActuatorId::Humidifier => 0,
        ActuatorId::Ventilator => 1,
    }
}

/// Write one edge. The scheduler has already moved on, so a failure only
/// flags the channel for resync.
fn write<A: ActuatorPort>(
    actuators: &mut A,
    channel: &mut Channel,
    command: ActuatorCommand,
    faults: &mut Vec<ActuatorFault>,
) {
    match actuators.set(command.actuator, command.on) {
        Ok(()) => channel.resync = false,
        Err(err) => {
            warn!(actuator = %command.actuator, on = command.on, error = %err, "actuator write failed");
            channel.resync = true;
            faults.push(ActuatorFault {
                actuator: command.actuator,
                reason: err.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::coordination::Arbitration;
    use crate::ports::{ActuatorError, Reading};
    use crate::record::MemorySink;

    #[derive(Default)]
    struct ScriptedSensor {
        script: VecDeque<Result<Reading, SensorError>>,
    }

    impl ScriptedSensor {
        fn push_ok(&mut self, humidity: f64) {
            self.script.push_back(Ok(Reading::new(humidity, 20.0)));
        }

        fn push_err(&mut self, err: SensorError) {
            self.script.push_back(Err(err));
        }
    }

    impl SensorPort for ScriptedSensor {
        fn read(&mut self) -> Result<Reading, SensorError> {
            self.script.pop_front().unwrap_or(Err(SensorError::NotResponding))
        }
    }

    #[derive(Default)]
    struct Relays {
        writes: Vec<(ActuatorId, bool)>,
        fail_humidifier: u32,
    }

    impl Relays {
        fn last(&self, actuator: ActuatorId) -> Option<bool> {
            self.writes
                .iter()
                .rev()
                .find(|(a, _)| *a == actuator)
                .map(|(_, on)| *on)
        }
    }

    impl ActuatorPort for Relays {
        fn set(&mut self, actuator: ActuatorId, on: bool) -> Result<(), ActuatorError> {
            if actuator == ActuatorId::Humidifier && self.fail_humidifier > 0 {
                self.fail_humidifier -= 1;
                return Err(ActuatorError::WriteFailed {
                    actuator,
                    reason: "relay busy".to_string(),
                });
            }
            self.writes.push((actuator, on));
            Ok(())
        }
    }

    fn config() -> ControllerConfig {
        ControllerConfig {
            target_humidity_pct: 95.0,
            kp: 0.5,
            ki: 0.05,
            integral_clamp: 20.0,
            min_on_seconds: 0.1,
            min_off_seconds: 0.1,
            sampling_period_seconds: 1.0,
            estimator_window: 5,
            min_trend_samples: 3,
            prediction_horizon_seconds: 1.0,
            sensor_timeout_seconds: 0.5,
            warmup_seconds: 0.0,
            ..Default::default()
        }
    }

    fn control_loop(
        sensor: ScriptedSensor,
        cfg: ControllerConfig,
    ) -> ControlLoop<ScriptedSensor, Relays, MemorySink> {
        ControlLoop::new(cfg, sensor, Relays::default(), MemorySink::new()).unwrap()
    }

    #[test]
    fn invalid_config_is_refused() {
        let cfg = ControllerConfig {
            kp: -1.0,
            ..config()
        };
        let result = ControlLoop::new(cfg, ScriptedSensor::default(), Relays::default(), MemorySink::new());
        assert!(result.is_err());
    }

    #[test]
    fn first_tick_asserts_off_then_humidifies() {
        let mut sensor = ScriptedSensor::default();
        sensor.push_ok(80.0);
        let mut cl = control_loop(sensor, config());

        let outcome = cl.tick(0.0);
        let record = outcome.record().unwrap();
        assert_eq!(record.demand_humidifier, 1.0);
        assert!(record.humidifier_on);
        assert!(!record.ventilator_on);
        assert_eq!(
            cl.actuators().writes,
            vec![
                (ActuatorId::Humidifier, false),
                (ActuatorId::Ventilator, false),
                (ActuatorId::Humidifier, true),
            ]
        );
        assert_eq!(cl.sink().records.len(), 1);
    }

    #[test]
    fn partial_demand_switches_off_inside_the_period() {
        let mut sensor = ScriptedSensor::default();
        sensor.push_ok(94.0);
        let mut cl = control_loop(sensor, config());

        let record = cl.tick(0.0).record().cloned().unwrap();
        // kp * 1% + ki * 1%*s = 0.55
        assert!((record.demand_humidifier - 0.55).abs() < 1e-9);
        let off_at = cl.next_transition().unwrap();
        assert!((off_at - 0.55).abs() < 1e-9);
        let applied = cl.service(off_at);
        assert_eq!(applied.len(), 1);
        assert!(!applied[0].on);
        assert_eq!(cl.actuators().last(ActuatorId::Humidifier), Some(false));
    }

    #[test]
    fn implausible_reading_counts_as_failure() {
        let mut sensor = ScriptedSensor::default();
        sensor.push_ok(140.0);
        let mut cl = control_loop(sensor, config());
        match cl.tick(0.0) {
            TickOutcome::SensorFault { consecutive, .. } => assert_eq!(consecutive, 1),
            other => panic!("expected a sensor fault, got {other:?}"),
        }
        assert!(cl.sink().records.is_empty());
    }

    #[test]
    fn sustained_sensor_loss_forces_everything_off() {
        let mut sensor = ScriptedSensor::default();
        for _ in 0..3 {
            sensor.push_ok(80.0);
        }
        for _ in 0..6 {
            sensor.push_err(SensorError::Timeout);
        }
        sensor.push_ok(80.0);
        let mut cl = control_loop(sensor, config());

        let mut t = 0.0;
        for _ in 0..3 {
            cl.tick(t);
            t += 1.0;
        }
        assert!(cl.actuator_state(ActuatorId::Humidifier).is_on);

        for i in 1..=4 {
            let outcome = cl.tick(t);
            t += 1.0;
            assert!(matches!(outcome, TickOutcome::SensorFault { failsafe: false, consecutive, .. } if consecutive == i));
            assert!(cl.actuator_state(ActuatorId::Humidifier).is_on, "held through failure {i}");
        }

        let outcome = cl.tick(t);
        t += 1.0;
        assert!(matches!(outcome, TickOutcome::SensorFault { failsafe: true, .. }));
        assert!(cl.is_failsafe());
        assert!(!cl.actuator_state(ActuatorId::Humidifier).is_on);
        assert_eq!(cl.actuators().last(ActuatorId::Humidifier), Some(false));
        assert_eq!(cl.integral(ActuatorId::Humidifier), 0.0);
        assert_eq!(cl.next_transition(), None);

        cl.tick(t);
        t += 1.0;
        assert!(!cl.actuator_state(ActuatorId::Humidifier).is_on);

        let outcome = cl.tick(t);
        assert!(outcome.record().is_some());
        assert!(!cl.is_failsafe());
        assert_eq!(cl.consecutive_failures(), 0);
        assert!(cl.actuator_state(ActuatorId::Humidifier).is_on);
    }

    #[test]
    fn failed_forced_off_write_reaches_the_sink() {
        let mut sensor = ScriptedSensor::default();
        sensor.push_ok(80.0);
        for _ in 0..5 {
            sensor.push_err(SensorError::Timeout);
        }
        sensor.push_ok(80.0);
        let mut cl = control_loop(sensor, config());

        cl.tick(0.0);
        for t in 1..5 {
            cl.tick(t as f64);
        }
        cl.actuators_mut().fail_humidifier = 1;
        let outcome = cl.tick(5.0);
        assert!(matches!(outcome, TickOutcome::SensorFault { failsafe: true, .. }));
        assert_eq!(outcome.actuator_faults().len(), 1);

        let record = cl.tick(6.0).record().cloned().unwrap();
        assert_eq!(record.actuator_faults.len(), 1);
        assert_eq!(record.actuator_faults[0].actuator, ActuatorId::Humidifier);
        assert_eq!(cl.sink().records.last(), Some(&record));
    }

    #[test]
    fn control_restarts_from_scratch_after_failsafe() {
        let cfg = ControllerConfig {
            kp: 0.1,
            ki: 0.01,
            ..config()
        };
        let mut sensor = ScriptedSensor::default();
        sensor.push_ok(94.0);
        for _ in 0..10 {
            sensor.push_err(SensorError::Timeout);
        }
        sensor.push_ok(94.0);
        let mut cl = control_loop(sensor, cfg);

        cl.tick(0.0);
        assert!((cl.integral(ActuatorId::Humidifier) - 1.0).abs() < 1e-9);
        for t in 1..=10 {
            cl.tick(t as f64);
        }
        assert!(cl.is_failsafe());
        assert_eq!(cl.integral(ActuatorId::Humidifier), 0.0);

        let record = cl.tick(11.0).record().cloned().unwrap();
        // One period of error, not the whole outage
        assert!((cl.integral(ActuatorId::Humidifier) - 1.0).abs() < 1e-9);
        assert_eq!(record.confidence, 0.0);
        assert_eq!(record.predicted_humidity, 94.0);
    }

    #[test]
    fn failed_write_is_reasserted_next_tick() {
        let mut sensor = ScriptedSensor::default();
        sensor.push_ok(80.0);
        sensor.push_ok(80.0);
        let mut cl = ControlLoop::new(
            config(),
            sensor,
            Relays {
                fail_humidifier: 2,
                ..Default::default()
            },
            MemorySink::new(),
        )
        .unwrap();

        let first = cl.tick(0.0).record().cloned().unwrap();
        assert_eq!(first.actuator_faults.len(), 2);
        assert!(first.humidifier_on, "scheduler advances optimistically");
        assert_eq!(cl.actuators().last(ActuatorId::Humidifier), None);

        let second = cl.tick(1.0).record().cloned().unwrap();
        assert!(second.actuator_faults.is_empty());
        assert_eq!(cl.actuators().last(ActuatorId::Humidifier), Some(true));
    }

    #[test]
    fn conflicting_demands_are_arbitrated() {
        let cfg = ControllerConfig {
            kp: 0.01,
            ki: 0.01,
            prediction_horizon_seconds: 0.0,
            ..config()
        };
        let mut sensor = ScriptedSensor::default();
        for _ in 0..4 {
            sensor.push_ok(90.0);
        }
        sensor.push_ok(98.0);
        sensor.push_ok(99.5);
        let mut cl = control_loop(sensor, cfg);

        for t in 0..4 {
            cl.tick(t as f64);
        }
        assert!((cl.integral(ActuatorId::Humidifier) - 20.0).abs() < 1e-9);

        let below = cl.tick(4.0).record().cloned().unwrap();
        assert_eq!(below.arbitration, Arbitration::HumidifierPriority);
        assert!(below.demand_humidifier > 0.0);
        assert_eq!(below.demand_ventilator, 0.0);
        assert!(!below.ventilator_on);

        let above = cl.tick(5.0).record().cloned().unwrap();
        assert_eq!(above.arbitration, Arbitration::EmergencyVentilation);
        assert_eq!(above.demand_humidifier, 0.0);
        assert!(above.demand_ventilator > 0.0);
    }

    #[test]
    fn disabled_ventilator_is_never_driven() {
        let cfg = ControllerConfig {
            ventilator_enabled: false,
            ..config()
        };
        let mut sensor = ScriptedSensor::default();
        sensor.push_ok(100.0);
        let mut cl = control_loop(sensor, cfg);
        let record = cl.tick(0.0).record().cloned().unwrap();
        assert_eq!(record.demand_ventilator, 0.0);
        assert!(!record.ventilator_on);
        assert_eq!(cl.integral(ActuatorId::Ventilator), 0.0);
    }

    #[test]
    fn shutdown_switches_everything_off() {
        let mut sensor = ScriptedSensor::default();
        sensor.push_ok(80.0);
        let mut cl = control_loop(sensor, config());
        cl.tick(0.0);
        assert!(cl.actuator_state(ActuatorId::Humidifier).is_on);

        let faults = cl.shutdown(0.05);
        assert!(faults.is_empty());
        assert!(!cl.actuator_state(ActuatorId::Humidifier).is_on);
        assert_eq!(cl.actuators().last(ActuatorId::Humidifier), Some(false));
        assert_eq!(cl.actuators().last(ActuatorId::Ventilator), Some(false));
        assert_eq!(cl.next_transition(), None);
    }

    #[test]
    fn outcome_serializes_with_kind_tag() {
        let outcome = TickOutcome::SensorFault {
            timestamp: 3.0,
            error: SensorError::Timeout.to_string(),
            consecutive: 2,
            failsafe: false,
            actuator_faults: Vec::new(),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"kind\":\"sensor_fault\""));
    }
}
