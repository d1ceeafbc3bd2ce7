//! Sensor reads with a hard deadline.
//!
//! Single-wire humidity sensors can hang mid-transfer. [`TimedSensor`] moves
//! the blocking driver onto its own thread and waits for each reply with a
//! timeout. At most one request is outstanding: while the driver is hung,
//! further reads wait on that request instead of queueing new ones. A reply
//! that arrives after its read timed out is discarded and a fresh read issued.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use hc_controls::{Reading, SensorError, SensorPort};
use tracing::{debug, warn};

use crate::error::AppResult;

type Reply = (u64, Result<Reading, SensorError>);

pub struct TimedSensor {
    requests: Sender<u64>,
    replies: Receiver<Reply>,
    timeout: Duration,
    next_seq: u64,
    in_flight: Option<u64>,
}

impl TimedSensor {
    /// Start the worker thread that owns `sensor`.
    ///
    /// The worker exits once the `TimedSensor` is dropped and any read in
    /// progress returns.
    pub fn spawn<S>(mut sensor: S, timeout: Duration) -> AppResult<Self>
    where
        S: SensorPort + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel::<u64>();
        let (reply_tx, reply_rx) = mpsc::channel::<Reply>();

        thread::Builder::new()
            .name("hc-sensor".to_string())
            .spawn(move || {
                for seq in request_rx {
                    let result = sensor.read();
                    if reply_tx.send((seq, result)).is_err() {
                        break;
                    }
                }
                debug!("sensor worker stopped");
            })?;

        Ok(Self {
            requests: request_tx,
            replies: reply_rx,
            timeout,
            next_seq: 0,
            in_flight: None,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl SensorPort for TimedSensor {
    fn read(&mut self) -> Result<Reading, SensorError> {
        let deadline = Instant::now() + self.timeout;
        let mut issued = None;
        loop {
            let seq = match self.in_flight {
                Some(seq) => seq,
                None => {
                    let seq = self.next_seq;
                    self.next_seq += 1;
                    if self.requests.send(seq).is_err() {
                        return Err(SensorError::NotResponding);
                    }
                    self.in_flight = Some(seq);
                    issued = Some(seq);
                    seq
                }
            };

            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.replies.recv_timeout(remaining) {
                Ok((reply_seq, result)) if reply_seq == seq => {
                    self.in_flight = None;
                    if issued == Some(seq) {
                        return result;
                    }
                    debug!(stale = seq, "discarding late sensor reply");
                }
                Ok((stale, _)) => debug!(stale, expected = seq, "discarding late sensor reply"),
                Err(RecvTimeoutError::Timeout) => {
                    warn!(seq, timeout_ms = self.timeout.as_millis() as u64, "sensor read timed out");
                    return Err(SensorError::Timeout);
                }
                Err(RecvTimeoutError::Disconnected) => return Err(SensorError::NotResponding),
            }
        }
    }
}
