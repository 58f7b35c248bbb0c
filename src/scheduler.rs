//! # Transmission Scheduler
//!
//! Fixed-period loop that snapshots [`ControlState`], builds an [`RcPacket`]
//! and hands it to a [`FrameSink`].
//!
//! Wake-ups are planned against an absolute deadline that advances by exactly
//! one period per packet, so a late wake-up is made up on the next iteration.
//! When the deadline drifts more than two periods away from the clock (a
//! suspended process, a stalled sink) it is rebased to the current time.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::controller::capture::CaptureFailure;
use crate::error::{JoystickRemoteError, Result};
use crate::rcinput::protocol::RcPacket;
use crate::remote::sink::FrameSink;
use crate::state::ControlState;

/// Default transmit period (100Hz)
pub const TRANSMIT_PERIOD: Duration = Duration::from_millis(10);

/// Default number of packets between status log messages
pub const STATUS_INTERVAL_PACKETS: u64 = 1000;

/// What the loop does before the next send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// Wait this long, then send
    Sleep(Duration),
    /// Deadline was rebased to now; send immediately
    Resync,
}

/// Deadline bookkeeping for the transmit loop
///
/// Times are offsets from the moment the loop started.
#[derive(Debug, Clone)]
pub struct Pacer {
    period: Duration,
    next_deadline: Duration,
}

impl Pacer {
    /// Create a pacer whose first deadline is one period after start
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_deadline: period,
        }
    }

    /// Decide how to reach the next deadline from `now`
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use joystick_remote::scheduler::{Pace, Pacer};
    ///
    /// let mut pacer = Pacer::new(Duration::from_millis(10));
    /// assert_eq!(pacer.plan(Duration::from_millis(4)), Pace::Sleep(Duration::from_millis(6)));
    /// assert_eq!(pacer.plan(Duration::from_millis(35)), Pace::Resync);
    /// ```
    pub fn plan(&mut self, now: Duration) -> Pace {
        let limit = self.period * 2;

        if now > self.next_deadline {
            if now - self.next_deadline > limit {
                self.next_deadline = now;
                return Pace::Resync;
            }
            Pace::Sleep(Duration::ZERO)
        } else {
            let ahead = self.next_deadline - now;
            if ahead > limit {
                self.next_deadline = now;
                return Pace::Resync;
            }
            Pace::Sleep(ahead)
        }
    }

    /// Move the deadline one period forward
    pub fn advance(&mut self) {
        self.next_deadline += self.period;
    }

    /// Current deadline, as an offset from start
    pub fn next_deadline(&self) -> Duration {
        self.next_deadline
    }

    /// Transmit period
    pub fn period(&self) -> Duration {
        self.period
    }
}

/// Periodic packet transmitter
pub struct Transmitter<S: FrameSink> {
    state: Arc<ControlState>,
    sink: S,
    pacer: Pacer,
    status_interval: u64,
    packets_sent: u64,
}

impl<S: FrameSink> Transmitter<S> {
    /// Create a transmitter
    ///
    /// # Arguments
    ///
    /// * `state` - Control state written by the capture loop
    /// * `sink` - Packet destination
    /// * `period` - Transmit period
    /// * `status_interval` - Packets between status log messages (0 disables)
    pub fn new(state: Arc<ControlState>, sink: S, period: Duration, status_interval: u64) -> Self {
        Self {
            state,
            sink,
            pacer: Pacer::new(period),
            status_interval,
            packets_sent: 0,
        }
    }

    /// Run until the capture loop reports a fatal error
    ///
    /// Never returns `Ok`; the caller ends the loop by dropping the future
    /// (e.g. from a `select!` on Ctrl+C).
    ///
    /// # Errors
    ///
    /// Returns the capture loop's error, or `DeviceDisconnected` if the capture
    /// thread went away without reporting one.
    pub async fn run(&mut self, mut failure: CaptureFailure) -> Result<()> {
        let start = Instant::now();
        info!(
            "Starting transmission loop at {}Hz",
            1000 / self.pacer.period().as_millis().max(1)
        );

        loop {
            let wait = match self.pacer.plan(start.elapsed()) {
                Pace::Sleep(wait) => wait,
                Pace::Resync => {
                    warn!(
                        "Transmit loop drifted more than {:?}, resyncing",
                        self.pacer.period() * 2
                    );
                    Duration::ZERO
                }
            };

            tokio::select! {
                biased;

                result = &mut failure => {
                    return Err(result.unwrap_or_else(|_| {
                        JoystickRemoteError::DeviceDisconnected("capture thread exited".to_string())
                    }));
                }

                _ = sleep(wait) => {}
            }

            self.send_once(start.elapsed()).await;
            self.pacer.advance();
        }
    }

    /// Snapshot the control state and send one packet stamped with `elapsed`
    pub async fn send_once(&mut self, elapsed: Duration) {
        let set = self.state.snapshot();
        let timestamp_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        let packet = RcPacket::new(timestamp_us, &set.to_array());

        self.sink.send(&packet).await;
        self.packets_sent += 1;
        debug!("Packet {} at {}us: {:?}", self.packets_sent, timestamp_us, set);

        if self.status_interval > 0 && self.packets_sent % self.status_interval == 0 {
            info!(
                "Sent {} packets (roll {}, pitch {}, throttle {}, yaw {}, mode {})",
                self.packets_sent, set.roll, set.pitch, set.throttle, set.yaw, set.mode
            );
        }
    }

    /// Number of packets handed to the sink
    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    /// Shared control state read by the loop
    pub fn state(&self) -> Arc<ControlState> {
        Arc::clone(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::sink::mocks::RecordingSink;
    use crate::state::{Channel, ChannelUpdate};
    use tokio::sync::oneshot;

    const PERIOD: Duration = Duration::from_millis(10);

    #[test]
    fn test_first_deadline_is_one_period() {
        let pacer = Pacer::new(PERIOD);
        assert_eq!(pacer.next_deadline(), PERIOD);
    }

    #[test]
    fn test_plan_sleeps_until_deadline() {
        let mut pacer = Pacer::new(PERIOD);
        assert_eq!(pacer.plan(Duration::ZERO), Pace::Sleep(PERIOD));
        assert_eq!(pacer.plan(Duration::from_millis(7)), Pace::Sleep(Duration::from_millis(3)));
    }

    #[test]
    fn test_plan_slightly_behind_sleeps_zero() {
        let mut pacer = Pacer::new(PERIOD);
        // 1.5 periods behind the 10ms deadline
        assert_eq!(pacer.plan(Duration::from_millis(25)), Pace::Sleep(Duration::ZERO));
        assert_eq!(pacer.next_deadline(), PERIOD);
    }

    #[test]
    fn test_plan_far_behind_resyncs() {
        let mut pacer = Pacer::new(PERIOD);
        let now = Duration::from_millis(35);

        assert_eq!(pacer.plan(now), Pace::Resync);
        assert_eq!(pacer.next_deadline(), now);

        pacer.advance();
        assert_eq!(pacer.next_deadline(), now + PERIOD);
    }

    #[test]
    fn test_plan_exactly_two_periods_behind_does_not_resync() {
        let mut pacer = Pacer::new(PERIOD);
        assert_eq!(pacer.plan(Duration::from_millis(30)), Pace::Sleep(Duration::ZERO));
    }

    #[test]
    fn test_plan_far_ahead_resyncs() {
        let mut pacer = Pacer::new(PERIOD);
        for _ in 0..10 {
            pacer.advance();
        }
        assert_eq!(pacer.plan(Duration::from_millis(5)), Pace::Resync);
        assert_eq!(pacer.next_deadline(), Duration::from_millis(5));
    }

    #[test]
    fn test_late_wakeup_is_made_up() {
        let mut pacer = Pacer::new(PERIOD);
        // Woke 4ms late for the first deadline
        assert_eq!(pacer.plan(Duration::from_millis(14)), Pace::Sleep(Duration::ZERO));
        pacer.advance();
        // Next deadline stays on the 10ms grid
        assert_eq!(pacer.plan(Duration::from_millis(14)), Pace::Sleep(Duration::from_millis(6)));
    }

    #[tokio::test]
    async fn test_send_once_uses_snapshot() {
        let state = Arc::new(ControlState::new(1500));
        state.apply(ChannelUpdate::new(Channel::Roll, 1900));
        state.apply(ChannelUpdate::new(Channel::Mode, 1685));

        let sink = RecordingSink::new();
        let mut transmitter = Transmitter::new(Arc::clone(&state), sink.clone(), PERIOD, 0);
        transmitter.send_once(Duration::from_micros(12_345)).await;

        let packets = sink.get_packets();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].timestamp_us, 12_345);
        assert_eq!(&packets[0].pwms[..5], &[1900, 1500, 1500, 1500, 1685]);
        assert!(packets[0].pwms[5..].iter().all(|&pwm| pwm == 0));
        assert_eq!(transmitter.packets_sent(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_sends_until_capture_fails() {
        let state = Arc::new(ControlState::new(1500));
        let sink = RecordingSink::new();
        let mut transmitter = Transmitter::new(state, sink.clone(), PERIOD, 2);

        let (failure_tx, failure_rx) = oneshot::channel();
        tokio::spawn(async move {
            sleep(Duration::from_millis(55)).await;
            let _ = failure_tx.send(JoystickRemoteError::DeviceDisconnected("js0".to_string()));
        });

        let result = transmitter.run(failure_rx).await;
        assert!(matches!(result, Err(JoystickRemoteError::DeviceDisconnected(_))));

        let packets = sink.get_packets();
        assert!((4..=6).contains(&packets.len()), "sent {} packets", packets.len());
        assert!(packets.windows(2).all(|w| w[0].timestamp_us < w[1].timestamp_us));
        assert!(packets.iter().all(|p| p.pwms[..5] == [1500; 5]));
    }

    #[test]
    fn test_state_is_shared() {
        let state = Arc::new(ControlState::default());
        let transmitter = Transmitter::new(Arc::clone(&state), RecordingSink::new(), PERIOD, 0);

        transmitter.state().apply(ChannelUpdate::new(Channel::Yaw, 1100));
        assert_eq!(state.snapshot().yaw, 1100);
    }

    #[tokio::test]
    async fn test_run_stops_when_capture_thread_vanishes() {
        let state = Arc::new(ControlState::default());
        let mut transmitter = Transmitter::new(state, RecordingSink::new(), PERIOD, 0);

        let (failure_tx, failure_rx) = oneshot::channel::<JoystickRemoteError>();
        drop(failure_tx);

        match transmitter.run(failure_rx).await {
            Err(JoystickRemoteError::DeviceDisconnected(msg)) => {
                assert_eq!(msg, "capture thread exited");
            }
            other => panic!("Expected DeviceDisconnected, got: {:?}", other),
        }
        assert_eq!(transmitter.packets_sent(), 0);
    }
}
