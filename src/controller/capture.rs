//! # Input Capture Loop
//!
//! Runs the blocking device read loop on a dedicated thread.
//!
//! Each event goes through the [`ChannelMapper`] and, if it maps to a channel,
//! into [`ControlState`]. A device hang-up or read error ends the loop; the
//! error is handed to the transmission loop through a oneshot channel so the
//! process shuts down from the main task instead of from the worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::oneshot;
use tracing::{debug, error, info};

use super::channel_mapper::ChannelMapper;
use super::event::{EventSource, RawEvent};
use crate::error::{JoystickRemoteError, Result};
use crate::state::ControlState;

/// Name of the capture thread, visible in debuggers and `top -H`.
const CAPTURE_THREAD_NAME: &str = "joystick-capture";

/// Receiving end of the capture loop's fatal error.
pub type CaptureFailure = oneshot::Receiver<JoystickRemoteError>;

/// Handle to the running capture thread.
///
/// Dropping the handle requests shutdown but does not join: the thread may be
/// blocked in a device read that only returns on the next event.
#[derive(Debug)]
pub struct InputCapture {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl InputCapture {
    /// Start the capture loop
    ///
    /// # Arguments
    ///
    /// * `source` - Opened input device
    /// * `mapper` - Lookup tables for the active profile
    /// * `state` - Shared control state written by the loop
    ///
    /// # Returns
    ///
    /// The thread handle and the receiver that yields the error that ended the
    /// loop.
    ///
    /// # Errors
    ///
    /// Returns `Io` error if the thread cannot be spawned.
    pub fn spawn(
        mut source: Box<dyn EventSource>,
        mapper: Arc<ChannelMapper>,
        state: Arc<ControlState>,
    ) -> Result<(Self, CaptureFailure)> {
        let (failure_tx, failure_rx) = oneshot::channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name(CAPTURE_THREAD_NAME.to_string())
            .spawn(move || {
                debug!("Starting joystick event listener");
                match run_capture(source.as_mut(), &mapper, &state, &stop) {
                    Ok(()) => info!("Joystick event listener stopped"),
                    Err(e) => {
                        error!("Joystick event listener failed: {}", e);
                        // Receiver is gone only when the transmit loop already ended
                        let _ = failure_tx.send(e);
                    }
                }
            })?;

        Ok((
            Self {
                handle: Some(handle),
                shutdown,
            },
            failure_rx,
        ))
    }

    /// Ask the loop to stop after the next event.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Returns true once the capture thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the capture thread to exit.
    ///
    /// Blocks until the device delivers another event or fails.
    ///
    /// # Errors
    ///
    /// Returns `Device` error if the capture thread panicked.
    pub fn join(mut self) -> Result<()> {
        self.shutdown();
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| JoystickRemoteError::Device("capture thread panicked".to_string())),
            None => Ok(()),
        }
    }
}

impl Drop for InputCapture {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Blocking capture loop
///
/// Returns `Ok(())` when shutdown was requested, or the error that ended it.
pub fn run_capture(
    source: &mut dyn EventSource,
    mapper: &ChannelMapper,
    state: &ControlState,
    shutdown: &AtomicBool,
) -> Result<()> {
    while !shutdown.load(Ordering::Acquire) {
        let event = source.next_event()?;
        process_event(mapper, state, &event);
    }
    Ok(())
}

/// Apply one raw event to the control state
///
/// Returns true if a channel was written.
pub fn process_event(mapper: &ChannelMapper, state: &ControlState, event: &RawEvent) -> bool {
    debug!("Event {:?} #{} = {}", event.kind, event.number, event.value);
    match mapper.map_event(event) {
        Some(update) => {
            state.apply(update);
            true
        }
        None => false,
    }
}
