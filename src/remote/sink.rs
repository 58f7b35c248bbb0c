//! Trait abstraction over packet outputs so the transmission loop can drive
//! the network sender, the simulation display, or a test recorder.

use crate::rcinput::protocol::RcPacket;

/// Destination for scheduled RC packets
///
/// `send` is fire-and-forget: implementations report failures themselves and
/// never ask the caller to retry.
#[allow(async_fn_in_trait)]
pub trait FrameSink {
    /// Deliver one packet
    async fn send(&mut self, packet: &RcPacket);
}
