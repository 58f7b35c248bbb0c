//! # Remote Transport Module
//!
//! Sends RC input packets to the vehicle over UDP.
//!
//! This module handles:
//! - Splitting and resolving the `host:port` destination
//! - Binding a UDP socket of the destination's address family
//! - Fire-and-forget transmission, one datagram per packet
//! - The local simulation display used instead of the network

pub mod console;
pub mod sink;

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::{lookup_host, UdpSocket};
use tracing::{debug, info, warn};

use crate::error::{JoystickRemoteError, Result};
use crate::rcinput::encoder::encode_rc_packet;
use crate::rcinput::protocol::RcPacket;
use sink::FrameSink;

/// UDP RC input sender
///
/// Owns the socket and the destination resolved at startup.
pub struct UdpRemote {
    /// Unconnected socket bound to an ephemeral port
    socket: UdpSocket,
    /// Destination resolved once at startup
    destination: SocketAddr,
    /// Datagrams that failed to send
    send_failures: u64,
}

impl std::fmt::Debug for UdpRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpRemote")
            .field("destination", &self.destination)
            .field("send_failures", &self.send_failures)
            .finish_non_exhaustive()
    }
}

impl UdpRemote {
    /// Resolve the destination and open the socket
    ///
    /// # Arguments
    ///
    /// * `remote` - Destination as `host:port` (IPv6 hosts may be bracketed)
    ///
    /// # Errors
    ///
    /// Returns `Remote` error if the port is missing or invalid, the host does
    /// not resolve, or the socket cannot be bound.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joystick_remote::remote::UdpRemote;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let remote = UdpRemote::connect("192.168.1.1:777").await?;
    ///     println!("Sending to {}", remote.destination());
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(remote: &str) -> Result<Self> {
        let (host, port) = split_host_port(remote)?;
        debug!("remote addr: {}, remote port: {}", host, port);

        let destination = lookup_host((host, port))
            .await
            .map_err(|e| JoystickRemoteError::Remote(format!("Failed to resolve {}: {}", host, e)))?
            .next()
            .ok_or_else(|| JoystickRemoteError::Remote(format!("No address found for {}", host)))?;

        let bind_addr: SocketAddr = if destination.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| JoystickRemoteError::Remote(format!("Failed to bind UDP socket: {}", e)))?;

        info!("Sending RC input packets to {}", destination);

        Ok(Self {
            socket,
            destination,
            send_failures: 0,
        })
    }

    /// Send one packet as a single datagram
    ///
    /// # Errors
    ///
    /// Returns `Io` error if the datagram could not be sent.
    pub async fn send_packet(&self, packet: &RcPacket) -> Result<()> {
        let bytes = encode_rc_packet(packet);
        self.socket.send_to(&bytes, self.destination).await?;
        Ok(())
    }

    /// Get the resolved destination address
    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// Get the number of datagrams that failed to send
    pub fn send_failures(&self) -> u64 {
        self.send_failures
    }
}

impl FrameSink for UdpRemote {
    async fn send(&mut self, packet: &RcPacket) {
        // A dropped frame is superseded by the next one; never retry
        if let Err(e) = self.send_packet(packet).await {
            self.send_failures += 1;
            warn!("Failed to send packet to {}: {}", self.destination, e);
        }
    }
}

/// Split a `host:port` destination
///
/// Splits at the last colon; a bracketed IPv6 host loses its brackets.
///
/// # Errors
///
/// Returns `Remote` error if there is no colon, the host is empty, or the port
/// is not a number in 0-65535.
///
/// # Examples
///
/// ```
/// use joystick_remote::remote::split_host_port;
///
/// assert_eq!(split_host_port("192.168.1.1:777")?, ("192.168.1.1", 777));
/// assert_eq!(split_host_port("[::1]:14550")?, ("::1", 14550));
/// assert!(split_host_port("192.168.1.1").is_err());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn split_host_port(remote: &str) -> Result<(&str, u16)> {
    let (host, port) = remote
        .rsplit_once(':')
        .ok_or_else(|| JoystickRemoteError::Remote(format!("No port specified in \"{}\"", remote)))?;

    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    if host.is_empty() {
        return Err(JoystickRemoteError::Remote(format!(
            "No host specified in \"{}\"",
            remote
        )));
    }

    let port = port
        .parse::<u16>()
        .map_err(|_| JoystickRemoteError::Remote(format!("Invalid port \"{}\"", port)))?;

    Ok((host, port))
}
