//! Datagram transport for CAMs.
//!
//! Radios deliver whole encoded CAMs, so the transport is datagram-shaped:
//! one `send` per CAM, one `recv` per received CAM. [`UdpTransport`] stands in
//! for the vendor radio caster with UDP broadcast.

use std::{
    collections::VecDeque,
    future::Future,
    net::{IpAddr, SocketAddr},
    sync::{Mutex, PoisonError},
};

use bytes::Bytes;
use camguard_proto::CborCodec;
use tokio::net::UdpSocket;

use crate::error::StationError;

/// Largest datagram accepted, the largest CAM the reference codec produces.
pub const MAX_DATAGRAM_SIZE: usize = CborCodec::MAX_MESSAGE_SIZE;

/// Own broadcasts remembered for loopback suppression.
const LOOPBACK_HISTORY: usize = 16;

/// Verification status reported by a lower security layer, if any.
///
/// Carried for logging only; the CAM envelope is checked independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LowerLayerStatus {
    /// The lower layer does not verify
    #[default]
    Unknown,
    /// The lower layer verified the packet
    Verified,
    /// The lower layer could not verify the packet
    Failed,
}

/// Metadata of a received datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxMeta {
    /// Wall-clock receive time, milliseconds since the Unix epoch
    pub received_at_ms: i64,
    /// Lower-layer verification status
    pub lower_layer: LowerLayerStatus,
}

/// One received datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    /// Encoded CAM
    pub bytes: Bytes,
    /// Receive metadata
    pub meta: RxMeta,
}

/// Datagram transport shared by the send loop and receive workers.
pub trait Transport: Send + Sync + 'static {
    /// Broadcast one encoded CAM.
    ///
    /// # Errors
    ///
    /// Returns an error if the datagram could not be handed to the medium.
    fn send(&self, bytes: &[u8]) -> impl Future<Output = Result<(), StationError>> + Send;

    /// Wait for the next datagram.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium is closed or failed.
    fn recv(&self) -> impl Future<Output = Result<Received, StationError>> + Send;
}

/// UDP broadcast transport.
///
/// A radio never hears its own transmissions, but a UDP broadcast is
/// delivered back to the sending socket. When the target is a broadcast
/// address the transport drops the first received copy of each datagram it
/// sent, so that neither echo detection nor latency sees the loopback copy.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    target: SocketAddr,
    loopback: Option<Mutex<VecDeque<Bytes>>>,
}

impl UdpTransport {
    /// Bind `bind` and send to `target`, with broadcast enabled.
    pub async fn bind(bind: SocketAddr, target: SocketAddr) -> Result<Self, StationError> {
        let socket = UdpSocket::bind(bind).await?;
        socket.set_broadcast(true)?;

        let loopback = is_broadcast(target.ip()).then(|| Mutex::new(VecDeque::new()));
        tracing::info!(%bind, %target, broadcast = loopback.is_some(), "UDP transport bound");

        Ok(Self { socket, target, loopback })
    }

    fn remember_sent(&self, bytes: &[u8]) {
        if let Some(history) = &self.loopback {
            let mut history = history.lock().unwrap_or_else(PoisonError::into_inner);
            if history.len() == LOOPBACK_HISTORY {
                history.pop_front();
            }
            history.push_back(Bytes::copy_from_slice(bytes));
        }
    }

    /// True if `bytes` is our own broadcast coming back; consumes the entry.
    fn is_own_loopback(&self, bytes: &[u8]) -> bool {
        let Some(history) = &self.loopback else {
            return false;
        };
        let mut history = history.lock().unwrap_or_else(PoisonError::into_inner);
        match history.iter().position(|sent| sent.as_ref() == bytes) {
            Some(index) => {
                history.remove(index);
                true
            },
            None => false,
        }
    }

    /// Local address of the socket.
    pub fn local_addr(&self) -> Result<SocketAddr, StationError> {
        Ok(self.socket.local_addr()?)
    }
}

impl Transport for UdpTransport {
    async fn send(&self, bytes: &[u8]) -> Result<(), StationError> {
        let sent = self.socket.send_to(bytes, self.target).await?;
        if sent != bytes.len() {
            return Err(StationError::Transport(format!(
                "short send: {sent} of {} bytes",
                bytes.len()
            )));
        }
        self.remember_sent(bytes);
        Ok(())
    }

    async fn recv(&self) -> Result<Received, StationError> {
        loop {
            let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
            let (len, from) = self.socket.recv_from(&mut buf).await?;
            buf.truncate(len);

            if self.is_own_loopback(&buf) {
                tracing::trace!(%from, len, "dropped own broadcast");
                continue;
            }
            tracing::trace!(%from, len, "datagram received");

            let meta =
                RxMeta { received_at_ms: wall_clock_ms(), lower_layer: LowerLayerStatus::Unknown };
            return Ok(Received { bytes: Bytes::from(buf), meta });
        }
    }
}

/// Limited broadcast, or an IPv4 address ending in .255.
fn is_broadcast(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_broadcast() || v4.octets()[3] == 255,
        IpAddr::V6(_) => false,
    }
}

#[allow(clippy::disallowed_methods)]
fn wall_clock_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
