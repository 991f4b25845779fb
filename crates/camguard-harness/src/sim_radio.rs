//! Simulated radio over turmoil UDP.
//!
//! A real radio broadcasts to whoever is in range. `SimRadio` approximates
//! that with unicast copies to a fixed list of neighbour hosts, so turmoil's
//! latency, loss and partition controls apply per link.

use std::{io, net::SocketAddr};

use bytes::Bytes;
use camguard_core::Environment;
use camguard_station::{
    LowerLayerStatus, MAX_DATAGRAM_SIZE, Received, RxMeta, StationError, Transport,
};
use turmoil::net::UdpSocket;

use crate::SimEnv;

/// Port every simulated radio listens on.
pub const RADIO_PORT: u16 = 4700;

/// Simulated radio of one turmoil host.
pub struct SimRadio {
    socket: UdpSocket,
    neighbours: Vec<SocketAddr>,
    env: SimEnv,
}

impl SimRadio {
    /// Bind [`RADIO_PORT`] on the current host, reaching `neighbours` by
    /// host name.
    ///
    /// Must be called from inside a turmoil host or client.
    pub async fn bind(env: &SimEnv, neighbours: &[&str]) -> io::Result<Self> {
        let socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], RADIO_PORT))).await?;
        let neighbours = neighbours
            .iter()
            .map(|host| SocketAddr::new(turmoil::lookup(*host), RADIO_PORT))
            .collect();

        Ok(Self { socket, neighbours, env: env.clone() })
    }

    /// Addresses this radio transmits to.
    pub fn neighbours(&self) -> &[SocketAddr] {
        &self.neighbours
    }
}

impl Transport for SimRadio {
    async fn send(&self, bytes: &[u8]) -> Result<(), StationError> {
        for neighbour in &self.neighbours {
            self.socket.send_to(bytes, *neighbour).await?;
        }
        Ok(())
    }

    async fn recv(&self) -> Result<Received, StationError> {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        let (len, from) = self.socket.recv_from(&mut buf).await?;
        buf.truncate(len);
        tracing::trace!(%from, len, "simulated datagram received");

        let meta = RxMeta {
            received_at_ms: self.env.wall_clock_secs() * 1000,
            lower_layer: LowerLayerStatus::Unknown,
        };
        Ok(Received { bytes: Bytes::from(buf), meta })
    }
}
