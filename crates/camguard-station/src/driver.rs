//! Station driver.
//!
//! Sans-IO core of a station. It builds outgoing CAMs and turns each received
//! datagram into [`StationAction`]s; the runtime in [`crate::Station`]
//! executes them against a transport and the shared counters.

use bytes::Bytes;
use camguard_core::{
    Disposition, Environment, Inbound, Outcome, SealedCam, SecurityError, SecurityLayer,
};
use camguard_proto::{Cam, CarrierCodec};

use crate::{config::Mode, profile::StationProfile};

/// Generation delta time cycles through this many values.
pub const GENERATION_CYCLE: u64 = 1000;

/// Actions that the station driver produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationAction {
    /// Hand a peer CAM to the application
    Deliver {
        /// CAM without the security container
        cam: Cam,
        /// Verification outcome
        outcome: Outcome,
    },

    /// Peer CAM dropped by the acceptance policy
    Reject {
        /// Originating station
        station_id: u32,
        /// Verification outcome
        outcome: Outcome,
        /// Rejection reason
        reason: SecurityError,
    },

    /// Datagram is not a CAM
    Discard {
        /// Decode failure
        reason: SecurityError,
    },

    /// Re-broadcast the received bytes unchanged
    Echo {
        /// Datagram as received
        bytes: Bytes,
    },

    /// Our own CAM came back; time it
    RecordRoundTrip {
        /// Generation delta time of the echoed CAM
        generation_delta_time: u16,
    },

    /// Log a message
    Log {
        /// Log level
        level: LogLevel,
        /// Message to log
        message: String,
    },
}

/// Log levels for station actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational message
    Info,
    /// Warning
    Warn,
}

/// Action-based station driver.
///
/// Immutable after construction, so one instance is shared by the send loop
/// and every receive worker.
#[derive(Debug, Clone)]
pub struct StationDriver<C: CarrierCodec> {
    layer: SecurityLayer<C>,
    profile: StationProfile,
    mode: Mode,
}

impl<C: CarrierCodec> StationDriver<C> {
    /// Driver for `profile` in `mode`.
    ///
    /// The layer should be built for `profile.station_id`, otherwise own
    /// echoes are treated as peer traffic.
    pub fn new(layer: SecurityLayer<C>, profile: StationProfile, mode: Mode) -> Self {
        if layer.station_id() != profile.station_id {
            tracing::warn!(
                layer = layer.station_id(),
                profile = profile.station_id,
                "security layer and profile disagree on station id"
            );
        }
        Self { layer, profile, mode }
    }

    /// The security layer.
    pub fn layer(&self) -> &SecurityLayer<C> {
        &self.layer
    }

    /// Operating mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Generation delta time of the `tx_count`-th CAM.
    pub fn generation_delta_time(tx_count: u64) -> u16 {
        (tx_count % GENERATION_CYCLE) as u16
    }

    /// Unsealed CAM for the `tx_count`-th transmission.
    pub fn build_cam(&self, tx_count: u64) -> Cam {
        self.profile.build_cam(Self::generation_delta_time(tx_count))
    }

    /// Attach the security envelope to `cam`.
    pub fn seal<E: Environment>(&self, cam: &Cam, env: &E) -> Result<SealedCam, SecurityError> {
        self.layer.seal_cam(cam, env)
    }

    /// Build and seal the `tx_count`-th CAM.
    pub fn next_cam<E: Environment>(
        &self,
        tx_count: u64,
        env: &E,
    ) -> Result<SealedCam, SecurityError> {
        self.seal(&self.build_cam(tx_count), env)
    }

    /// Decode and check one received datagram.
    pub fn open<E: Environment>(&self, bytes: &[u8], env: &E) -> Result<Inbound, SecurityError> {
        self.layer.open_cam(bytes, env)
    }

    /// Process one received datagram.
    pub fn handle_datagram<E: Environment>(&self, bytes: &Bytes, env: &E) -> Vec<StationAction> {
        self.actions_for(bytes, self.open(bytes, env))
    }

    /// Actions for a datagram already passed through [`Self::open`].
    pub fn actions_for(
        &self,
        bytes: &Bytes,
        opened: Result<Inbound, SecurityError>,
    ) -> Vec<StationAction> {
        match opened {
            Err(reason) => {
                let message = format!("discarding datagram of {} bytes: {reason}", bytes.len());
                vec![
                    StationAction::Discard { reason },
                    StationAction::Log { level: LogLevel::Warn, message },
                ]
            },
            Ok(Inbound::Echo { generation_delta_time }) => {
                if self.mode.measures_latency() {
                    vec![StationAction::RecordRoundTrip { generation_delta_time }]
                } else {
                    vec![StationAction::Log {
                        level: LogLevel::Debug,
                        message: format!("own CAM {generation_delta_time} heard back"),
                    }]
                }
            },
            Ok(Inbound::Peer { cam, outcome, disposition }) => {
                let mut actions = Vec::with_capacity(2);
                match disposition {
                    Disposition::Deliver => actions.push(StationAction::Deliver { cam, outcome }),
                    Disposition::Reject(reason) => actions.push(StationAction::Reject {
                        station_id: cam.station_id(),
                        outcome,
                        reason,
                    }),
                }
                if self.mode.echoes_peers() {
                    actions.push(StationAction::Echo { bytes: bytes.clone() });
                }
                actions
            },
        }
    }
}
