//! Message-level sealing and opening of CAMs.
//!
//! [`SecurityLayer`] sits between the application and the carrier codec. On
//! transmit it encodes the CAM without a low-frequency container, seals those
//! bytes, installs the envelope as the path history and encodes again. On
//! receive it undoes exactly that: remove the container, encode the rest and
//! check the envelope against the result.
//!
//! # Invariants
//!
//! - The authenticated payload never contains a low-frequency container, so
//!   the receiver reconstructs it by removal alone
//! - Messages carrying the local station id are echoes and skip verification
//! - Nothing here panics; every failure is returned or reported as a status

use camguard_crypto::Pseudonym;
use camguard_proto::{
    Cam, CarrierCodec, LowFrequencyContainer, VehicleRole,
    slots::{from_path_points, to_path_points},
};

use crate::{
    env::Environment,
    error::SecurityError,
    policy::{AcceptancePolicy, Disposition},
    scheme::{Scheme, SchemeId, VerificationReport},
    timestamp::{Freshness, Timestamp32},
};

/// Low-frequency container fields sent next to the envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LowFrequencyProfile {
    /// Vehicle role
    pub vehicle_role: VehicleRole,
    /// Exterior lights bit string
    pub exterior_lights: u8,
}

/// Bytes ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedCam {
    /// Encoded CAM
    pub bytes: Vec<u8>,
    /// Whether an envelope made it into `bytes`
    pub status: SealStatus,
}

/// Result of attaching an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SealStatus {
    /// Envelope attached
    Sealed {
        /// Scheme used
        scheme: SchemeId,
        /// Pseudonym in the envelope
        pseudonym: Pseudonym,
        /// Timestamp in the envelope
        timestamp: Timestamp32,
    },
    /// Augmented encode failed; the plain CAM was encoded instead
    Unsealed(SecurityError),
    /// No scheme configured
    Disabled,
}

/// How far verification of a peer message got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Security disabled locally; nothing was checked
    Unsecured,
    /// Envelope checked; see the report for freshness and verdict
    Checked(VerificationReport),
    /// Envelope missing, malformed or not reproducible
    CannotVerify(SecurityError),
}

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Our own transmission came back
    Echo {
        /// Generation delta time of the echoed message
        generation_delta_time: u16,
    },
    /// Message from another station
    Peer {
        /// The CAM, without the security container
        cam: Cam,
        /// Verification outcome
        outcome: Outcome,
        /// Policy decision
        disposition: Disposition,
    },
}

/// Seals outgoing and opens incoming CAMs for one station.
#[derive(Debug, Clone)]
pub struct SecurityLayer<C: CarrierCodec> {
    codec: C,
    scheme: Scheme,
    policy: AcceptancePolicy,
    station_id: u32,
    profile: LowFrequencyProfile,
}

impl<C: CarrierCodec> SecurityLayer<C> {
    /// Layer for `station_id` with the permissive policy and default profile.
    pub fn new(codec: C, scheme: Scheme, station_id: u32) -> Self {
        Self {
            codec,
            scheme,
            policy: AcceptancePolicy::default(),
            station_id,
            profile: LowFrequencyProfile::default(),
        }
    }

    /// Replace the acceptance policy.
    #[must_use]
    pub fn with_policy(mut self, policy: AcceptancePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the low-frequency profile.
    #[must_use]
    pub fn with_profile(mut self, profile: LowFrequencyProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Local station id.
    pub fn station_id(&self) -> u32 {
        self.station_id
    }

    /// Configured scheme.
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Configured policy.
    pub fn policy(&self) -> AcceptancePolicy {
        self.policy
    }

    /// The carrier codec.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Encode `cam` for transmission, sealed with the configured scheme.
    ///
    /// Any low-frequency container on `cam` is replaced by the envelope.
    ///
    /// # Errors
    ///
    /// `SecurityError::Encoding` if the CAM cannot be encoded even without
    /// the envelope. A failure to encode the augmented CAM is not an error:
    /// the plain bytes are returned with [`SealStatus::Unsealed`].
    pub fn seal_cam<E: Environment>(&self, cam: &Cam, env: &E) -> Result<SealedCam, SecurityError> {
        if matches!(self.scheme, Scheme::Disabled) {
            let bytes = self.codec.encode(cam).map_err(SecurityError::Encoding)?;
            return Ok(SealedCam { bytes, status: SealStatus::Disabled });
        }

        let mut cam = cam.clone();
        if cam.take_low_frequency().is_some() {
            tracing::debug!(station_id = self.station_id, "replacing low-frequency container");
        }

        let payload = self.codec.encode(&cam).map_err(SecurityError::Encoding)?;
        let sealed = self.scheme.seal(&payload, env.timestamp(), env)?;

        cam.parameters.low_frequency_container = Some(LowFrequencyContainer {
            vehicle_role: self.profile.vehicle_role,
            exterior_lights: self.profile.exterior_lights,
            path_history: to_path_points(&sealed.slots),
        });

        match self.codec.encode(&cam) {
            Ok(bytes) => {
                tracing::debug!(
                    station_id = self.station_id,
                    scheme = %sealed.scheme,
                    timestamp = %sealed.timestamp,
                    "sealed CAM"
                );
                Ok(SealedCam {
                    bytes,
                    status: SealStatus::Sealed {
                        scheme: sealed.scheme,
                        pseudonym: sealed.pseudonym,
                        timestamp: sealed.timestamp,
                    },
                })
            },
            Err(err) => {
                tracing::error!(
                    station_id = self.station_id,
                    error = %err,
                    "envelope discarded, sending CAM unsealed"
                );
                let status = SealStatus::Unsealed(SecurityError::Encoding(err));
                Ok(SealedCam { bytes: payload, status })
            },
        }
    }

    /// Decode and check received bytes.
    ///
    /// # Errors
    ///
    /// `SecurityError::Decoding` if `bytes` are not a CAM. Every other
    /// condition is reported in the returned [`Inbound`].
    pub fn open_cam<E: Environment>(
        &self,
        bytes: &[u8],
        env: &E,
    ) -> Result<Inbound, SecurityError> {
        let mut cam = self.codec.decode(bytes).map_err(SecurityError::Decoding)?;

        if cam.station_id() == self.station_id {
            return Ok(Inbound::Echo { generation_delta_time: cam.generation_delta_time });
        }

        if matches!(self.scheme, Scheme::Disabled) {
            return Ok(Inbound::Peer {
                cam,
                outcome: Outcome::Unsecured,
                disposition: Disposition::Deliver,
            });
        }

        let local = env.timestamp();
        let peer = cam.station_id();
        let (outcome, disposition) = match self.check(&mut cam, local) {
            Ok(report) => {
                log_report(peer, &report, local);
                let disposition = self.policy.decide(&report, local);
                (Outcome::Checked(report), disposition)
            },
            Err(err) => {
                tracing::warn!(
                    station_id = peer,
                    scheme = %self.scheme.id(),
                    error = %err,
                    "cannot verify CAM"
                );
                let disposition = self.policy.decide_unchecked(&err);
                (Outcome::CannotVerify(err), disposition)
            },
        };

        Ok(Inbound::Peer { cam, outcome, disposition })
    }

    /// Strip the envelope from `cam` and verify it against the re-encoded rest.
    fn check(
        &self,
        cam: &mut Cam,
        local: Timestamp32,
    ) -> Result<VerificationReport, SecurityError> {
        let expected = self.scheme.slot_count();
        let container = cam
            .take_low_frequency()
            .ok_or(SecurityError::MalformedEnvelope { expected, actual: 0 })?;

        if container.path_history.len() != expected {
            return Err(SecurityError::MalformedEnvelope {
                expected,
                actual: container.path_history.len(),
            });
        }

        let slots = from_path_points(&container.path_history)?;
        let payload = self.codec.encode(cam).map_err(SecurityError::Encoding)?;
        self.scheme.verify(&slots, &payload, local)
    }
}

fn log_report(station_id: u32, report: &VerificationReport, local: Timestamp32) {
    if let Freshness::Stale { skew } = report.freshness {
        tracing::warn!(
            station_id,
            scheme = %report.scheme,
            skew,
            received = %report.timestamp,
            local = %local,
            "stale timestamp"
        );
    }

    if report.is_verified() {
        tracing::debug!(
            station_id,
            scheme = %report.scheme,
            pseudonym = ?report.pseudonym,
            "verified"
        );
    } else {
        tracing::warn!(
            station_id,
            scheme = %report.scheme,
            pseudonym = ?report.pseudonym,
            "tag mismatch"
        );
    }
}
