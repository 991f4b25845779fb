//! Camguard security core.
//!
//! Pseudonymous authentication for CAMs without changing their declared wire
//! format. A sender seals the encoded CAM into a fixed-size envelope and
//! carries that envelope as the path history of the low-frequency container;
//! a receiver removes the container, re-encodes the rest and checks the
//! envelope against it.
//!
//! # Architecture
//!
//! All logic is synchronous and pure given its inputs. Time and randomness
//! come from an [`Environment`], so the same code runs against real clocks in
//! a station and against virtual clocks and a seeded RNG in tests.
//!
//! # Components
//!
//! - [`Scheme`]: the configured scheme (disabled, hash chain, regional)
//! - [`HashChainEnvelope`], [`RegionalEnvelope`]: fixed byte layouts
//! - [`AcceptancePolicy`]: what happens to stale or unverified messages
//! - [`SecurityLayer`]: message-level seal/open over a [`CarrierCodec`]
//!
//! [`CarrierCodec`]: camguard_proto::CarrierCodec

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
pub mod envelope;
pub mod error;
pub mod policy;
pub mod scheme;
pub mod security;
pub mod timestamp;

#[cfg(test)]
mod testing;

pub use env::Environment;
pub use envelope::{HASH_CHAIN_TAG_SIZE, HashChainEnvelope, REGIONAL_TAG_SIZE, RegionalEnvelope};
pub use error::SecurityError;
pub use policy::{AcceptancePolicy, Disposition};
pub use scheme::{
    EnvelopeScheme, HashChainScheme, PoolSelection, RegionalScheme, Scheme, SchemeId,
    SealedEnvelope, VerificationReport, Verdict,
};
pub use security::{
    Inbound, LowFrequencyProfile, Outcome, SealStatus, SealedCam, SecurityLayer,
};
pub use timestamp::{FRESHNESS_WINDOW_SECS, Freshness, Timestamp32};
