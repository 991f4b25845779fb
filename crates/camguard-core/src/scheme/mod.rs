//! Security schemes.
//!
//! The closed set of schemes is modeled as a tagged variant, [`Scheme`], with
//! one `seal`/`verify` interface. Each enabled variant implements
//! [`EnvelopeScheme`] over its own envelope layout.
//!
//! # Sealing
//!
//! ```text
//! RawPayload ──┐
//! Timestamp ───┼──> pseudonym + tag ──> envelope bytes ──> slots
//! Key material ┘
//! ```
//!
//! # Verification
//!
//! Slots are unpacked, the envelope is parsed, freshness is computed and the
//! tag is recomputed over the reconstructed payload. A stale timestamp or a
//! tag mismatch is reported in the [`VerificationReport`], never as an error;
//! deciding what to do with such messages is the job of the acceptance
//! policy. Errors are reserved for envelopes that cannot be checked at all.

mod hash_chain;
mod regional;

use std::fmt;

use camguard_crypto::Pseudonym;
use camguard_proto::{Slot, unpack};
pub use hash_chain::{HashChainScheme, PoolSelection};
pub use regional::RegionalScheme;

use crate::{
    env::Environment,
    error::SecurityError,
    timestamp::{Freshness, Timestamp32},
};

/// Out-of-band scheme selector, configured identically on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemeId {
    /// No envelope is attached or checked
    Disabled,
    /// Pseudonym and MAC key drawn from a shared pool
    HashChain,
    /// Derived pseudonym and a shared regional key
    Regional,
}

impl SchemeId {
    /// Numeric selector.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Disabled => 0,
            Self::HashChain => 1,
            Self::Regional => 2,
        }
    }
}

impl TryFrom<u8> for SchemeId {
    type Error = SecurityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::HashChain),
            2 => Ok(Self::Regional),
            other => Err(SecurityError::UnknownScheme(other)),
        }
    }
}

impl fmt::Display for SchemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disabled => "disabled",
            Self::HashChain => "hash-chain",
            Self::Regional => "regional",
        })
    }
}

/// An envelope packed into slots, ready for the path history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedEnvelope {
    /// Scheme that produced the envelope
    pub scheme: SchemeId,
    /// Pseudonym carried by the envelope
    pub pseudonym: Pseudonym,
    /// Timestamp carried by the envelope
    pub timestamp: Timestamp32,
    /// Packed envelope
    pub slots: Vec<Slot>,
}

impl SealedEnvelope {
    /// Envelope bytes, as recovered by a receiver.
    pub fn to_bytes(&self) -> Vec<u8> {
        unpack(&self.slots)
    }
}

/// Outcome of the tag comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Recomputed tag equals the received tag
    Verified,
    /// Tags differ
    Unverified,
}

/// Everything learned from a checkable envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationReport {
    /// Scheme used for the check
    pub scheme: SchemeId,
    /// Pseudonym carried by the envelope
    pub pseudonym: Pseudonym,
    /// Timestamp carried by the envelope
    pub timestamp: Timestamp32,
    /// Envelope timestamp compared with the local clock
    pub freshness: Freshness,
    /// Tag comparison
    pub verdict: Verdict,
}

impl VerificationReport {
    /// Returns true if the tag matched. Freshness is not considered.
    pub fn is_verified(&self) -> bool {
        self.verdict == Verdict::Verified
    }

    /// Conditions worth reporting, in verification order.
    pub fn findings(&self, local: Timestamp32) -> Vec<SecurityError> {
        let mut findings = Vec::new();
        if !self.freshness.is_fresh() {
            findings.push(SecurityError::StaleTimestamp {
                received: self.timestamp.secs(),
                local: local.secs(),
            });
        }
        if self.verdict == Verdict::Unverified {
            findings.push(SecurityError::TagMismatch);
        }
        findings
    }
}

/// One envelope layout with its build and verify procedures.
pub trait EnvelopeScheme {
    /// Selector of this scheme.
    const ID: SchemeId;

    /// Slots occupied by the envelope.
    const SLOT_COUNT: usize;

    /// Build an envelope over `payload`.
    ///
    /// Randomness, if the scheme needs any, comes from `env`.
    fn seal<E: Environment>(
        &self,
        payload: &[u8],
        timestamp: Timestamp32,
        env: &E,
    ) -> Result<SealedEnvelope, SecurityError>;

    /// Check an envelope received with `payload`.
    ///
    /// # Errors
    ///
    /// Only for envelopes that cannot be checked: wrong slot count or an
    /// unknown key index.
    fn open(
        &self,
        slots: &[Slot],
        payload: &[u8],
        local: Timestamp32,
    ) -> Result<VerificationReport, SecurityError>;
}

/// Slot count check shared by both layouts.
fn expect_slots(slots: &[Slot], expected: usize) -> Result<Vec<u8>, SecurityError> {
    if slots.len() != expected {
        return Err(SecurityError::MalformedEnvelope { expected, actual: slots.len() });
    }
    Ok(unpack(slots))
}

/// The configured scheme.
#[derive(Debug, Clone, Default)]
pub enum Scheme {
    /// Messages are sent and accepted without envelope
    #[default]
    Disabled,
    /// Key-pool scheme
    HashChain(HashChainScheme),
    /// Regional-key scheme
    Regional(RegionalScheme),
}

impl Scheme {
    /// Selector of the configured variant.
    pub fn id(&self) -> SchemeId {
        match self {
            Self::Disabled => SchemeId::Disabled,
            Self::HashChain(_) => HashChainScheme::ID,
            Self::Regional(_) => RegionalScheme::ID,
        }
    }

    /// Slots the envelope occupies; zero when disabled.
    pub fn slot_count(&self) -> usize {
        match self {
            Self::Disabled => 0,
            Self::HashChain(_) => HashChainScheme::SLOT_COUNT,
            Self::Regional(_) => RegionalScheme::SLOT_COUNT,
        }
    }

    /// Build an envelope over `payload`.
    ///
    /// # Errors
    ///
    /// `SecurityError::Disabled` when no scheme is configured.
    pub fn seal<E: Environment>(
        &self,
        payload: &[u8],
        timestamp: Timestamp32,
        env: &E,
    ) -> Result<SealedEnvelope, SecurityError> {
        match self {
            Self::Disabled => Err(SecurityError::Disabled),
            Self::HashChain(scheme) => scheme.seal(payload, timestamp, env),
            Self::Regional(scheme) => scheme.seal(payload, timestamp, env),
        }
    }

    /// Check an envelope received with `payload` against the local clock.
    ///
    /// # Errors
    ///
    /// `SecurityError::Disabled` when no scheme is configured, otherwise as
    /// [`EnvelopeScheme::open`].
    pub fn verify(
        &self,
        slots: &[Slot],
        payload: &[u8],
        local: Timestamp32,
    ) -> Result<VerificationReport, SecurityError> {
        match self {
            Self::Disabled => Err(SecurityError::Disabled),
            Self::HashChain(scheme) => scheme.open(slots, payload, local),
            Self::Regional(scheme) => scheme.open(slots, payload, local),
        }
    }
}
