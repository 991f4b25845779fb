//! Error types for the security layer.
//!
//! Every failure here is locally recoverable. Callers receive them as values
//! and decide whether a message is delivered, retried unsealed or dropped.

use camguard_crypto::CryptoError;
use camguard_proto::{CodecError, SlotError};
use thiserror::Error;

/// Errors from sealing or opening a CAM.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    /// Carrier encode failed; the message was not augmented or not verified
    #[error("carrier encoding failed: {0}")]
    Encoding(CodecError),

    /// Inbound bytes are not a decodable CAM
    #[error("carrier decoding failed: {0}")]
    Decoding(CodecError),

    /// Slot count does not match the configured scheme
    #[error("malformed envelope: expected {expected} slots, got {actual}")]
    MalformedEnvelope {
        /// Slots required by the scheme
        expected: usize,
        /// Slots carried by the message
        actual: usize,
    },

    /// A path point cannot be read back as a slot
    #[error("envelope slot unreadable: {0}")]
    Slot(#[from] SlotError),

    /// Envelope names a key index outside the configured pool
    #[error("unknown key index {index} (pool has {pool_len} entries)")]
    UnknownKeyIndex {
        /// Transmitted key index
        index: u32,
        /// Local pool size
        pool_len: usize,
    },

    /// Timestamp outside the freshness window
    #[error("stale timestamp: received {received}, local {local}")]
    StaleTimestamp {
        /// Timestamp carried by the envelope
        received: i32,
        /// Receiver wall clock
        local: i32,
    },

    /// Recomputed tag differs from the received one
    #[error("authentication tag mismatch")]
    TagMismatch,

    /// Operation needs a scheme but security is disabled
    #[error("security scheme disabled")]
    Disabled,

    /// Scheme selector is not 0, 1 or 2
    #[error("unknown security scheme selector {0}")]
    UnknownScheme(u8),

    /// Local key material lookup failed
    #[error("key material: {0}")]
    KeyMaterial(#[from] CryptoError),
}

impl SecurityError {
    /// Returns true if the envelope could not be checked at all.
    ///
    /// Such messages are surfaced as "cannot verify" and rejected regardless
    /// of the acceptance policy.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedEnvelope { .. } | Self::Slot(_) | Self::UnknownKeyIndex { .. }
        )
    }
}
