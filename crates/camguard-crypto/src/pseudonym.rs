//! Pseudonyms and their derivation for the regional scheme.

use std::fmt;

use crate::{
    digest::{hash, hash_parts},
    error::CryptoError,
    keys::RegionalSecrets,
};

/// Size of a pseudonym.
pub const PSEUDONYM_SIZE: usize = 20;

/// Offset of the digest bytes that form a derived pseudonym.
const DIGEST_TAIL: usize = 12;

/// A 20-byte short-lived identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pseudonym([u8; PSEUDONYM_SIZE]);

impl Pseudonym {
    /// Wrap raw pseudonym bytes.
    pub const fn new(bytes: [u8; PSEUDONYM_SIZE]) -> Self {
        Self(bytes)
    }

    /// Pseudonym from a slice of exactly [`PSEUDONYM_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        bytes.try_into().map(Self).map_err(|_| CryptoError::InvalidLength {
            expected: PSEUDONYM_SIZE,
            actual: bytes.len(),
        })
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; PSEUDONYM_SIZE] {
        &self.0
    }
}

impl fmt::Debug for Pseudonym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pseudonym(")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

/// Derive the regional-scheme pseudonym for `timestamp`.
///
/// ```text
/// static  = SHA-256(api ‖ vehicle_secret ‖ vehicle_id ‖ membership_key)
/// dynamic = SHA-256(api ‖ timestamp_be)
/// pseudonym[i] = static[12 + i] ⊕ dynamic[12 + i],  i in 0..20
/// ```
///
/// Deterministic: any holder of the same secrets derives the same pseudonym
/// for the same timestamp.
pub fn derive_pseudonym(secrets: &RegionalSecrets, timestamp: i32) -> Pseudonym {
    let static_digest = hash(&secrets.static_component());
    let dynamic_digest = hash_parts(&[secrets.api_secret.as_bytes(), &timestamp.to_be_bytes()]);

    let mut pseudonym = [0u8; PSEUDONYM_SIZE];
    for (i, byte) in pseudonym.iter_mut().enumerate() {
        *byte = static_digest[DIGEST_TAIL + i] ^ dynamic_digest[DIGEST_TAIL + i];
    }
    Pseudonym(pseudonym)
}
