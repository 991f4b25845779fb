//! SHA-256 and HMAC-SHA-256 over fully materialized buffers.

use hmac::{Hmac, Mac};
use sha2::{Digest as _, Sha256};
use subtle::ConstantTimeEq;

use crate::keys::SymmetricKey;

type HmacSha256 = Hmac<Sha256>;

/// Output size of both primitives.
pub const DIGEST_SIZE: usize = 32;

/// A 32-byte digest.
pub type Digest = [u8; DIGEST_SIZE];

/// Unkeyed SHA-256 of `data`.
pub fn hash(data: &[u8]) -> Digest {
    hash_parts(&[data])
}

/// SHA-256 of the concatenation of `parts`.
pub fn hash_parts(parts: &[&[u8]]) -> Digest {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }

    let mut digest = [0u8; DIGEST_SIZE];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// HMAC-SHA-256 of `data` under `key`.
pub fn mac(key: &SymmetricKey, data: &[u8]) -> Digest {
    mac_parts(key, &[data])
}

/// HMAC-SHA-256 of the concatenation of `parts` under `key`.
pub fn mac_parts(key: &SymmetricKey, parts: &[&[u8]]) -> Digest {
    let Ok(mut mac) = HmacSha256::new_from_slice(key.as_bytes()) else {
        unreachable!("HMAC-SHA256 accepts any key size");
    };
    for part in parts {
        mac.update(part);
    }

    let mut digest = [0u8; DIGEST_SIZE];
    digest.copy_from_slice(&mac.finalize().into_bytes());
    digest
}

/// Constant-time comparison of two tags.
///
/// Slices of different length never match.
pub fn tags_match(expected: &[u8], received: &[u8]) -> bool {
    expected.ct_eq(received).into()
}
