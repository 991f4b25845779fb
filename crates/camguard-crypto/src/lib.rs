//! Camguard Cryptographic Primitives
//!
//! Building blocks for the two envelope schemes. Pure functions with
//! deterministic outputs: nothing in this crate draws randomness, callers pass
//! the indices they picked.
//!
//! # Key Material
//!
//! ```text
//! Hash-chain scheme                 Regional scheme
//!
//! KeyPool                           RegionalSecrets
//!  ├─ (pseudonym 0, key 0)           ├─ regional_key ──────────► tag digest
//!  ├─ (pseudonym 1, key 1)           └─ api ‖ vsk ‖ id ‖ k_mbr
//!  └─ ...                                   │
//!       │           │                       ▼
//!       ▼           ▼               SHA-256(static) ⊕ SHA-256(api ‖ ts)
//!   pseudonym   HMAC key                    │
//!                                           ▼
//!                                       pseudonym
//! ```
//!
//! All keys are loaded once at startup and are read-only afterwards. Key
//! bytes are zeroized when the owning value is dropped.
//!
//! # Security
//!
//! - Tags are compared in constant time ([`tags_match`])
//! - The hash-chain scheme discloses the key index in clear; only holders of
//!   the pool can produce a valid tag for it
//! - The regional scheme's pseudonym is reproducible by every holder of the
//!   same static secrets; it hides identity from outsiders only

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod digest;
pub mod error;
pub mod keys;
pub mod pseudonym;

pub use digest::{DIGEST_SIZE, Digest, hash, hash_parts, mac, mac_parts, tags_match};
pub use error::CryptoError;
pub use keys::{KEY_SIZE, KeyPool, PoolEntry, RegionalSecrets, SymmetricKey};
pub use pseudonym::{PSEUDONYM_SIZE, Pseudonym, derive_pseudonym};
