//! Fuzz target for received datagrams
//!
//! Arbitrary bytes through the full receive path: carrier decode, echo
//! detection, envelope extraction and verification.
//!
//! # Invariants
//!
//! - Undecodable bytes are a decoding error
//! - Every decodable CAM yields an echo or a peer outcome
//! - Unchecked envelopes are never delivered
//! - NEVER panic

#![no_main]

use std::sync::{Arc, OnceLock};

use camguard_core::{HashChainScheme, Inbound, Outcome, Scheme, SecurityError, SecurityLayer};
use camguard_crypto::{KeyPool, PoolEntry, Pseudonym, SymmetricKey};
use camguard_harness::SimEnv;
use camguard_proto::CborCodec;
use libfuzzer_sys::fuzz_target;

fn layer() -> &'static SecurityLayer<CborCodec> {
    static LAYER: OnceLock<SecurityLayer<CborCodec>> = OnceLock::new();
    LAYER.get_or_init(|| {
        let entries = (0..5u8)
            .map(|i| PoolEntry {
                pseudonym: Pseudonym::new([i; 20]),
                key: SymmetricKey::new([0x40 + i; 32]),
            })
            .collect();
        let scheme = HashChainScheme::new(Arc::new(KeyPool::new(entries).unwrap()));
        SecurityLayer::new(CborCodec::new(), Scheme::HashChain(scheme), 168)
    })
}

fuzz_target!(|data: &[u8]| {
    let env = SimEnv::new();
    match layer().open_cam(data, &env) {
        Ok(Inbound::Echo { .. }) => {},
        Ok(Inbound::Peer { outcome, disposition, .. }) => {
            if let Outcome::CannotVerify(_) = outcome {
                assert!(!disposition.is_deliver());
            }
        },
        Err(err) => assert!(matches!(err, SecurityError::Decoding(_)), "unexpected error: {err}"),
    }
});
