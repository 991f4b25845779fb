//! Fuzz target for envelope verification
//!
//! Attacker-controlled slots and payloads against both schemes.
//!
//! # Invariants
//!
//! - Wrong slot counts are reported as malformed, never checked
//! - Correct slot counts always produce a report, except unknown key indices
//! - Random slots essentially never verify
//! - NEVER panic

#![no_main]

use std::sync::{Arc, OnceLock};

use arbitrary::Arbitrary;
use camguard_core::{HashChainScheme, RegionalScheme, Scheme, Timestamp32};
use camguard_crypto::{KeyPool, PoolEntry, Pseudonym, RegionalSecrets, SymmetricKey};
use camguard_proto::Slot;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    regional: bool,
    slots: Vec<(i16, i16)>,
    payload: Vec<u8>,
    local: i32,
}

fn schemes() -> &'static (Scheme, Scheme) {
    static SCHEMES: OnceLock<(Scheme, Scheme)> = OnceLock::new();
    SCHEMES.get_or_init(|| {
        let entries = (0..5u8)
            .map(|i| PoolEntry {
                pseudonym: Pseudonym::new([i; 20]),
                key: SymmetricKey::new([0x40 + i; 32]),
            })
            .collect();
        let pool = KeyPool::new(entries).unwrap();
        let secrets = RegionalSecrets {
            regional_key: SymmetricKey::new([1; 32]),
            api_secret: SymmetricKey::new([2; 32]),
            vehicle_secret: SymmetricKey::new([3; 32]),
            vehicle_id: SymmetricKey::new([4; 32]),
            membership_key: SymmetricKey::new([5; 32]),
        };
        (
            Scheme::HashChain(HashChainScheme::new(Arc::new(pool))),
            Scheme::Regional(RegionalScheme::new(Arc::new(secrets))),
        )
    })
}

fuzz_target!(|input: Input| {
    let (hash_chain, regional) = schemes();
    let scheme = if input.regional { regional } else { hash_chain };
    let slots: Vec<Slot> = input.slots.iter().map(|&(a, b)| Slot { a, b }).collect();

    match scheme.verify(&slots, &input.payload, Timestamp32::new(input.local)) {
        Ok(report) => {
            assert_eq!(slots.len(), scheme.slot_count());
            assert_eq!(report.scheme, scheme.id());
        },
        Err(err) => assert!(err.is_malformed(), "unexpected error: {err}"),
    }
});
