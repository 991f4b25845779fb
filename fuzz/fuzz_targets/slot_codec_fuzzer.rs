//! Fuzz target for the slot codec
//!
//! # Strategy
//!
//! - Arbitrary byte buffers packed into slots and back
//! - Arbitrary path points read back as slots
//!
//! # Invariants
//!
//! - `pack` succeeds exactly for lengths that are a multiple of 4
//! - `unpack(pack(b)) == b`
//! - A path point is readable iff both deltas fit in 16 bits
//! - NEVER panic

#![no_main]

use arbitrary::Arbitrary;
use camguard_proto::{PathPoint, SLOT_BYTES, Slot, pack, slots, unpack};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    bytes: Vec<u8>,
    points: Vec<(i32, i32, i32, Option<u16>)>,
}

fuzz_target!(|input: Input| {
    match pack(&input.bytes) {
        Ok(packed) => {
            assert_eq!(input.bytes.len() % SLOT_BYTES, 0);
            assert_eq!(unpack(&packed), input.bytes);

            let points = slots::to_path_points(&packed);
            assert_eq!(slots::from_path_points(&points).ok(), Some(packed));
        },
        Err(_) => assert_ne!(input.bytes.len() % SLOT_BYTES, 0),
    }

    for (lat, lon, alt, time) in input.points {
        let point = PathPoint {
            delta_latitude: lat,
            delta_longitude: lon,
            delta_altitude: alt,
            path_delta_time: time,
        };
        let fits = i16::try_from(lat).is_ok() && i16::try_from(lon).is_ok();
        assert_eq!(Slot::from_path_point(&point).is_ok(), fits);
    }
});
