//! Slot codec: opaque bytes <-> path-history points.
//!
//! Every 4 bytes of a buffer become one slot, a pair of signed 16-bit values
//! carried in the delta-latitude and delta-longitude fields of a path point:
//!
//! ```text
//! bytes:  b0 b1 b2 b3 | b4 b5 b6 b7 | ...
//! slot:   (a = b0b1, b = b2b3) | (a = b4b5, b = b6b7) | ...
//! point:  delta_latitude = a, delta_longitude = b, delta_altitude = 0, no delta time
//! ```
//!
//! The fields carry arbitrary bit patterns, not geographic offsets. Both
//! halves are big-endian, so `unpack(pack(b)) == b` for every buffer whose
//! length is a multiple of [`SLOT_BYTES`].

use crate::{cam::PathPoint, errors::SlotError};

/// Bytes carried by one slot.
pub const SLOT_BYTES: usize = 4;

/// One transport slot: two signed 16-bit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Slot {
    /// First half, carried as delta latitude
    pub a: i16,
    /// Second half, carried as delta longitude
    pub b: i16,
}

impl Slot {
    /// Build a slot from four bytes.
    pub fn from_bytes(bytes: [u8; SLOT_BYTES]) -> Self {
        Self {
            a: i16::from_be_bytes([bytes[0], bytes[1]]),
            b: i16::from_be_bytes([bytes[2], bytes[3]]),
        }
    }

    /// The four bytes this slot carries.
    pub fn to_bytes(self) -> [u8; SLOT_BYTES] {
        let [a0, a1] = self.a.to_be_bytes();
        let [b0, b1] = self.b.to_be_bytes();
        [a0, a1, b0, b1]
    }

    /// Path point carrying this slot.
    pub fn to_path_point(self) -> PathPoint {
        PathPoint {
            delta_latitude: i32::from(self.a),
            delta_longitude: i32::from(self.b),
            delta_altitude: 0,
            path_delta_time: None,
        }
    }

    /// Read a slot back from a path point.
    ///
    /// Only the two delta fields are read. A value outside the signed 16-bit
    /// range means the carrier rewrote the point and is reported rather than
    /// truncated.
    pub fn from_path_point(point: &PathPoint) -> Result<Self, SlotError> {
        let a = i16::try_from(point.delta_latitude).map_err(|_| SlotError::OutOfRange {
            field: "delta_latitude",
            value: point.delta_latitude,
        })?;
        let b = i16::try_from(point.delta_longitude).map_err(|_| SlotError::OutOfRange {
            field: "delta_longitude",
            value: point.delta_longitude,
        })?;
        Ok(Self { a, b })
    }
}

/// Pack a buffer into slots.
///
/// # Errors
///
/// - `SlotError::UnalignedLength` if `bytes.len()` is not a multiple of
///   [`SLOT_BYTES`]
pub fn pack(bytes: &[u8]) -> Result<Vec<Slot>, SlotError> {
    if bytes.len() % SLOT_BYTES != 0 {
        return Err(SlotError::UnalignedLength { len: bytes.len(), width: SLOT_BYTES });
    }

    Ok(bytes
        .chunks_exact(SLOT_BYTES)
        .map(|chunk| Slot::from_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Unpack slots into the bytes they carry.
pub fn unpack(slots: &[Slot]) -> Vec<u8> {
    slots.iter().flat_map(|slot| slot.to_bytes()).collect()
}

/// Path points for a sequence of slots.
pub fn to_path_points(slots: &[Slot]) -> Vec<PathPoint> {
    slots.iter().map(|slot| slot.to_path_point()).collect()
}

/// Slots read back from a sequence of path points.
pub fn from_path_points(points: &[PathPoint]) -> Result<Vec<Slot>, SlotError> {
    points.iter().map(Slot::from_path_point).collect()
}
