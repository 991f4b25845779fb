//! Error types for the carrier codec and the slot codec.

use thiserror::Error;

/// Errors raised by a [`crate::CarrierCodec`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A constrained field is outside the range the carrier definition allows
    #[error("{field} out of range: {value} not in [{min}, {max}]")]
    ValueOutOfRange {
        /// Name of the offending field
        field: &'static str,
        /// Value that was supplied
        value: i64,
        /// Smallest allowed value
        min: i64,
        /// Largest allowed value
        max: i64,
    },

    /// Path history holds more points than the carrier allows
    #[error("path history too long: {len} points (max {max})")]
    PathHistoryTooLong {
        /// Number of points supplied
        len: usize,
        /// Maximum number of points
        max: usize,
    },

    /// The PDU header does not identify a CAM
    #[error("not a CAM: message id {0}")]
    NotACam(u8),

    /// The PDU header carries a protocol version this codec does not handle
    #[error("unsupported CAM protocol version: {0}")]
    UnsupportedVersion(u8),

    /// Message does not fit the carrier's size limit
    #[error("message of {len} bytes exceeds {max}")]
    MessageTooLarge {
        /// Encoded size
        len: usize,
        /// Size limit
        max: usize,
    },

    /// Serialization failed
    #[error("encode failed: {0}")]
    Encode(String),

    /// Deserialization failed
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Errors raised by the slot codec.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotError {
    /// Buffer length is not a multiple of the slot width
    #[error("buffer length {len} is not a multiple of {width}")]
    UnalignedLength {
        /// Length of the supplied buffer
        len: usize,
        /// Bytes carried per slot
        width: usize,
    },

    /// A path point field does not fit a signed 16-bit slot half.
    ///
    /// Seeing this on receive means something between the sender and us
    /// rewrote the deltas as geographic offsets.
    #[error("path point field {field} = {value} does not fit in 16 bits")]
    OutOfRange {
        /// Which half of the slot overflowed
        field: &'static str,
        /// Value found in the path point
        value: i32,
    },
}
