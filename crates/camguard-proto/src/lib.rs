//! Camguard carrier protocol types.
//!
//! The carrier is the ETSI Cooperative Awareness Message (CAM). Radio stacks
//! normally ship a vendor ASN.1 codec for it; this crate models the subset of
//! the CAM structure the authentication side-channel touches and provides a
//! reference CBOR codec with the same range constraints, so the security layer
//! can be exercised without vendor code.
//!
//! # Components
//!
//! - [`Cam`] and its containers: the decoded carrier message
//! - [`CarrierCodec`]: the encode/decode seam implemented by vendor codecs
//! - [`CborCodec`]: reference codec used by the station and the tests
//! - [`slots`]: the bidirectional byte-buffer to path-point mapping
//!
//! # Invariants
//!
//! - Encoding is deterministic: the same [`Cam`] always encodes to the same
//!   bytes. Verification depends on this, because the receiver re-encodes the
//!   decoded message to recover the exact bytes the sender authenticated.
//! - Codecs never clamp. Out-of-range fields fail to encode.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cam;
pub mod codec;
pub mod errors;
pub mod slots;

pub use cam::{
    BasicContainer, Cam, CamParameters, HighFrequencyContainer, ItsPduHeader,
    LowFrequencyContainer, PathPoint, ReferencePosition, VehicleRole,
};
pub use codec::{CarrierCodec, CborCodec};
pub use errors::{CodecError, SlotError};
pub use slots::{SLOT_BYTES, Slot, pack, unpack};
