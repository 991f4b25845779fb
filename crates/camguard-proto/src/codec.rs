//! Carrier codec seam and the reference CBOR implementation.
//!
//! Production radios hand CAMs to a vendor UPER codec; the security layer only
//! needs `encode`/`decode`, so that is all [`CarrierCodec`] asks for.
//! [`CborCodec`] applies the same value constraints as the ASN.1 module so
//! that an envelope which survives it would also survive a conforming
//! encoder.

use crate::{
    cam::{Cam, ItsPduHeader, PathPoint},
    errors::CodecError,
};

/// Encode/decode for the base CAM structure.
///
/// # Invariants
///
/// - `encode` is deterministic
/// - `decode(encode(cam)) == cam` for every `cam` that encodes
/// - Values are validated, never clamped
pub trait CarrierCodec: Send + Sync + 'static {
    /// Serialize a CAM.
    fn encode(&self, cam: &Cam) -> Result<Vec<u8>, CodecError>;

    /// Deserialize a CAM.
    fn decode(&self, bytes: &[u8]) -> Result<Cam, CodecError>;
}

/// DeltaLatitude / DeltaLongitude bounds.
const DELTA_POSITION_RANGE: (i64, i64) = (-131_071, 131_072);

/// DeltaAltitude bounds.
const DELTA_ALTITUDE_RANGE: (i64, i64) = (-12_700, 12_800);

/// PathDeltaTime bounds.
const PATH_DELTA_TIME_RANGE: (i64, i64) = (1, 65_535);

/// Latitude bounds (1/10 microdegree).
const LATITUDE_RANGE: (i64, i64) = (-900_000_000, 900_000_001);

/// Longitude bounds (1/10 microdegree).
const LONGITUDE_RANGE: (i64, i64) = (-1_800_000_000, 1_800_000_001);

/// Reference CAM codec serializing with CBOR.
#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

impl CborCodec {
    /// Largest message `encode` produces and `decode` accepts.
    ///
    /// A CAM carrying [`Self::MAX_PATH_POINTS`] points at their widest
    /// values stays below this.
    pub const MAX_MESSAGE_SIZE: usize = 4096;

    /// Maximum number of path history points.
    pub const MAX_PATH_POINTS: usize = 40;

    /// Create the codec.
    pub fn new() -> Self {
        Self
    }

    fn validate(cam: &Cam) -> Result<(), CodecError> {
        if cam.header.message_id != ItsPduHeader::CAM_MESSAGE_ID {
            return Err(CodecError::NotACam(cam.header.message_id));
        }
        if cam.header.protocol_version != ItsPduHeader::CAM_PROTOCOL_VERSION {
            return Err(CodecError::UnsupportedVersion(cam.header.protocol_version));
        }

        let position = &cam.parameters.basic_container.reference_position;
        check_range("latitude", position.latitude.into(), LATITUDE_RANGE)?;
        check_range("longitude", position.longitude.into(), LONGITUDE_RANGE)?;

        if let Some(lf) = &cam.parameters.low_frequency_container {
            if lf.path_history.len() > Self::MAX_PATH_POINTS {
                return Err(CodecError::PathHistoryTooLong {
                    len: lf.path_history.len(),
                    max: Self::MAX_PATH_POINTS,
                });
            }
            for point in &lf.path_history {
                validate_path_point(point)?;
            }
        }

        Ok(())
    }
}

fn validate_path_point(point: &PathPoint) -> Result<(), CodecError> {
    check_range("delta_latitude", point.delta_latitude.into(), DELTA_POSITION_RANGE)?;
    check_range("delta_longitude", point.delta_longitude.into(), DELTA_POSITION_RANGE)?;
    check_range("delta_altitude", point.delta_altitude.into(), DELTA_ALTITUDE_RANGE)?;
    if let Some(delta_time) = point.path_delta_time {
        check_range("path_delta_time", delta_time.into(), PATH_DELTA_TIME_RANGE)?;
    }
    Ok(())
}

fn check_range(field: &'static str, value: i64, (min, max): (i64, i64)) -> Result<(), CodecError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(CodecError::ValueOutOfRange { field, value, min, max })
    }
}

impl CarrierCodec for CborCodec {
    fn encode(&self, cam: &Cam) -> Result<Vec<u8>, CodecError> {
        Self::validate(cam)?;

        let mut encoded = Vec::with_capacity(128);
        ciborium::ser::into_writer(cam, &mut encoded)
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        if encoded.len() > Self::MAX_MESSAGE_SIZE {
            return Err(CodecError::MessageTooLarge {
                len: encoded.len(),
                max: Self::MAX_MESSAGE_SIZE,
            });
        }
        Ok(encoded)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Cam, CodecError> {
        if bytes.len() > Self::MAX_MESSAGE_SIZE {
            return Err(CodecError::MessageTooLarge {
                len: bytes.len(),
                max: Self::MAX_MESSAGE_SIZE,
            });
        }

        let cam: Cam =
            ciborium::de::from_reader(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
        Self::validate(&cam)?;
        Ok(cam)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cam::{LowFrequencyContainer, VehicleRole};

    fn sample_cam() -> Cam {
        let mut cam = Cam::new(4242, 17);
        cam.parameters.basic_container.station_type = 5;
        cam.parameters.basic_container.reference_position.latitude = 387_365_120;
        cam.parameters.basic_container.reference_position.longitude = -91_393_480;
        cam.parameters.high_frequency_container.speed = 1388;
        cam
    }

    #[test]
    fn encode_decode_roundtrip() {
        let codec = CborCodec::new();
        let cam = sample_cam();

        let bytes = codec.encode(&cam).unwrap();
        let decoded = codec.decode(&bytes).unwrap();

        assert_eq!(decoded, cam);
    }

    #[test]
    fn encoding_is_deterministic() {
        let codec = CborCodec::new();
        let cam = sample_cam();

        assert_eq!(codec.encode(&cam).unwrap(), codec.encode(&cam.clone()).unwrap());
    }

    #[test]
    fn low_frequency_container_changes_encoding() {
        let codec = CborCodec::new();
        let plain = sample_cam();
        let mut with_lf = plain.clone();
        with_lf.parameters.low_frequency_container = Some(LowFrequencyContainer::default());

        assert_ne!(codec.encode(&plain).unwrap(), codec.encode(&with_lf).unwrap());
    }

    #[test]
    fn rejects_delta_out_of_range() {
        let codec = CborCodec::new();
        let mut cam = sample_cam();
        cam.parameters.low_frequency_container = Some(LowFrequencyContainer {
            path_history: vec![PathPoint { delta_latitude: 200_000, ..Default::default() }],
            ..Default::default()
        });

        let err = codec.encode(&cam).unwrap_err();
        assert!(matches!(err, CodecError::ValueOutOfRange { field: "delta_latitude", .. }));
    }

    #[test]
    fn accepts_full_i16_range_in_deltas() {
        let codec = CborCodec::new();
        let mut cam = sample_cam();
        cam.parameters.low_frequency_container = Some(LowFrequencyContainer {
            path_history: vec![
                PathPoint {
                    delta_latitude: i32::from(i16::MIN),
                    delta_longitude: i32::from(i16::MAX),
                    ..Default::default()
                },
            ],
            ..Default::default()
        });

        let decoded = codec.decode(&codec.encode(&cam).unwrap()).unwrap();
        assert_eq!(decoded, cam);
    }

    #[test]
    fn widest_path_history_roundtrips() {
        let codec = CborCodec::new();
        let mut cam = sample_cam();
        cam.header.station_id = u32::MAX;
        cam.generation_delta_time = u16::MAX;
        cam.parameters.basic_container.station_type = u8::MAX;
        cam.parameters.basic_container.reference_position.latitude = -900_000_000;
        cam.parameters.basic_container.reference_position.longitude = -1_800_000_000;
        cam.parameters.basic_container.reference_position.altitude = i32::MIN;
        cam.parameters.high_frequency_container.heading = u16::MAX;
        cam.parameters.high_frequency_container.vehicle_length = u16::MAX;
        cam.parameters.high_frequency_container.vehicle_width = u8::MAX;
        let widest = PathPoint {
            delta_latitude: -131_071,
            delta_longitude: -131_071,
            delta_altitude: -12_700,
            path_delta_time: Some(u16::MAX),
        };
        cam.parameters.low_frequency_container = Some(LowFrequencyContainer {
            vehicle_role: VehicleRole::DangerousGoods,
            exterior_lights: u8::MAX,
            path_history: vec![widest; CborCodec::MAX_PATH_POINTS],
        });

        let bytes = codec.encode(&cam).unwrap();
        assert!(bytes.len() <= CborCodec::MAX_MESSAGE_SIZE, "{} bytes", bytes.len());
        assert_eq!(codec.decode(&bytes).unwrap(), cam);
    }

    #[test]
    fn full_history_of_slot_extremes_roundtrips() {
        let codec = CborCodec::new();
        let mut cam = sample_cam();
        let extreme = PathPoint {
            delta_latitude: i32::from(i16::MIN),
            delta_longitude: i32::from(i16::MIN),
            ..Default::default()
        };
        cam.parameters.low_frequency_container = Some(LowFrequencyContainer {
            path_history: vec![extreme; CborCodec::MAX_PATH_POINTS],
            ..Default::default()
        });

        let decoded = codec.decode(&codec.encode(&cam).unwrap()).unwrap();
        assert_eq!(decoded, cam);
    }

    #[test]
    fn rejects_too_many_path_points() {
        let codec = CborCodec::new();
        let mut cam = sample_cam();
        cam.parameters.low_frequency_container = Some(LowFrequencyContainer {
            path_history: vec![PathPoint::default(); CborCodec::MAX_PATH_POINTS + 1],
            ..Default::default()
        });

        assert!(matches!(codec.encode(&cam), Err(CodecError::PathHistoryTooLong { .. })));
    }

    #[test]
    fn rejects_non_cam_header() {
        let codec = CborCodec::new();
        let mut cam = sample_cam();
        cam.header.message_id = 1;

        assert_eq!(codec.encode(&cam), Err(CodecError::NotACam(1)));
    }

    #[test]
    fn decode_garbage_fails() {
        let codec = CborCodec::new();
        assert!(matches!(codec.decode(&[0xff, 0x00, 0x13]), Err(CodecError::Decode(_))));
    }

    #[test]
    fn decode_oversized_fails() {
        let codec = CborCodec::new();
        let bytes = vec![0u8; CborCodec::MAX_MESSAGE_SIZE + 1];
        assert!(matches!(codec.decode(&bytes), Err(CodecError::MessageTooLarge { .. })));
    }
}
