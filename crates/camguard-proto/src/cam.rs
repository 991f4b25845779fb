//! Decoded CAM structure.
//!
//! Only the fields a station fills in and the optional low-frequency container
//! are modelled. The low-frequency container's path history is the field the
//! security layer borrows for its slots.

use serde::{Deserialize, Serialize};

/// ITS PDU header shared by all ITS messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItsPduHeader {
    /// Protocol version of the message definition
    pub protocol_version: u8,
    /// Message type identifier
    pub message_id: u8,
    /// Originating station identifier
    pub station_id: u32,
}

impl ItsPduHeader {
    /// Message id assigned to CAM.
    pub const CAM_MESSAGE_ID: u8 = 2;

    /// CAM protocol version understood by this crate.
    pub const CAM_PROTOCOL_VERSION: u8 = 2;

    /// Header for a CAM originated by `station_id`.
    pub fn cam(station_id: u32) -> Self {
        Self {
            protocol_version: Self::CAM_PROTOCOL_VERSION,
            message_id: Self::CAM_MESSAGE_ID,
            station_id,
        }
    }
}

/// Geographic reference position in tenths of a microdegree and centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReferencePosition {
    /// Latitude, 1/10 microdegree
    pub latitude: i32,
    /// Longitude, 1/10 microdegree
    pub longitude: i32,
    /// Altitude, centimetres
    pub altitude: i32,
}

/// Basic container, present in every CAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BasicContainer {
    /// ETSI station type (5 = passenger car, 10 = special vehicle, ...)
    pub station_type: u8,
    /// Position at generation time
    pub reference_position: ReferencePosition,
}

/// Basic vehicle high-frequency container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HighFrequencyContainer {
    /// Heading, 0.1 degree
    pub heading: u16,
    /// Speed, cm/s
    pub speed: u16,
    /// Vehicle length, 0.1 m
    pub vehicle_length: u16,
    /// Vehicle width, 0.1 m
    pub vehicle_width: u8,
}

/// Role of the vehicle in road traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VehicleRole {
    /// No particular role
    #[default]
    Default,
    /// Public transport
    PublicTransport,
    /// Special transport
    SpecialTransport,
    /// Dangerous goods
    DangerousGoods,
    /// Road work
    RoadWork,
    /// Rescue
    Rescue,
    /// Emergency vehicle
    Emergency,
    /// Safety car
    SafetyCar,
}

/// One point of the path history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PathPoint {
    /// Latitude offset from the previous point, 1/10 microdegree
    pub delta_latitude: i32,
    /// Longitude offset from the previous point, 1/10 microdegree
    pub delta_longitude: i32,
    /// Altitude offset from the previous point, centimetres
    pub delta_altitude: i32,
    /// Time offset from the previous point, 10 ms units
    pub path_delta_time: Option<u16>,
}

/// Basic vehicle low-frequency container.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LowFrequencyContainer {
    /// Vehicle role
    pub vehicle_role: VehicleRole,
    /// Exterior lights bit string (bit 0 = low beam, 1 = high beam, 2 = left
    /// turn, 3 = right turn, ...)
    pub exterior_lights: u8,
    /// Recent path of the vehicle
    pub path_history: Vec<PathPoint>,
}

impl LowFrequencyContainer {
    /// High beam headlights on.
    pub const LIGHTS_HIGH_BEAM: u8 = 1 << 1;
    /// Left turn signal on.
    pub const LIGHTS_LEFT_TURN: u8 = 1 << 2;
    /// Right turn signal on.
    pub const LIGHTS_RIGHT_TURN: u8 = 1 << 3;
}

/// CAM parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CamParameters {
    /// Basic container
    pub basic_container: BasicContainer,
    /// High-frequency container
    pub high_frequency_container: HighFrequencyContainer,
    /// Optional low-frequency container
    pub low_frequency_container: Option<LowFrequencyContainer>,
}

/// Cooperative Awareness Message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cam {
    /// PDU header
    pub header: ItsPduHeader,
    /// Generation time modulo 65536, milliseconds
    pub generation_delta_time: u16,
    /// Containers
    pub parameters: CamParameters,
}

impl Cam {
    /// CAM from `station_id` with empty containers.
    pub fn new(station_id: u32, generation_delta_time: u16) -> Self {
        Self {
            header: ItsPduHeader::cam(station_id),
            generation_delta_time,
            parameters: CamParameters::default(),
        }
    }

    /// Originating station.
    pub fn station_id(&self) -> u32 {
        self.header.station_id
    }

    /// Path history of the low-frequency container, if present.
    pub fn path_history(&self) -> Option<&[PathPoint]> {
        self.parameters.low_frequency_container.as_ref().map(|lf| lf.path_history.as_slice())
    }

    /// Remove and return the low-frequency container.
    pub fn take_low_frequency(&mut self) -> Option<LowFrequencyContainer> {
        self.parameters.low_frequency_container.take()
    }
}
