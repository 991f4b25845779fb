//! What this station says about itself in every CAM.

use camguard_core::LowFrequencyProfile;
use camguard_proto::{
    BasicContainer, Cam, HighFrequencyContainer, LowFrequencyContainer, ReferencePosition,
    VehicleRole,
};

/// Default station id when none is configured.
pub const DEFAULT_STATION_ID: u32 = 168;

/// ITS station type "special vehicle".
pub const STATION_TYPE_SPECIAL_VEHICLE: u8 = 10;

/// Static description of the local station.
///
/// Position and motion are fixed; no GNSS receiver feeds this profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationProfile {
    /// Station id in the PDU header; also used for echo detection
    pub station_id: u32,
    /// ITS station type
    pub station_type: u8,
    /// Reported reference position
    pub reference_position: ReferencePosition,
    /// Heading, 0.1 degree
    pub heading: u16,
    /// Speed, cm/s
    pub speed: u16,
    /// Vehicle length, 0.1 m
    pub vehicle_length: u16,
    /// Vehicle width, 0.1 m
    pub vehicle_width: u8,
    /// Vehicle role sent in the low-frequency container
    pub vehicle_role: VehicleRole,
    /// Left turn signal on
    pub left_turn_signal: bool,
    /// Right turn signal on
    pub right_turn_signal: bool,
}

impl Default for StationProfile {
    fn default() -> Self {
        Self {
            station_id: DEFAULT_STATION_ID,
            station_type: STATION_TYPE_SPECIAL_VEHICLE,
            reference_position: ReferencePosition::default(),
            heading: 0,
            speed: 0,
            vehicle_length: 38,
            vehicle_width: 18,
            vehicle_role: VehicleRole::Emergency,
            left_turn_signal: false,
            right_turn_signal: false,
        }
    }
}

impl StationProfile {
    /// CAM with this profile's containers and no low-frequency container.
    pub fn build_cam(&self, generation_delta_time: u16) -> Cam {
        let mut cam = Cam::new(self.station_id, generation_delta_time);
        cam.parameters.basic_container = BasicContainer {
            station_type: self.station_type,
            reference_position: self.reference_position,
        };
        cam.parameters.high_frequency_container = HighFrequencyContainer {
            heading: self.heading,
            speed: self.speed,
            vehicle_length: self.vehicle_length,
            vehicle_width: self.vehicle_width,
        };
        cam
    }

    /// Exterior lights: high beam always, turn signals as configured.
    pub fn exterior_lights(&self) -> u8 {
        let mut lights = LowFrequencyContainer::LIGHTS_HIGH_BEAM;
        if self.left_turn_signal {
            lights |= LowFrequencyContainer::LIGHTS_LEFT_TURN;
        }
        if self.right_turn_signal {
            lights |= LowFrequencyContainer::LIGHTS_RIGHT_TURN;
        }
        lights
    }

    /// Low-frequency fields for the security layer.
    pub fn low_frequency(&self) -> LowFrequencyProfile {
        LowFrequencyProfile {
            vehicle_role: self.vehicle_role,
            exterior_lights: self.exterior_lights(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cam_carries_profile() {
        let profile = StationProfile { station_id: 7, speed: 1500, ..StationProfile::default() };
        let cam = profile.build_cam(42);

        assert_eq!(cam.station_id(), 7);
        assert_eq!(cam.generation_delta_time, 42);
        assert_eq!(cam.parameters.basic_container.station_type, STATION_TYPE_SPECIAL_VEHICLE);
        assert_eq!(cam.parameters.high_frequency_container.speed, 1500);
        assert!(cam.parameters.low_frequency_container.is_none());
    }

    #[test]
    fn turn_signals_set_light_bits() {
        let profile = StationProfile { left_turn_signal: true, ..StationProfile::default() };
        assert_eq!(
            profile.exterior_lights(),
            LowFrequencyContainer::LIGHTS_HIGH_BEAM | LowFrequencyContainer::LIGHTS_LEFT_TURN
        );
        assert_eq!(
            StationProfile::default().exterior_lights(),
            LowFrequencyContainer::LIGHTS_HIGH_BEAM
        );
    }
}
