//! Deterministic simulation harness for camguard testing.
//!
//! Turmoil-based implementations of the Environment and Transport traits for
//! deterministic, reproducible testing of stations over a simulated radio.
//!
//! - [`SimEnv`]: seeded RNG, simulated monotonic time, adjustable wall clock
//! - [`SimRadio`]: UDP over turmoil, broadcasting to a fixed neighbour list
//! - [`reference_keys`]: the shared reference key file, parsed

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_env;
pub mod sim_radio;

use std::time::Duration;

use camguard_station::{ConfigError, KeyMaterial, Mode, StationConfig, StationProfile};
pub use sim_env::{SIM_EPOCH, SimEnv};
pub use sim_radio::{RADIO_PORT, SimRadio};

/// Reference key file shipped with the repository.
pub const REFERENCE_KEYS: &str = include_str!("../../../config/reference-keys.toml");

/// Key material of [`REFERENCE_KEYS`].
pub fn reference_keys() -> Result<KeyMaterial, ConfigError> {
    KeyMaterial::from_toml(REFERENCE_KEYS)
}

/// Station configuration for simulation: short interval, default profile
/// with `station_id`.
pub fn sim_config(station_id: u32, mode: Mode) -> StationConfig {
    StationConfig {
        mode,
        profile: StationProfile { station_id, ..StationProfile::default() },
        interval: Duration::from_millis(500),
        ..StationConfig::default()
    }
}
