//! Station configuration and key material.
//!
//! Key material lives in a TOML file with hex-encoded byte strings:
//!
//! ```toml
//! [[hash_chain]]
//! pseudonym = "f009cccdd6a068650711a52aa27290afc7a26ad8"
//! key = "f009cccdd6a068650711a52ab838704c6773eddf1f895271a27290afc7a26ad8"
//!
//! [regional]
//! regional_key = "..."
//! api_secret = "..."
//! vehicle_secret = "..."
//! vehicle_id = "..."
//! membership_key = "..."
//! ```
//!
//! The file is read once at startup. The resulting [`KeyMaterial`] is shared
//! read-only between the sender and every receive worker.

use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use camguard_core::{AcceptancePolicy, HashChainScheme, RegionalScheme, Scheme, SchemeId};
use camguard_crypto::{KeyPool, PoolEntry, Pseudonym, RegionalSecrets, SymmetricKey};
use serde::Deserialize;

use crate::{error::ConfigError, profile::StationProfile};

/// Operating mode of a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Receive and verify only
    #[value(alias = "0")]
    Receive,
    /// Send only
    #[value(alias = "1")]
    Send,
    /// Send and receive
    #[value(alias = "2")]
    SendReceive,
    /// Receive and re-broadcast peer messages unchanged
    #[value(alias = "3")]
    Echo,
    /// Send, and measure latency from our own echoed messages
    #[value(alias = "4")]
    Latency,
    /// Echo peers and measure own latency
    #[value(alias = "5")]
    EchoLatency,
}

impl Mode {
    /// Whether the send loop runs.
    pub fn sends(self) -> bool {
        matches!(self, Self::Send | Self::SendReceive | Self::Latency | Self::EchoLatency)
    }

    /// Whether the receive loop runs.
    pub fn receives(self) -> bool {
        !matches!(self, Self::Send)
    }

    /// Whether peer messages are re-broadcast.
    pub fn echoes_peers(self) -> bool {
        matches!(self, Self::Echo | Self::EchoLatency)
    }

    /// Whether echoes of our own messages are timed.
    pub fn measures_latency(self) -> bool {
        matches!(self, Self::Latency | Self::EchoLatency)
    }
}

/// Computation-time evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Evaluation {
    /// No timing
    #[default]
    #[value(alias = "0")]
    Off,
    /// Time envelope sealing and verification alone
    #[value(alias = "1")]
    Security,
    /// Time whole CAM generation and whole datagram handling
    #[value(alias = "2")]
    Total,
}

/// Full station configuration.
#[derive(Debug, Clone)]
pub struct StationConfig {
    /// Local UDP address
    pub bind: SocketAddr,
    /// Broadcast or peer address for outgoing CAMs
    pub target: SocketAddr,
    /// Operating mode
    pub mode: Mode,
    /// Station self-description
    pub profile: StationProfile,
    /// Period of the send loop
    pub interval: Duration,
    /// Budget of one receive worker
    pub worker_deadline: Duration,
    /// What to do with stale or unverified messages
    pub policy: AcceptancePolicy,
    /// Computation-time evaluation
    pub evaluation: Evaluation,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 4700)),
            target: SocketAddr::from(([255, 255, 255, 255], 4700)),
            mode: Mode::SendReceive,
            profile: StationProfile::default(),
            interval: Duration::from_secs(1),
            worker_deadline: Duration::from_millis(100),
            policy: AcceptancePolicy::default(),
            evaluation: Evaluation::Off,
        }
    }
}

impl StationConfig {
    /// Check values the type system cannot.
    ///
    /// # Errors
    ///
    /// `ConfigError::ZeroDuration` for a zero send interval or worker
    /// deadline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroDuration("interval"));
        }
        if self.worker_deadline.is_zero() {
            return Err(ConfigError::ZeroDuration("worker_deadline"));
        }
        Ok(())
    }
}

/// Parse a `host:port` socket address.
pub fn parse_address(address: &str) -> Result<SocketAddr, ConfigError> {
    address.parse().map_err(|e: std::net::AddrParseError| ConfigError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeyFile {
    #[serde(default)]
    hash_chain: Vec<PoolEntryFile>,
    regional: Option<RegionalFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PoolEntryFile {
    pseudonym: String,
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegionalFile {
    regional_key: String,
    api_secret: String,
    vehicle_secret: String,
    vehicle_id: String,
    membership_key: String,
}

/// Key material for both schemes, each optional.
#[derive(Debug, Clone, Default)]
pub struct KeyMaterial {
    /// Hash-chain pool
    pub pool: Option<Arc<KeyPool>>,
    /// Regional secrets
    pub regional: Option<Arc<RegionalSecrets>>,
}

impl KeyMaterial {
    /// Read and validate a key file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml(&text)
    }

    /// Parse and validate key file contents.
    ///
    /// An empty `hash_chain` list means no pool, not an empty pool.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let file: KeyFile = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let pool = if file.hash_chain.is_empty() {
            None
        } else {
            let entries = file
                .hash_chain
                .iter()
                .enumerate()
                .map(|(i, entry)| {
                    let pseudonym_field = format!("hash_chain[{i}].pseudonym");
                    Ok(PoolEntry {
                        pseudonym: pseudonym(&pseudonym_field, &entry.pseudonym)?,
                        key: key(&format!("hash_chain[{i}].key"), &entry.key)?,
                    })
                })
                .collect::<Result<Vec<_>, ConfigError>>()?;
            let pool = KeyPool::new(entries)
                .map_err(|source| ConfigError::KeyMaterial { field: "hash_chain".into(), source })?;
            Some(Arc::new(pool))
        };

        let regional = file
            .regional
            .map(|r| {
                Ok::<_, ConfigError>(Arc::new(RegionalSecrets {
                    regional_key: key("regional.regional_key", &r.regional_key)?,
                    api_secret: key("regional.api_secret", &r.api_secret)?,
                    vehicle_secret: key("regional.vehicle_secret", &r.vehicle_secret)?,
                    vehicle_id: key("regional.vehicle_id", &r.vehicle_id)?,
                    membership_key: key("regional.membership_key", &r.membership_key)?,
                }))
            })
            .transpose()?;

        Ok(Self { pool, regional })
    }

    /// Build the scheme selected by `id`.
    ///
    /// # Errors
    ///
    /// `ConfigError::MissingKeys` if the file has no material for `id`.
    pub fn scheme(&self, id: SchemeId) -> Result<Scheme, ConfigError> {
        match id {
            SchemeId::Disabled => Ok(Scheme::Disabled),
            SchemeId::HashChain => self
                .pool
                .clone()
                .map(|pool| Scheme::HashChain(HashChainScheme::new(pool)))
                .ok_or(ConfigError::MissingKeys(id)),
            SchemeId::Regional => self
                .regional
                .clone()
                .map(|secrets| Scheme::Regional(RegionalScheme::new(secrets)))
                .ok_or(ConfigError::MissingKeys(id)),
        }
    }
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, ConfigError> {
    hex::decode(value.trim())
        .map_err(|source| ConfigError::Hex { field: field.to_string(), source })
}

fn key(field: &str, value: &str) -> Result<SymmetricKey, ConfigError> {
    SymmetricKey::from_slice(&decode_hex(field, value)?)
        .map_err(|source| ConfigError::KeyMaterial { field: field.to_string(), source })
}

fn pseudonym(field: &str, value: &str) -> Result<Pseudonym, ConfigError> {
    Pseudonym::from_slice(&decode_hex(field, value)?)
        .map_err(|source| ConfigError::KeyMaterial { field: field.to_string(), source })
}
