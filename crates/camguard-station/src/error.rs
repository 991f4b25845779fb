//! Station error types.

use std::{io, path::PathBuf};

use camguard_core::{SchemeId, SecurityError};
use camguard_crypto::CryptoError;
use thiserror::Error;

/// Startup configuration errors.
///
/// All of these are fatal: fix the configuration and restart.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Key file could not be read
    #[error("cannot read key file {path}: {source}")]
    Io {
        /// Key file path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Key file is not valid TOML or has unknown fields
    #[error("invalid key file: {0}")]
    Parse(String),

    /// A key or pseudonym is not valid hex
    #[error("{field}: invalid hex: {source}")]
    Hex {
        /// Offending field
        field: String,
        /// Underlying error
        source: hex::FromHexError,
    },

    /// A key or pseudonym has the wrong length, or the pool is empty
    #[error("{field}: {source}")]
    KeyMaterial {
        /// Offending field
        field: String,
        /// Underlying error
        source: CryptoError,
    },

    /// Selected scheme has no key material in the key file
    #[error("scheme {0} selected but the key file has no material for it")]
    MissingKeys(SchemeId),

    /// Scheme selector out of range
    #[error(transparent)]
    Scheme(#[from] SecurityError),

    /// A period that must be positive is zero
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// Bind or target address is not `host:port`
    #[error("invalid address '{address}': {reason}")]
    Address {
        /// Address as given
        address: String,
        /// Parse failure
        reason: String,
    },
}

/// Runtime errors of a station.
#[derive(Error, Debug)]
pub enum StationError {
    /// Configuration error at startup
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Socket or radio failure
    #[error("transport error: {0}")]
    Transport(String),

    /// CAM could not be produced
    #[error("security error: {0}")]
    Security(#[from] SecurityError),
}

impl From<io::Error> for StationError {
    fn from(err: io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
