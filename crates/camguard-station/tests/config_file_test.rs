//! Key file loading from disk.

use std::{fs, path::Path};

use camguard_core::{Scheme, SchemeId};
use camguard_harness::REFERENCE_KEYS;
use camguard_station::{ConfigError, KeyMaterial};
use tempfile::TempDir;

const REGIONAL_ONLY: &str = r#"
[regional]
regional_key = "f009cccdd6a068650711a52ab838704c6773eddf1f895271a27290afc7a26ad8"
api_secret = "11130978070c05500713071311130978070c0550071311130978070c05500713"
vehicle_secret = "0b0c0d0e0f101112131413140b0c0d0e0f10111213140b0c0d0e0f1011121314"
vehicle_id = "0102030405060708090a090a0102030405060708090a0102030405060708090a"
membership_key = "0b130978250c0550071307130b130978250c055007130b130978250c05500713"
"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn reference_file_provides_both_schemes() {
    let dir = TempDir::new().unwrap();
    let keys = KeyMaterial::load(&write(&dir, "keys.toml", REFERENCE_KEYS)).unwrap();

    assert_eq!(keys.pool.as_ref().map(|pool| pool.len()), Some(5));
    assert!(matches!(keys.scheme(SchemeId::HashChain).unwrap(), Scheme::HashChain(_)));
    assert!(matches!(keys.scheme(SchemeId::Regional).unwrap(), Scheme::Regional(_)));
    assert!(matches!(keys.scheme(SchemeId::Disabled).unwrap(), Scheme::Disabled));
}

#[test]
fn missing_section_is_reported_per_scheme() {
    let dir = TempDir::new().unwrap();
    let keys = KeyMaterial::load(&write(&dir, "regional.toml", REGIONAL_ONLY)).unwrap();

    assert!(keys.pool.is_none());
    assert!(keys.scheme(SchemeId::Regional).is_ok());
    assert!(matches!(
        keys.scheme(SchemeId::HashChain),
        Err(ConfigError::MissingKeys(SchemeId::HashChain))
    ));
}

#[test]
fn missing_file_is_io_error() {
    let err = KeyMaterial::load(Path::new("/nonexistent/camguard/keys.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn bad_hex_names_the_field() {
    let dir = TempDir::new().unwrap();
    let contents = REGIONAL_ONLY.replace("f009cccd", "zz09cccd");
    let err = KeyMaterial::load(&write(&dir, "bad.toml", &contents)).unwrap_err();

    let ConfigError::Hex { field, .. } = err else { panic!("unexpected error: {err}") };
    assert_eq!(field, "regional.regional_key");
}

#[test]
fn short_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let contents = r#"
[[hash_chain]]
pseudonym = "8f0f90472a5ae5222c6aaaa44875ad7262ffda54"
key = "8f0f90472a5ae522"
"#;
    let err = KeyMaterial::load(&write(&dir, "short.toml", contents)).unwrap_err();

    let ConfigError::KeyMaterial { field, .. } = err else { panic!("unexpected error: {err}") };
    assert_eq!(field, "hash_chain[0].key");
}

#[test]
fn unknown_fields_are_rejected() {
    let dir = TempDir::new().unwrap();
    let contents = format!("{REGIONAL_ONLY}\nextra = \"value\"\n");
    let err = KeyMaterial::load(&write(&dir, "extra.toml", &contents)).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
