//! Platform-specific storage paths

use std::path::PathBuf;

use crate::{Result, StoreError};

/// Configuration directory (`<config>/quantarax`).
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join("quantarax"))
        .ok_or_else(|| StoreError::Config("no platform config directory available".into()))
}

/// Data directory (`<data>/quantarax`), holding the SQLite database and
/// signing identity.
pub fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|p| p.join("quantarax"))
        .ok_or_else(|| StoreError::Config("no platform data directory available".into()))
}

/// Path to the TOML configuration file.
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Path to the persisted Ed25519 signing identity.
pub fn identity_file() -> Result<PathBuf> {
    Ok(data_dir()?.join("identity.key"))
}

/// Path to the SQLite database backing sessions, bitmaps, CAS, and the DTN
/// queue.
pub fn db_file() -> Result<PathBuf> {
    Ok(data_dir()?.join("quantarax.db"))
}

/// Create the config and data directories if they do not already exist.
pub fn ensure_dirs() -> Result<()> {
    std::fs::create_dir_all(config_dir()?)?;
    std::fs::create_dir_all(data_dir()?)?;
    Ok(())
}
