//! Configuration schema

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level QuantaraX configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantaraXConfig {
    /// Transfer defaults
    pub transfer: TransferConfig,
    /// Storage paths
    pub storage: StorageConfig,
    /// Rate-limiting knobs for accepted connections
    pub rate_limit: RateLimitConfig,
    /// Per-domain-profile overrides, keyed by domain name (see [C14])
    #[serde(default)]
    pub domain_overrides: std::collections::HashMap<String, DomainOverride>,
}

impl Default for QuantaraXConfig {
    fn default() -> Self {
        Self {
            transfer: TransferConfig::default(),
            storage: StorageConfig::default(),
            rate_limit: RateLimitConfig::default(),
            domain_overrides: std::collections::HashMap::new(),
        }
    }
}

/// Transfer defaults applied when a session doesn't override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Default chunk size, human-readable (e.g. `"1MiB"`)
    pub chunk_size: bytesize::ByteSize,
    /// Default download directory for received files
    pub download_dir: PathBuf,
    /// Named domain profile applied when the sender doesn't pick one
    pub default_domain_profile: Option<String>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: bytesize::ByteSize::mib(1),
            download_dir: PathBuf::from("."),
            default_domain_profile: None,
        }
    }
}

/// Filesystem locations for the SQLite database and signing identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database; `None` uses the platform data dir default
    pub database_path: Option<PathBuf>,
    /// Path to the persisted signing identity; `None` uses the platform data dir default
    pub identity_path: Option<PathBuf>,
    /// Max age before a CAS entry is eligible for GC
    pub cas_max_age_secs: u64,
    /// Max age before a terminal session is eligible for cleanup
    pub session_max_age_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            identity_path: None,
            cas_max_age_secs: 7 * 24 * 3600,
            session_max_age_secs: 30 * 24 * 3600,
        }
    }
}

/// Token-bucket limiter applied to incoming connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained accept rate, connections/second
    pub connections_per_second: u32,
    /// Burst capacity above the sustained rate
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { connections_per_second: 50, burst: 100 }
    }
}

/// Per-domain override of the built-in FEC defaults (see [`crate`] domain
/// profile table); `None` fields fall back to the built-in default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainOverride {
    pub fec_k: Option<usize>,
    pub fec_r: Option<usize>,
}
