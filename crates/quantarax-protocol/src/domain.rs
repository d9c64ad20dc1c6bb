//! Domain profiles (C14): named presets of per-class configuration, FEC
//! parameters, and special policies, selected by the kind of file being
//! transferred.

use serde::{Deserialize, Serialize};

use crate::transfer::Manifest;
use crate::{ProtocolError, Result};

/// When a receiver should emit an ACK for chunks handled by a given class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckStrategy {
    /// Acknowledge as soon as a chunk is persisted
    Immediate,
    /// Batch acknowledgments, flushing at most every `millis` milliseconds
    Delayed {
        /// Batching window in milliseconds
        millis: u32,
    },
}

/// Chunk size a class uses, or the manifest's base chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkBytes {
    /// Use the manifest's base `chunk_size`, unmodified
    Base,
    /// Override with a fixed size in bytes
    Fixed(u32),
}

/// Initial worker-pool configuration for one priority class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassConfig {
    /// When ACKs are sent for chunks this class delivers
    pub ack_strategy: AckStrategy,
    /// Initial worker/stream count for this class
    pub streams: u32,
    /// Chunk size this class operates at
    pub chunk_bytes: ChunkBytes,
}

const fn immediate(streams: u32, chunk_bytes: ChunkBytes) -> ClassConfig {
    ClassConfig { ack_strategy: AckStrategy::Immediate, streams, chunk_bytes }
}

const fn delayed(millis: u32, streams: u32, chunk_bytes: ChunkBytes) -> ClassConfig {
    ClassConfig { ack_strategy: AckStrategy::Delayed { millis }, streams, chunk_bytes }
}

/// Reed-Solomon `(K, R)` defaults for a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FecDefaults {
    /// Data shard count
    pub k: usize,
    /// Parity shard count
    pub r: usize,
}

/// A named domain preset: per-class configs, FEC defaults, and policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainProfile {
    /// Domain name, e.g. `"medical"`
    pub name: &'static str,
    /// P0 (highest priority) class config
    pub p0: ClassConfig,
    /// P1 class config
    pub p1: ClassConfig,
    /// P2 (lowest priority) class config
    pub p2: ClassConfig,
    /// Reed-Solomon defaults
    pub fec: FecDefaults,
    /// When set, both end-to-end encryption and at-rest protection are
    /// required or the transfer must be rejected at accept time
    pub medical_strict: bool,
    /// When set, failed sends for this domain are queued for delay-tolerant
    /// retry with the given TTL in seconds
    pub dtn_ttl_seconds: Option<u64>,
}

/// High-resolution media: large preview/bulk chunks, generous FEC for loss.
pub const MEDIA: DomainProfile = DomainProfile {
    name: "media",
    p0: immediate(1, ChunkBytes::Base),
    p1: delayed(10, 8, ChunkBytes::Fixed(1024 * 1024)),
    p2: delayed(25, 8, ChunkBytes::Fixed(4 * 1024 * 1024)),
    fec: FecDefaults { k: 50, r: 6 },
    medical_strict: false,
    dtn_ttl_seconds: None,
};

/// Medical imagery/records: strict end-to-end and at-rest requirements.
pub const MEDICAL: DomainProfile = DomainProfile {
    name: "medical",
    p0: immediate(1, ChunkBytes::Base),
    p1: immediate(2, ChunkBytes::Fixed(256 * 1024)),
    p2: delayed(10, 2, ChunkBytes::Fixed(256 * 1024)),
    fec: FecDefaults { k: 16, r: 8 },
    medical_strict: true,
    dtn_ttl_seconds: None,
};

/// CAD/engineering artifacts: dependency and delta-block discovery favored.
pub const ENGINEERING: DomainProfile = DomainProfile {
    name: "engineering",
    p0: delayed(10, 1, ChunkBytes::Base),
    p1: delayed(25, 4, ChunkBytes::Fixed(256 * 1024)),
    p2: delayed(25, 4, ChunkBytes::Fixed(256 * 1024)),
    fec: FecDefaults { k: 32, r: 4 },
    medical_strict: false,
    dtn_ttl_seconds: None,
};

/// High-rate sensor/telemetry streams: large chunks, aggressive FEC.
pub const TELEMETRY: DomainProfile = DomainProfile {
    name: "telemetry",
    p0: immediate(4, ChunkBytes::Fixed(512 * 1024)),
    p1: delayed(10, 2, ChunkBytes::Fixed(512 * 1024)),
    p2: delayed(25, 6, ChunkBytes::Fixed(1024 * 1024)),
    fec: FecDefaults { k: 50, r: 8 },
    medical_strict: false,
    dtn_ttl_seconds: None,
};

/// Disaster-response links: assume lossy, intermittent connectivity.
pub const DISASTER: DomainProfile = DomainProfile {
    name: "disaster",
    p0: delayed(10, 1, ChunkBytes::Fixed(256 * 1024)),
    p1: delayed(10, 1, ChunkBytes::Fixed(256 * 1024)),
    p2: delayed(10, 2, ChunkBytes::Fixed(256 * 1024)),
    fec: FecDefaults { k: 20, r: 12 },
    medical_strict: false,
    dtn_ttl_seconds: Some(86_400),
};

/// Rural/low-bandwidth links: conservative chunk sizes, DTN fallback.
pub const RURAL: DomainProfile = DomainProfile {
    name: "rural",
    p0: delayed(10, 1, ChunkBytes::Fixed(384 * 1024)),
    p1: delayed(10, 1, ChunkBytes::Fixed(384 * 1024)),
    p2: delayed(10, 2, ChunkBytes::Fixed(384 * 1024)),
    fec: FecDefaults { k: 20, r: 10 },
    medical_strict: false,
    dtn_ttl_seconds: Some(43_200),
};

/// Look up a domain profile by name.
pub fn by_name(name: &str) -> Result<DomainProfile> {
    match name {
        "media" => Ok(MEDIA),
        "medical" => Ok(MEDICAL),
        "engineering" => Ok(ENGINEERING),
        "telemetry" => Ok(TELEMETRY),
        "disaster" => Ok(DISASTER),
        "rural" => Ok(RURAL),
        other => Err(ProtocolError::InvalidArgument(format!("unknown domain profile: {other}"))),
    }
}

/// Accept or reject `manifest` under `profile`'s policy. Only `medical_strict`
/// profiles enforce anything today: the manifest's declared policy must
/// commit to both end-to-end and at-rest protection.
pub fn accept_transfer(manifest: &Manifest, profile: &DomainProfile) -> Result<()> {
    if !profile.medical_strict {
        return Ok(());
    }
    if !manifest.policy.e2e {
        return Err(ProtocolError::MedicalStrictViolation("e2e".into()));
    }
    if !manifest.policy.at_rest {
        return Err(ProtocolError::MedicalStrictViolation("at_rest".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::TransferPolicy;

    fn manifest_with_policy(policy: TransferPolicy) -> Manifest {
        let signer = quantarax_crypto::sig::Ed25519Signer::generate_identity();
        let mut manifest = Manifest {
            session_id: uuid::Uuid::nil(),
            file_name: "scan.dcm".into(),
            file_size: 10,
            chunk_size: 10,
            chunk_count: 1,
            hash_algorithm: "BLAKE3".into(),
            chunks: vec![crate::transfer::ChunkDescriptor {
                index: 0,
                hash: "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=".into(),
                length: 10,
            }],
            merkle_root: "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=".into(),
            created_at: 0,
            fec: None,
            domain_profile: Some("medical".into()),
            policy,
            signature: None,
        };
        manifest.sign(&signer).unwrap();
        manifest
    }

    #[test]
    fn non_strict_profile_accepts_any_policy() {
        let manifest = manifest_with_policy(TransferPolicy { e2e: false, at_rest: false });
        assert!(accept_transfer(&manifest, &MEDIA).is_ok());
    }

    #[test]
    fn strict_profile_accepts_full_policy() {
        let manifest = manifest_with_policy(TransferPolicy::default());
        assert!(accept_transfer(&manifest, &MEDICAL).is_ok());
    }

    #[test]
    fn strict_profile_rejects_missing_e2e() {
        let manifest = manifest_with_policy(TransferPolicy { e2e: false, at_rest: true });
        assert!(matches!(
            accept_transfer(&manifest, &MEDICAL),
            Err(ProtocolError::MedicalStrictViolation(ref reason)) if reason == "e2e"
        ));
    }

    #[test]
    fn strict_profile_rejects_missing_at_rest() {
        let manifest = manifest_with_policy(TransferPolicy { e2e: true, at_rest: false });
        assert!(matches!(
            accept_transfer(&manifest, &MEDICAL),
            Err(ProtocolError::MedicalStrictViolation(ref reason)) if reason == "at_rest"
        ));
    }

    #[test]
    fn medical_profile_is_strict() {
        assert!(MEDICAL.medical_strict);
        assert!(!MEDIA.medical_strict);
    }

    #[test]
    fn disaster_and_rural_enable_dtn() {
        assert_eq!(DISASTER.dtn_ttl_seconds, Some(86_400));
        assert_eq!(RURAL.dtn_ttl_seconds, Some(43_200));
        assert_eq!(MEDIA.dtn_ttl_seconds, None);
    }

    #[test]
    fn by_name_resolves_every_known_domain() {
        for name in ["media", "medical", "engineering", "telemetry", "disaster", "rural"] {
            assert_eq!(by_name(name).unwrap().name, name);
        }
    }

    #[test]
    fn unknown_domain_is_rejected() {
        assert!(by_name("aquarium").is_err());
    }

    #[test]
    fn fec_parameters_are_within_supported_range() {
        for profile in [MEDIA, MEDICAL, ENGINEERING, TELEMETRY, DISASTER, RURAL] {
            assert!(profile.fec.k >= 1 && profile.fec.k <= 256);
            assert!(profile.fec.r >= 1 && profile.fec.r <= 256);
        }
    }
}
