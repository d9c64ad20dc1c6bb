//! QUIC transport implementation

pub mod quic;
pub mod relay;
pub mod tls_config;
