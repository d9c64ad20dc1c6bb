//! Self-signed TLS identities for QUIC endpoints
//!
//! QuantaraX's TLS layer provides transport-level confidentiality against
//! passive network observers; it is not the trust boundary. Peer identity
//! and message confidentiality are established by the session handshake in
//! `quantarax-crypto`, so the client accepts any server certificate.

use std::sync::Arc;

use crate::{Result, TransportError};

/// Generated TLS certificate and key pair for one QUIC endpoint.
pub struct TlsIdentity {
    /// DER-encoded certificate
    pub cert_der: rustls::pki_types::CertificateDer<'static>,
    /// DER-encoded private key
    pub key_der: rustls::pki_types::PrivatePkcs8KeyDer<'static>,
}

/// Generate a self-signed TLS certificate for localhost.
pub fn generate_self_signed() -> Result<TlsIdentity> {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
        .map_err(|e| TransportError::TlsError(format!("cert generation failed: {e}")))?;

    let cert_der = rustls::pki_types::CertificateDer::from(cert.cert);
    let key_der = rustls::pki_types::PrivatePkcs8KeyDer::from(cert.key_pair.serialize_der());

    Ok(TlsIdentity { cert_der, key_der })
}

/// Build a quinn `ServerConfig` from a TLS identity, with the given ALPN
/// protocol list.
pub fn quinn_server_config(identity: &TlsIdentity, alpn: &[&str]) -> Result<quinn::ServerConfig> {
    let mut crypto = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(vec![identity.cert_der.clone()], identity.key_der.clone_key().into())
        .map_err(|e| TransportError::TlsError(format!("rustls server config failed: {e}")))?;
    crypto.alpn_protocols = alpn.iter().map(|p| p.as_bytes().to_vec()).collect();

    let quic_crypto = quinn::crypto::rustls::QuicServerConfig::try_from(crypto)
        .map_err(|e| TransportError::TlsError(format!("quinn server config failed: {e}")))?;
    let mut server_config = quinn::ServerConfig::with_crypto(Arc::new(quic_crypto));
    apply_transport_params(&mut server_config);
    Ok(server_config)
}

/// Build a quinn `ClientConfig` that accepts any server certificate.
pub fn quinn_client_config(alpn: &[&str]) -> Result<quinn::ClientConfig> {
    let mut crypto = rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(SkipServerVerification))
        .with_no_client_auth();
    crypto.alpn_protocols = alpn.iter().map(|p| p.as_bytes().to_vec()).collect();

    let mut client_config = quinn::ClientConfig::new(Arc::new(
        quinn::crypto::rustls::QuicClientConfig::try_from(crypto)
            .map_err(|e| TransportError::TlsError(format!("quinn client config failed: {e}")))?,
    ));
    apply_client_transport_params(&mut client_config);
    Ok(client_config)
}

fn apply_transport_params(server_config: &mut quinn::ServerConfig) {
    let mut transport = quinn::TransportConfig::default();
    transport.keep_alive_interval(Some(std::time::Duration::from_secs(10)));
    transport.max_idle_timeout(Some(std::time::Duration::from_secs(60).try_into().unwrap()));
    transport.stream_receive_window((8u32 * 1024 * 1024).into());
    transport.receive_window((128u32 * 1024 * 1024).into());
    server_config.transport_config(Arc::new(transport));
}

fn apply_client_transport_params(client_config: &mut quinn::ClientConfig) {
    let mut transport = quinn::TransportConfig::default();
    transport.keep_alive_interval(Some(std::time::Duration::from_secs(10)));
    transport.max_idle_timeout(Some(std::time::Duration::from_secs(60).try_into().unwrap()));
    transport.stream_receive_window((8u32 * 1024 * 1024).into());
    transport.receive_window((128u32 * 1024 * 1024).into());
    client_config.transport_config(Arc::new(transport));
}

/// Certificate verifier that accepts any certificate.
#[derive(Debug)]
struct SkipServerVerification;

impl rustls::client::danger::ServerCertVerifier for SkipServerVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::aws_lc_rs::default_provider().signature_verification_algorithms.supported_schemes()
    }
}
