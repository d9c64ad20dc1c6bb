//! Loopback integration tests driving [`super::sender::send_file`] and
//! [`super::receiver::receive_file`] against each other over a real QUIC
//! connection on `127.0.0.1`.

use std::sync::Arc;

use quantarax_crypto::sig::ed25519::Ed25519Signer;
use quantarax_protocol::transfer::{compute_manifest, ChunkOptions, TransferPolicy};
use quantarax_store::cas::InMemoryContentStore;
use quantarax_store::session::SessionStore;
use quantarax_transport::{dial, listen};

use super::receiver::receive_file;
use super::sender::send_file;
use super::EngineError;

async fn loopback_pair() -> (Arc<quantarax_transport::Conn>, Arc<quantarax_transport::Conn>) {
    let listener = listen("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();

    let accept = tokio::spawn(async move { listener.accept().await.unwrap() });
    let client_conn = dial(addr).await.unwrap();
    let server_conn = accept.await.unwrap();

    (Arc::new(client_conn), Arc::new(server_conn))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn direct_one_megabyte_transfer_round_trips_byte_equal() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("payload.bin");
    let original: Vec<u8> = (0..1_048_576u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(&src_path, &original).unwrap();

    let manifest = compute_manifest(&src_path, ChunkOptions { chunk_size: 65_536 }).unwrap();
    assert_eq!(manifest.chunk_count, 16);

    let sender_identity = Ed25519Signer::generate_identity();
    let receiver_identity = Ed25519Signer::generate_identity();
    let (client_conn, server_conn) = loopback_pair().await;

    let download_dir = dir.path().join("downloads");
    std::fs::create_dir_all(&download_dir).unwrap();
    let cas: Arc<dyn quantarax_store::cas::ContentStore> = Arc::new(InMemoryContentStore::new());
    let sessions = Arc::new(SessionStore::new(quantarax_store::db::open_in_memory().unwrap()));

    let (send_result, receive_result) = tokio::join!(
        send_file(client_conn, manifest, src_path.clone(), &sender_identity, None, None),
        receive_file(server_conn, &download_dir, cas, &receiver_identity, sessions),
    );

    let send_outcome = send_result.expect("send_file should succeed");
    assert!(send_outcome.verified);

    let receive_outcome = receive_result.expect("receive_file should succeed");
    assert!(receive_outcome.verified);

    let received = std::fs::read(&receive_outcome.output_path).unwrap();
    assert_eq!(received, original);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn medical_strict_profile_rejects_manifest_missing_at_rest_commitment() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("scan.dcm");
    std::fs::write(&src_path, b"protected health information").unwrap();

    let mut manifest = compute_manifest(&src_path, ChunkOptions::default()).unwrap();
    manifest.domain_profile = Some("medical".to_string());
    manifest.policy = TransferPolicy { e2e: true, at_rest: false };

    let sender_identity = Ed25519Signer::generate_identity();
    let receiver_identity = Ed25519Signer::generate_identity();
    let (client_conn, server_conn) = loopback_pair().await;

    let download_dir = dir.path().join("downloads");
    std::fs::create_dir_all(&download_dir).unwrap();
    let cas: Arc<dyn quantarax_store::cas::ContentStore> = Arc::new(InMemoryContentStore::new());
    let sessions = Arc::new(SessionStore::new(quantarax_store::db::open_in_memory().unwrap()));

    // The sender doesn't evaluate policy itself; rejection only happens once
    // the receiver inspects the manifest, so the sender side of this join
    // may itself surface a transport error once the receiver drops the
    // connection without ever sending a VERIFICATION message.
    let (_, receive_result) = tokio::join!(
        send_file(client_conn, manifest, src_path, &sender_identity, Some("medical"), None),
        receive_file(server_conn, &download_dir, cas, &receiver_identity, sessions),
    );

    assert!(matches!(
        receive_result,
        Err(EngineError::Protocol(quantarax_protocol::ProtocolError::MedicalStrictViolation(ref reason)))
            if reason == "at_rest"
    ));
    assert!(!download_dir.join("scan.dcm").exists());
}
